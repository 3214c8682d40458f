/*
 *  Copyright (C) 2025 Michael Bachmann
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU Affero General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU Affero General Public License for more details.
 *
 *  You should have received a copy of the GNU Affero General Public License
 *  along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use serde::{Deserialize, Serialize};
use std::str::FromStr;

pub type MilliSeconds = f64;
pub type FramesPerSecond = u32;
pub type Frames = u64;

/// Linear PCM sample widths carried by AES67 (no
/// codec support beyond L16/L24/L32).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SampleFormat {
    L16,
    L24,
    L32,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unsupported sample encoding: {0}")]
pub struct UnsupportedSampleFormat(pub String);

impl FromStr for SampleFormat {
    type Err = UnsupportedSampleFormat;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "L16" => Ok(SampleFormat::L16),
            "L24" => Ok(SampleFormat::L24),
            "L32" => Ok(SampleFormat::L32),
            other => Err(UnsupportedSampleFormat(other.to_owned())),
        }
    }
}

impl std::fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SampleFormat::L16 => "L16",
            SampleFormat::L24 => "L24",
            SampleFormat::L32 => "L32",
        })
    }
}

impl SampleFormat {
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleFormat::L16 => 2,
            SampleFormat::L24 => 3,
            SampleFormat::L32 => 4,
        }
    }
}

/// Channel count and sample format of one frame of interleaved audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FrameFormat {
    pub channels: usize,
    pub sample_format: SampleFormat,
}

impl FrameFormat {
    pub fn bytes_per_frame(&self) -> usize {
        self.channels * self.sample_format.bytes_per_sample()
    }
}

/// Full description of a media stream's sample grid: rate, channel count
/// and sample format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: FramesPerSecond,
    pub frame_format: FrameFormat,
}

impl AudioFormat {
    /// Frames carried by one packet of the given packet time, rounded up
    /// (`framecount = round(ptime_ms * sample_rate / 1000)`).
    pub fn frames_per_packet(&self, ptime_ms: MilliSeconds) -> usize {
        frames_per_packet(self.sample_rate, ptime_ms)
    }

    pub fn bytes_per_packet(&self, ptime_ms: MilliSeconds) -> usize {
        self.frames_per_packet(ptime_ms) * self.frame_format.bytes_per_frame()
    }

    /// Frames that fit in a buffer spanning `duration_ms` (see the buffer-sizing
    /// "Buffer sizing": `buffer_size_frames = max(sample_rate * 200ms, 1024)`).
    pub fn frames_for_duration(&self, duration_ms: MilliSeconds) -> usize {
        frames_for_duration(self.sample_rate, duration_ms)
    }
}

pub fn frames_per_packet(sample_rate: FramesPerSecond, ptime_ms: MilliSeconds) -> usize {
    ((sample_rate as f64 * ptime_ms) / 1000.0).round() as usize
}

pub fn frames_for_duration(sample_rate: FramesPerSecond, duration_ms: MilliSeconds) -> usize {
    ((sample_rate as f64 * duration_ms) / 1000.0).ceil() as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_per_packet_matches_one_millisecond_at_48k() {
        assert_eq!(frames_per_packet(48_000, 1.0), 48);
    }

    #[test]
    fn buffer_sizing_is_at_least_200ms() {
        assert_eq!(frames_for_duration(48_000, 200.0), 9_600);
    }

    #[test]
    fn sample_format_round_trips_through_str() {
        for f in [SampleFormat::L16, SampleFormat::L24, SampleFormat::L32] {
            assert_eq!(f.to_string().parse::<SampleFormat>().unwrap(), f);
        }
    }
}
