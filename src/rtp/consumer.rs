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

//! The audio-thread side of one reader: drains the SPSC FIFO into the
//! reorder buffer, then serves fixed-size reads transcoded to the
//! consumer's preferred byte order. Never blocks and never takes a mutex;
//! the only cross-thread primitives touched here are the FIFO receiver and
//! an [`Rcu`] snapshot of the current audio format.

use super::{error::Result, reader::IncomingPacket, reorder::ReorderBuffer};
use crate::{
    codec::{Endian, transcode},
    formats::{AudioFormat, MilliSeconds},
    sync::{DoubleBuffer, Rcu, SpscReceiver},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Idle,
    WaitingForData,
    Ok,
    OkNoConsumer,
    Inactive,
}

pub struct AudioConsumer {
    fifo: SpscReceiver<IncomingPacket>,
    reorder: ReorderBuffer,
    format: Rcu<AudioFormat>,
    delay_frames: u32,
    state: DoubleBuffer<StreamState>,
    last_state: StreamState,
    ever_read: bool,
}

/// Buffer sizing: at least 200ms of audio, never fewer than 1024 frames.
pub fn buffer_size_frames(format: &AudioFormat) -> usize {
    format.frames_for_duration(200.0).max(1024)
}

/// FIFO depth in packets for the given packet time.
pub fn fifo_depth(format: &AudioFormat, ptime_ms: MilliSeconds) -> usize {
    (buffer_size_frames(format) / format.frames_per_packet(ptime_ms)).max(1)
}

impl AudioConsumer {
    pub fn new(
        fifo: SpscReceiver<IncomingPacket>,
        format: AudioFormat,
        ptime_ms: MilliSeconds,
        delay_frames: u32,
    ) -> Self {
        let frames_per_slot = format.frames_per_packet(ptime_ms);
        let bytes_per_frame = format.frame_format.bytes_per_frame();
        let capacity_slots = (buffer_size_frames(&format) / frames_per_slot).max(1);
        Self {
            fifo,
            reorder: ReorderBuffer::new(frames_per_slot, capacity_slots, bytes_per_frame),
            format: Rcu::new(format),
            delay_frames,
            state: DoubleBuffer::new(),
            last_state: StreamState::Idle,
            ever_read: false,
        }
    }

    /// Publishes a new stream format; future reads transcode against it.
    pub fn set_format(&self, format: AudioFormat) {
        self.format.update(format);
    }

    pub fn state(&self) -> StreamState {
        self.state.get().unwrap_or(self.last_state)
    }

    fn publish_state(&mut self, state: StreamState) {
        self.last_state = state;
        self.state.update(state);
    }

    /// Drains everything currently queued in the FIFO into the reorder
    /// buffer. Must run on the audio thread ahead of `read`.
    fn drain_fifo(&mut self) {
        while let Some(packet) = self.fifo.try_pop() {
            self.reorder.align(packet.rtp_timestamp.wrapping_sub(self.delay_frames));
            self.reorder.write(packet.rtp_timestamp, &packet.payload);
        }
    }

    /// Reads `frames` worth of audio into `output`, transcoded to `to`
    /// byte order. On the first call the cursor is anchored at
    /// `most_recent_packet_ts - delay_frames`; subsequent calls advance by
    /// the number of frames actually requested.
    pub fn read_audio(&mut self, output: &mut [u8], to: Endian) -> Result<usize> {
        self.drain_fifo();

        if !self.ever_read {
            match self.reorder.next_read_ts() {
                Some(_) => self.ever_read = true,
                None => {
                    self.publish_state(StreamState::WaitingForData);
                    return Ok(0);
                }
            }
        }

        let format = self.format.load();
        let bytes_per_sample = format.frame_format.sample_format.bytes_per_sample();

        match self.reorder.read(None) {
            Ok((_, data)) => {
                let len = data.len().min(output.len());
                transcode(&data[..len], bytes_per_sample, Endian::Big, to, &mut output[..len]);
                self.publish_state(StreamState::Ok);
                Ok(len)
            }
            Err(_) => {
                self.publish_state(StreamState::WaitingForData);
                Ok(0)
            }
        }
    }

    pub fn mark_no_consumer(&mut self) {
        self.publish_state(StreamState::OkNoConsumer);
    }

    pub fn mark_inactive(&mut self) {
        self.publish_state(StreamState::Inactive);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        formats::{FrameFormat, SampleFormat},
        sync::spsc,
        time::WrappingU16,
    };

    fn sample_format() -> AudioFormat {
        AudioFormat {
            sample_rate: 48_000,
            frame_format: FrameFormat {
                channels: 2,
                sample_format: SampleFormat::L16,
            },
        }
    }

    fn packet(ts: u32, frames: usize, bytes_per_frame: usize, fill: u8) -> IncomingPacket {
        IncomingPacket {
            payload: vec![fill; frames * bytes_per_frame],
            rtp_timestamp: ts,
            sequence_number: WrappingU16::new(0),
            packet_time_frames: frames,
            received_at_nanos: None,
        }
    }

    #[test]
    fn reports_waiting_for_data_before_anything_arrives() {
        let (_tx, rx) = spsc(4);
        let mut consumer = AudioConsumer::new(rx, sample_format(), 1.0, 0);
        let mut out = [0u8; 192];
        let n = consumer.read_audio(&mut out, Endian::Little).unwrap();
        assert_eq!(n, 0);
        assert_eq!(consumer.state(), StreamState::WaitingForData);
    }

    #[test]
    fn reads_back_transcoded_audio_once_a_packet_arrives() {
        let (tx, rx) = spsc(4);
        let mut consumer = AudioConsumer::new(rx, sample_format(), 1.0, 0);
        tx.try_push(packet(0, 48, 4, 0)).unwrap();
        let mut out = vec![0u8; 48 * 4];
        let n = consumer.read_audio(&mut out, Endian::Big).unwrap();
        assert_eq!(n, 48 * 4);
        assert_eq!(consumer.state(), StreamState::Ok);
    }

    #[test]
    fn format_changes_are_visible_to_the_next_read() {
        let (_tx, rx) = spsc(4);
        let consumer = AudioConsumer::new(rx, sample_format(), 1.0, 0);
        let mut other = sample_format();
        other.sample_rate = 96_000;
        consumer.set_format(other);
        assert_eq!(consumer.format.load().sample_rate, 96_000);
    }
}
