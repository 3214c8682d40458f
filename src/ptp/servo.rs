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

//! The virtual-clock frequency-ratio servo, with outlier-filtered offset
//! input. Grounded on `include/ravennakit/ptp/ptp_local_ptp_clock.hpp`;
//! `ptp_local_clock.hpp`'s simpler `LocalSystemClock` servo formula is not
//! used here matches the detailed variant almost verbatim.

use crate::time::SlidingStats;

/// Width of the sliding offset window feeding outlier rejection.
pub const OFFSET_WINDOW: usize = 51;
/// Adjustments required since the last step before outlier rejection kicks in.
pub const CALIBRATED_THRESHOLD: u32 = 10;
/// Absolute offset, in seconds, beyond which a sample is rejected as an outlier.
pub const OUTLIER_THRESHOLD_SECONDS: f64 = 0.0013;
/// Absolute offset, in seconds, beyond which the servo steps instead of slewing.
pub const CLOCK_STEP_THRESHOLD_SECONDS: f64 = 1.0;
/// Maximum frequency-ratio change applied per `adjust` call.
pub const MAX_SLEW_PER_ADJUSTMENT: f64 = 0.001;
/// Low-pass filter coefficient applied to raw offset samples before feeding the servo.
pub const FILTER_ALPHA: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdjustOutcome {
    Applied,
    Stepped,
    Ignored,
}

/// A software clock disciplined by a stream of offset-from-master samples.
/// `now_ptp = last_sync + (now_local - last_sync) * frequency_ratio + shift`.
#[derive(Debug, Clone)]
pub struct VirtualClock {
    shift_nanos: i128,
    frequency_ratio: f64,
    last_sync_local_nanos: i128,
    filtered_offset_seconds: Option<f64>,
    offsets: SlidingStats,
    adjustments_since_step: u32,
    ignored_outliers: u64,
}

impl Default for VirtualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualClock {
    pub fn new() -> Self {
        Self {
            shift_nanos: 0,
            frequency_ratio: 1.0,
            last_sync_local_nanos: 0,
            filtered_offset_seconds: None,
            offsets: SlidingStats::new(OFFSET_WINDOW),
            adjustments_since_step: 0,
            ignored_outliers: 0,
        }
    }

    pub fn frequency_ratio(&self) -> f64 {
        self.frequency_ratio
    }

    pub fn shift_nanos(&self) -> i128 {
        self.shift_nanos
    }

    pub fn ignored_outliers(&self) -> u64 {
        self.ignored_outliers
    }

    pub fn is_calibrated(&self) -> bool {
        self.adjustments_since_step >= CALIBRATED_THRESHOLD
    }

    pub fn now(&self, now_local_nanos: i128) -> i128 {
        let advance = ((now_local_nanos - self.last_sync_local_nanos) as f64 * self.frequency_ratio) as i128;
        self.last_sync_local_nanos + advance + self.shift_nanos
    }

    fn fold_advance(&mut self, now_local_nanos: i128) {
        let advance = ((now_local_nanos - self.last_sync_local_nanos) as f64 * self.frequency_ratio) as i128;
        self.shift_nanos += advance;
        self.last_sync_local_nanos = now_local_nanos;
    }

    fn step(&mut self, offset_seconds: f64, now_local_nanos: i128) {
        self.fold_advance(now_local_nanos);
        self.shift_nanos -= (offset_seconds * 1e9) as i128;
        self.filtered_offset_seconds = None;
        self.offsets.reset();
        self.adjustments_since_step = 0;
        self.frequency_ratio = 1.0;
    }

    /// Applies one offset-from-master sample (seconds, positive means the
    /// local clock is ahead). Returns what happened so callers can update
    /// statistics/logging.
    pub fn adjust(&mut self, raw_offset_seconds: f64, now_local_nanos: i128) -> AdjustOutcome {
        if raw_offset_seconds.abs() > CLOCK_STEP_THRESHOLD_SECONDS {
            self.step(raw_offset_seconds, now_local_nanos);
            return AdjustOutcome::Stepped;
        }

        let filtered = match self.filtered_offset_seconds {
            Some(prev) => FILTER_ALPHA * raw_offset_seconds + (1.0 - FILTER_ALPHA) * prev,
            None => raw_offset_seconds,
        };

        if self.is_calibrated() && self.offsets.is_outlier(filtered, OUTLIER_THRESHOLD_SECONDS) {
            self.ignored_outliers += 1;
            return AdjustOutcome::Ignored;
        }

        self.filtered_offset_seconds = Some(filtered);
        self.offsets.push(filtered);
        self.fold_advance(now_local_nanos);

        if !self.is_calibrated() {
            self.frequency_ratio = 1.0;
            self.adjustments_since_step += 1;
        } else {
            let nominal = 1.5f64.powf(-filtered).clamp(0.5, 1.5);
            let delta = nominal - self.frequency_ratio;
            if delta.abs() <= MAX_SLEW_PER_ADJUSTMENT {
                self.frequency_ratio = nominal;
            } else {
                self.frequency_ratio += delta.signum() * MAX_SLEW_PER_ADJUSTMENT;
            }
            self.adjustments_since_step += 1;
        }

        AdjustOutcome::Applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_step_on_large_offset() {
        let mut clock = VirtualClock::new();
        let outcome = clock.adjust(2.0, 0);
        assert_eq!(outcome, AdjustOutcome::Stepped);
        assert_eq!(clock.frequency_ratio(), 1.0);
        assert_eq!(clock.shift_nanos(), -2_000_000_000);
        assert_eq!(clock.adjustments_since_step, 0);
    }

    #[test]
    fn outlier_is_rejected_once_calibrated() {
        let mut clock = VirtualClock::new();
        for i in 0..20 {
            clock.adjust(0.0, i as i128 * 1_000_000_000);
        }
        assert!(clock.is_calibrated());
        let ratio_before = clock.frequency_ratio();
        let outcome = clock.adjust(0.005, 20_000_000_000);
        assert_eq!(outcome, AdjustOutcome::Ignored);
        assert_eq!(clock.ignored_outliers(), 1);
        assert_eq!(clock.frequency_ratio(), ratio_before);
    }

    #[test]
    fn uncalibrated_samples_never_move_frequency_ratio() {
        let mut clock = VirtualClock::new();
        for i in 0..5 {
            clock.adjust(0.0002, i as i128 * 1_000_000_000);
        }
        assert!(!clock.is_calibrated());
        assert_eq!(clock.frequency_ratio(), 1.0);
    }
}
