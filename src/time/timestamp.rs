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

//! The 80-bit PTP timestamp (48-bit seconds, 32-bit nanoseconds) used on the
//! wire by Announce/Sync/Follow_Up/Delay_Req/Delay_Resp bodies. Grounded on
//! `include/ravennakit/ptp/ptp_timestamp.hpp`.

use crate::codec::view::{BufferView, ViewError};
use std::ops::{Add, Sub};

const NANOS_PER_SEC: i128 = 1_000_000_000;
pub const SECONDS_MASK: u64 = 0x0000_ffff_ffff_ffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp {
    seconds: u64,
    nanoseconds: u32,
}

impl Timestamp {
    pub fn new(seconds: u64, nanoseconds: u32) -> Self {
        assert!(seconds <= SECONDS_MASK, "PTP seconds field overflows 48 bits");
        assert!(nanoseconds < 1_000_000_000, "nanoseconds field must be < 1e9");
        Self { seconds, nanoseconds }
    }

    pub fn seconds(&self) -> u64 {
        self.seconds
    }

    pub fn nanoseconds(&self) -> u32 {
        self.nanoseconds
    }

    pub fn from_nanos(total_nanos: i128) -> Self {
        let secs = total_nanos.div_euclid(NANOS_PER_SEC);
        let nanos = total_nanos.rem_euclid(NANOS_PER_SEC);
        Self::new(secs as u64, nanos as u32)
    }

    pub fn to_nanos(self) -> i128 {
        self.seconds as i128 * NANOS_PER_SEC + self.nanoseconds as i128
    }

    pub fn read(view: &mut BufferView<'_>) -> Result<Self, ViewError> {
        let seconds = view.read_u48_be()?;
        let nanoseconds = view.read_u32_be()?;
        Ok(Self { seconds, nanoseconds })
    }

    pub fn write(&self, out: &mut Vec<u8>) {
        let s = self.seconds.to_be_bytes();
        out.extend_from_slice(&s[2..8]);
        out.extend_from_slice(&self.nanoseconds.to_be_bytes());
    }
}

impl Sub for Timestamp {
    type Output = i128;

    /// Signed difference in nanoseconds, `self - rhs`.
    fn sub(self, rhs: Self) -> i128 {
        self.to_nanos() - rhs.to_nanos()
    }
}

impl Add<i128> for Timestamp {
    type Output = Timestamp;

    fn add(self, rhs: i128) -> Timestamp {
        Timestamp::from_nanos(self.to_nanos() + rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_wire_format() {
        let ts = Timestamp::new(1_700_000_000, 123_456_789);
        let mut buf = Vec::new();
        ts.write(&mut buf);
        assert_eq!(buf.len(), 10);
        let mut view = BufferView::new(&buf);
        assert_eq!(Timestamp::read(&mut view).unwrap(), ts);
    }

    #[test]
    fn splits_u64_max_nanos_into_seconds_and_remainder() {
        let ts = Timestamp::from_nanos(u64::MAX as i128);
        assert_eq!(ts.seconds(), 18_446_744_073);
        assert_eq!(ts.nanoseconds(), 709_551_615);
    }

    #[test]
    fn difference_is_signed_nanoseconds() {
        let a = Timestamp::new(10, 0);
        let b = Timestamp::new(9, 999_999_000);
        assert_eq!(a - b, 1_000);
        assert_eq!(b - a, -1_000);
    }
}
