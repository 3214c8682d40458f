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

//! Clock and time primitives: monotonic clock access, 80-bit PTP
//! timestamps, wrapping sequence-number arithmetic, and sliding
//! statistics. Everything here is leaf-level and has no dependency on the
//! PTP or RTP subsystems that consume it.

pub(crate) mod phc;
mod sliding_stats;
mod timestamp;
mod wrapping;

pub use sliding_stats::SlidingStats;
pub use timestamp::Timestamp;
pub use wrapping::WrappingU16;

use crate::{
    config::PtpMode,
    error::{ClockError, ClockResult, ConfigResult},
    formats::{Frames, FramesPerSecond},
    nic,
    ptp::PtpSlaveClock,
};
use libc::{clock_gettime, clockid_t, timespec};
use phc::PhcClock;
use std::{io, time::Instant};
use tracing::{error, info, warn};

pub const NANOS_PER_SEC: i128 = 1_000_000_000;

/// A source of PTP-disciplined time expressed in audio frames, matching the
/// shape the RTP receive/send path consumes.
pub trait MediaClock: Send + 'static {
    fn current_media_time(&mut self) -> ClockResult<Frames>;
    fn current_ptp_time_nanos(&mut self) -> ClockResult<i128>;
}

pub(crate) fn get_time(clock_id: clockid_t) -> io::Result<timespec> {
    let mut tp = timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    if unsafe { clock_gettime(clock_id, &mut tp) } != 0 {
        let e = io::Error::last_os_error();
        error!(clock_id, "could not read clock: {e}");
        Err(e)
    } else {
        Ok(tp)
    }
}

pub(crate) fn to_nanos(tp: timespec) -> i128 {
    tp.tv_sec as i128 * NANOS_PER_SEC + tp.tv_nsec as i128
}

/// The clock source selected by [`PtpMode`].
pub enum Clock {
    /// Delegates to the OS TAI/monotonic clock; used when an external PTP
    /// daemon already disciplines the system clock.
    System(SystemClock),
    /// Reads a NIC's PTP hardware clock (PHC) directly.
    Phc(PhcClock),
    /// This crate's own ordinary-clock PTP slave.
    Internal(PtpSlaveClock),
}

impl MediaClock for Clock {
    fn current_media_time(&mut self) -> ClockResult<Frames> {
        match self {
            Clock::System(c) => c.current_media_time(),
            Clock::Phc(c) => c.current_media_time(),
            Clock::Internal(c) => c.current_media_time(),
        }
    }

    fn current_ptp_time_nanos(&mut self) -> ClockResult<i128> {
        match self {
            Clock::System(c) => c.current_ptp_time_nanos(),
            Clock::Phc(c) => c.current_ptp_time_nanos(),
            Clock::Internal(c) => c.current_ptp_time_nanos(),
        }
    }
}

/// Reads time straight from `CLOCK_TAI`, for use when an external daemon
/// (e.g. `ptp4l` + `phc2sys`) already disciplines the system clock.
#[derive(Debug, Clone)]
pub struct SystemClock {
    sample_rate: FramesPerSecond,
}

impl SystemClock {
    pub fn new(sample_rate: FramesPerSecond) -> Self {
        Self { sample_rate }
    }
}

impl MediaClock for SystemClock {
    fn current_media_time(&mut self) -> ClockResult<Frames> {
        let start = Instant::now();
        let nanos = self.current_ptp_time_nanos()?;
        let elapsed = start.elapsed().as_micros();
        if elapsed > 500 {
            warn!("reading system clock took {elapsed} µs");
        }
        Ok(((nanos.max(0) as u128 * self.sample_rate as u128) / NANOS_PER_SEC as u128) as Frames)
    }

    fn current_ptp_time_nanos(&mut self) -> ClockResult<i128> {
        Ok(to_nanos(get_time(libc::CLOCK_TAI)?))
    }
}

pub async fn get_clock(ptp_mode: Option<PtpMode>, sample_rate: FramesPerSecond) -> ConfigResult<Clock> {
    match ptp_mode {
        Some(PtpMode::System) | None => {
            info!("using system clock as media clock source");
            Ok(Clock::System(SystemClock::new(sample_rate)))
        }
        Some(PtpMode::Phc { nic: nic_name }) => {
            info!(nic = %nic_name, "using PHC clock as media clock source");
            let iface = nic::find_nic_with_name(&nic_name)?;
            let path = nic::phc_device_for_interface(&iface)?
                .ok_or_else(|| ClockError::PtpNotSupported(iface.name.clone()))?;
            Ok(Clock::Phc(PhcClock::open(path, sample_rate)?))
        }
        Some(PtpMode::Internal { nic: nic_name, domain }) => {
            info!(nic = %nic_name, "starting internal PTP slave clock");
            let iface = nic::find_nic_with_name(&nic_name)?;
            let clock = PtpSlaveClock::start(iface, domain, sample_rate)
                .await
                .map_err(ClockError::Ptp)?;
            Ok(Clock::Internal(clock))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_advances_monotonically() {
        let mut clock = SystemClock::new(48_000);
        let a = clock.current_ptp_time_nanos().unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let b = clock.current_ptp_time_nanos().unwrap();
        assert!(b > a);
    }
}
