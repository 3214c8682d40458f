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

use crate::{
    error::ClockResult,
    formats::{Frames, FramesPerSecond},
    time::{MediaClock, get_time, to_nanos},
};
use libc::{CLOCK_TAI, clockid_t};
use std::{
    os::fd::{IntoRawFd, RawFd},
    path::Path,
    sync::{
        Arc, Mutex, OnceLock,
        atomic::{AtomicI64, Ordering},
    },
    thread,
    time::Duration,
};
use tracing::{info, warn};

static CLOCK_ID: OnceLock<Arc<Mutex<Option<(clockid_t, RawFd)>>>> = OnceLock::new();

fn clock_registry() -> &'static Arc<Mutex<Option<(clockid_t, RawFd)>>> {
    CLOCK_ID.get_or_init(|| Arc::new(Mutex::new(None)))
}

/// Reads a NIC's PTP hardware clock via the Linux `/dev/ptpN` character
/// device, polling its offset from `CLOCK_TAI` once a second in a background
/// thread. Grounded on `aes67-rs/src/time/phc.rs`.
#[derive(Debug, Clone)]
pub struct PhcClock {
    sample_rate: FramesPerSecond,
    last_offset: Arc<AtomicI64>,
}

impl PhcClock {
    pub fn open(path: impl AsRef<Path>, sample_rate: FramesPerSecond) -> ClockResult<Self> {
        let clock = {
            let mut guard = clock_registry().lock().expect("mutex poisoned");
            if let Some((clock_id, _)) = guard.as_ref() {
                *clock_id
            } else {
                let file = std::fs::OpenOptions::new()
                    .write(true)
                    .read(true)
                    .open(path)?;
                let fd = file.into_raw_fd();
                let clock_id = ((!(fd as clockid_t)) << 3) | 3;
                *guard = Some((clock_id, fd));
                clock_id
            }
        };

        let last_offset = Arc::new(AtomicI64::new(get_current_offset(clock)?));

        info!("starting PHC sync thread");
        let sync_offset = last_offset.clone();
        thread::spawn(move || {
            loop {
                match get_current_offset(clock) {
                    Ok(offset) => sync_offset.store(offset, Ordering::Release),
                    Err(_) => return,
                }
                thread::sleep(Duration::from_secs(1));
            }
        });

        Ok(Self {
            sample_rate,
            last_offset,
        })
    }
}

fn get_current_offset(clock: clockid_t) -> ClockResult<i64> {
    let tai1 = to_nanos(get_time(CLOCK_TAI)?);
    let phc = to_nanos(get_time(clock)?);
    let tai2 = to_nanos(get_time(CLOCK_TAI)?);
    Ok((phc - (tai1 + tai2) / 2) as i64)
}

impl MediaClock for PhcClock {
    fn current_media_time(&mut self) -> ClockResult<Frames> {
        let start = std::time::Instant::now();
        let nanos = self.current_ptp_time_nanos()?;
        let elapsed = start.elapsed().as_micros();
        if elapsed > 500 {
            warn!("reading PHC clock took {elapsed} µs");
        }
        Ok(((nanos.max(0) as u128 * self.sample_rate as u128) / super::NANOS_PER_SEC as u128) as Frames)
    }

    fn current_ptp_time_nanos(&mut self) -> ClockResult<i128> {
        let tai = to_nanos(get_time(CLOCK_TAI)?);
        let offset = self.last_offset.load(Ordering::Acquire);
        Ok(tai + offset as i128)
    }
}
