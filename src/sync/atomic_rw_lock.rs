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

//! A many-reader/single-writer spinlock guarding the RTP socket pool's
//! reader slots during add/remove transitions. The network and audio
//! threads only ever take shared locks; only the orchestration thread takes
//! the exclusive lock, and it never blocks readers for long. Grounded on
//! `include/ravennakit/core/sync/atomic_rw_lock.hpp`.

use std::sync::atomic::{AtomicI32, Ordering};

const WRITER: i32 = i32::MIN;

#[derive(Debug, Default)]
pub struct AtomicRwLock {
    state: AtomicI32,
}

impl AtomicRwLock {
    pub fn new() -> Self {
        Self {
            state: AtomicI32::new(0),
        }
    }

    pub fn try_lock_shared(&self) -> bool {
        let mut current = self.state.load(Ordering::Acquire);
        loop {
            if current < 0 {
                return false;
            }
            match self.state.compare_exchange_weak(
                current,
                current + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return true,
                Err(observed) => current = observed,
            }
        }
    }

    pub fn lock_shared(&self) -> bool {
        while !self.try_lock_shared() {
            std::hint::spin_loop();
        }
        true
    }

    pub fn unlock_shared(&self) {
        self.state.fetch_sub(1, Ordering::Release);
    }

    pub fn try_lock_exclusive(&self) -> bool {
        self.state
            .compare_exchange(0, WRITER, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    pub fn lock_exclusive(&self) -> bool {
        while !self.try_lock_exclusive() {
            std::hint::spin_loop();
        }
        true
    }

    pub fn unlock_exclusive(&self) {
        self.state.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusive_excludes_shared_and_exclusive() {
        let lock = AtomicRwLock::new();
        assert!(lock.lock_exclusive());
        assert!(!lock.try_lock_shared());
        assert!(!lock.try_lock_exclusive());
        lock.unlock_exclusive();
    }

    #[test]
    fn multiple_readers_can_coexist() {
        let lock = AtomicRwLock::new();
        assert!(lock.lock_shared());
        assert!(lock.lock_shared());
        assert!(lock.try_lock_shared());
        assert!(!lock.try_lock_exclusive());
        lock.unlock_shared();
        lock.unlock_shared();
        lock.unlock_shared();
        assert!(lock.lock_exclusive());
        lock.unlock_exclusive();
    }
}
