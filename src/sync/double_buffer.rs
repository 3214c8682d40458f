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

//! A single-producer/single-consumer double buffer carrying the latest
//! scalar state (PTP offset, stream health) between threads without FIFO
//! semantics. Wait-free on both sides. Ported from
//! `include/ravennakit/core/sync/double_buffer.hpp`, whose bit-packed
//! `state_` protocol this keeps verbatim.

use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::atomic::{AtomicU32, Ordering},
};

pub struct DoubleBuffer<T> {
    storage: [UnsafeCell<MaybeUninit<T>>; 2],
    state: AtomicU32,
}

unsafe impl<T: Send> Sync for DoubleBuffer<T> {}

impl<T> Default for DoubleBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DoubleBuffer<T> {
    pub fn new() -> Self {
        Self {
            storage: [
                UnsafeCell::new(MaybeUninit::uninit()),
                UnsafeCell::new(MaybeUninit::uninit()),
            ],
            state: AtomicU32::new(0),
        }
    }

    /// Publishes a new value, overwriting whatever had not yet been read.
    pub fn update(&self, value: T) {
        let cell = self.start_writing();
        unsafe {
            (*cell).write(value);
        }
        self.end_writing();
    }

    fn start_writing(&self) -> *mut MaybeUninit<T> {
        let state = self.state.fetch_add(0x2, Ordering::SeqCst);
        self.storage[(state & 1) as usize].get()
    }

    fn end_writing(&self) {
        let state = self.state.load(Ordering::SeqCst);
        let active = state & 1;
        let flag = (8u32 << active) ^ (state & (8u32 << active));
        let delta = flag.wrapping_sub(0x2);
        let state = self.state.fetch_add(delta, Ordering::SeqCst).wrapping_add(delta);

        if state & 0x6 == 0 {
            let target = (state ^ 0x1) & !(0x10 >> (state & 1));
            let _ = self
                .state
                .compare_exchange(state, target, Ordering::SeqCst, Ordering::SeqCst);
        }
    }

    /// Returns the most recent value not yet consumed, or `None` if nothing
    /// new has been published since the last `get`.
    pub fn get(&self) -> Option<T> {
        let read_state = self.state.load(Ordering::SeqCst);
        if read_state & (0x10 >> (read_state & 1)) == 0 {
            return None;
        }

        let read_state = self.state.fetch_add(0x2, Ordering::SeqCst).wrapping_add(0x2);
        let cell = self.storage[((read_state & 1) ^ 1) as usize].get();
        let value = unsafe { (*cell).assume_init_read() };
        self.end_reading(read_state);
        Some(value)
    }

    fn end_reading(&self, read_state: u32) {
        if read_state & (0x10 >> (read_state & 1)) == 0 {
            return;
        }
        let sub = (0x10 >> (read_state & 1)) | 0x2;
        let state = self.state.fetch_sub(sub, Ordering::SeqCst).wrapping_sub(sub);
        if state & 0x6 == 0 && state & (0x8u32 << (state & 1)) == 1 {
            let _ = self
                .state
                .compare_exchange(state, state ^ 0x1, Ordering::SeqCst, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_returns_last_update_once() {
        let db = DoubleBuffer::new();
        db.update(42);
        assert_eq!(db.get(), Some(42));
        assert_eq!(db.get(), None);
    }

    #[test]
    fn later_update_overwrites_unread_value() {
        let db = DoubleBuffer::new();
        db.update(1);
        db.update(2);
        assert_eq!(db.get(), Some(2));
    }
}
