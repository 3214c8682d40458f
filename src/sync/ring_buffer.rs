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

//! A fixed-capacity buffer that overwrites its oldest element once full.
//! Single-threaded; used by the RTP packet-statistics window. Grounded on
//! `include/ravennakit/core/containers/ring_buffer.hpp`.

use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: VecDeque<T>,
    capacity: usize,
}

impl<T> RingBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "ring buffer must have a size greater than zero");
        Self {
            data: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Pushes `value`. Returns `true` if the buffer was full and the oldest
    /// element was overwritten.
    pub fn push_back(&mut self, value: T) -> bool {
        let overwritten = self.is_full();
        if overwritten {
            self.data.pop_front();
        }
        self.data.push_back(value);
        overwritten
    }

    pub fn pop_front(&mut self) -> Option<T> {
        self.data.pop_front()
    }

    pub fn front(&self) -> Option<&T> {
        self.data.front()
    }

    pub fn back(&self) -> Option<&T> {
        self.data.back()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.data.len() == self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.data.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overwrites_oldest_once_full() {
        let mut rb = RingBuffer::new(2);
        assert!(!rb.push_back(1));
        assert!(!rb.push_back(2));
        assert!(rb.push_back(3));
        assert_eq!(rb.iter().copied().collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn push_then_pop_round_trips() {
        let mut rb = RingBuffer::new(4);
        rb.push_back(42);
        assert_eq!(rb.pop_front(), Some(42));
        assert!(rb.is_empty());
    }
}
