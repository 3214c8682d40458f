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

//! A bounded single-producer/single-consumer FIFO carrying validated RTP
//! packets from the reactor thread to the audio thread. Push
//! and pop are both wait-free; a full queue is reported to the producer
//! rather than blocking it.

use std::{
    cell::UnsafeCell,
    mem::MaybeUninit,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

struct Slot<T>(UnsafeCell<MaybeUninit<T>>);

struct Shared<T> {
    buffer: Box<[Slot<T>]>,
    capacity: usize,
    head: AtomicUsize,
    tail: AtomicUsize,
}

unsafe impl<T: Send> Sync for Shared<T> {}

pub struct Sender<T> {
    shared: Arc<Shared<T>>,
}

pub struct Receiver<T> {
    shared: Arc<Shared<T>>,
}

/// Creates a bounded SPSC channel of the given capacity (must be > 0).
pub fn spsc<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    assert!(capacity > 0, "SPSC FIFO capacity must be non-zero");
    let buffer = (0..capacity + 1)
        .map(|_| Slot(UnsafeCell::new(MaybeUninit::uninit())))
        .collect::<Vec<_>>()
        .into_boxed_slice();
    let shared = Arc::new(Shared {
        buffer,
        capacity: capacity + 1,
        head: AtomicUsize::new(0),
        tail: AtomicUsize::new(0),
    });
    (
        Sender {
            shared: shared.clone(),
        },
        Receiver { shared },
    )
}

impl<T> Sender<T> {
    /// Attempts to push `value`. Returns it back (as `Err`) if the FIFO is full.
    pub fn try_push(&self, value: T) -> Result<(), T> {
        let tail = self.shared.tail.load(Ordering::Relaxed);
        let next = (tail + 1) % self.shared.capacity;
        if next == self.shared.head.load(Ordering::Acquire) {
            return Err(value);
        }
        unsafe {
            (*self.shared.buffer[tail].0.get()).write(value);
        }
        self.shared.tail.store(next, Ordering::Release);
        Ok(())
    }

    pub fn len(&self) -> usize {
        let head = self.shared.head.load(Ordering::Acquire);
        let tail = self.shared.tail.load(Ordering::Acquire);
        (tail + self.shared.capacity - head) % self.shared.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.shared.capacity - 1
    }
}

impl<T> Receiver<T> {
    pub fn try_pop(&self) -> Option<T> {
        let head = self.shared.head.load(Ordering::Relaxed);
        if head == self.shared.tail.load(Ordering::Acquire) {
            return None;
        }
        let value = unsafe { (*self.shared.buffer[head].0.get()).assume_init_read() };
        let next = (head + 1) % self.shared.capacity;
        self.shared.head.store(next, Ordering::Release);
        Some(value)
    }

    pub fn len(&self) -> usize {
        let head = self.shared.head.load(Ordering::Acquire);
        let tail = self.shared.tail.load(Ordering::Acquire);
        (tail + self.shared.capacity - head) % self.shared.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<T> Drop for Shared<T> {
    fn drop(&mut self) {
        let mut head = *self.head.get_mut();
        let tail = *self.tail.get_mut();
        while head != tail {
            unsafe {
                (*self.buffer[head].0.get()).assume_init_drop();
            }
            head = (head + 1) % self.capacity;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_then_pop_round_trips_in_order() {
        let (tx, rx) = spsc(4);
        tx.try_push(1).unwrap();
        tx.try_push(2).unwrap();
        assert_eq!(rx.try_pop(), Some(1));
        assert_eq!(rx.try_pop(), Some(2));
        assert_eq!(rx.try_pop(), None);
    }

    #[test]
    fn reports_full_instead_of_blocking() {
        let (tx, _rx) = spsc::<u32>(2);
        tx.try_push(1).unwrap();
        tx.try_push(2).unwrap();
        assert_eq!(tx.try_push(3), Err(3));
    }

    #[test]
    fn drop_cleans_up_unread_items() {
        let (tx, rx) = spsc(2);
        tx.try_push(Box::new(1)).unwrap();
        drop(tx);
        drop(rx);
    }
}
