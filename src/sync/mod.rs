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

//! Cross-cutting concurrency primitives shared by the reactor and audio
//! threads: a single-producer/single-consumer FIFO, an RCU snapshot
//! publisher, a many-reader/single-writer atomic lock, and a wait-free
//! double buffer. Grounded on `include/ravennakit/core/sync/*` and
//! `include/ravennakit/core/containers/ring_buffer.hpp`.

mod atomic_rw_lock;
mod double_buffer;
mod rcu;
mod ring_buffer;
mod spsc;

pub use atomic_rw_lock::AtomicRwLock;
pub use double_buffer::DoubleBuffer;
pub use rcu::Rcu;
pub use ring_buffer::RingBuffer;
pub use spsc::{Receiver as SpscReceiver, Sender as SpscSender, spsc};
