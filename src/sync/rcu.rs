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

//! Publishes parameter/config snapshots (audio format, delay, session
//! assignments) from the reactor thread to the audio thread.
//! Grounded on `include/ravennakit/core/sync/rcu.hpp`, whose manual
//! value-list reclamation is replaced here by `Arc` reference counting:
//! a reader's snapshot is just a cloned `Arc`, so the last reader to drop
//! it frees the old value automatically instead of requiring an explicit
//! `reclaim()` call. The writer side stays mutex-protected and non-realtime;
//! the read side stays an uncontended, effectively wait-free snapshot clone.

use std::sync::{Arc, RwLock};

#[derive(Debug)]
pub struct Rcu<T> {
    current: RwLock<Arc<T>>,
}

impl<T> Rcu<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: RwLock::new(Arc::new(value)),
        }
    }

    /// Publishes a new value. Safe to call from the reactor thread only;
    /// never call from the audio thread.
    pub fn update(&self, value: T) {
        let mut guard = self.current.write().expect("rcu writer lock poisoned");
        *guard = Arc::new(value);
    }

    /// Returns a snapshot of the current value. The returned `Arc` remains
    /// valid and stable for as long as it is held, even if `update` is
    /// called concurrently.
    pub fn load(&self) -> Arc<T> {
        self.current.read().expect("rcu reader lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn readers_see_latest_published_value() {
        let rcu = Rcu::new(1);
        assert_eq!(*rcu.load(), 1);
        rcu.update(2);
        assert_eq!(*rcu.load(), 2);
    }

    #[test]
    fn snapshot_stays_stable_across_a_later_update() {
        let rcu = Rcu::new("a".to_string());
        let snapshot = rcu.load();
        rcu.update("b".to_string());
        assert_eq!(*snapshot, "a");
        assert_eq!(*rcu.load(), "b");
    }
}
