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

//! Refcounts multicast group joins so duplicate subscribers on the same
//! `(group, interface, port)` share one IGMP join and only the last removal
//! issues `leave_group`.

use dashmap::DashMap;
use socket2::Socket;
use std::{net::Ipv4Addr, sync::Arc};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct JoinKey {
    group: Ipv4Addr,
    iface_index: u32,
    port: u16,
}

#[derive(Default)]
pub struct MulticastJoinGuard {
    counts: DashMap<JoinKey, usize>,
}

impl MulticastJoinGuard {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Joins `group` on `socket` unless another subscriber already holds it
    /// for the same `(group, iface, port)`; refcounts either way.
    pub fn acquire(
        &self,
        socket: &Socket,
        group: Ipv4Addr,
        iface_index: u32,
        port: u16,
        iface: &pnet::datalink::NetworkInterface,
    ) -> crate::error::ConfigResult<()> {
        let key = JoinKey {
            group,
            iface_index,
            port,
        };
        let mut entry = self.counts.entry(key).or_insert(0);
        if *entry == 0 {
            super::join_multicast_v4(socket, group, iface)?;
            debug!(%group, port, "joined multicast group");
        }
        *entry += 1;
        Ok(())
    }

    /// Releases one reference; issues `leave_group` only when the last
    /// holder releases.
    pub fn release(
        &self,
        socket: &Socket,
        group: Ipv4Addr,
        iface_index: u32,
        port: u16,
        iface: &pnet::datalink::NetworkInterface,
    ) {
        let key = JoinKey {
            group,
            iface_index,
            port,
        };
        let Some(mut entry) = self.counts.get_mut(&key) else {
            return;
        };
        *entry = entry.saturating_sub(1);
        let now_zero = *entry == 0;
        drop(entry);
        if now_zero {
            self.counts.remove(&key);
            if let Err(e) = super::leave_multicast_v4(socket, group, iface) {
                warn!(%group, port, "failed to leave multicast group: {e}");
            } else {
                debug!(%group, port, "left multicast group");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refcount_reaches_zero_only_after_matching_releases() {
        let guard = MulticastJoinGuard::default();
        let key = JoinKey {
            group: Ipv4Addr::new(239, 1, 1, 1),
            iface_index: 1,
            port: 5004,
        };
        *guard.counts.entry(key.clone()).or_insert(0) += 1;
        *guard.counts.entry(key.clone()).or_insert(0) += 1;
        assert_eq!(*guard.counts.get(&key).unwrap(), 2);
    }
}
