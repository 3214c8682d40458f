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

//! Keeps session SDP up to date as RAVENNA transmitters come and go on the
//! network. One session entry per resolved DNS-SD instance; DESCRIBE is
//! issued once per resolution and the result cached until the instance is
//! removed. There is no persistent RTSP connection per host the way a
//! long-lived control channel would have one — each DESCRIBE is a fresh,
//! short-lived TCP round trip, which is all a one-shot SDP pull needs.

use crate::{
    monitoring::{DiscoveryStats, Monitoring, Report},
    net::{DnsSdEvent, ServiceInstance},
    rtsp,
    sdp::SessionDescription,
};
use std::{collections::HashMap, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub instance: ServiceInstance,
    pub sdp: SessionDescription,
}

/// Shared, reactor-thread-owned table of currently known sessions, keyed by
/// DNS-SD instance name.
#[derive(Default)]
pub struct SessionTable {
    sessions: RwLock<HashMap<String, SessionEntry>>,
}

impl SessionTable {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn get(&self, name: &str) -> Option<SessionEntry> {
        self.sessions.read().await.get(name).cloned()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Percent-encodes the handful of characters that would otherwise break a
/// single RTSP URI path segment; RAVENNA session names are short
/// human-readable labels, not arbitrary binary data.
pub fn encode_session_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

const DESCRIBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Drains `events` forever, issuing DESCRIBE for each resolved RAVENNA
/// session and updating `table` accordingly. Returns once the channel
/// closes.
pub async fn run(table: Arc<SessionTable>, monitoring: Monitoring, mut events: mpsc::UnboundedReceiver<DnsSdEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            DnsSdEvent::Resolved(instance) => handle_resolved(&table, &monitoring, instance).await,
            DnsSdEvent::Removed { name, .. } => handle_removed(&table, &monitoring, &name).await,
        }
    }
}

async fn handle_resolved(table: &Arc<SessionTable>, monitoring: &Monitoring, instance: ServiceInstance) {
    let Some(addr) = instance.addresses.first().copied() else {
        warn!(name = %instance.name, "resolved RAVENNA session with no address, ignoring");
        return;
    };
    let path = format!("by-name/{}", encode_session_name(&instance.name));
    let socket_addr = SocketAddr::new(addr, instance.port);

    let table = table.clone();
    let monitoring = monitoring.clone();
    tokio::spawn(async move {
        match rtsp::describe_with_timeout(socket_addr, &path, DESCRIBE_TIMEOUT).await {
            Ok(sdp) => {
                info!(name = %instance.name, session = %sdp.session_name, "resolved session description");
                let mut sessions = table.sessions.write().await;
                sessions.insert(
                    instance.name.clone(),
                    SessionEntry {
                        instance,
                        sdp,
                    },
                );
                drop(sessions);
                let mut stats = DiscoveryStats::default();
                stats.record_resolved();
                monitoring.report(Report::Discovery(stats));
            }
            Err(err) => {
                warn!(name = %instance.name, error = %err, "DESCRIBE failed for resolved session");
            }
        }
    });
}

async fn handle_removed(table: &Arc<SessionTable>, monitoring: &Monitoring, name: &str) {
    let mut sessions = table.sessions.write().await;
    if sessions.remove(name).is_some() {
        drop(sessions);
        info!(name, "RAVENNA session removed");
        let mut stats = DiscoveryStats::default();
        stats.record_removed();
        monitoring.report(Report::Discovery(stats));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_name_encoding_leaves_simple_names_untouched() {
        assert_eq!(encode_session_name("studio-a"), "studio-a");
    }

    #[test]
    fn session_name_encoding_escapes_spaces_and_slashes() {
        assert_eq!(encode_session_name("studio a/b"), "studio%20a%2Fb");
    }

    #[tokio::test]
    async fn removed_session_not_present_is_a_no_op() {
        let table = SessionTable::new();
        let monitoring = Monitoring::new(4);
        handle_removed(&table, &monitoring, "nonexistent").await;
        assert_eq!(table.len().await, 0);
    }
}
