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

//! Monitoring fan-out: one `broadcast` channel operators (a CLI, a web UI,
//! a metrics exporter) subscribe to for PTP servo health, RTP stream
//! stats, and discovery session churn. A single flat channel rather than
//! a parent/child report tree, since there is no multi-process supervision
//! tree to mirror here.

mod health;
mod stats;

pub use health::{PortHealth, PtpHealth, StreamHealth};
pub use stats::{DiscoveryStats, MonitoringStats};

use crate::rtp::PacketStats;
use tokio::sync::broadcast;

#[derive(Debug, Clone)]
pub enum Report {
    Ptp(PtpHealth),
    Stream { reader_id: String, health: StreamHealth },
    RtpStats { reader_id: String, stats: PacketStats },
    Discovery(DiscoveryStats),
}

/// A cheap-to-clone handle producers report through; subscribers get a
/// fresh `broadcast::Receiver` and miss nothing published after they
/// subscribe.
#[derive(Debug, Clone)]
pub struct Monitoring {
    tx: broadcast::Sender<Report>,
}

impl Monitoring {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Report> {
        self.tx.subscribe()
    }

    /// Publishes a report; dropped silently if nobody is subscribed.
    pub fn report(&self, report: Report) {
        let _ = self.tx.send(report);
    }
}

impl Default for Monitoring {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptp::PortState;

    #[test]
    fn subscribers_receive_reports_published_after_they_subscribe() {
        let monitoring = Monitoring::new(16);
        let mut rx = monitoring.subscribe();
        monitoring.report(Report::Ptp(PtpHealth {
            port_state: PortState::Slave,
            offset_nanos: 12.0,
            frequency_ratio: 1.0,
        }));
        let report = rx.try_recv().unwrap();
        assert!(matches!(report, Report::Ptp(h) if h.port_state == PortState::Slave));
    }
}
