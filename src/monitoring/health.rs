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

//! Health snapshots reported by the PTP servo and the RTP audio consumer.
//! `PortHealth` collapses the full IEEE 1588 port state machine down to the
//! three-valued summary operators actually want to alert on.

use crate::{ptp::PortState, rtp::StreamState};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PtpHealth {
    pub port_state: PortState,
    pub offset_nanos: f64,
    pub frequency_ratio: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamHealth {
    pub state: StreamState,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortHealth {
    Healthy,
    Degraded,
    Faulty,
}

impl PortHealth {
    pub fn from_port_state(state: PortState) -> Self {
        match state {
            PortState::Faulty => PortHealth::Faulty,
            PortState::Slave | PortState::Master | PortState::Passive => PortHealth::Healthy,
            PortState::Initializing | PortState::Disabled | PortState::Listening | PortState::PreMaster | PortState::Uncalibrated => {
                PortHealth::Degraded
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slave_state_is_healthy() {
        assert_eq!(PortHealth::from_port_state(PortState::Slave), PortHealth::Healthy);
    }

    #[test]
    fn faulty_state_is_faulty() {
        assert_eq!(PortHealth::from_port_state(PortState::Faulty), PortHealth::Faulty);
    }

    #[test]
    fn uncalibrated_state_is_degraded() {
        assert_eq!(PortHealth::from_port_state(PortState::Uncalibrated), PortHealth::Degraded);
    }
}
