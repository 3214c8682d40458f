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

use crate::formats::FramesPerSecond;
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, time::Duration};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PtpMode {
    /// An external PTP daemon already disciplines the system TAI clock (or
    /// this machine acts as grandmaster itself); read it with `clock_gettime`.
    #[default]
    System,
    /// An external PTP daemon disciplines a NIC's hardware clock without
    /// touching the system clock; read the PHC character device directly.
    Phc { nic: String },
    /// No external PTP daemon is running; this crate's own ordinary-clock
    /// slave joins the domain and disciplines a virtual clock in-process.
    Internal { nic: String, domain: Option<u8> },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioConfig {
    pub nic: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: FramesPerSecond,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiverConfig {
    pub nic: String,
    /// Extra playout delay added on top of the stream's own link offset, in milliseconds.
    #[serde(default, with = "serde_millis")]
    pub link_offset: Option<Duration>,
    /// Maximum number of ST 2022-7-style redundant legs this receiver will merge.
    #[serde(default = "default_redundancy")]
    pub redundancy: usize,
}

fn default_redundancy() -> usize {
    1
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SenderConfig {
    pub nic: String,
    pub multicast_address: IpAddr,
    pub port: u16,
    #[serde(default = "default_ptime_ms")]
    pub ptime_ms: f64,
}

fn default_ptime_ms() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveryConfig {
    /// DNS-SD service instance name advertised for senders on this node.
    pub instance_name: String,
    #[serde(default = "default_rtsp_port")]
    pub rtsp_port: u16,
}

fn default_rtsp_port() -> u16 {
    554
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub ptp: Option<PtpMode>,
    pub audio: AudioConfig,
    #[serde(default)]
    pub receivers: Vec<ReceiverConfig>,
    #[serde(default)]
    pub senders: Vec<SenderConfig>,
    #[serde(default)]
    pub discovery: Option<DiscoveryConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            ptp: None,
            audio: AudioConfig::default(),
            receivers: Vec::new(),
            senders: Vec::new(),
            discovery: None,
        }
    }
}

fn default_sample_rate() -> FramesPerSecond {
    48_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ptp_mode_defaults_to_system() {
        assert!(matches!(PtpMode::default(), PtpMode::System));
    }

    #[test]
    fn config_round_trips_through_yaml() {
        let config = Config {
            ptp: Some(PtpMode::Internal {
                nic: "eth0".to_string(),
                domain: Some(0),
            }),
            audio: AudioConfig {
                nic: "eth0".to_string(),
                sample_rate: 48_000,
            },
            receivers: vec![ReceiverConfig {
                nic: "eth0".to_string(),
                link_offset: Some(Duration::from_millis(4)),
                redundancy: 2,
            }],
            senders: Vec::new(),
            discovery: Some(DiscoveryConfig {
                instance_name: "studio-a".to_string(),
                rtsp_port: 554,
            }),
        };
        let yaml = serde_yaml::to_string(&config).expect("serialize");
        let parsed: Config = serde_yaml::from_str(&yaml).expect("deserialize");
        assert_eq!(parsed.receivers.len(), 1);
        assert_eq!(parsed.receivers[0].redundancy, 2);
    }
}
