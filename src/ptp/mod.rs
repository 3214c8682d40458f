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

//! An IEEE 1588-2019 ordinary-clock slave: message codec, foreign-master
//! list, BMCA, port state machine, delay-request loop and virtual clock
//! servo. Grounded on `include/ravennakit/ptp/*` throughout.

pub mod foreign_master;
pub mod identity;
pub mod message;
pub mod servo;
mod slave;

pub use identity::{ClockIdentity, MessageType, PortIdentity, SdoId};
pub use message::{FlagField, MessageHeader, Version};
pub use servo::VirtualClock;
pub use slave::PtpSlaveClock;

use thiserror::Error;

/// Mirrors `ptp_error.hpp`'s `rav::ptp::Error` enum one variant at a time.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("invalid data")]
    InvalidData,
    #[error("invalid header length")]
    InvalidHeaderLength,
    #[error("invalid message length")]
    InvalidMessageLength,
    #[error("only ordinary clock supported")]
    OnlyOrdinaryClockSupported,
    #[error("only slave supported")]
    OnlySlaveSupported,
    #[error("failed to get network interfaces")]
    FailedToGetNetworkInterfaces,
    #[error("network interface not found")]
    NetworkInterfaceNotFound,
    #[error("no MAC address available")]
    NoMacAddressAvailable,
    #[error("invalid clock identity")]
    InvalidClockIdentity,
    #[error("port invalid")]
    PortInvalid,
    #[error("port already exists")]
    PortAlreadyExists,
    #[error("too many ports")]
    TooManyPorts,
}

pub type Result<T> = std::result::Result<T, Error>;

/// `224.0.1.129`, the PTP multicast group.
pub const PTP_MULTICAST_GROUP: std::net::Ipv4Addr = std::net::Ipv4Addr::new(224, 0, 1, 129);
pub const PTP_EVENT_PORT: u16 = 319;
pub const PTP_GENERAL_PORT: u16 = 320;

/// Foreign-master qualification window, in announce intervals.
pub const FOREIGN_MASTER_TIME_WINDOW: u8 = 4;
/// Minimum announce count within the window to qualify a foreign master.
pub const FOREIGN_MASTER_THRESHOLD: u8 = 2;

/// Port state per IEEE 1588-2019 §8.2.15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortState {
    Initializing,
    Faulty,
    Disabled,
    Listening,
    PreMaster,
    Master,
    Passive,
    Uncalibrated,
    Slave,
}
