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

//! PTP identity types: `SdoId`, `ClockIdentity`, `PortIdentity`, and the
//! message-type discriminant. Grounded on
//! `include/ravennakit/ptp/types/{ptp_sdo_id.hpp,ptp_port_identity.hpp}`.

use std::fmt;

/// Split major/minor domain-owner id (IEEE 1588-2019 §7.1). Encoded as the
/// high/low nibble of the header's first octet and the `minorSdoId` octet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SdoId {
    pub major: u8,
    pub minor: u8,
}

impl SdoId {
    pub const DEFAULT: SdoId = SdoId { major: 0, minor: 0 };

    pub fn new(major: u8, minor: u8) -> Self {
        assert!(major <= 0x0f, "majorSdoId is a 4-bit field");
        Self { major, minor }
    }
}

impl fmt::Display for SdoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// An 8-octet opaque clock identity, usually derived from a MAC address via
/// EUI-64 insertion.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ClockIdentity(pub [u8; 8]);

impl ClockIdentity {
    pub const ALL_ONES: ClockIdentity = ClockIdentity([0xff; 8]);

    /// `aa:bb:cc:dd:ee:ff` -> `aa bb cc FF FE dd ee ff`.
    pub fn from_eui48(mac: [u8; 6]) -> Self {
        Self([mac[0], mac[1], mac[2], 0xff, 0xfe, mac[3], mac[4], mac[5]])
    }

    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(bytes)
    }

    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0
    }
}

impl fmt::Debug for ClockIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClockIdentity({self})")
    }
}

impl fmt::Display for ClockIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|b| format!("{b:02X}")).collect();
        write!(f, "{}", parts.join("-"))
    }
}

/// Port number range, IEEE 1588-2019 §5.3.5.
pub const PORT_NUMBER_MIN: u16 = 0x0001;
pub const PORT_NUMBER_MAX: u16 = 0xfffe;
pub const PORT_NUMBER_ALL: u16 = 0xffff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PortIdentity {
    pub clock_identity: ClockIdentity,
    pub port_number: u16,
}

impl PortIdentity {
    pub fn new(clock_identity: ClockIdentity, port_number: u16) -> Self {
        Self {
            clock_identity,
            port_number,
        }
    }
}

/// Message-type nibble, IEEE 1588-2019 Table 35.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    Sync,
    DelayReq,
    PdelayReq,
    PdelayResp,
    FollowUp,
    DelayResp,
    PdelayRespFollowUp,
    Announce,
    Signaling,
    Management,
    Unknown(u8),
}

impl MessageType {
    pub fn from_nibble(n: u8) -> Self {
        match n & 0x0f {
            0x0 => MessageType::Sync,
            0x1 => MessageType::DelayReq,
            0x2 => MessageType::PdelayReq,
            0x3 => MessageType::PdelayResp,
            0x8 => MessageType::FollowUp,
            0x9 => MessageType::DelayResp,
            0xa => MessageType::PdelayRespFollowUp,
            0xb => MessageType::Announce,
            0xc => MessageType::Signaling,
            0xd => MessageType::Management,
            other => MessageType::Unknown(other),
        }
    }

    pub fn to_nibble(self) -> u8 {
        match self {
            MessageType::Sync => 0x0,
            MessageType::DelayReq => 0x1,
            MessageType::PdelayReq => 0x2,
            MessageType::PdelayResp => 0x3,
            MessageType::FollowUp => 0x8,
            MessageType::DelayResp => 0x9,
            MessageType::PdelayRespFollowUp => 0xa,
            MessageType::Announce => 0xb,
            MessageType::Signaling => 0xc,
            MessageType::Management => 0xd,
            MessageType::Unknown(other) => other & 0x0f,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eui48_insertion_matches_spec_example() {
        let id = ClockIdentity::from_eui48([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]);
        assert_eq!(id.to_string(), "AA-BB-CC-FF-FE-DD-EE-FF");
    }

    #[test]
    fn message_type_round_trips_through_nibble() {
        for mt in [
            MessageType::Sync,
            MessageType::DelayReq,
            MessageType::FollowUp,
            MessageType::DelayResp,
            MessageType::Announce,
        ] {
            assert_eq!(MessageType::from_nibble(mt.to_nibble()), mt);
        }
    }
}
