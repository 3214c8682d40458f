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

//! The 34-octet PTP message header plus the message bodies this slave
//! profile speaks: Announce, Sync, Follow_Up, Delay_Req, Delay_Resp.
//! Grounded on `include/ravennakit/ptp/messages/{ptp_message_header.hpp,
//! ptp_announce_message.hpp,ptp_message.hpp}` and the IEEE 1588-2019 wire format.

use super::{
    Error, Result,
    identity::{ClockIdentity, MessageType, PortIdentity, SdoId},
};
use crate::{codec::view::BufferView, time::Timestamp, time::WrappingU16};

pub const HEADER_SIZE: usize = 34;
pub const ANNOUNCE_BODY_SIZE: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
}

/// The 16-bit flag field, IEEE 1588-2019 Table 37. Only the bits this
/// profile inspects or emits are named; reserved bits round-trip as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FlagField {
    pub alternate_master: bool,
    pub two_step: bool,
    pub unicast: bool,
    pub profile_specific_1: bool,
    pub profile_specific_2: bool,
    pub leap61: bool,
    pub leap59: bool,
    pub current_utc_offset_valid: bool,
    pub ptp_timescale: bool,
    pub time_traceable: bool,
    pub frequency_traceable: bool,
    pub synchronization_uncertain: bool,
}

impl FlagField {
    pub fn from_octets(octet1: u8, octet2: u8) -> Self {
        Self {
            alternate_master: octet1 & 0x01 != 0,
            two_step: octet1 & 0x02 != 0,
            unicast: octet1 & 0x04 != 0,
            profile_specific_1: octet1 & 0x20 != 0,
            profile_specific_2: octet1 & 0x40 != 0,
            leap61: octet2 & 0x01 != 0,
            leap59: octet2 & 0x02 != 0,
            current_utc_offset_valid: octet2 & 0x04 != 0,
            ptp_timescale: octet2 & 0x08 != 0,
            time_traceable: octet2 & 0x10 != 0,
            frequency_traceable: octet2 & 0x20 != 0,
            synchronization_uncertain: octet2 & 0x40 != 0,
        }
    }

    pub fn to_octets(self) -> (u8, u8) {
        let mut o1 = 0u8;
        if self.alternate_master {
            o1 |= 0x01;
        }
        if self.two_step {
            o1 |= 0x02;
        }
        if self.unicast {
            o1 |= 0x04;
        }
        if self.profile_specific_1 {
            o1 |= 0x20;
        }
        if self.profile_specific_2 {
            o1 |= 0x40;
        }
        let mut o2 = 0u8;
        if self.leap61 {
            o2 |= 0x01;
        }
        if self.leap59 {
            o2 |= 0x02;
        }
        if self.current_utc_offset_valid {
            o2 |= 0x04;
        }
        if self.ptp_timescale {
            o2 |= 0x08;
        }
        if self.time_traceable {
            o2 |= 0x10;
        }
        if self.frequency_traceable {
            o2 |= 0x20;
        }
        if self.synchronization_uncertain {
            o2 |= 0x40;
        }
        (o1, o2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageHeader {
    pub sdo_id: SdoId,
    pub message_type: MessageType,
    pub version: Version,
    pub message_length: u16,
    pub domain_number: u8,
    pub flags: FlagField,
    pub correction_field: i64,
    pub source_port_identity: PortIdentity,
    pub sequence_id: WrappingU16,
    pub control_field: u8,
    pub log_message_interval: i8,
}

impl MessageHeader {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidHeaderLength);
        }
        let mut view = BufferView::new(data);

        let b0 = view.read_u8().map_err(|_| Error::InvalidHeaderLength)?;
        let major_sdo_id = b0 >> 4;
        let message_type = MessageType::from_nibble(b0);

        let b1 = view.read_u8().map_err(|_| Error::InvalidHeaderLength)?;
        let version = Version {
            minor: b1 >> 4,
            major: b1 & 0x0f,
        };

        let message_length = view.read_u16_be().map_err(|_| Error::InvalidHeaderLength)?;
        let domain_number = view.read_u8().map_err(|_| Error::InvalidHeaderLength)?;
        let minor_sdo_id = view.read_u8().map_err(|_| Error::InvalidHeaderLength)?;
        let flag1 = view.read_u8().map_err(|_| Error::InvalidHeaderLength)?;
        let flag2 = view.read_u8().map_err(|_| Error::InvalidHeaderLength)?;
        let flags = FlagField::from_octets(flag1, flag2);
        let correction_field = view.read_i64_be().map_err(|_| Error::InvalidHeaderLength)?;
        view.skip(4).map_err(|_| Error::InvalidHeaderLength)?; // messageTypeSpecific, reserved
        let clock_id_bytes = view.take(8).map_err(|_| Error::InvalidHeaderLength)?;
        let mut clock_id = [0u8; 8];
        clock_id.copy_from_slice(clock_id_bytes);
        let port_number = view.read_u16_be().map_err(|_| Error::InvalidHeaderLength)?;
        let sequence_id = view.read_u16_be().map_err(|_| Error::InvalidHeaderLength)?;
        let control_field = view.read_u8().map_err(|_| Error::InvalidHeaderLength)?;
        let log_message_interval = view.read_i8().map_err(|_| Error::InvalidHeaderLength)?;

        if (message_length as usize) < HEADER_SIZE {
            return Err(Error::InvalidMessageLength);
        }

        Ok(Self {
            sdo_id: SdoId::new(major_sdo_id, minor_sdo_id),
            message_type,
            version,
            message_length,
            domain_number,
            flags,
            correction_field,
            source_port_identity: PortIdentity::new(ClockIdentity::from_be_bytes(clock_id), port_number),
            sequence_id: WrappingU16::new(sequence_id),
            control_field,
            log_message_interval,
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push((self.sdo_id.major << 4) | self.message_type.to_nibble());
        out.push((self.version.minor << 4) | (self.version.major & 0x0f));
        out.extend_from_slice(&self.message_length.to_be_bytes());
        out.push(self.domain_number);
        out.push(self.sdo_id.minor);
        let (f1, f2) = self.flags.to_octets();
        out.push(f1);
        out.push(f2);
        out.extend_from_slice(&self.correction_field.to_be_bytes());
        out.extend_from_slice(&[0u8; 4]);
        out.extend_from_slice(&self.source_port_identity.clock_identity.to_be_bytes());
        out.extend_from_slice(&self.source_port_identity.port_number.to_be_bytes());
        out.extend_from_slice(&self.sequence_id.0.to_be_bytes());
        out.push(self.control_field);
        out.push(self.log_message_interval as u8);
    }

    /// IEEE 1588-2019 §9.5.5: a header matches another iff source port
    /// identity and sequence id are equal.
    pub fn matches(&self, other: &MessageHeader) -> bool {
        self.source_port_identity == other.source_port_identity && self.sequence_id == other.sequence_id
    }
}

/// Announce message body (30 bytes after the header).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnounceBody {
    pub origin_timestamp: Timestamp,
    pub current_utc_offset: i16,
    pub grandmaster_priority1: u8,
    pub grandmaster_clock_class: u8,
    pub grandmaster_clock_accuracy: u8,
    pub grandmaster_offset_scaled_log_variance: u16,
    pub grandmaster_priority2: u8,
    pub grandmaster_identity: ClockIdentity,
    pub steps_removed: u16,
    pub time_source: u8,
}

impl AnnounceBody {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < ANNOUNCE_BODY_SIZE {
            return Err(Error::InvalidMessageLength);
        }
        let mut view = BufferView::new(data);
        let origin_timestamp = Timestamp::read(&mut view).map_err(|_| Error::InvalidMessageLength)?;
        let current_utc_offset = view.read_i16_be().map_err(|_| Error::InvalidMessageLength)?;
        view.skip(1).map_err(|_| Error::InvalidMessageLength)?;
        let grandmaster_priority1 = view.read_u8().map_err(|_| Error::InvalidMessageLength)?;
        let grandmaster_clock_class = view.read_u8().map_err(|_| Error::InvalidMessageLength)?;
        let grandmaster_clock_accuracy = view.read_u8().map_err(|_| Error::InvalidMessageLength)?;
        let grandmaster_offset_scaled_log_variance =
            view.read_u16_be().map_err(|_| Error::InvalidMessageLength)?;
        let grandmaster_priority2 = view.read_u8().map_err(|_| Error::InvalidMessageLength)?;
        let identity_bytes = view.take(8).map_err(|_| Error::InvalidMessageLength)?;
        let mut identity = [0u8; 8];
        identity.copy_from_slice(identity_bytes);
        let steps_removed = view.read_u16_be().map_err(|_| Error::InvalidMessageLength)?;
        let time_source = view.read_u8().map_err(|_| Error::InvalidMessageLength)?;

        Ok(Self {
            origin_timestamp,
            current_utc_offset,
            grandmaster_priority1,
            grandmaster_clock_class,
            grandmaster_clock_accuracy,
            grandmaster_offset_scaled_log_variance,
            grandmaster_priority2,
            grandmaster_identity: ClockIdentity::from_be_bytes(identity),
            steps_removed,
            time_source,
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        self.origin_timestamp.write(out);
        out.extend_from_slice(&self.current_utc_offset.to_be_bytes());
        out.push(0);
        out.push(self.grandmaster_priority1);
        out.push(self.grandmaster_clock_class);
        out.push(self.grandmaster_clock_accuracy);
        out.extend_from_slice(&self.grandmaster_offset_scaled_log_variance.to_be_bytes());
        out.push(self.grandmaster_priority2);
        out.extend_from_slice(&self.grandmaster_identity.to_be_bytes());
        out.extend_from_slice(&self.steps_removed.to_be_bytes());
        out.push(self.time_source);
    }
}

/// A timestamp-only body shared by Sync, Follow_Up and Delay_Resp (the
/// latter also carries a `requestingPortIdentity`, modeled separately).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimestampBody {
    pub timestamp: Timestamp,
}

impl TimestampBody {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 10 {
            return Err(Error::InvalidMessageLength);
        }
        let mut view = BufferView::new(data);
        let timestamp = Timestamp::read(&mut view).map_err(|_| Error::InvalidMessageLength)?;
        Ok(Self { timestamp })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        self.timestamp.write(out);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayRespBody {
    pub receive_timestamp: Timestamp,
    pub requesting_port_identity: PortIdentity,
}

impl DelayRespBody {
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        if data.len() < 20 {
            return Err(Error::InvalidMessageLength);
        }
        let mut view = BufferView::new(data);
        let receive_timestamp = Timestamp::read(&mut view).map_err(|_| Error::InvalidMessageLength)?;
        let clock_id_bytes = view.take(8).map_err(|_| Error::InvalidMessageLength)?;
        let mut clock_id = [0u8; 8];
        clock_id.copy_from_slice(clock_id_bytes);
        let port_number = view.read_u16_be().map_err(|_| Error::InvalidMessageLength)?;
        Ok(Self {
            receive_timestamp,
            requesting_port_identity: PortIdentity::new(ClockIdentity::from_be_bytes(clock_id), port_number),
        })
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        self.receive_timestamp.write(out);
        out.extend_from_slice(&self.requesting_port_identity.clock_identity.to_be_bytes());
        out.extend_from_slice(&self.requesting_port_identity.port_number.to_be_bytes());
    }
}

/// A fully parsed PTP message: header plus the body variant this profile
/// understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    Sync(MessageHeader, TimestampBody),
    FollowUp(MessageHeader, TimestampBody),
    DelayReq(MessageHeader, TimestampBody),
    DelayResp(MessageHeader, DelayRespBody),
    Announce(MessageHeader, AnnounceBody),
}

impl Message {
    pub fn header(&self) -> &MessageHeader {
        match self {
            Message::Sync(h, _)
            | Message::FollowUp(h, _)
            | Message::DelayReq(h, _)
            | Message::DelayResp(h, _)
            | Message::Announce(h, _) => h,
        }
    }

    pub fn parse(data: &[u8]) -> Result<Self> {
        let header = MessageHeader::from_bytes(data)?;
        let body = &data[HEADER_SIZE..];
        match header.message_type {
            MessageType::Sync => Ok(Message::Sync(header, TimestampBody::from_bytes(body)?)),
            MessageType::FollowUp => Ok(Message::FollowUp(header, TimestampBody::from_bytes(body)?)),
            MessageType::DelayReq => Ok(Message::DelayReq(header, TimestampBody::from_bytes(body)?)),
            MessageType::DelayResp => Ok(Message::DelayResp(header, DelayRespBody::from_bytes(body)?)),
            MessageType::Announce => Ok(Message::Announce(header, AnnounceBody::from_bytes(body)?)),
            _ => Err(Error::InvalidData),
        }
    }

    pub fn write_to(&self, out: &mut Vec<u8>) {
        match self {
            Message::Sync(h, b) | Message::FollowUp(h, b) | Message::DelayReq(h, b) => {
                h.write_to(out);
                b.write_to(out);
            }
            Message::DelayResp(h, b) => {
                h.write_to(out);
                b.write_to(out);
            }
            Message::Announce(h, b) => {
                h.write_to(out);
                b.write_to(out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header(message_type: MessageType, sequence_id: u16) -> MessageHeader {
        MessageHeader {
            sdo_id: SdoId::DEFAULT,
            message_type,
            version: Version { major: 2, minor: 1 },
            message_length: (HEADER_SIZE + ANNOUNCE_BODY_SIZE) as u16,
            domain_number: 0,
            flags: FlagField::default(),
            correction_field: 0,
            source_port_identity: PortIdentity::new(ClockIdentity::from_eui48([0, 0x1d, 0xc1, 0x51, 0x9e, 0xf7]), 1),
            sequence_id: WrappingU16::new(sequence_id),
            control_field: 0,
            log_message_interval: 0,
        }
    }

    #[test]
    fn header_round_trips_through_wire_bytes() {
        let header = sample_header(MessageType::Announce, 42);
        let mut buf = Vec::new();
        header.write_to(&mut buf);
        assert_eq!(buf.len(), HEADER_SIZE);
        let decoded = MessageHeader::from_bytes(&buf).unwrap();
        assert_eq!(decoded, header);
    }

    #[test]
    fn matches_requires_equal_port_identity_and_sequence() {
        let a = sample_header(MessageType::Sync, 5);
        let b = sample_header(MessageType::FollowUp, 5);
        assert!(a.matches(&b));
        let c = sample_header(MessageType::FollowUp, 6);
        assert!(!a.matches(&c));
    }

    #[test]
    fn announce_message_round_trips() {
        let header = sample_header(MessageType::Announce, 1);
        let body = AnnounceBody {
            origin_timestamp: Timestamp::new(0, 0),
            current_utc_offset: 37,
            grandmaster_priority1: 128,
            grandmaster_clock_class: 6,
            grandmaster_clock_accuracy: 0x20,
            grandmaster_offset_scaled_log_variance: 0xffff,
            grandmaster_priority2: 128,
            grandmaster_identity: ClockIdentity::from_eui48([0, 0x1d, 0xc1, 0x51, 0x9e, 0xf7]),
            steps_removed: 0,
            time_source: 0xa0,
        };
        let msg = Message::Announce(header, body);
        let mut buf = Vec::new();
        msg.write_to(&mut buf);
        let decoded = Message::parse(&buf).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn truncated_header_is_rejected() {
        let buf = [0u8; 10];
        assert_eq!(MessageHeader::from_bytes(&buf).unwrap_err(), Error::InvalidHeaderLength);
    }
}
