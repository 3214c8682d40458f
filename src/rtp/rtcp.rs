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

//! A read-only view over one RTCP packet, just enough to tell sender
//! reports apart from receiver reports and recover their NTP timestamp; no
//! transmit side, no report-block decoding.

use super::error::{Error, Result};

const HEADER_LEN: usize = 8;
const NTP_TIMESTAMP_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcpPacketType {
    SenderReport,
    ReceiverReport,
    SourceDescriptionItems,
    Bye,
    App,
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NtpTimestamp {
    pub seconds: u32,
    pub fraction: u32,
}

pub struct RtcpPacketView<'a> {
    data: &'a [u8],
}

impl<'a> RtcpPacketView<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        if data.len() < HEADER_LEN {
            return Err(Error::MalformedPacket("RTCP header shorter than 8 octets".into()));
        }
        let view = Self { data };
        if view.version() > 2 {
            return Err(Error::UnsupportedVersion(view.version()));
        }
        Ok(view)
    }

    pub fn version(&self) -> u8 {
        (self.data[0] & 0b1100_0000) >> 6
    }

    pub fn padding(&self) -> bool {
        (self.data[0] & 0b0010_0000) != 0
    }

    pub fn reception_report_count(&self) -> u8 {
        self.data[0] & 0b0001_1111
    }

    pub fn packet_type(&self) -> RtcpPacketType {
        match self.data[1] {
            200 => RtcpPacketType::SenderReport,
            201 => RtcpPacketType::ReceiverReport,
            202 => RtcpPacketType::SourceDescriptionItems,
            203 => RtcpPacketType::Bye,
            204 => RtcpPacketType::App,
            _ => RtcpPacketType::Unknown,
        }
    }

    /// Packet length in 32-bit words, including the header word.
    pub fn length(&self) -> u16 {
        u16::from_be_bytes([self.data[2], self.data[3]]) + 1
    }

    pub fn ssrc(&self) -> u32 {
        u32::from_be_bytes([self.data[4], self.data[5], self.data[6], self.data[7]])
    }

    /// NTP timestamp carried by a sender report; zero for every other
    /// packet type.
    pub fn ntp_timestamp(&self) -> NtpTimestamp {
        if self.packet_type() != RtcpPacketType::SenderReport || self.data.len() < HEADER_LEN + NTP_TIMESTAMP_LEN {
            return NtpTimestamp::default();
        }
        NtpTimestamp {
            seconds: u32::from_be_bytes([self.data[8], self.data[9], self.data[10], self.data[11]]),
            fraction: u32::from_be_bytes([self.data[12], self.data[13], self.data[14], self.data[15]]),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sender_report(ssrc: u32, ntp_seconds: u32, ntp_fraction: u32) -> Vec<u8> {
        let mut buf = vec![0x80, 200, 0, 6];
        buf.extend_from_slice(&ssrc.to_be_bytes());
        buf.extend_from_slice(&ntp_seconds.to_be_bytes());
        buf.extend_from_slice(&ntp_fraction.to_be_bytes());
        buf.extend_from_slice(&[0u8; 12]);
        buf
    }

    #[test]
    fn parses_sender_report_fields() {
        let buf = sender_report(42, 100, 200);
        let rtcp = RtcpPacketView::parse(&buf).unwrap();
        assert_eq!(rtcp.packet_type(), RtcpPacketType::SenderReport);
        assert_eq!(rtcp.ssrc(), 42);
        assert_eq!(rtcp.length(), 7);
        assert_eq!(rtcp.ntp_timestamp(), NtpTimestamp { seconds: 100, fraction: 200 });
    }

    #[test]
    fn non_sender_report_has_zero_ntp_timestamp() {
        let mut buf = vec![0x81, 201, 0, 1];
        buf.extend_from_slice(&99u32.to_be_bytes());
        let rtcp = RtcpPacketView::parse(&buf).unwrap();
        assert_eq!(rtcp.packet_type(), RtcpPacketType::ReceiverReport);
        assert_eq!(rtcp.reception_report_count(), 1);
        assert_eq!(rtcp.ntp_timestamp(), NtpTimestamp::default());
    }

    #[test]
    fn unknown_packet_type_for_unrecognized_byte() {
        let mut buf = vec![0x80, 199, 0, 0];
        buf.extend_from_slice(&0u32.to_be_bytes());
        let rtcp = RtcpPacketView::parse(&buf).unwrap();
        assert_eq!(rtcp.packet_type(), RtcpPacketType::Unknown);
    }

    #[test]
    fn rejects_truncated_header() {
        let buf = [0x80, 200, 0, 0];
        assert!(RtcpPacketView::parse(&buf).is_err());
    }
}
