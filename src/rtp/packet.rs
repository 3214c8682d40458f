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

//! A thin wrapper around `rtp-rs`'s wire reader, restating the verification
//! invariant (version must be 2) as a typed error instead of a generic
//! `RtpReaderError`.

use super::error::{Error, Result};
use crate::time::WrappingU16;
use rtp_rs::RtpReader;

pub struct RtpPacket<'a> {
    reader: RtpReader<'a>,
}

impl<'a> RtpPacket<'a> {
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let reader = RtpReader::new(data).map_err(|e| Error::MalformedPacket(format!("{e:?}")))?;
        if reader.version() != 2 {
            return Err(Error::UnsupportedVersion(reader.version()));
        }
        Ok(Self { reader })
    }

    pub fn sequence_number(&self) -> WrappingU16 {
        WrappingU16::new(u16::from(self.reader.sequence_number()))
    }

    pub fn timestamp(&self) -> u32 {
        self.reader.timestamp()
    }

    pub fn ssrc(&self) -> u32 {
        self.reader.ssrc()
    }

    pub fn marker(&self) -> bool {
        self.reader.mark()
    }

    pub fn payload_type(&self) -> u8 {
        self.reader.payload_type()
    }

    pub fn payload(&self) -> &'a [u8] {
        self.reader.payload()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_packet(seq: u16, ts: u32, payload: &[u8]) -> Vec<u8> {
        let mut buf = vec![0x80, 97];
        buf.extend_from_slice(&seq.to_be_bytes());
        buf.extend_from_slice(&ts.to_be_bytes());
        buf.extend_from_slice(&1234u32.to_be_bytes());
        buf.extend_from_slice(payload);
        buf
    }

    #[test]
    fn parses_fields_from_a_well_formed_packet() {
        let payload = [1u8, 2, 3, 4];
        let buf = sample_packet(100, 48_000, &payload);
        let packet = RtpPacket::parse(&buf).unwrap();
        assert_eq!(packet.sequence_number().0, 100);
        assert_eq!(packet.timestamp(), 48_000);
        assert_eq!(packet.ssrc(), 1234);
        assert_eq!(packet.payload_type(), 97);
        assert_eq!(packet.payload(), &payload);
    }

    #[test]
    fn rejects_truncated_header() {
        let buf = [0x80, 97, 0, 1];
        assert!(RtpPacket::parse(&buf).is_err());
    }

    #[test]
    fn rejects_version_other_than_two() {
        let mut buf = sample_packet(1, 1, &[0, 0]);
        buf[0] = 0x40; // version 1
        assert!(matches!(RtpPacket::parse(&buf), Err(Error::UnsupportedVersion(1))));
    }
}
