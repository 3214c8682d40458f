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

//! The parsed shape of an RFC 8866 session description plus the AES67/
//! RAVENNA attribute extensions this core understands.

#[derive(Debug, Clone, PartialEq)]
pub struct Origin {
    pub username: String,
    pub sess_id: String,
    pub sess_version: String,
    pub nettype: String,
    pub addrtype: String,
    pub unicast_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionData {
    pub nettype: String,
    pub addrtype: String,
    pub address: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub start: u64,
    pub stop: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtpMap {
    pub payload_type: u8,
    pub encoding_name: String,
    pub clock_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PtpVersion {
    Ieee1588_2008,
    Ieee1588_2019,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefClock {
    pub version: PtpVersion,
    pub grandmaster_identity: String,
    pub domain: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MediaClock {
    pub offset: i64,
    pub rate: Option<(u32, u32)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilterMode {
    Incl,
    Excl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFilter {
    pub mode: SourceFilterMode,
    pub nettype: String,
    pub address_type: String,
    pub destination_address: String,
    pub source_addresses: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockDeviation {
    pub numerator: i64,
    pub denominator: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaAttributes {
    pub rtpmaps: Vec<RtpMap>,
    pub ptime_ms: Option<f64>,
    pub maxptime_ms: Option<f64>,
    pub direction: Option<Direction>,
    pub ts_refclk: Option<RefClock>,
    pub mediaclk: Option<MediaClock>,
    pub clock_domain: Option<u8>,
    pub clock_deviation: Option<ClockDeviation>,
    pub source_filter: Option<SourceFilter>,
    pub mid: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaName {
    pub media: String,
    pub port: u16,
    pub protos: Vec<String>,
    pub formats: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaDescription {
    pub media_name: MediaName,
    pub connection: Option<ConnectionData>,
    pub attributes: MediaAttributes,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionAttributes {
    pub group_dup: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionDescription {
    pub version: u8,
    pub origin: Origin,
    pub session_name: String,
    pub connection: Option<ConnectionData>,
    pub timing: Timing,
    pub attributes: SessionAttributes,
    pub media_descriptions: Vec<MediaDescription>,
}
