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

//! Reconstructs a canonical `\r\n`-joined text in RFC 8866 field order.

use super::types::*;
use std::fmt::Write;

pub fn emit(sdp: &SessionDescription) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "v={}\r", sdp.version);
    let _ = writeln!(
        out,
        "o={} {} {} {} {} {}\r",
        sdp.origin.username,
        sdp.origin.sess_id,
        sdp.origin.sess_version,
        sdp.origin.nettype,
        sdp.origin.addrtype,
        sdp.origin.unicast_address
    );
    let _ = writeln!(out, "s={}\r", sdp.session_name);
    if let Some(c) = &sdp.connection {
        emit_connection(&mut out, c);
    }
    let _ = writeln!(out, "t={} {}\r", sdp.timing.start, sdp.timing.stop);
    if let Some(tags) = &sdp.attributes.group_dup {
        let _ = writeln!(out, "a=group:DUP {}\r", tags.join(" "));
    }
    for media in &sdp.media_descriptions {
        emit_media(&mut out, media);
    }
    out
}

fn emit_connection(out: &mut String, c: &ConnectionData) {
    let _ = writeln!(out, "c={} {} {}\r", c.nettype, c.addrtype, c.address);
}

fn emit_media(out: &mut String, media: &MediaDescription) {
    let protos = media.media_name.protos.join("/");
    let formats = media
        .media_name
        .formats
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(" ");
    let _ = writeln!(out, "m={} {} {} {}\r", media.media_name.media, media.media_name.port, protos, formats);
    if let Some(c) = &media.connection {
        emit_connection(out, c);
    }
    let a = &media.attributes;
    for rtpmap in &a.rtpmaps {
        if rtpmap.channels == 1 {
            let _ = writeln!(out, "a=rtpmap:{} {}/{}\r", rtpmap.payload_type, rtpmap.encoding_name, rtpmap.clock_rate);
        } else {
            let _ = writeln!(
                out,
                "a=rtpmap:{} {}/{}/{}\r",
                rtpmap.payload_type, rtpmap.encoding_name, rtpmap.clock_rate, rtpmap.channels
            );
        }
    }
    if let Some(ptime) = a.ptime_ms {
        let _ = writeln!(out, "a=ptime:{}\r", format_ms(ptime));
    }
    if let Some(maxptime) = a.maxptime_ms {
        let _ = writeln!(out, "a=maxptime:{}\r", format_ms(maxptime));
    }
    if let Some(refclk) = &a.ts_refclk {
        let version = match refclk.version {
            PtpVersion::Ieee1588_2008 => "IEEE1588-2008",
            PtpVersion::Ieee1588_2019 => "IEEE1588-2019",
        };
        let _ = writeln!(out, "a=ts-refclk:ptp={}:{}:{}\r", version, refclk.grandmaster_identity, refclk.domain);
    }
    if let Some(mediaclk) = &a.mediaclk {
        match mediaclk.rate {
            Some((num, den)) => {
                let _ = writeln!(out, "a=mediaclk:direct={} rate={}/{}\r", mediaclk.offset, num, den);
            }
            None => {
                let _ = writeln!(out, "a=mediaclk:direct={}\r", mediaclk.offset);
            }
        }
    }
    if let Some(domain) = a.clock_domain {
        let _ = writeln!(out, "a=clock-domain:PTPv2 {domain}\r");
    }
    if let Some(dev) = a.clock_deviation {
        let _ = writeln!(out, "a=clock-deviation:{}/{}\r", dev.numerator, dev.denominator);
    }
    if let Some(filter) = &a.source_filter {
        let mode = match filter.mode {
            SourceFilterMode::Incl => "incl",
            SourceFilterMode::Excl => "excl",
        };
        let _ = writeln!(
            out,
            "a=source-filter: {} {} {} {} {}\r",
            mode,
            filter.nettype,
            filter.address_type,
            filter.destination_address,
            filter.source_addresses.join(" ")
        );
    }
    if let Some(mid) = &a.mid {
        let _ = writeln!(out, "a=mid:{mid}\r");
    }
    match a.direction {
        Some(Direction::SendRecv) => {
            let _ = writeln!(out, "a=sendrecv\r");
        }
        Some(Direction::SendOnly) => {
            let _ = writeln!(out, "a=sendonly\r");
        }
        Some(Direction::RecvOnly) => {
            let _ = writeln!(out, "a=recvonly\r");
        }
        Some(Direction::Inactive) => {
            let _ = writeln!(out, "a=inactive\r");
        }
        None => {}
    }
}

fn format_ms(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::super::parse;
    use super::*;

    #[test]
    fn round_trips_minimal_session() {
        let sdp = SessionDescription {
            version: 0,
            origin: Origin {
                username: "-".to_string(),
                sess_id: "1".to_string(),
                sess_version: "1".to_string(),
                nettype: "IN".to_string(),
                addrtype: "IP4".to_string(),
                unicast_address: "192.168.1.10".to_string(),
            },
            session_name: "Example".to_string(),
            connection: Some(ConnectionData {
                nettype: "IN".to_string(),
                addrtype: "IP4".to_string(),
                address: "239.1.1.1/32".to_string(),
            }),
            timing: Timing { start: 0, stop: 0 },
            attributes: SessionAttributes::default(),
            media_descriptions: vec![MediaDescription {
                media_name: MediaName {
                    media: "audio".to_string(),
                    port: 5004,
                    protos: vec!["RTP".to_string(), "AVP".to_string()],
                    formats: vec![97],
                },
                connection: None,
                attributes: MediaAttributes {
                    rtpmaps: vec![RtpMap {
                        payload_type: 97,
                        encoding_name: "L24".to_string(),
                        clock_rate: 48_000,
                        channels: 2,
                    }],
                    ptime_ms: Some(1.0),
                    direction: Some(Direction::RecvOnly),
                    ..Default::default()
                },
            }],
        };

        let text = emit(&sdp);
        let reparsed = parse::parse(&text).expect("emitted text should parse");
        assert_eq!(reparsed, sdp);
    }
}
