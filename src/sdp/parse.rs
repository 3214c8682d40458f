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

//! A single left-to-right pass over `\r\n`/`\n`-terminated `type=value`
//! lines, dispatching on the first character. Attribute lines route to the
//! current media description once one has begun, else to the session.

use super::{
    error::{Error, Result},
    types::*,
};

pub fn parse(text: &str) -> Result<SessionDescription> {
    let mut version = None;
    let mut origin = None;
    let mut session_name = None;
    let mut connection = None;
    let mut timing = None;
    let mut session_attributes = SessionAttributes::default();
    let mut media_descriptions: Vec<MediaDescription> = Vec::new();

    for (idx, raw_line) in text.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw_line.trim_end_matches('\r');
        if line.is_empty() {
            continue;
        }
        let mut parts = line.splitn(2, '=');
        let key = parts.next().unwrap_or("");
        let value = parts.next().ok_or_else(|| Error::Malformed {
            line: line_no,
            key: key.to_string(),
            reason: "missing '=' separator".to_string(),
        })?;

        match key {
            "v" => {
                version = Some(value.parse::<u8>().map_err(|e| Error::Malformed {
                    line: line_no,
                    key: "v".to_string(),
                    reason: e.to_string(),
                })?);
            }
            "o" => origin = Some(parse_origin(line_no, value)?),
            "s" => session_name = Some(value.to_string()),
            "c" => {
                let c = parse_connection(line_no, value)?;
                if let Some(media) = media_descriptions.last_mut() {
                    media.connection = Some(c);
                } else {
                    connection = Some(c);
                }
            }
            "t" => timing = Some(parse_timing(line_no, value)?),
            "m" => media_descriptions.push(parse_media_name(line_no, value)?),
            "a" => {
                if let Some(media) = media_descriptions.last_mut() {
                    apply_media_attribute(line_no, value, &mut media.attributes)?;
                } else {
                    apply_session_attribute(line_no, value, &mut session_attributes)?;
                }
            }
            _ => {
                // Unrecognized top-level lines (i=, u=, e=, p=, b=, r=, z=, k=)
                // carry no semantics this core acts on; RFC 8866 permits
                // ignoring lines not needed by the consumer.
            }
        }
    }

    Ok(SessionDescription {
        version: version.ok_or_else(|| Error::MissingField { field: "v".to_string() })?,
        origin: origin.ok_or_else(|| Error::MissingField { field: "o".to_string() })?,
        session_name: session_name.ok_or_else(|| Error::MissingField { field: "s".to_string() })?,
        connection,
        timing: timing.ok_or_else(|| Error::MissingField { field: "t".to_string() })?,
        attributes: session_attributes,
        media_descriptions,
    })
}

fn parse_origin(line: usize, value: &str) -> Result<Origin> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() != 6 {
        return Err(Error::Malformed {
            line,
            key: "o".to_string(),
            reason: format!("expected 6 fields, found {}", fields.len()),
        });
    }
    check_nettype(line, fields[3])?;
    check_addrtype(line, fields[4])?;
    Ok(Origin {
        username: fields[0].to_string(),
        sess_id: fields[1].to_string(),
        sess_version: fields[2].to_string(),
        nettype: fields[3].to_string(),
        addrtype: fields[4].to_string(),
        unicast_address: fields[5].to_string(),
    })
}

fn parse_connection(line: usize, value: &str) -> Result<ConnectionData> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() != 3 {
        return Err(Error::Malformed {
            line,
            key: "c".to_string(),
            reason: format!("expected 3 fields, found {}", fields.len()),
        });
    }
    check_nettype(line, fields[0])?;
    check_addrtype(line, fields[1])?;
    Ok(ConnectionData {
        nettype: fields[0].to_string(),
        addrtype: fields[1].to_string(),
        address: fields[2].to_string(),
    })
}

fn parse_timing(line: usize, value: &str) -> Result<Timing> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() != 2 {
        return Err(Error::Malformed {
            line,
            key: "t".to_string(),
            reason: format!("expected 2 fields, found {}", fields.len()),
        });
    }
    let start = fields[0].parse().map_err(|e: std::num::ParseIntError| Error::Malformed {
        line,
        key: "t".to_string(),
        reason: e.to_string(),
    })?;
    let stop = fields[1].parse().map_err(|e: std::num::ParseIntError| Error::Malformed {
        line,
        key: "t".to_string(),
        reason: e.to_string(),
    })?;
    Ok(Timing { start, stop })
}

fn parse_media_name(line: usize, value: &str) -> Result<MediaDescription> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() < 4 {
        return Err(Error::Malformed {
            line,
            key: "m".to_string(),
            reason: format!("expected at least 4 fields, found {}", fields.len()),
        });
    }
    let port = fields[1].parse::<u16>().map_err(|e| Error::Malformed {
        line,
        key: "m".to_string(),
        reason: e.to_string(),
    })?;
    let protos = fields[2].split('/').map(str::to_string).collect();
    let mut formats = Vec::with_capacity(fields.len() - 3);
    for f in &fields[3..] {
        formats.push(f.parse::<u8>().map_err(|e| Error::Malformed {
            line,
            key: "m".to_string(),
            reason: e.to_string(),
        })?);
    }
    Ok(MediaDescription {
        media_name: MediaName {
            media: fields[0].to_string(),
            port,
            protos,
            formats,
        },
        connection: None,
        attributes: MediaAttributes::default(),
    })
}

fn check_nettype(line: usize, nettype: &str) -> Result<()> {
    if nettype != "IN" {
        return Err(Error::UnknownNetworkType {
            line,
            nettype: nettype.to_string(),
        });
    }
    Ok(())
}

fn check_addrtype(line: usize, addrtype: &str) -> Result<()> {
    if addrtype != "IP4" && addrtype != "IP6" {
        return Err(Error::UnknownAddressType {
            line,
            addrtype: addrtype.to_string(),
        });
    }
    Ok(())
}

fn apply_session_attribute(_line: usize, value: &str, attrs: &mut SessionAttributes) -> Result<()> {
    let (key, rest) = split_attr(value);
    match key {
        "group" => {
            let mut tags = rest.split_whitespace();
            match tags.next() {
                Some("DUP") => {
                    attrs.group_dup = Some(tags.map(str::to_string).collect());
                    Ok(())
                }
                _ => Ok(()),
            }
        }
        _ => Err(Error::AttributeOutOfScope { key: key.to_string() }),
    }
}

fn apply_media_attribute(line: usize, value: &str, attrs: &mut MediaAttributes) -> Result<()> {
    let (key, rest) = split_attr(value);
    match key {
        "rtpmap" => attrs.rtpmaps.push(parse_rtpmap(line, rest)?),
        "ptime" => attrs.ptime_ms = Some(parse_positive_f64(line, "ptime", rest)?),
        "maxptime" => attrs.maxptime_ms = Some(parse_positive_f64(line, "maxptime", rest)?),
        "sendrecv" => attrs.direction = Some(Direction::SendRecv),
        "sendonly" => attrs.direction = Some(Direction::SendOnly),
        "recvonly" => attrs.direction = Some(Direction::RecvOnly),
        "inactive" => attrs.direction = Some(Direction::Inactive),
        "ts-refclk" => attrs.ts_refclk = Some(parse_ts_refclk(line, rest)?),
        "mediaclk" => attrs.mediaclk = Some(parse_mediaclk(line, rest)?),
        "clock-domain" => attrs.clock_domain = Some(parse_clock_domain(line, rest)?),
        "clock-deviation" => attrs.clock_deviation = Some(parse_clock_deviation(line, rest)?),
        "source-filter" => attrs.source_filter = Some(parse_source_filter(line, rest)?),
        "mid" => attrs.mid = Some(rest.to_string()),
        _ => {}
    }
    Ok(())
}

fn split_attr(value: &str) -> (&str, &str) {
    match value.split_once(':') {
        Some((k, v)) => (k, v),
        None => (value, ""),
    }
}

fn parse_rtpmap(line: usize, rest: &str) -> Result<RtpMap> {
    let mut parts = rest.splitn(2, char::is_whitespace);
    let pt = parts.next().unwrap_or("").parse::<u8>().map_err(|e| Error::Malformed {
        line,
        key: "rtpmap".to_string(),
        reason: e.to_string(),
    })?;
    let encoding = parts.next().ok_or_else(|| Error::Malformed {
        line,
        key: "rtpmap".to_string(),
        reason: "missing encoding/rate".to_string(),
    })?;
    let mut encoding_fields = encoding.splitn(3, '/');
    let encoding_name = encoding_fields.next().unwrap_or("").to_string();
    let clock_rate = encoding_fields
        .next()
        .ok_or_else(|| Error::Malformed {
            line,
            key: "rtpmap".to_string(),
            reason: "missing clock rate".to_string(),
        })?
        .parse::<u32>()
        .map_err(|e| Error::Malformed {
            line,
            key: "rtpmap".to_string(),
            reason: e.to_string(),
        })?;
    let channels = match encoding_fields.next() {
        Some(c) => c.parse::<u16>().map_err(|e| Error::Malformed {
            line,
            key: "rtpmap".to_string(),
            reason: e.to_string(),
        })?,
        None => 1,
    };
    Ok(RtpMap {
        payload_type: pt,
        encoding_name,
        clock_rate,
        channels,
    })
}

fn parse_positive_f64(line: usize, key: &str, rest: &str) -> Result<f64> {
    let v = rest.parse::<f64>().map_err(|e| Error::Malformed {
        line,
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    if v <= 0.0 {
        return Err(Error::Malformed {
            line,
            key: key.to_string(),
            reason: "must be > 0".to_string(),
        });
    }
    Ok(v)
}

fn parse_ts_refclk(line: usize, rest: &str) -> Result<RefClock> {
    let spec = rest.strip_prefix("ptp=").ok_or_else(|| Error::Malformed {
        line,
        key: "ts-refclk".to_string(),
        reason: "only 'ptp=' clock sources are supported".to_string(),
    })?;
    let fields: Vec<&str> = spec.split(':').collect();
    if fields.len() != 3 {
        return Err(Error::Malformed {
            line,
            key: "ts-refclk".to_string(),
            reason: format!("expected 3 colon-separated fields, found {}", fields.len()),
        });
    }
    let version = match fields[0] {
        "IEEE1588-2008" => PtpVersion::Ieee1588_2008,
        "IEEE1588-2019" => PtpVersion::Ieee1588_2019,
        other => {
            return Err(Error::Malformed {
                line,
                key: "ts-refclk".to_string(),
                reason: format!("unsupported PTP version tag '{other}'"),
            });
        }
    };
    let domain = fields[2].parse::<u8>().map_err(|e| Error::Malformed {
        line,
        key: "ts-refclk".to_string(),
        reason: e.to_string(),
    })?;
    Ok(RefClock {
        version,
        grandmaster_identity: fields[1].to_string(),
        domain,
    })
}

fn parse_mediaclk(line: usize, rest: &str) -> Result<MediaClock> {
    let mut parts = rest.split_whitespace();
    let direct = parts.next().ok_or_else(|| Error::Malformed {
        line,
        key: "mediaclk".to_string(),
        reason: "missing direct=<offset>".to_string(),
    })?;
    let offset_str = direct.strip_prefix("direct=").ok_or_else(|| Error::Malformed {
        line,
        key: "mediaclk".to_string(),
        reason: "expected 'direct=<offset>'".to_string(),
    })?;
    let offset = offset_str.parse::<i64>().map_err(|e| Error::Malformed {
        line,
        key: "mediaclk".to_string(),
        reason: e.to_string(),
    })?;
    let rate = match parts.next() {
        Some(r) => {
            let r = r.strip_prefix("rate=").ok_or_else(|| Error::Malformed {
                line,
                key: "mediaclk".to_string(),
                reason: "expected 'rate=<num>/<den>'".to_string(),
            })?;
            let (num, den) = r.split_once('/').ok_or_else(|| Error::Malformed {
                line,
                key: "mediaclk".to_string(),
                reason: "rate must be '<num>/<den>'".to_string(),
            })?;
            let num = num.parse::<u32>().map_err(|e| Error::Malformed {
                line,
                key: "mediaclk".to_string(),
                reason: e.to_string(),
            })?;
            let den = den.parse::<u32>().map_err(|e| Error::Malformed {
                line,
                key: "mediaclk".to_string(),
                reason: e.to_string(),
            })?;
            Some((num, den))
        }
        None => None,
    };
    Ok(MediaClock { offset, rate })
}

fn parse_clock_domain(line: usize, rest: &str) -> Result<u8> {
    let mut parts = rest.split_whitespace();
    let tag = parts.next().unwrap_or("");
    if tag != "PTPv2" {
        return Err(Error::Malformed {
            line,
            key: "clock-domain".to_string(),
            reason: format!("unsupported clock type tag '{tag}'"),
        });
    }
    parts
        .next()
        .ok_or_else(|| Error::Malformed {
            line,
            key: "clock-domain".to_string(),
            reason: "missing domain number".to_string(),
        })?
        .parse::<u8>()
        .map_err(|e| Error::Malformed {
            line,
            key: "clock-domain".to_string(),
            reason: e.to_string(),
        })
}

fn parse_clock_deviation(line: usize, rest: &str) -> Result<ClockDeviation> {
    let (num, den) = rest.split_once('/').ok_or_else(|| Error::Malformed {
        line,
        key: "clock-deviation".to_string(),
        reason: "expected '<n>/<d>'".to_string(),
    })?;
    Ok(ClockDeviation {
        numerator: num.parse().map_err(|e: std::num::ParseIntError| Error::Malformed {
            line,
            key: "clock-deviation".to_string(),
            reason: e.to_string(),
        })?,
        denominator: den.parse().map_err(|e: std::num::ParseIntError| Error::Malformed {
            line,
            key: "clock-deviation".to_string(),
            reason: e.to_string(),
        })?,
    })
}

fn parse_source_filter(line: usize, rest: &str) -> Result<SourceFilter> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    if fields.len() < 5 {
        return Err(Error::Malformed {
            line,
            key: "source-filter".to_string(),
            reason: format!("expected at least 5 fields, found {}", fields.len()),
        });
    }
    let mode = match fields[0] {
        "incl" => SourceFilterMode::Incl,
        "excl" => SourceFilterMode::Excl,
        other => {
            return Err(Error::Malformed {
                line,
                key: "source-filter".to_string(),
                reason: format!("mode must be 'incl' or 'excl', found '{other}'"),
            });
        }
    };
    check_nettype(line, fields[1])?;
    check_addrtype(line, fields[2])?;
    Ok(SourceFilter {
        mode,
        nettype: fields[1].to_string(),
        address_type: fields[2].to_string(),
        destination_address: fields[3].to_string(),
        source_addresses: fields[4..].iter().map(|s| s.to_string()).collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AES67_EXAMPLE: &str = "v=0\r\n\
o=- 1 1 IN IP4 192.168.1.10\r\n\
s=AES67 Example\r\n\
c=IN IP4 239.1.1.1/32\r\n\
t=0 0\r\n\
m=audio 5004 RTP/AVP 97\r\n\
a=rtpmap:97 L24/48000/2\r\n\
a=ptime:1\r\n\
a=ts-refclk:ptp=IEEE1588-2008:00-1D-C1-FF-FE-00-17-D7:0\r\n\
a=mediaclk:direct=0\r\n\
a=recvonly\r\n";

    #[test]
    fn parses_aes67_example() {
        let sdp = parse(AES67_EXAMPLE).expect("should parse");
        assert_eq!(sdp.version, 0);
        assert_eq!(sdp.session_name, "AES67 Example");
        let media = &sdp.media_descriptions[0];
        assert_eq!(media.media_name.port, 5004);
        assert_eq!(media.attributes.rtpmaps[0].encoding_name, "L24");
        assert_eq!(media.attributes.rtpmaps[0].clock_rate, 48_000);
        assert_eq!(media.attributes.rtpmaps[0].channels, 2);
        assert_eq!(media.attributes.ptime_ms, Some(1.0));
        assert_eq!(media.attributes.direction, Some(Direction::RecvOnly));
        assert!(media.attributes.ts_refclk.is_some());
    }

    #[test]
    fn rejects_unknown_address_type() {
        let bad = "v=0\r\no=- 1 1 IN IP4 1.2.3.4\r\ns=x\r\nc=IN IPX 1.2.3.4\r\nt=0 0\r\n";
        assert!(parse(bad).is_err());
    }

    #[test]
    fn rejects_non_positive_ptime() {
        let bad =
            "v=0\r\no=- 1 1 IN IP4 1.2.3.4\r\ns=x\r\nt=0 0\r\nm=audio 5004 RTP/AVP 97\r\na=ptime:0\r\n";
        assert!(parse(bad).is_err());
    }

    #[test]
    fn group_dup_is_session_scoped() {
        let text = "v=0\r\no=- 1 1 IN IP4 1.2.3.4\r\ns=x\r\nt=0 0\r\na=group:DUP 1 2\r\nm=audio 5004 RTP/AVP 97\r\n";
        let sdp = parse(text).expect("should parse");
        assert_eq!(sdp.attributes.group_dup, Some(vec!["1".to_string(), "2".to_string()]));
    }

    const ANUBIS_SDP: &str = "v=0\r\n\
o=- 13 0 IN IP4 192.168.15.52\r\n\
s=Anubis_610120_13\r\n\
c=IN IP4 239.1.15.52/15\r\n\
t=0 0\r\n\
a=clock-domain:PTPv2 0\r\n\
a=ts-refclk:ptp=IEEE1588-2008:00-1D-C1-FF-FE-51-9E-F7:0\r\n\
a=mediaclk:direct=0\r\n\
m=audio 5004 RTP/AVP 98\r\n\
c=IN IP4 239.1.15.52/15\r\n\
a=rtpmap:98 L16/48000/2\r\n\
a=source-filter: incl IN IP4 239.1.15.52 192.168.15.52\r\n\
a=clock-domain:PTPv2 0\r\n\
a=sync-time:0\r\n\
a=framecount:48\r\n\
a=palign:0\r\n\
a=ptime:1\r\n\
a=ts-refclk:ptp=IEEE1588-2008:00-1D-C1-FF-FE-51-9E-F7:0\r\n\
a=mediaclk:direct=0\r\n\
a=recvonly\r\n\
a=midi-pre2:50040 0,0;0,1\r\n";

    #[test]
    fn parses_anubis_example() {
        let sdp = parse(ANUBIS_SDP).expect("should parse");
        assert_eq!(sdp.version, 0);
        let media = &sdp.media_descriptions[0];
        let rtpmap = &media.attributes.rtpmaps[0];
        assert_eq!(rtpmap.encoding_name, "L16");
        assert_eq!(rtpmap.clock_rate, 48_000);
        assert_eq!(rtpmap.channels, 2);
        assert_eq!(media.attributes.ptime_ms, Some(1.0));
        let refclk = media.attributes.ts_refclk.as_ref().expect("ts-refclk present");
        assert_eq!(refclk.version, PtpVersion::Ieee1588_2008);
        assert_eq!(refclk.grandmaster_identity, "00-1D-C1-FF-FE-51-9E-F7");
        assert_eq!(refclk.domain, 0);
    }
}
