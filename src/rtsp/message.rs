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

//! Request/response message types. Parsing lives in [`super::parser`];
//! these types only know how to serialize themselves onto the wire, always
//! with `\r\n` line endings regardless of what the parser tolerated on
//! input.

use super::headers::Headers;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    pub uri: String,
    pub version_major: u8,
    pub version_minor: u8,
    pub headers: Headers,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub version_major: u8,
    pub version_minor: u8,
    pub status_code: u16,
    pub reason: String,
    pub headers: Headers,
    pub body: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Request(Request),
    Response(Response),
}

impl Request {
    pub fn new(method: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            version_major: 1,
            version_minor: 0,
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "{} {} RTSP/{}.{}\r\n",
            self.method, self.uri, self.version_major, self.version_minor
        )
        .into_bytes();
        for (name, value) in self.headers.iter() {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }
}

impl Response {
    pub fn new(status_code: u16, reason: impl Into<String>) -> Self {
        Self {
            version_major: 1,
            version_minor: 0,
            status_code,
            reason: reason.into(),
            headers: Headers::new(),
            body: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = format!(
            "RTSP/{}.{} {} {}\r\n",
            self.version_major, self.version_minor, self.status_code, self.reason
        )
        .into_bytes();
        for (name, value) in self.headers.iter() {
            out.extend_from_slice(format!("{name}: {value}\r\n").as_bytes());
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(&self.body);
        out
    }

    pub fn is_sdp(&self) -> bool {
        self.headers
            .get("Content-Type")
            .map(|v| v.eq_ignore_ascii_case("application/sdp"))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_serializes_with_crlf_line_endings() {
        let mut req = Request::new("DESCRIBE", "rtsp://host/by-name/studio-a");
        req.headers.push("CSeq", "1");
        req.headers.push("Accept", "application/sdp");
        let bytes = req.to_bytes();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.starts_with("DESCRIBE rtsp://host/by-name/studio-a RTSP/1.0\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
        assert!(text.contains("CSeq: 1\r\n"));
    }

    #[test]
    fn response_reports_sdp_content_type() {
        let mut resp = Response::new(200, "OK");
        resp.headers.push("Content-Type", "application/sdp");
        assert!(resp.is_sdp());
    }
}
