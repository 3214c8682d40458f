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

//! An incremental parser over a growing byte buffer: feed it whatever
//! arrived off the socket, get back every message that is now complete.
//! Tolerates `\r\n` and bare `\n` line endings on input; a partial
//! status line, partial headers, or a body still short of `Content-Length`
//! all just wait for the next `feed`.

use super::{
    error::{Error, Result},
    headers::Headers,
    message::{Message, Request, Response},
};

#[derive(Default)]
pub struct IncrementalParser {
    buffer: Vec<u8>,
}

impl IncrementalParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `bytes` and returns every message that became complete as a
    /// result, in arrival order. Leaves any trailing partial message
    /// buffered for the next call.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<Vec<Message>> {
        self.buffer.extend_from_slice(bytes);
        let mut messages = Vec::new();
        while let Some(message) = self.try_parse_one()? {
            messages.push(message);
        }
        Ok(messages)
    }

    fn try_parse_one(&mut self) -> Result<Option<Message>> {
        let Some(header_end) = header_block_end(&self.buffer) else {
            return Ok(None);
        };

        let (start_line, header_lines) = split_header_lines(&self.buffer[..header_end])?;
        let headers = parse_header_lines(&header_lines)?;
        let content_length = match headers.content_length() {
            Some(len) => len,
            None => 0,
        };

        let total_len = header_end + content_length;
        if self.buffer.len() < total_len {
            return Ok(None);
        }

        let body = self.buffer[header_end..total_len].to_vec();
        let message = parse_start_line(&start_line, headers, body)?;
        self.buffer.drain(..total_len);
        Ok(Some(message))
    }
}

/// Finds the byte offset right after the blank line terminating the
/// header block (`\r\n\r\n` or `\n\n`), or `None` if not yet complete.
fn header_block_end(buf: &[u8]) -> Option<usize> {
    let mut idx = 0;
    while let Some(rel_nl) = buf[idx..].iter().position(|&b| b == b'\n') {
        let nl = idx + rel_nl;
        let mut line_end = nl;
        if line_end > idx && buf[line_end - 1] == b'\r' {
            line_end -= 1;
        }
        if line_end == idx {
            return Some(nl + 1);
        }
        idx = nl + 1;
    }
    None
}

fn split_header_lines(block: &[u8]) -> Result<(String, Vec<String>)> {
    let text = String::from_utf8_lossy(block);
    let mut lines = text
        .split('\n')
        .map(|line| line.strip_suffix('\r').unwrap_or(line).to_owned())
        .filter(|line| !line.is_empty());
    let start_line = lines
        .next()
        .ok_or_else(|| Error::BadStartLine("empty message".into()))?;
    Ok((start_line, lines.collect()))
}

fn parse_header_lines(lines: &[String]) -> Result<Headers> {
    let mut headers = Headers::new();
    for line in lines {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::BadHeader(line.clone()))?;
        headers.push(name.trim(), value.trim());
    }
    Ok(headers)
}

fn parse_rtsp_version(token: &str) -> Result<(u8, u8)> {
    let version = token
        .strip_prefix("RTSP/")
        .ok_or_else(|| Error::BadStartLine(format!("expected RTSP version, got {token}")))?;
    let (major, minor) = version
        .split_once('.')
        .ok_or_else(|| Error::BadStartLine(format!("malformed RTSP version {version}")))?;
    let major: u8 = major.parse().map_err(|_| Error::BadStartLine(format!("bad major version {major}")))?;
    let minor: u8 = minor.parse().map_err(|_| Error::BadStartLine(format!("bad minor version {minor}")))?;
    Ok((major, minor))
}

fn parse_start_line(line: &str, headers: Headers, body: Vec<u8>) -> Result<Message> {
    let mut parts = line.splitn(3, ' ');
    let first = parts.next().ok_or_else(|| Error::BadStartLine(line.to_owned()))?;
    let second = parts.next().ok_or_else(|| Error::BadStartLine(line.to_owned()))?;
    let third = parts.next().ok_or_else(|| Error::BadStartLine(line.to_owned()))?;

    if first.starts_with("RTSP/") {
        let (version_major, version_minor) = parse_rtsp_version(first)?;
        let status_code: u16 = second
            .parse()
            .map_err(|_| Error::BadStartLine(format!("bad status code {second}")))?;
        Ok(Message::Response(Response {
            version_major,
            version_minor,
            status_code,
            reason: third.to_owned(),
            headers,
            body,
        }))
    } else {
        let (version_major, version_minor) = parse_rtsp_version(third)?;
        Ok(Message::Request(Request {
            method: first.to_owned(),
            uri: second.to_owned(),
            version_major,
            version_minor,
            headers,
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_request_with_no_body() {
        let mut parser = IncrementalParser::new();
        let input = b"DESCRIBE rtsp://host/by-name/studio-a RTSP/1.0\r\nCSeq: 1\r\nAccept: application/sdp\r\n\r\n";
        let messages = parser.feed(input).unwrap();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            Message::Request(req) => {
                assert_eq!(req.method, "DESCRIBE");
                assert_eq!(req.uri, "rtsp://host/by-name/studio-a");
                assert_eq!(req.headers.get("CSeq"), Some("1"));
            }
            Message::Response(_) => panic!("expected a request"),
        }
    }

    #[test]
    fn parses_a_response_with_a_body_split_across_feeds() {
        let mut parser = IncrementalParser::new();
        let head = b"RTSP/1.0 200 OK\r\nContent-Type: application/sdp\r\nContent-Length: 5\r\n\r\n";
        assert!(parser.feed(head).unwrap().is_empty());
        let messages = parser.feed(b"v=0\r\n").unwrap();
        assert_eq!(messages.len(), 1);
        match &messages[0] {
            Message::Response(resp) => {
                assert_eq!(resp.status_code, 200);
                assert!(resp.is_sdp());
                assert_eq!(resp.body, b"v=0\r\n");
            }
            Message::Request(_) => panic!("expected a response"),
        }
    }

    #[test]
    fn tolerates_bare_newlines_on_input() {
        let mut parser = IncrementalParser::new();
        let input = b"DESCRIBE rtsp://host/s RTSP/1.0\nCSeq: 1\n\n";
        let messages = parser.feed(input).unwrap();
        assert_eq!(messages.len(), 1);
    }

    #[test]
    fn pipelined_messages_are_all_returned() {
        let mut parser = IncrementalParser::new();
        let one = b"DESCRIBE rtsp://host/a RTSP/1.0\r\nCSeq: 1\r\n\r\n".to_vec();
        let two = b"DESCRIBE rtsp://host/b RTSP/1.0\r\nCSeq: 2\r\n\r\n".to_vec();
        let mut input = one;
        input.extend_from_slice(&two);
        let messages = parser.feed(&input).unwrap();
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn rejects_a_header_line_without_a_colon() {
        let mut parser = IncrementalParser::new();
        let input = b"DESCRIBE rtsp://host/a RTSP/1.0\r\nbroken-header\r\n\r\n";
        assert!(parser.feed(input).is_err());
    }
}
