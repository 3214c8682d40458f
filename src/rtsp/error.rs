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

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    #[error("malformed RTSP start line: {0}")]
    BadStartLine(String),
    #[error("malformed RTSP header: {0}")]
    BadHeader(String),
    #[error("unsupported RTSP version {0}.{1}")]
    UnsupportedVersion(u8, u8),
    #[error("invalid Content-Length: {0}")]
    BadContentLength(String),
    #[error("no response received before the describe timeout")]
    DescribeTimeout,
    #[error("response did not carry an application/sdp body")]
    NotSdp,
    #[error("SDP error: {0}")]
    Sdp(#[from] crate::sdp::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("socket configuration error: {0}")]
    Config(#[from] crate::error::ConfigError),
}

pub type Result<T> = std::result::Result<T, Error>;
