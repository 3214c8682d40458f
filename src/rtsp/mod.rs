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

//! RTSP request/response plumbing for the DESCRIBE exchange AES67
//! transmitters and receivers use to hand over SDP: message types and
//! serialization, an incremental parser, a connection abstraction over a
//! TCP stream, a DESCRIBE-only client, and a server that answers DESCRIBE
//! by session path.

mod client;
mod connection;
mod error;
mod headers;
mod message;
mod parser;
mod server;

pub use client::{describe, describe_with_timeout};
pub use connection::{Connection, ConnectionReader, ConnectionWriter};
pub use error::{Error, Result};
pub use headers::Headers;
pub use message::{Message, Request, Response};
pub use parser::IncrementalParser;
pub use server::{describe_response, DescribeHandler, Server};
