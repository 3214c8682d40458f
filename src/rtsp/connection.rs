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

//! A single RTSP connection: one TCP stream split into a read half fed to
//! the [`super::parser::IncrementalParser`] and a write half messages are
//! serialized onto directly. Splitting lets a connection's reader run on
//! its own task emitting completed messages over an mpsc channel while the
//! caller keeps the writer to answer each one, without needing a write
//! queue of its own since RTSP here is small, low-rate control traffic.

use super::{error::Result, message::Message, parser::IncrementalParser};
use std::net::SocketAddr;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{
        tcp::{OwnedReadHalf, OwnedWriteHalf},
        TcpStream,
    },
    sync::mpsc,
};
use tracing::{debug, warn};

const READ_CHUNK: usize = 2048;

pub struct Connection {
    stream: TcpStream,
    peer: SocketAddr,
}

pub struct ConnectionReader {
    read_half: OwnedReadHalf,
    peer: SocketAddr,
    parser: IncrementalParser,
}

pub struct ConnectionWriter {
    write_half: OwnedWriteHalf,
}

impl Connection {
    pub fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn split(self) -> (ConnectionReader, ConnectionWriter) {
        let (read_half, write_half) = self.stream.into_split();
        (
            ConnectionReader {
                read_half,
                peer: self.peer,
                parser: IncrementalParser::new(),
            },
            ConnectionWriter { write_half },
        )
    }
}

impl ConnectionWriter {
    pub async fn send(&mut self, message: &Message) -> Result<()> {
        let bytes = match message {
            Message::Request(req) => req.to_bytes(),
            Message::Response(resp) => resp.to_bytes(),
        };
        self.write_half.write_all(&bytes).await?;
        Ok(())
    }
}

impl ConnectionReader {
    /// Reads datagrams off the socket until the connection closes, pushing
    /// every completed message onto `tx`. Returns once the peer closes the
    /// connection, a read fails, or the receiver is dropped.
    pub async fn run(mut self, tx: mpsc::Sender<Message>) {
        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = match self.read_half.read(&mut buf).await {
                Ok(0) => {
                    debug!(peer = %self.peer, "RTSP connection closed by peer");
                    return;
                }
                Ok(n) => n,
                Err(err) => {
                    warn!(peer = %self.peer, error = %err, "RTSP read error");
                    return;
                }
            };

            let messages = match self.parser.feed(&buf[..n]) {
                Ok(messages) => messages,
                Err(err) => {
                    warn!(peer = %self.peer, error = %err, "RTSP parse error");
                    return;
                }
            };

            for message in messages {
                if tx.send(message).await.is_err() {
                    return;
                }
            }
        }
    }
}
