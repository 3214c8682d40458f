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

//! Accepts inbound RTSP connections and hands each one to a callback that
//! answers DESCRIBE requests with a session's current SDP. One task per
//! connection; the listening socket carries the same keepalive/nodelay
//! setup the rest of this crate's TCP sockets use.

use super::{
    connection::Connection,
    error::Result,
    message::{Message, Response},
};
use crate::net::bind_tcp_listener;
use std::{net::IpAddr, sync::Arc};
use tokio::{net::TcpListener, sync::mpsc};
use tracing::{info, warn};

/// Resolves a DESCRIBE request path to the SDP body that should be returned,
/// or `None` if no such session is known.
pub trait DescribeHandler: Send + Sync + 'static {
    fn describe(&self, uri: &str) -> Option<String>;
}

pub struct Server {
    listener: TcpListener,
}

impl Server {
    pub async fn bind(bind_addr: IpAddr, port: u16) -> Result<Self> {
        let std_listener = bind_tcp_listener(bind_addr, port)?;
        let listener = TcpListener::from_std(std_listener)?;
        Ok(Self { listener })
    }

    pub fn local_port(&self) -> std::io::Result<u16> {
        Ok(self.listener.local_addr()?.port())
    }

    /// Accepts connections forever, answering each DESCRIBE request through
    /// `handler`. Returns only if accepting fails outright.
    pub async fn serve(self, handler: Arc<dyn DescribeHandler>) -> Result<()> {
        loop {
            let (stream, peer) = self.listener.accept().await?;
            let handler = handler.clone();
            tokio::spawn(async move {
                let (reader, mut writer) = Connection::new(stream, peer).split();
                let (tx, mut rx) = mpsc::channel(8);
                tokio::spawn(reader.run(tx));

                while let Some(message) = rx.recv().await {
                    let Message::Request(request) = message else {
                        continue;
                    };
                    if request.method != "DESCRIBE" {
                        warn!(peer = %peer, method = %request.method, "unsupported RTSP method");
                        continue;
                    }
                    info!(peer = %peer, uri = %request.uri, "RTSP DESCRIBE");
                    let response = describe_response(handler.describe(&request.uri));
                    if let Err(err) = writer.send(&Message::Response(response)).await {
                        warn!(peer = %peer, error = %err, "failed to write RTSP response");
                        return;
                    }
                }
            });
        }
    }
}

/// Builds the 200 OK / 404 response for a DESCRIBE lookup result.
pub fn describe_response(sdp_body: Option<String>) -> Response {
    match sdp_body {
        Some(body) => {
            let mut response = Response::new(200, "OK");
            response.headers.push("Content-Type", "application/sdp");
            response.headers.push("Content-Length", body.len().to_string());
            response.body = body.into_bytes();
            response
        }
        None => Response::new(404, "Not Found"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describe_response_carries_the_sdp_body() {
        let response = describe_response(Some("v=0\r\n".to_owned()));
        assert_eq!(response.status_code, 200);
        assert!(response.is_sdp());
        assert_eq!(response.body, b"v=0\r\n");
    }

    #[test]
    fn missing_session_is_not_found() {
        let response = describe_response(None);
        assert_eq!(response.status_code, 404);
    }
}
