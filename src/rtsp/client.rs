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

//! A DESCRIBE-only RTSP client: connects, sends a single request, and waits
//! for the SDP-bearing response. This crate only ever needs DESCRIBE to pull
//! a session description for a discovered transmitter, so there is no
//! session/state machinery beyond that.

use super::{
    connection::Connection,
    error::{Error, Result},
    message::{Message, Request},
};
use crate::sdp::{self, SessionDescription};
use std::{net::SocketAddr, time::Duration};
use tokio::{net::TcpStream, sync::mpsc, time::timeout};

const DEFAULT_DESCRIBE_TIMEOUT: Duration = Duration::from_secs(1);

/// Connects to `addr` and issues `DESCRIBE rtsp://<addr>/<path>`, returning
/// the parsed session description from the first SDP-bearing response.
pub async fn describe(addr: SocketAddr, path: &str) -> Result<SessionDescription> {
    describe_with_timeout(addr, path, DEFAULT_DESCRIBE_TIMEOUT).await
}

pub async fn describe_with_timeout(
    addr: SocketAddr,
    path: &str,
    describe_timeout: Duration,
) -> Result<SessionDescription> {
    let stream = TcpStream::connect(addr).await?;
    let peer = stream.peer_addr()?;
    let (reader, mut writer) = Connection::new(stream, peer).split();

    let (tx, mut rx) = mpsc::channel(4);
    let mut request = Request::new("DESCRIBE", format!("rtsp://{}/{path}", addr.ip()));
    request.headers.push("CSeq", "1");
    request.headers.push("Accept", "application/sdp");

    writer.send(&Message::Request(request)).await?;
    tokio::spawn(reader.run(tx));

    let message = timeout(describe_timeout, rx.recv())
        .await
        .map_err(|_| Error::DescribeTimeout)?
        .ok_or(Error::DescribeTimeout)?;

    match message {
        Message::Response(resp) if resp.is_sdp() => {
            let text = String::from_utf8_lossy(&resp.body);
            Ok(sdp::parse(&text)?)
        }
        Message::Response(_) => Err(Error::NotSdp),
        Message::Request(_) => Err(Error::NotSdp),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rtsp::{headers::Headers, message::Response};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    #[tokio::test]
    async fn describe_parses_the_sdp_response_body() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 512];
            let n = socket.read(&mut buf).await.unwrap();
            assert!(String::from_utf8_lossy(&buf[..n]).starts_with("DESCRIBE"));

            let body = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=studio-a\r\nc=IN IP4 239.1.1.1/32\r\nt=0 0\r\nm=audio 5004 RTP/AVP 97\r\na=rtpmap:97 L24/48000/2\r\n";
            let mut response = Response::new(200, "OK");
            let mut headers = Headers::new();
            headers.push("Content-Type", "application/sdp");
            headers.push("Content-Length", body.len().to_string());
            response.headers = headers;
            response.body = body.as_bytes().to_vec();
            socket.write_all(&response.to_bytes()).await.unwrap();
        });

        let sdp = describe(addr, "by-name/studio-a").await.unwrap();
        assert_eq!(sdp.session_name, "studio-a");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn describe_times_out_if_nothing_responds() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = listener.accept().await;
            // Intentionally never respond.
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let result = describe_with_timeout(addr, "by-name/studio-a", Duration::from_millis(50)).await;
        assert!(matches!(result, Err(Error::DescribeTimeout)));
    }
}
