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

//! The socket pool: one [`TimestampedUdpSocket`] per bound port, shared
//! across every session joined on that port, and a fixed set of reader
//! slots datagrams are fanned out to. Generalizes the single-session
//! receive loop into a many-sessions-per-socket, many-readers-per-session
//! dispatch fan-out.

use super::{
    error::{Error, Result},
    packet::RtpPacket,
    reader::{DispatchOutcome, IncomingPacket, ReaderSlot},
    session::Channel,
};
use crate::{
    net::{MulticastJoinGuard, TimestampedUdpSocket, bind_udp_socket},
    sync::SpscSender,
};
use pnet::datalink::NetworkInterface;
use std::net::{IpAddr, Ipv4Addr};
use tokio::net::UdpSocket as TokioUdpSocket;
use tracing::{debug, warn};

const MAX_DATAGRAM_LEN: usize = 1500;

pub struct SocketPool {
    slots: Vec<ReaderSlot>,
    join_guard: std::sync::Arc<MulticastJoinGuard>,
}

impl SocketPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| ReaderSlot::new()).collect(),
            join_guard: MulticastJoinGuard::new(),
        }
    }

    /// Opens and configures a socket bound to `port` on `iface`, ready to
    /// be driven by [`Self::run_socket`].
    pub fn bind(&self, iface: &NetworkInterface, bind_addr: IpAddr, port: u16) -> Result<TimestampedUdpSocket> {
        let socket = bind_udp_socket(iface, bind_addr, port).map_err(|e| Error::MalformedPacket(e.to_string()))?;
        let tokio_socket = TokioUdpSocket::from_std(socket.into())?;
        Ok(TimestampedUdpSocket::new(tokio_socket)?)
    }

    /// Joins a session's multicast group, refcounted across every reader
    /// sharing the same `(group, iface, port)`.
    pub fn join(&self, socket: &socket2::Socket, group: Ipv4Addr, iface: &NetworkInterface, port: u16) -> Result<()> {
        self.join_guard
            .acquire(socket, group, iface.index, port, iface)
            .map_err(|e| Error::MalformedPacket(e.to_string()))
    }

    pub fn leave(&self, socket: &socket2::Socket, group: Ipv4Addr, iface: &NetworkInterface, port: u16) {
        self.join_guard.release(socket, group, iface.index, port, iface);
    }

    /// Assigns `channels` to the first free slot, to be delivered through
    /// `fifo`. Returns the slot index so the caller can remove it later.
    pub fn add_reader(&self, channels: Vec<Channel>, fifo: SpscSender<IncomingPacket>) -> Result<usize> {
        for (index, slot) in self.slots.iter().enumerate() {
            match slot.add(channels.clone(), fifo) {
                Ok(()) => return Ok(index),
                Err(_) => continue,
            }
        }
        Err(Error::NoFreeSlot)
    }

    pub fn remove_reader(&self, index: usize) {
        if let Some(slot) = self.slots.get(index) {
            slot.remove();
        }
    }

    /// Drives one bound socket: parses each datagram as RTP and dispatches
    /// it to every reader slot whose channels match. Runs until the socket
    /// errors; malformed datagrams and unmatched destinations are silently
    /// dropped (slot-level statistics are the place to observe them, not
    /// this loop).
    pub async fn run_socket(&self, socket: &TimestampedUdpSocket, port: u16) -> Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM_LEN];
        loop {
            let recv = socket.recv(&mut buf).await?;
            let Some(destination) = recv.destination else {
                debug!(port, "datagram with no recoverable destination address, dropping");
                continue;
            };
            let source = recv.from.ip();

            let packet = match RtpPacket::parse(&buf[..recv.len]) {
                Ok(packet) => packet,
                Err(e) => {
                    debug!(port, %source, "malformed RTP packet: {e}");
                    continue;
                }
            };

            let incoming = IncomingPacket {
                payload: packet.payload().to_vec(),
                rtp_timestamp: packet.timestamp(),
                sequence_number: packet.sequence_number(),
                packet_time_frames: 0,
                received_at_nanos: recv.received_at_nanos,
            };

            let mut delivered = false;
            for slot in &self.slots {
                match slot.dispatch(destination, port, source, &incoming) {
                    DispatchOutcome::Delivered => delivered = true,
                    DispatchOutcome::FifoFull => warn!(port, %destination, "reader FIFO full, dropping packet"),
                    DispatchOutcome::NoMatch | DispatchOutcome::Skipped => {}
                }
            }
            if !delivered {
                debug!(port, %destination, %source, "packet matched no reader");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rtp::filter::SourceFilter, rtp::session::Session, sync::spsc, time::WrappingU16};

    fn sample_channel(port: u16) -> Channel {
        Channel {
            session: Session {
                connection_address: IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1)),
                rtp_port: port,
                rtcp_port: port + 1,
            },
            filter: SourceFilter::accept_all(),
        }
    }

    #[test]
    fn add_reader_fails_once_every_slot_is_taken() {
        let pool = SocketPool::new(1);
        let (tx1, _rx1) = spsc(4);
        pool.add_reader(vec![sample_channel(5004)], tx1).unwrap();
        let (tx2, _rx2) = spsc(4);
        assert!(matches!(pool.add_reader(vec![sample_channel(5006)], tx2), Err(Error::NoFreeSlot)));
    }

    #[test]
    fn removing_a_reader_frees_its_slot() {
        let pool = SocketPool::new(1);
        let (tx1, _rx1) = spsc(4);
        let index = pool.add_reader(vec![sample_channel(5004)], tx1).unwrap();
        pool.remove_reader(index);
        let (tx2, _rx2) = spsc(4);
        assert!(pool.add_reader(vec![sample_channel(5006)], tx2).is_ok());
    }

    #[test]
    fn wrapping_sequence_numbers_compare_correctly_in_incoming_packets() {
        let a = WrappingU16::new(65_535);
        let b = WrappingU16::new(0);
        assert!(b.is_ahead_of(a));
    }
}
