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

//! Reactor shims the rest of the crate is built on: UDP sockets that
//! surface kernel receive timestamps and destination addresses, a
//! refcounted multicast-join guard, and a DNS-SD provider abstraction.
//! Grounded on `aes67-rs/src/socket.rs` (socket setup shape) generalized
//! per-datagram cmsg decoding instead of that module's single-group-per-socket
//! assumption, since the RTP socket pool shares one port across groups.

pub mod dnssd;
pub mod mdns;
pub mod multicast;
pub mod timestamped;

pub use dnssd::{DnsSdEvent, DnsSdProvider, ServiceInstance};
pub use mdns::MdnsSdProvider;
pub use multicast::MulticastJoinGuard;
pub use timestamped::{RecvResult, TimestampedUdpSocket};

use crate::error::ConfigResult;
use pnet::datalink::NetworkInterface;
use socket2::{Domain, Protocol, SockAddr, Socket, TcpKeepalive, Type};
use std::{
    net::{IpAddr, Ipv4Addr, SocketAddr, TcpListener},
    num::NonZeroU32,
    time::Duration,
};

/// Creates a UDP socket bound to `port` on `iface`, with `SO_REUSEADDR` and
/// `IP_PKTINFO`/`IPV6_RECVPKTINFO` enabled so the destination multicast
/// address is recoverable per datagram.
pub fn bind_udp_socket(iface: &NetworkInterface, bind_addr: IpAddr, port: u16) -> ConfigResult<Socket> {
    let domain = match bind_addr {
        IpAddr::V4(_) => Domain::IPV4,
        IpAddr::V6(_) => Domain::IPV6,
    };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    match bind_addr {
        IpAddr::V4(_) => enable_pktinfo_v4(&socket)?,
        IpAddr::V6(_) => enable_pktinfo_v6(&socket)?,
    }
    if let IpAddr::V4(_) = bind_addr {
        let _ = socket.bind_device_by_index_v4(NonZeroU32::new(iface.index));
    }
    socket.bind(&SockAddr::from(SocketAddr::new(bind_addr, port)))?;
    socket.set_nonblocking(true)?;
    Ok(socket)
}

#[cfg(target_os = "linux")]
fn enable_pktinfo_v4(socket: &Socket) -> ConfigResult<()> {
    use std::os::fd::AsRawFd;
    let fd = socket.as_raw_fd();
    let one: libc::c_int = 1;
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::IPPROTO_IP,
            libc::IP_PKTINFO,
            &one as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn enable_pktinfo_v4(_socket: &Socket) -> ConfigResult<()> {
    Ok(())
}

#[cfg(target_os = "linux")]
fn enable_pktinfo_v6(socket: &Socket) -> ConfigResult<()> {
    use std::os::fd::AsRawFd;
    let fd = socket.as_raw_fd();
    let one: libc::c_int = 1;
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::IPPROTO_IPV6,
            libc::IPV6_RECVPKTINFO,
            &one as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(std::io::Error::last_os_error().into());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn enable_pktinfo_v6(_socket: &Socket) -> ConfigResult<()> {
    Ok(())
}

/// Binds a listening TCP socket with keepalive enabled, for the RTSP server.
pub fn bind_tcp_listener(bind_addr: IpAddr, port: u16) -> ConfigResult<TcpListener> {
    let domain = match bind_addr {
        IpAddr::V4(_) => Domain::IPV4,
        IpAddr::V6(_) => Domain::IPV6,
    };
    let keepalive = TcpKeepalive::new()
        .with_time(Duration::from_secs(30))
        .with_interval(Duration::from_secs(10));

    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    socket.set_nonblocking(true)?;
    socket.set_keepalive(true)?;
    socket.set_tcp_keepalive(&keepalive)?;
    socket.set_tcp_nodelay(true)?;
    socket.bind(&SockAddr::from(SocketAddr::new(bind_addr, port)))?;
    socket.listen(128)?;
    Ok(socket.into())
}

pub fn join_multicast_v4(socket: &Socket, group: Ipv4Addr, iface: &NetworkInterface) -> ConfigResult<()> {
    let local_v4 = iface.ips.iter().find_map(|ipn| match ipn.ip() {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    });
    match local_v4 {
        Some(local) => socket.join_multicast_v4(&group, &local)?,
        None => socket.join_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?,
    }
    Ok(())
}

pub fn leave_multicast_v4(socket: &Socket, group: Ipv4Addr, iface: &NetworkInterface) -> ConfigResult<()> {
    let local_v4 = iface.ips.iter().find_map(|ipn| match ipn.ip() {
        IpAddr::V4(v4) => Some(v4),
        IpAddr::V6(_) => None,
    });
    match local_v4 {
        Some(local) => socket.leave_multicast_v4(&group, &local)?,
        None => socket.leave_multicast_v4(&group, &Ipv4Addr::UNSPECIFIED)?,
    }
    Ok(())
}
