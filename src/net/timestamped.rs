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

//! A UDP socket wrapper that recovers, per datagram, the kernel receive
//! timestamp (`SO_TIMESTAMPNS`) and the destination address the packet was
//! sent to (`IP_PKTINFO`) — needed so one socket bound to a shared port can
//! demultiplex several joined multicast groups.

use std::{
    io,
    mem::{self, MaybeUninit},
    net::{IpAddr, Ipv4Addr, SocketAddr},
    os::fd::AsRawFd,
};
use tokio::{io::Interest, net::UdpSocket};

pub struct TimestampedUdpSocket {
    inner: UdpSocket,
}

#[derive(Debug, Clone, Copy)]
pub struct RecvResult {
    pub len: usize,
    pub from: SocketAddr,
    /// The multicast/unicast address the datagram was addressed to, if the
    /// platform surfaced it via `IP_PKTINFO`.
    pub destination: Option<IpAddr>,
    /// Kernel receive timestamp in nanoseconds since the Unix epoch, if
    /// `SO_TIMESTAMPNS` was available; falls back to `None` so the caller
    /// can substitute a reactor-side timestamp.
    pub received_at_nanos: Option<i128>,
}

impl TimestampedUdpSocket {
    pub fn new(inner: UdpSocket) -> io::Result<Self> {
        enable_timestamping(&inner)?;
        Ok(Self { inner })
    }

    pub async fn send_to(&self, buf: &[u8], target: SocketAddr) -> io::Result<usize> {
        self.inner.send_to(buf, target).await
    }

    /// Awaits readability, then performs a single `recvmsg` decoding both
    /// ancillary messages this module cares about.
    pub async fn recv(&self, buf: &mut [u8]) -> io::Result<RecvResult> {
        loop {
            self.inner.readable().await?;
            match self.try_recv(buf) {
                Ok(result) => return Ok(result),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => continue,
                Err(e) => return Err(e),
            }
        }
    }

    fn try_recv(&self, buf: &mut [u8]) -> io::Result<RecvResult> {
        self.inner.try_io(Interest::READABLE, || recvmsg_with_cmsg(self.inner.as_raw_fd(), buf))
    }
}

#[cfg(target_os = "linux")]
fn enable_timestamping(socket: &UdpSocket) -> io::Result<()> {
    let fd = socket.as_raw_fd();
    let one: libc::c_int = 1;
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_TIMESTAMPNS,
            &one as *const _ as *const libc::c_void,
            mem::size_of::<libc::c_int>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn enable_timestamping(_socket: &UdpSocket) -> io::Result<()> {
    Ok(())
}

#[cfg(target_os = "linux")]
fn recvmsg_with_cmsg(fd: std::os::fd::RawFd, buf: &mut [u8]) -> io::Result<RecvResult> {
    const CMSG_SPACE: usize = 256;
    let mut cmsg_buf = [0u8; CMSG_SPACE];
    let mut iov = libc::iovec {
        iov_base: buf.as_mut_ptr() as *mut libc::c_void,
        iov_len: buf.len(),
    };
    let mut from: MaybeUninit<libc::sockaddr_storage> = MaybeUninit::zeroed();

    let mut msg: libc::msghdr = unsafe { mem::zeroed() };
    msg.msg_name = from.as_mut_ptr() as *mut libc::c_void;
    msg.msg_namelen = mem::size_of::<libc::sockaddr_storage>() as libc::socklen_t;
    msg.msg_iov = &mut iov;
    msg.msg_iovlen = 1;
    msg.msg_control = cmsg_buf.as_mut_ptr() as *mut libc::c_void;
    msg.msg_controllen = cmsg_buf.len();

    let n = unsafe { libc::recvmsg(fd, &mut msg, 0) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }

    let from_addr = unsafe { sockaddr_storage_to_socket_addr(&from.assume_init()) }
        .unwrap_or_else(|| SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0));

    let mut destination = None;
    let mut received_at_nanos = None;

    unsafe {
        let mut cmsg = libc::CMSG_FIRSTHDR(&msg);
        while !cmsg.is_null() {
            let hdr = &*cmsg;
            if hdr.cmsg_level == libc::IPPROTO_IP && hdr.cmsg_type == libc::IP_PKTINFO {
                let info = &*(libc::CMSG_DATA(cmsg) as *const libc::in_pktinfo);
                destination = Some(IpAddr::V4(Ipv4Addr::from(u32::from_be(info.ipi_addr.s_addr))));
            } else if hdr.cmsg_level == libc::SOL_SOCKET && hdr.cmsg_type == libc::SCM_TIMESTAMPNS {
                let ts = &*(libc::CMSG_DATA(cmsg) as *const libc::timespec);
                received_at_nanos = Some(ts.tv_sec as i128 * 1_000_000_000 + ts.tv_nsec as i128);
            }
            cmsg = libc::CMSG_NXTHDR(&msg, cmsg);
        }
    }

    Ok(RecvResult {
        len: n as usize,
        from: from_addr,
        destination,
        received_at_nanos,
    })
}

#[cfg(target_os = "linux")]
unsafe fn sockaddr_storage_to_socket_addr(storage: &libc::sockaddr_storage) -> Option<SocketAddr> {
    match storage.ss_family as libc::c_int {
        libc::AF_INET => {
            let addr: &libc::sockaddr_in = unsafe { &*(storage as *const _ as *const libc::sockaddr_in) };
            let ip = Ipv4Addr::from(u32::from_be(addr.sin_addr.s_addr));
            Some(SocketAddr::new(IpAddr::V4(ip), u16::from_be(addr.sin_port)))
        }
        _ => None,
    }
}

#[cfg(not(target_os = "linux"))]
fn recvmsg_with_cmsg(_fd: std::os::fd::RawFd, _buf: &mut [u8]) -> io::Result<RecvResult> {
    Err(io::Error::other("per-datagram cmsg decoding is only implemented on linux"))
}
