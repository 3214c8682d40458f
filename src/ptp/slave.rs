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

//! The ordinary-clock PTP slave's reactor loop: foreign-master bookkeeping,
//! BMCA, the Sync/Follow_Up/Delay_Req/Delay_Resp exchange, and the virtual
//! clock servo, wired together and published to the audio thread via an
//! [`Rcu`] snapshot. Grounded on `ptp_instance.hpp` + `ptp_local_ptp_clock.hpp`
//! and the BMCA/servo algorithms.

use super::{
    Error, PTP_EVENT_PORT, PTP_GENERAL_PORT, PTP_MULTICAST_GROUP, PortState, Result,
    foreign_master::{ComparisonDataset, ForeignMasterList, decide_port_state},
    identity::{MessageType, PortIdentity},
    message::{DelayRespBody, Message, TimestampBody},
    servo::VirtualClock,
};
use crate::{
    error::ClockResult,
    formats::{Frames, FramesPerSecond},
    sync::Rcu,
    time::{MediaClock, Timestamp, get_time, to_nanos},
};
use pnet::datalink::NetworkInterface;
use rand::Rng;
use socket2::{Domain, Protocol, Socket, Type};
use std::{net::IpAddr, net::Ipv4Addr, net::SocketAddr, net::SocketAddrV4, sync::Arc, time::Duration};
use tokio::net::UdpSocket;
use tracing::{debug, info, instrument, trace, warn};

/// Snapshot of the virtual clock's reportable state, published to readers.
#[derive(Debug, Clone, Copy)]
struct ClockState {
    last_sync_local_nanos: i128,
    shift_nanos: i128,
    frequency_ratio: f64,
}

const ANNOUNCE_TICK: Duration = Duration::from_secs(2);

/// A running PTP ordinary-clock slave. Implements [`MediaClock`] by
/// extrapolating from the most recently published [`ClockState`].
pub struct PtpSlaveClock {
    state: Arc<Rcu<ClockState>>,
    sample_rate: FramesPerSecond,
}

impl PtpSlaveClock {
    #[instrument(skip(iface), fields(iface = %iface.name))]
    pub async fn start(iface: NetworkInterface, domain: Option<u8>, sample_rate: FramesPerSecond) -> Result<Self> {
        let clock_identity = crate::nic::clock_identity_for_interface(&iface)?;
        let port_identity = PortIdentity::new(clock_identity, 1);
        let domain_number = domain.unwrap_or(0);

        let local_v4 = iface
            .ips
            .iter()
            .find_map(|ipn| match ipn.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .ok_or(Error::NetworkInterfaceNotFound)?;

        let event_socket = bind_multicast_socket(local_v4, PTP_EVENT_PORT)?;
        let general_socket = bind_multicast_socket(local_v4, PTP_GENERAL_PORT)?;

        let state = Arc::new(Rcu::new(ClockState {
            last_sync_local_nanos: to_nanos(get_time(libc::CLOCK_TAI).map_err(|_| Error::FailedToGetNetworkInterfaces)?),
            shift_nanos: 0,
            frequency_ratio: 1.0,
        }));

        info!(%port_identity.clock_identity, domain = domain_number, "starting PTP slave");

        let loop_state = state.clone();
        tokio::spawn(async move {
            run(event_socket, general_socket, port_identity, domain_number, loop_state).await;
        });

        Ok(Self { state, sample_rate })
    }
}

impl MediaClock for PtpSlaveClock {
    fn current_media_time(&mut self) -> ClockResult<Frames> {
        let nanos = self.current_ptp_time_nanos()?;
        Ok(((nanos.max(0) as u128 * self.sample_rate as u128) / super::super::time::NANOS_PER_SEC as u128) as Frames)
    }

    fn current_ptp_time_nanos(&mut self) -> ClockResult<i128> {
        let now_local = to_nanos(get_time(libc::CLOCK_TAI)?);
        let s = self.state.load();
        let advance = ((now_local - s.last_sync_local_nanos) as f64 * s.frequency_ratio) as i128;
        Ok(s.last_sync_local_nanos + advance + s.shift_nanos)
    }
}

fn bind_multicast_socket(local: Ipv4Addr, port: u16) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))
        .map_err(|_| Error::FailedToGetNetworkInterfaces)?;
    socket.set_reuse_address(true).map_err(|_| Error::FailedToGetNetworkInterfaces)?;
    let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
    socket.bind(&addr.into()).map_err(|_| Error::FailedToGetNetworkInterfaces)?;
    socket
        .join_multicast_v4(&PTP_MULTICAST_GROUP, &local)
        .map_err(|_| Error::FailedToGetNetworkInterfaces)?;
    socket.set_nonblocking(true).map_err(|_| Error::FailedToGetNetworkInterfaces)?;
    UdpSocket::from_std(socket.into()).map_err(|_| Error::FailedToGetNetworkInterfaces)
}

struct PendingDelayReq {
    sequence_id: u16,
    t3: Timestamp,
}

/// A Sync exchange in progress: `t2` is the local receive time of the Sync
/// datagram itself; `t1` (the master's origin timestamp) arrives either
/// inline (one-step) or via a matching Follow_Up (two-step) and is `None`
/// until then.
struct PendingSync {
    header: super::MessageHeader,
    t1: Option<Timestamp>,
    t2: Timestamp,
}

#[instrument(skip_all, fields(domain = domain_number))]
async fn run(
    event_socket: UdpSocket,
    general_socket: UdpSocket,
    local_port_identity: PortIdentity,
    domain_number: u8,
    state: Arc<Rcu<ClockState>>,
) {
    let mut foreign_masters = ForeignMasterList::new();
    let mut port_state = PortState::Listening;
    let mut current_best: Option<PortIdentity> = None;
    let mut servo = VirtualClock::new();
    let mut pending_sync: Option<PendingSync> = None;
    let mut pending_delay_req: Option<PendingDelayReq> = None;
    let mut sequence_id: u16 = rand::rng().random();

    let mut announce_tick = tokio::time::interval(ANNOUNCE_TICK);
    let mut event_buf = [0u8; 128];
    let mut general_buf = [0u8; 128];

    loop {
        tokio::select! {
            _ = announce_tick.tick() => {
                foreign_masters.increase_age_and_purge(current_best);
                let best = foreign_masters.best_qualified();
                current_best = best.map(|r| r.port_identity);
                let dataset = best.map(|r| r.dataset);
                let new_state = decide_port_state(dataset.as_ref(), false);
                if new_state != port_state {
                    debug!(?port_state, ?new_state, "PTP port state transition");
                    port_state = new_state;
                }
            }
            recv = event_socket.recv_from(&mut event_buf) => {
                let Ok((len, _from)) = recv else { continue };
                let t2 = match get_time(libc::CLOCK_TAI) {
                    Ok(tp) => Timestamp::from_nanos(to_nanos(tp)),
                    Err(_) => continue,
                };
                handle_event_message(
                    &event_buf[..len],
                    t2,
                    domain_number,
                    local_port_identity,
                    &event_socket,
                    &mut pending_sync,
                    &mut pending_delay_req,
                    &mut sequence_id,
                ).await;
            }
            recv = general_socket.recv_from(&mut general_buf) => {
                let Ok((len, _from)) = recv else { continue };
                handle_general_message(
                    &general_buf[..len],
                    domain_number,
                    local_port_identity,
                    &event_socket,
                    &mut foreign_masters,
                    &mut pending_sync,
                    &mut pending_delay_req,
                    &mut sequence_id,
                    &mut servo,
                    &state,
                ).await;
            }
        }
    }
}

fn passes_inbound_filter(header: &super::MessageHeader, domain_number: u8, local: PortIdentity) -> bool {
    if header.domain_number != domain_number {
        return false;
    }
    if header.source_port_identity.clock_identity == local.clock_identity {
        return false;
    }
    if header.flags.alternate_master {
        return false;
    }
    true
}

#[allow(clippy::too_many_arguments)]
async fn handle_event_message(
    data: &[u8],
    t2: Timestamp,
    domain_number: u8,
    local: PortIdentity,
    event_socket: &UdpSocket,
    pending_sync: &mut Option<PendingSync>,
    pending_delay_req: &mut Option<PendingDelayReq>,
    sequence_id: &mut u16,
) {
    let Ok(message) = Message::parse(data) else {
        trace!("dropping malformed PTP event message");
        return;
    };
    if !passes_inbound_filter(message.header(), domain_number, local) {
        return;
    }

    if let Message::Sync(header, body) = message {
        if header.flags.two_step {
            *pending_sync = Some(PendingSync {
                header,
                t1: None,
                t2,
            });
        } else {
            let t1 = Timestamp::from_nanos(body.timestamp.to_nanos() + header.correction_field / 65_536);
            *pending_sync = Some(PendingSync {
                header,
                t1: Some(t1),
                t2,
            });
            send_delay_req(event_socket, local, sequence_id, pending_delay_req).await;
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn handle_general_message(
    data: &[u8],
    domain_number: u8,
    local: PortIdentity,
    event_socket: &UdpSocket,
    foreign_masters: &mut ForeignMasterList,
    pending_sync: &mut Option<PendingSync>,
    pending_delay_req: &mut Option<PendingDelayReq>,
    sequence_id: &mut u16,
    servo: &mut VirtualClock,
    state: &Arc<Rcu<ClockState>>,
) {
    let Ok(message) = Message::parse(data) else {
        trace!("dropping malformed PTP general message");
        return;
    };
    if !passes_inbound_filter(message.header(), domain_number, local) {
        return;
    }

    match message {
        Message::Announce(header, body) => {
            let dataset = ComparisonDataset::from_announce(&body, header.source_port_identity);
            foreign_masters.add_or_update_entry(header.source_port_identity, dataset);
        }
        Message::FollowUp(header, body) => {
            let Some(sync) = pending_sync.as_mut() else {
                return;
            };
            if !sync.header.matches(&header) {
                return;
            }
            let t1 = Timestamp::from_nanos(body.timestamp.to_nanos() + header.correction_field / 65_536);
            sync.t1 = Some(t1);
            send_delay_req(event_socket, local, sequence_id, pending_delay_req).await;
        }
        Message::DelayResp(header, DelayRespBody {
            receive_timestamp,
            requesting_port_identity,
        }) => {
            if requesting_port_identity != local {
                return;
            }
            let Some(req) = pending_delay_req.take() else {
                return;
            };
            if header.sequence_id.0 != req.sequence_id {
                return;
            }
            let Some(sync) = pending_sync.take() else {
                return;
            };
            let Some(t1) = sync.t1 else {
                return;
            };
            let t4 = receive_timestamp;
            let (mean_path_delay, offset) = compute_offset(t1, sync.t2, req.t3, t4);
            let _ = mean_path_delay;
            let outcome = servo.adjust(offset as f64 / 1e9, to_nanos_now());
            trace!(?outcome, offset, "PTP offset sample applied");
            state.update(ClockState {
                last_sync_local_nanos: to_nanos_now(),
                shift_nanos: servo.shift_nanos(),
                frequency_ratio: servo.frequency_ratio(),
            });
        }
        _ => {}
    }
}

fn to_nanos_now() -> i128 {
    get_time(libc::CLOCK_TAI).map(to_nanos).unwrap_or(0)
}

async fn send_delay_req(
    event_socket: &UdpSocket,
    local: PortIdentity,
    sequence_id: &mut u16,
    pending_delay_req: &mut Option<PendingDelayReq>,
) {
    let seq = *sequence_id;
    *sequence_id = sequence_id.wrapping_add(1);

    let header = super::MessageHeader {
        sdo_id: super::SdoId::DEFAULT,
        message_type: MessageType::DelayReq,
        version: super::Version { major: 2, minor: 1 },
        message_length: (super::message::HEADER_SIZE + 10) as u16,
        domain_number: 0,
        flags: super::FlagField::default(),
        correction_field: 0,
        source_port_identity: local,
        sequence_id: crate::time::WrappingU16::new(seq),
        control_field: 1,
        log_message_interval: 0x7f,
    };
    let body = TimestampBody {
        timestamp: Timestamp::new(0, 0),
    };
    let mut buf = Vec::with_capacity(super::message::HEADER_SIZE + 10);
    Message::DelayReq(header, body).write_to(&mut buf);

    let dest = SocketAddr::V4(SocketAddrV4::new(PTP_MULTICAST_GROUP, PTP_EVENT_PORT));
    let t3 = Timestamp::from_nanos(to_nanos_now());
    if let Err(e) = event_socket.send_to(&buf, dest).await {
        warn!("failed to send PTP Delay_Req: {e}");
        return;
    }
    *pending_delay_req = Some(PendingDelayReq { sequence_id: seq, t3 });
}

/// `meanPathDelay = ((T2-T1) + (T4-T3)) / 2`, `offsetFromMaster = (T2-T1) - meanPathDelay`.
fn compute_offset(t1: Timestamp, t2: Timestamp, t3: Timestamp, t4: Timestamp) -> (i128, i128) {
    let t2_minus_t1 = t2 - t1;
    let t4_minus_t3 = t4 - t3;
    let mean_path_delay = (t2_minus_t1 + t4_minus_t3) / 2;
    let offset = t2_minus_t1 - mean_path_delay;
    (mean_path_delay, offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offset_and_delay_match_textbook_example() {
        let t1 = Timestamp::new(100, 0);
        let t2 = Timestamp::new(100, 1_000_100);
        let t3 = Timestamp::new(100, 2_000_000);
        let t4 = Timestamp::new(100, 3_000_200);
        let (delay, offset) = compute_offset(t1, t2, t3, t4);
        assert_eq!(delay, 100);
        assert_eq!(offset, 1_000_000);
    }
}
