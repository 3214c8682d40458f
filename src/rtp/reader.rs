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

//! A reader slot: up to *N* `(session, filter)` channels, one per
//! redundancy leg, guarded by an [`AtomicRwLock`] so the network thread and
//! audio thread only ever take shared locks while the orchestration thread
//! exclusively mutates the channel set during add/remove.

use super::session::Channel;
use crate::{
    sync::{AtomicRwLock, SpscSender},
    time::WrappingU16,
};
use std::{cell::UnsafeCell, net::IpAddr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotState {
    Free,
    Adding,
    Ready,
    Removing,
}

#[derive(Debug, Clone)]
pub struct IncomingPacket {
    pub payload: Vec<u8>,
    pub rtp_timestamp: u32,
    pub sequence_number: WrappingU16,
    pub packet_time_frames: usize,
    pub received_at_nanos: Option<i128>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    NoMatch,
    FifoFull,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotBusy;

struct SlotData {
    state: SlotState,
    channels: Vec<Channel>,
    fifo: Option<SpscSender<IncomingPacket>>,
}

pub struct ReaderSlot {
    lock: AtomicRwLock,
    data: UnsafeCell<SlotData>,
}

// SAFETY: all access to `data` happens while holding `lock` in the matching
// mode (shared for reads, exclusive for the single add/remove mutator).
unsafe impl Sync for ReaderSlot {}

impl Default for ReaderSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderSlot {
    pub fn new() -> Self {
        Self {
            lock: AtomicRwLock::new(),
            data: UnsafeCell::new(SlotData {
                state: SlotState::Free,
                channels: Vec::new(),
                fifo: None,
            }),
        }
    }

    pub fn state(&self) -> SlotState {
        self.lock.lock_shared();
        let state = unsafe { (*self.data.get()).state };
        self.lock.unlock_shared();
        state
    }

    /// Begins serving `channels` through `fifo`. Fails if the slot isn't
    /// free.
    pub fn add(&self, channels: Vec<Channel>, fifo: SpscSender<IncomingPacket>) -> Result<(), SlotBusy> {
        self.lock.lock_exclusive();
        let result = unsafe {
            let data = &mut *self.data.get();
            if data.state != SlotState::Free {
                Err(SlotBusy)
            } else {
                data.state = SlotState::Adding;
                data.channels = channels;
                data.fifo = Some(fifo);
                data.state = SlotState::Ready;
                Ok(())
            }
        };
        self.lock.unlock_exclusive();
        result
    }

    /// Tears the slot down, returning it to `Free`. A no-op if already free.
    pub fn remove(&self) {
        self.lock.lock_exclusive();
        unsafe {
            let data = &mut *self.data.get();
            if data.state != SlotState::Free {
                data.state = SlotState::Removing;
                data.channels.clear();
                data.fifo = None;
                data.state = SlotState::Free;
            }
        }
        self.lock.unlock_exclusive();
    }

    /// Dispatches one datagram to this slot's channels, if ready and
    /// matching. Never blocks: a contended lock is reported as `Skipped`.
    pub fn dispatch(&self, destination: IpAddr, port: u16, source: IpAddr, packet: &IncomingPacket) -> DispatchOutcome {
        if !self.lock.try_lock_shared() {
            return DispatchOutcome::Skipped;
        }
        let outcome = unsafe {
            let data = &*self.data.get();
            if data.state != SlotState::Ready {
                DispatchOutcome::Skipped
            } else if !data.channels.iter().any(|c| c.matches(destination, port, source)) {
                DispatchOutcome::NoMatch
            } else {
                match &data.fifo {
                    Some(fifo) => match fifo.try_push(packet.clone()) {
                        Ok(()) => DispatchOutcome::Delivered,
                        Err(_) => DispatchOutcome::FifoFull,
                    },
                    None => DispatchOutcome::Skipped,
                }
            }
        };
        self.lock.unlock_shared();
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{rtp::filter::SourceFilter, rtp::session::Session, sync::spsc};
    use std::net::Ipv4Addr;

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

    fn sample_packet() -> IncomingPacket {
        IncomingPacket {
            payload: vec![0u8; 8],
            rtp_timestamp: 0,
            sequence_number: WrappingU16::new(0),
            packet_time_frames: 48,
            received_at_nanos: None,
        }
    }

    #[test]
    fn starts_free_and_rejects_dispatch() {
        let slot = ReaderSlot::new();
        assert_eq!(slot.state(), SlotState::Free);
        let destination = IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1));
        let source = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(slot.dispatch(destination, 5004, source, &sample_packet()), DispatchOutcome::Skipped);
    }

    #[test]
    fn ready_slot_delivers_matching_datagrams() {
        let slot = ReaderSlot::new();
        let (tx, rx) = spsc(4);
        slot.add(vec![sample_channel(5004)], tx).unwrap();
        assert_eq!(slot.state(), SlotState::Ready);

        let destination = IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1));
        let source = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(
            slot.dispatch(destination, 5004, source, &sample_packet()),
            DispatchOutcome::Delivered
        );
        assert!(rx.try_pop().is_some());
    }

    #[test]
    fn non_matching_port_is_not_delivered() {
        let slot = ReaderSlot::new();
        let (tx, _rx) = spsc(4);
        slot.add(vec![sample_channel(5004)], tx).unwrap();
        let destination = IpAddr::V4(Ipv4Addr::new(239, 1, 1, 1));
        let source = IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1));
        assert_eq!(
            slot.dispatch(destination, 5006, source, &sample_packet()),
            DispatchOutcome::NoMatch
        );
    }

    #[test]
    fn remove_returns_the_slot_to_free() {
        let slot = ReaderSlot::new();
        let (tx, _rx) = spsc(4);
        slot.add(vec![sample_channel(5004)], tx).unwrap();
        slot.remove();
        assert_eq!(slot.state(), SlotState::Free);
    }

    #[test]
    fn adding_to_a_non_free_slot_fails() {
        let slot = ReaderSlot::new();
        let (tx, _rx) = spsc(4);
        slot.add(vec![sample_channel(5004)], tx).unwrap();
        let (tx2, _rx2) = spsc(4);
        assert_eq!(slot.add(vec![sample_channel(5006)], tx2), Err(SlotBusy));
    }
}
