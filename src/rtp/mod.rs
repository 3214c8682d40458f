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

//! The RTP receive pipeline: a socket pool dispatches datagrams to reader
//! slots, each slot's reorder buffer merges redundant channels and absorbs
//! jitter, and an audio consumer drains the result on the audio thread.
//! Packet parsing itself is `rtp-rs`; everything here is the pipeline built
//! around it.

mod consumer;
mod error;
mod filter;
mod packet;
mod pool;
mod reader;
mod reorder;
mod rtcp;
mod session;
mod stats;

pub use consumer::{AudioConsumer, StreamState, buffer_size_frames, fifo_depth};
pub use error::{Error, Result};
pub use filter::{FilterEntry, FilterMode, SourceFilter};
pub use packet::RtpPacket;
pub use pool::SocketPool;
pub use reader::{DispatchOutcome, IncomingPacket, ReaderSlot, SlotBusy, SlotState};
pub use reorder::{ReorderBuffer, WriteOutcome};
pub use rtcp::{NtpTimestamp, RtcpPacketType, RtcpPacketView};
pub use session::{Channel, Session};
pub use stats::{PacketStats, PacketStatsWindow};
