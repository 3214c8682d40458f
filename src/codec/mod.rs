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

//! Byte-level building blocks shared by the PTP, RTP and SDP codecs: a
//! bounds-checked buffer view, big/little/native endian readers and
//! writers, a packed 24-bit sample type, and the audio byte-order /
//! interleaving transcoder used by the RTP receive path.

mod int24;
mod transcode;
mod view;

pub use int24::Int24;
pub use transcode::{Endian, transcode};
pub use view::{BufferView, ViewError};
