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

//! Ties DNS-SD, the RTSP client, and the RTSP server together: a browser
//! watches for RAVENNA sessions and drives DESCRIBE requests into a shared
//! session table, while an advertiser publishes this node's own sessions
//! for others to discover and describe in turn.

mod advertiser;
mod browser;
mod orchestrator;

pub use advertiser::{advertise, SessionRegistry};
pub use browser::{RavennaBrowser, RAVENNA_SESSION_SERVICE_TYPE};
pub use orchestrator::{encode_session_name, run, SessionEntry, SessionTable};
