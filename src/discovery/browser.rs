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

//! Subscribes to the RAVENNA session DNS-SD subtype and forwards resolved
//! and removed instances, as a thin wrapper over [`crate::net::DnsSdProvider`].

use crate::net::{DnsSdEvent, DnsSdProvider, SubscriptionHandle};
use std::sync::Arc;
use tokio::sync::mpsc;

pub const RAVENNA_SESSION_SERVICE_TYPE: &str = "_ravenna_session._sub._rtsp._tcp.local.";

pub struct RavennaBrowser {
    provider: Arc<dyn DnsSdProvider>,
    handle: SubscriptionHandle,
}

impl RavennaBrowser {
    pub fn start(provider: Arc<dyn DnsSdProvider>) -> crate::net::dnssd::DnsSdResult<(Self, mpsc::UnboundedReceiver<DnsSdEvent>)> {
        let (handle, rx) = provider.browse(RAVENNA_SESSION_SERVICE_TYPE)?;
        Ok((Self { provider, handle }, rx))
    }
}

impl Drop for RavennaBrowser {
    fn drop(&mut self) {
        let _ = self.provider.stop(self.handle);
    }
}
