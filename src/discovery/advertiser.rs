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

//! Advertises this node's local sender sessions over DNS-SD and answers
//! DESCRIBE requests for them with their current SDP text.

use super::browser::RAVENNA_SESSION_SERVICE_TYPE;
use crate::{net::DnsSdProvider, rtsp::DescribeHandler};
use std::{collections::HashMap, sync::RwLock};

/// A [`DescribeHandler`] backed by a name -> SDP-text map that senders
/// update whenever their session description changes.
#[derive(Default)]
pub struct SessionRegistry {
    by_path: RwLock<HashMap<String, String>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes (or replaces) the SDP text served at `/by-name/<name>`.
    pub fn publish(&self, name: &str, sdp_text: String) {
        let mut by_path = self.by_path.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        by_path.insert(format!("by-name/{name}"), sdp_text);
    }

    pub fn withdraw(&self, name: &str) {
        let mut by_path = self.by_path.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        by_path.remove(&format!("by-name/{name}"));
    }
}

impl DescribeHandler for SessionRegistry {
    fn describe(&self, uri: &str) -> Option<String> {
        let by_path = self.by_path.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        by_path
            .iter()
            .find(|(key, _)| uri.ends_with(key.as_str()))
            .map(|(_, value)| value.clone())
    }
}

/// Registers `instance_name` for `_ravenna_session._sub._rtsp._tcp` on
/// `port`, so browsers elsewhere on the network can find this node's RTSP
/// server.
pub fn advertise(
    provider: &dyn DnsSdProvider,
    instance_name: &str,
    port: u16,
) -> crate::net::dnssd::DnsSdResult<crate::net::dnssd::SubscriptionHandle> {
    provider.register_service(RAVENNA_SESSION_SERVICE_TYPE, instance_name, port, &HashMap::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_session_is_found_by_suffix_match() {
        let registry = SessionRegistry::new();
        registry.publish("studio-a", "v=0\r\n".to_owned());
        let found = registry.describe("rtsp://10.0.0.1/by-name/studio-a");
        assert_eq!(found.as_deref(), Some("v=0\r\n"));
    }

    #[test]
    fn withdrawn_session_is_no_longer_found() {
        let registry = SessionRegistry::new();
        registry.publish("studio-a", "v=0\r\n".to_owned());
        registry.withdraw("studio-a");
        assert_eq!(registry.describe("rtsp://10.0.0.1/by-name/studio-a"), None);
    }

    #[test]
    fn unknown_session_is_not_found() {
        let registry = SessionRegistry::new();
        assert_eq!(registry.describe("rtsp://10.0.0.1/by-name/unknown"), None);
    }
}
