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

//! The DNS-SD provider is abstracted behind a minimal trait so platform
//! backends (Bonjour/Core Foundation, Avahi, `mdns-sd`) plug in underneath
//! it; callbacks are always delivered hopped onto the reactor thread by the
//! caller, never invoked directly from a provider's own thread.

use std::{collections::HashMap, net::IpAddr};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Error, Debug)]
pub enum DnsSdError {
    #[error("DNS-SD provider error: {0}")]
    Provider(String),
}

pub type DnsSdResult<T> = Result<T, DnsSdError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceInstance {
    pub name: String,
    pub service_type: String,
    pub host_target: String,
    pub port: u16,
    pub txt: HashMap<String, String>,
    pub addresses: Vec<IpAddr>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DnsSdEvent {
    Resolved(ServiceInstance),
    Removed { service_type: String, name: String },
}

/// A handle to a live registration or browse subscription; dropping it
/// does not automatically unregister — call [`DnsSdProvider::stop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(pub u64);

pub trait DnsSdProvider: Send + Sync {
    fn register_service(
        &self,
        service_type: &str,
        name: &str,
        port: u16,
        txt: &HashMap<String, String>,
    ) -> DnsSdResult<SubscriptionHandle>;

    fn browse(&self, service_type: &str) -> DnsSdResult<(SubscriptionHandle, mpsc::UnboundedReceiver<DnsSdEvent>)>;

    fn resolve(&self, service_type: &str, name: &str) -> DnsSdResult<()>;

    fn stop(&self, handle: SubscriptionHandle) -> DnsSdResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_instance_equality_is_structural() {
        let a = ServiceInstance {
            name: "studio-a".into(),
            service_type: "_ravenna_session._sub._rtsp._tcp".into(),
            host_target: "studio-a.local".into(),
            port: 554,
            txt: HashMap::new(),
            addresses: vec!["10.0.0.5".parse().unwrap()],
        };
        let b = a.clone();
        assert_eq!(a, b);
    }
}
