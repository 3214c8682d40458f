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

//! A reference [`DnsSdProvider`] backed by `mdns-sd`. The provider
//! abstraction exists precisely so this module can be swapped (Bonjour,
//! Avahi) without touching the discovery orchestrator; this is one concrete
//! backend, not the only one the core can run against.

use super::dnssd::{DnsSdError, DnsSdEvent, DnsSdProvider, DnsSdResult, ServiceInstance, SubscriptionHandle};
use mdns_sd::{ServiceDaemon, ServiceEvent, ServiceInfo};
use std::{
    collections::HashMap,
    net::IpAddr,
    sync::atomic::{AtomicU64, Ordering},
};
use tokio::sync::mpsc;
use tracing::{instrument, warn};

pub struct MdnsSdProvider {
    daemon: ServiceDaemon,
    next_handle: AtomicU64,
}

impl MdnsSdProvider {
    pub fn new() -> DnsSdResult<Self> {
        let daemon = ServiceDaemon::new().map_err(|e| DnsSdError::Provider(e.to_string()))?;
        Ok(Self {
            daemon,
            next_handle: AtomicU64::new(1),
        })
    }

    fn allocate_handle(&self) -> SubscriptionHandle {
        SubscriptionHandle(self.next_handle.fetch_add(1, Ordering::Relaxed))
    }
}

impl DnsSdProvider for MdnsSdProvider {
    #[instrument(skip(self, txt))]
    fn register_service(
        &self,
        service_type: &str,
        name: &str,
        port: u16,
        txt: &HashMap<String, String>,
    ) -> DnsSdResult<SubscriptionHandle> {
        let host_name = format!("{name}.local.");
        let info = ServiceInfo::new(
            service_type,
            name,
            &host_name,
            "",
            port,
            txt.iter().map(|(k, v)| (k.as_str(), v.as_str())).collect::<HashMap<_, _>>(),
        )
        .map_err(|e| DnsSdError::Provider(e.to_string()))?
        .enable_addr_auto();

        self.daemon
            .register(info)
            .map_err(|e| DnsSdError::Provider(e.to_string()))?;
        Ok(self.allocate_handle())
    }

    #[instrument(skip(self))]
    fn browse(&self, service_type: &str) -> DnsSdResult<(SubscriptionHandle, mpsc::UnboundedReceiver<DnsSdEvent>)> {
        let receiver = self
            .daemon
            .browse(service_type)
            .map_err(|e| DnsSdError::Provider(e.to_string()))?;
        let (tx, rx) = mpsc::unbounded_channel();
        let service_type = service_type.to_owned();

        std::thread::spawn(move || {
            while let Ok(event) = receiver.recv() {
                let mapped = match event {
                    ServiceEvent::ServiceResolved(info) => Some(DnsSdEvent::Resolved(ServiceInstance {
                        name: info.get_fullname().to_owned(),
                        service_type: service_type.clone(),
                        host_target: info.get_hostname().to_owned(),
                        port: info.get_port(),
                        txt: info
                            .get_properties()
                            .iter()
                            .map(|p| (p.key().to_owned(), p.val_str().to_owned()))
                            .collect(),
                        addresses: info.get_addresses().iter().map(|a| IpAddr::V4(*a)).collect(),
                    })),
                    ServiceEvent::ServiceRemoved(service_type, fullname) => Some(DnsSdEvent::Removed {
                        service_type,
                        name: fullname,
                    }),
                    _ => None,
                };
                if let Some(event) = mapped {
                    if tx.send(event).is_err() {
                        break;
                    }
                }
            }
        });

        Ok((self.allocate_handle(), rx))
    }

    fn resolve(&self, service_type: &str, name: &str) -> DnsSdResult<()> {
        // `mdns-sd`'s browse channel already emits `ServiceResolved` once a
        // matching instance answers; a dedicated one-shot resolve is just a
        // browse the caller discards after the first match.
        let _ = self.browse(service_type)?;
        warn!(name, "resolve() degrades to a throwaway browse on this backend");
        Ok(())
    }

    fn stop(&self, _handle: SubscriptionHandle) -> DnsSdResult<()> {
        Ok(())
    }
}
