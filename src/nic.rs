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

use crate::{
    error::{ConfigError, ConfigResult},
    ptp::{Error as PtpError, identity::ClockIdentity},
};
use pnet::datalink::{self, MacAddr, NetworkInterface};
use std::{io, net::IpAddr, path::PathBuf, process::Command};

/// `Some("/dev/ptpX")` if the interface exposes a PTP hardware clock.
pub fn phc_device_for_interface(iface: &NetworkInterface) -> io::Result<Option<PathBuf>> {
    let output = Command::new("ethtool").arg("-T").arg(&iface.name).output()?;

    if !output.status.success() {
        return Err(io::Error::other(format!("ethtool failed for {}", iface.name)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    for line in stdout.lines() {
        if let Some(idx_str) = line.strip_prefix("Hardware timestamp provider index:") {
            if let Ok(idx) = idx_str.trim().parse::<u32>() {
                return Ok(Some(PathBuf::from(format!("/dev/ptp{idx}"))));
            }
        }
    }
    Ok(None)
}

pub fn find_ptp_interfaces() -> Vec<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .filter(|iface| matches!(phc_device_for_interface(iface), Ok(Some(_))))
        .collect()
}

pub fn find_nic_with_name(name: &str) -> ConfigResult<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| ConfigError::NoSuchNic(name.to_owned()))
}

pub fn find_nic_for_ip(ip: IpAddr) -> ConfigResult<NetworkInterface> {
    datalink::interfaces()
        .into_iter()
        .find(|iface| iface.ips.iter().any(|ipn| ipn.ip() == ip))
        .ok_or_else(|| ConfigError::NoSuchNic(ip.to_string()))
}

/// Derives a PTP `ClockIdentity` from a NIC's MAC address using the
/// EUI-48-to-EUI-64 conversion IEEE 1588 mandates (`ptp_clock_identity.hpp`:
/// insert `0xff 0xfe` between the OUI and the NIC-specific bytes).
pub fn clock_identity_for_interface(iface: &NetworkInterface) -> Result<ClockIdentity, PtpError> {
    let mac = iface.mac.ok_or(PtpError::NoMacAddressAvailable)?;
    Ok(ClockIdentity::from_eui48(mac_octets(mac)))
}

fn mac_octets(mac: MacAddr) -> [u8; 6] {
    [mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_name_is_an_error() {
        assert!(find_nic_with_name("definitely-not-a-real-nic-0").is_err());
    }
}
