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

//! A session identifies one physical network leg of a stream; a logical
//! (redundant) receiver owns up to *N* sessions, one per channel, each with
//! its own source filter.

use super::filter::SourceFilter;
use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Session {
    pub connection_address: IpAddr,
    pub rtp_port: u16,
    pub rtcp_port: u16,
}

#[derive(Debug, Clone)]
pub struct Channel {
    pub session: Session,
    pub filter: SourceFilter,
}

impl Channel {
    pub fn matches(&self, destination: IpAddr, port: u16, source: IpAddr) -> bool {
        self.session.connection_address == destination && self.session.rtp_port == port && self.filter.accepts(source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_requires_all_three_fields_to_match() {
        let a = Session {
            connection_address: IpAddr::V4(std::net::Ipv4Addr::new(239, 1, 1, 1)),
            rtp_port: 5004,
            rtcp_port: 5005,
        };
        let mut b = a;
        assert_eq!(a, b);
        b.rtcp_port = 5006;
        assert_ne!(a, b);
    }

    #[test]
    fn channel_matches_destination_port_and_source() {
        let session = Session {
            connection_address: IpAddr::V4(std::net::Ipv4Addr::new(239, 1, 1, 1)),
            rtp_port: 5004,
            rtcp_port: 5005,
        };
        let channel = Channel {
            session,
            filter: SourceFilter::accept_all(),
        };
        let source = IpAddr::V4(std::net::Ipv4Addr::new(10, 0, 0, 5));
        assert!(channel.matches(session.connection_address, 5004, source));
        assert!(!channel.matches(session.connection_address, 5005, source));
    }
}
