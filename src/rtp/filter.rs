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

//! An ordered per-session source filter. Exclude rules always win over
//! include rules, regardless of list order.

use std::net::IpAddr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    Include,
    Exclude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterEntry {
    pub mode: FilterMode,
    pub address: IpAddr,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceFilter {
    entries: Vec<FilterEntry>,
}

impl SourceFilter {
    pub fn new(entries: Vec<FilterEntry>) -> Self {
        Self { entries }
    }

    /// An empty filter accepts every source.
    pub fn accept_all() -> Self {
        Self::default()
    }

    /// Any `exclude` match rejects outright; otherwise, if any `include`
    /// rules exist, acceptance requires at least one match among them; an
    /// empty filter (or one with no `include` rules) accepts everything not
    /// already excluded.
    pub fn accepts(&self, source: IpAddr) -> bool {
        if self
            .entries
            .iter()
            .any(|e| e.mode == FilterMode::Exclude && e.address == source)
        {
            return false;
        }
        let includes: Vec<&FilterEntry> = self.entries.iter().filter(|e| e.mode == FilterMode::Include).collect();
        if includes.is_empty() {
            return true;
        }
        includes.iter().any(|e| e.address == source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(a: u8, b: u8, c: u8, d: u8) -> IpAddr {
        IpAddr::V4(std::net::Ipv4Addr::new(a, b, c, d))
    }

    #[test]
    fn empty_filter_accepts_everything() {
        assert!(SourceFilter::accept_all().accepts(ip(10, 0, 0, 1)));
    }

    #[test]
    fn include_only_requires_a_match() {
        let filter = SourceFilter::new(vec![FilterEntry {
            mode: FilterMode::Include,
            address: ip(10, 0, 0, 1),
        }]);
        assert!(filter.accepts(ip(10, 0, 0, 1)));
        assert!(!filter.accepts(ip(10, 0, 0, 2)));
    }

    #[test]
    fn exclude_wins_over_include_of_the_same_address() {
        let filter = SourceFilter::new(vec![
            FilterEntry {
                mode: FilterMode::Include,
                address: ip(10, 0, 0, 1),
            },
            FilterEntry {
                mode: FilterMode::Exclude,
                address: ip(10, 0, 0, 1),
            },
        ]);
        assert!(!filter.accepts(ip(10, 0, 0, 1)));
    }

    #[test]
    fn exclude_only_rejects_just_the_named_address() {
        let filter = SourceFilter::new(vec![FilterEntry {
            mode: FilterMode::Exclude,
            address: ip(10, 0, 0, 1),
        }]);
        assert!(!filter.accepts(ip(10, 0, 0, 1)));
        assert!(filter.accepts(ip(10, 0, 0, 2)));
    }
}
