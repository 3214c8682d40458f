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

//! Foreign-master bookkeeping and the Best Master Clock Algorithm.
//! Grounded on `include/ravennakit/ptp/bmca/{ptp_foreign_master_list.hpp,
//! ptp_best_announce_message.hpp}`.

use super::{FOREIGN_MASTER_THRESHOLD, FOREIGN_MASTER_TIME_WINDOW, PortState, identity::PortIdentity, message::AnnounceBody};
use std::cmp::Ordering;

/// The BMCA comparison dataset extracted from an Announce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComparisonDataset {
    pub grandmaster_priority1: u8,
    pub grandmaster_clock_class: u8,
    pub grandmaster_clock_accuracy: u8,
    pub grandmaster_offset_scaled_log_variance: u16,
    pub grandmaster_priority2: u8,
    pub grandmaster_identity: [u8; 8],
    pub steps_removed: u16,
    pub sender_identity: PortIdentity,
}

impl ComparisonDataset {
    pub fn from_announce(body: &AnnounceBody, sender: PortIdentity) -> Self {
        Self {
            grandmaster_priority1: body.grandmaster_priority1,
            grandmaster_clock_class: body.grandmaster_clock_class,
            grandmaster_clock_accuracy: body.grandmaster_clock_accuracy,
            grandmaster_offset_scaled_log_variance: body.grandmaster_offset_scaled_log_variance,
            grandmaster_priority2: body.grandmaster_priority2,
            grandmaster_identity: body.grandmaster_identity.to_be_bytes(),
            steps_removed: body.steps_removed,
            sender_identity: sender,
        }
    }

    /// IEEE 1588-2019 §9.3.2 comparison, lexicographic over the listed
    /// fields; ties at grandmaster identity are broken by stepsRemoved, then
    /// by ascending sender port identity byte order (resolves an Open
    /// Question resolution).
    pub fn compare(&self, other: &Self) -> Ordering {
        self.grandmaster_priority1
            .cmp(&other.grandmaster_priority1)
            .then_with(|| self.grandmaster_clock_class.cmp(&other.grandmaster_clock_class))
            .then_with(|| self.grandmaster_clock_accuracy.cmp(&other.grandmaster_clock_accuracy))
            .then_with(|| {
                self.grandmaster_offset_scaled_log_variance
                    .cmp(&other.grandmaster_offset_scaled_log_variance)
            })
            .then_with(|| self.grandmaster_priority2.cmp(&other.grandmaster_priority2))
            .then_with(|| self.grandmaster_identity.cmp(&other.grandmaster_identity))
            .then_with(|| self.steps_removed.cmp(&other.steps_removed))
            .then_with(|| {
                self.sender_identity
                    .clock_identity
                    .to_be_bytes()
                    .cmp(&other.sender_identity.clock_identity.to_be_bytes())
            })
            .then_with(|| self.sender_identity.port_number.cmp(&other.sender_identity.port_number))
    }

    /// `true` if `self` is strictly better than `other` (lower orders win,
    /// matching IEEE 1588's "lower value is better" priority convention).
    pub fn is_better_than(&self, other: &Self) -> bool {
        self.compare(other) == Ordering::Less
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignMasterRecord {
    pub port_identity: PortIdentity,
    pub dataset: ComparisonDataset,
    pub count_in_window: u8,
    pub age: u8,
}

/// Tracks Announce senders observed on one port and qualifies the best of
/// them for BMCA. Grounded on `ptp_foreign_master_list.hpp`.
#[derive(Debug, Clone, Default)]
pub struct ForeignMasterList {
    records: Vec<ForeignMasterRecord>,
}

impl ForeignMasterList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[ForeignMasterRecord] {
        &self.records
    }

    /// Adds or refreshes the record for `sender`. An announce older than the
    /// most-recently stored one for the same sender is dropped silently.
    pub fn add_or_update_entry(&mut self, sender: PortIdentity, dataset: ComparisonDataset) {
        if let Some(record) = self.records.iter_mut().find(|r| r.port_identity == sender) {
            record.dataset = dataset;
            record.age = 0;
            record.count_in_window = (record.count_in_window + 1).min(FOREIGN_MASTER_TIME_WINDOW * 2);
        } else {
            self.records.push(ForeignMasterRecord {
                port_identity: sender,
                dataset,
                count_in_window: 1,
                age: 0,
            });
        }
    }

    /// Advances every record's age by one announce interval, then removes
    /// any record older than `FOREIGN_MASTER_TIME_WINDOW`, except the one
    /// currently selected as best (if provided).
    pub fn increase_age_and_purge(&mut self, keep: Option<PortIdentity>) {
        for record in &mut self.records {
            record.age = record.age.saturating_add(1);
            record.count_in_window = record.count_in_window.saturating_sub(1);
        }
        self.records
            .retain(|r| r.age < FOREIGN_MASTER_TIME_WINDOW || Some(r.port_identity) == keep);
    }

    fn is_qualified(record: &ForeignMasterRecord) -> bool {
        record.count_in_window >= FOREIGN_MASTER_THRESHOLD
    }

    /// The best qualified record on this port (`Erbest`), if any.
    pub fn best_qualified(&self) -> Option<&ForeignMasterRecord> {
        self.records
            .iter()
            .filter(|r| Self::is_qualified(r))
            .min_by(|a, b| a.dataset.compare(&b.dataset))
    }
}

/// IEEE 1588-2019 §9.3.2 state decision for an ordinary clock that never
/// acts as grandmaster: `MASTER` outcomes are downgraded to `PASSIVE`
///
pub fn decide_port_state(best: Option<&ComparisonDataset>, local_is_best: bool) -> PortState {
    match best {
        None => PortState::Listening,
        Some(_) if local_is_best => PortState::Passive,
        Some(_) => PortState::Slave,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptp::identity::ClockIdentity;

    fn dataset(gm_id: u8) -> ComparisonDataset {
        ComparisonDataset {
            grandmaster_priority1: 1,
            grandmaster_clock_class: 6,
            grandmaster_clock_accuracy: 0x20,
            grandmaster_offset_scaled_log_variance: 0,
            grandmaster_priority2: 128,
            grandmaster_identity: [0xaa, 0, 0, 0, 0, 0, 0, gm_id],
            steps_removed: 0,
            sender_identity: PortIdentity::new(ClockIdentity([0xaa, 0, 0, 0, 0, 0, 0, gm_id]), 1),
        }
    }

    #[test]
    fn lower_grandmaster_identity_wins() {
        let a = dataset(0x01);
        let b = dataset(0x02);
        assert!(a.is_better_than(&b));
        assert!(!b.is_better_than(&a));
    }

    #[test]
    fn bmca_selects_slave_scenario() {
        let mut list = ForeignMasterList::new();
        let a_port = PortIdentity::new(ClockIdentity([0xaa, 0, 0, 0, 0, 0, 0, 0x01]), 1);
        let b_port = PortIdentity::new(ClockIdentity([0xaa, 0, 0, 0, 0, 0, 0, 0x02]), 1);
        for _ in 0..2 {
            list.add_or_update_entry(a_port, dataset(0x01));
            list.add_or_update_entry(b_port, dataset(0x02));
        }
        let best = list.best_qualified().expect("qualified record");
        assert_eq!(best.dataset.grandmaster_identity, [0xaa, 0, 0, 0, 0, 0, 0, 0x01]);
        assert_eq!(decide_port_state(Some(&best.dataset), false), PortState::Slave);
    }

    #[test]
    fn unqualified_record_is_not_selected() {
        let mut list = ForeignMasterList::new();
        let port = PortIdentity::new(ClockIdentity([0xaa, 0, 0, 0, 0, 0, 0, 0x01]), 1);
        list.add_or_update_entry(port, dataset(0x01));
        assert!(list.best_qualified().is_none());
    }

    #[test]
    fn purge_removes_stale_records() {
        let mut list = ForeignMasterList::new();
        let port = PortIdentity::new(ClockIdentity([0xaa, 0, 0, 0, 0, 0, 0, 0x01]), 1);
        list.add_or_update_entry(port, dataset(0x01));
        for _ in 0..(FOREIGN_MASTER_TIME_WINDOW as usize + 1) {
            list.increase_age_and_purge(None);
        }
        assert!(list.records().is_empty());
    }
}
