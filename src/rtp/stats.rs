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

//! A rolling window of per-sequence-number receive counters, wrap-aware via
//! [`WrappingU16`]. Tracks gaps (dropped), reordered arrivals, and repeat
//! deliveries of the same sequence number (duplicates).

use crate::{sync::RingBuffer, time::WrappingU16};

struct SeqEntry {
    seq: WrappingU16,
    times_received: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PacketStats {
    pub received: u64,
    pub out_of_order: u64,
    pub too_old: u64,
    pub dropped: u64,
    pub duplicates: u64,
}

pub struct PacketStatsWindow {
    window: RingBuffer<SeqEntry>,
    highest: Option<WrappingU16>,
    stats: PacketStats,
}

impl PacketStatsWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: RingBuffer::new(capacity),
            highest: None,
            stats: PacketStats::default(),
        }
    }

    pub fn stats(&self) -> PacketStats {
        self.stats
    }

    pub fn record_too_old(&mut self, _seq: WrappingU16) {
        self.stats.received += 1;
        self.stats.too_old += 1;
    }

    /// Records an in-window arrival. `seq` is the packet's RTP sequence
    /// number.
    pub fn record(&mut self, seq: WrappingU16) {
        self.stats.received += 1;

        if let Some(index) = self.window.iter().position(|e| e.seq == seq) {
            self.bump_duplicate(index);
            return;
        }

        match self.highest {
            None => {
                self.highest = Some(seq);
            }
            Some(highest) if seq.is_ahead_of(highest) => {
                let gap = seq.diff(highest) - 1;
                if gap > 0 {
                    self.stats.dropped += gap as u64;
                }
                self.highest = Some(seq);
            }
            Some(_) => {
                self.stats.out_of_order += 1;
            }
        }

        let evicted = self.window.push_back(SeqEntry { seq, times_received: 1 });
        let _ = evicted;
    }

    fn bump_duplicate(&mut self, index: usize) {
        // `RingBuffer` exposes only push/pop/front/back/iter, so rebuild the
        // window with the matching entry's counter incremented. The window
        // is small (tens of entries) so this is cheap.
        let mut rebuilt = Vec::with_capacity(self.window.len());
        for (i, entry) in self.window.iter().enumerate() {
            let times_received = if i == index { entry.times_received + 1 } else { entry.times_received };
            if times_received > 1 && i == index {
                self.stats.duplicates += 1;
            }
            rebuilt.push(SeqEntry {
                seq: entry.seq,
                times_received,
            });
        }
        let capacity = self.window.capacity();
        self.window = RingBuffer::new(capacity);
        for entry in rebuilt {
            self.window.push_back(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_order_sequence_has_no_gaps() {
        let mut stats = PacketStatsWindow::new(8);
        for seq in 0..5u16 {
            stats.record(WrappingU16::new(seq));
        }
        assert_eq!(stats.stats().dropped, 0);
        assert_eq!(stats.stats().received, 5);
    }

    #[test]
    fn a_gap_in_sequence_numbers_counts_as_dropped() {
        let mut stats = PacketStatsWindow::new(8);
        stats.record(WrappingU16::new(0));
        stats.record(WrappingU16::new(3));
        assert_eq!(stats.stats().dropped, 2);
    }

    #[test]
    fn repeat_delivery_of_the_same_sequence_counts_as_duplicate() {
        let mut stats = PacketStatsWindow::new(8);
        stats.record(WrappingU16::new(5));
        stats.record(WrappingU16::new(5));
        assert_eq!(stats.stats().duplicates, 1);
    }

    #[test]
    fn too_old_packets_are_counted_separately() {
        let mut stats = PacketStatsWindow::new(8);
        stats.record_too_old(WrappingU16::new(1));
        assert_eq!(stats.stats().too_old, 1);
        assert_eq!(stats.stats().out_of_order, 0);
    }
}
