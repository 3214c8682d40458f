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

//! A fixed-capacity sliding median, used by the PTP servo to reject offset
//! outliers. Grounded on
//! `include/ravennakit/ptp/detail/ptp_stats.hpp`'s `sliding_median`.

use std::collections::VecDeque;

/// Holds the last `capacity` samples and reports their median in O(log n)
/// per push via a sorted side buffer, an insertion-sort-on-push trick that
/// pays off because the windows stay small (51-101 elements).
#[derive(Debug, Clone)]
pub struct SlidingStats {
    capacity: usize,
    order: VecDeque<f64>,
    sorted: Vec<f64>,
}

impl SlidingStats {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sliding stats window must be non-empty");
        Self {
            capacity,
            order: VecDeque::with_capacity(capacity),
            sorted: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.order.len() == self.capacity
    }

    pub fn push(&mut self, value: f64) {
        if self.order.len() == self.capacity {
            let evicted = self.order.pop_front().expect("non-empty");
            let idx = self
                .sorted
                .binary_search_by(|probe| probe.partial_cmp(&evicted).unwrap())
                .unwrap_or_else(|i| i);
            self.sorted.remove(idx);
        }
        self.order.push_back(value);
        let idx = self
            .sorted
            .binary_search_by(|probe| probe.partial_cmp(&value).unwrap())
            .unwrap_or_else(|i| i);
        self.sorted.insert(idx, value);
    }

    pub fn median(&self) -> Option<f64> {
        if self.sorted.is_empty() {
            return None;
        }
        let mid = self.sorted.len() / 2;
        Some(if self.sorted.len() % 2 == 0 {
            (self.sorted[mid - 1] + self.sorted[mid]) / 2.0
        } else {
            self.sorted[mid]
        })
    }

    /// True if `value` deviates from the current median by more than
    /// `threshold`. Returns `false` (never an outlier) while the window has
    /// not yet been observed at all, matching the original's "not calibrated
    /// yet" behaviour.
    pub fn is_outlier(&self, value: f64, threshold: f64) -> bool {
        match self.median() {
            Some(median) => (value - median).abs() > threshold,
            None => false,
        }
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.sorted.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_window() {
        let mut s = SlidingStats::new(5);
        for v in [5.0, 1.0, 4.0, 2.0, 3.0] {
            s.push(v);
        }
        assert_eq!(s.median(), Some(3.0));
    }

    #[test]
    fn evicts_oldest_once_full() {
        let mut s = SlidingStats::new(3);
        for v in [1.0, 1.0, 1.0, 100.0] {
            s.push(v);
        }
        assert_eq!(s.median(), Some(1.0));
        assert!(s.is_full());
    }

    #[test]
    fn flags_values_far_from_median() {
        let mut s = SlidingStats::new(51);
        for _ in 0..51 {
            s.push(0.0);
        }
        assert!(!s.is_outlier(0.0005, 0.0013));
        assert!(s.is_outlier(0.002, 0.0013));
    }

    #[test]
    fn uncalibrated_window_never_flags_outliers() {
        let s = SlidingStats::new(10);
        assert!(!s.is_outlier(1_000_000.0, 0.001));
    }
}
