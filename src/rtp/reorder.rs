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

//! A timestamp-indexed circular buffer mapping a window of RTP timestamps
//! to fixed-size frame slots. Doubles as the redundancy-merge point: the
//! first channel to deliver a given timestamp wins the slot, and a later
//! write for the same timestamp is reported as a duplicate rather than
//! overwriting it.

use super::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Written,
    TooOld,
    Duplicate,
}

struct Slot {
    timestamp: u32,
    occupied: bool,
    data: Vec<u8>,
}

pub struct ReorderBuffer {
    frames_per_slot: usize,
    bytes_per_frame: usize,
    capacity_slots: usize,
    slots: Vec<Slot>,
    next_read_ts: Option<u32>,
}

/// Signed circular distance `a - b` for 32-bit wrapping timestamps, with the
/// half-open tie resolved toward "not old" (an exact 2^31 gap reads as
/// ahead, matching the crate-wide wrapping convention).
fn ts_diff(a: u32, b: u32) -> i64 {
    (a.wrapping_sub(b) as i32) as i64
}

impl ReorderBuffer {
    pub fn new(frames_per_slot: usize, capacity_slots: usize, bytes_per_frame: usize) -> Self {
        assert!(frames_per_slot > 0 && capacity_slots > 0 && bytes_per_frame > 0);
        let slot_size = frames_per_slot * bytes_per_frame;
        Self {
            frames_per_slot,
            bytes_per_frame,
            capacity_slots,
            slots: (0..capacity_slots)
                .map(|_| Slot {
                    timestamp: 0,
                    occupied: false,
                    data: vec![0u8; slot_size],
                })
                .collect(),
            next_read_ts: None,
        }
    }

    pub fn next_read_ts(&self) -> Option<u32> {
        self.next_read_ts
    }

    /// Anchors the read cursor the first time a packet arrives; a no-op
    /// afterward.
    pub fn align(&mut self, ts: u32) {
        if self.next_read_ts.is_none() {
            self.next_read_ts = Some(ts);
        }
    }

    fn capacity_frames(&self) -> u32 {
        (self.capacity_slots * self.frames_per_slot) as u32
    }

    fn slot_index(&self, ts: u32) -> usize {
        ((ts % self.capacity_frames()) / self.frames_per_slot as u32) as usize
    }

    /// Writes one packet's worth of frames at `ts`. `payload` must be
    /// exactly `frames_per_slot * bytes_per_frame` bytes.
    pub fn write(&mut self, ts: u32, payload: &[u8]) -> WriteOutcome {
        debug_assert_eq!(payload.len(), self.frames_per_slot * self.bytes_per_frame);

        if let Some(next) = self.next_read_ts {
            let end = ts.wrapping_add(self.frames_per_slot as u32);
            if ts_diff(next, end) >= 0 {
                return WriteOutcome::TooOld;
            }
        }

        let idx = self.slot_index(ts);
        let slot = &mut self.slots[idx];
        if slot.occupied && slot.timestamp == ts {
            return WriteOutcome::Duplicate;
        }
        slot.timestamp = ts;
        slot.occupied = true;
        slot.data.copy_from_slice(payload);
        WriteOutcome::Written
    }

    /// Reads the slot at `at_timestamp` (or the current cursor if `None`),
    /// advancing the cursor by one slot's worth of frames.
    pub fn read(&mut self, at_timestamp: Option<u32>) -> Result<(u32, &[u8])> {
        let ts = match at_timestamp.or(self.next_read_ts) {
            Some(ts) => ts,
            None => return Err(Error::Underrun(0)),
        };
        let idx = self.slot_index(ts);
        let slot = &self.slots[idx];
        if !slot.occupied || slot.timestamp != ts {
            return Err(Error::Underrun(ts));
        }
        self.next_read_ts = Some(ts.wrapping_add(self.frames_per_slot as u32));
        Ok((ts, &slot.data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(frames: usize, bytes_per_frame: usize, fill: u8) -> Vec<u8> {
        vec![fill; frames * bytes_per_frame]
    }

    #[test]
    fn writes_then_reads_in_timestamp_order() {
        let mut buf = ReorderBuffer::new(4, 8, 2);
        buf.align(0);
        assert_eq!(buf.write(0, &payload(4, 2, 1)), WriteOutcome::Written);
        let (ts, data) = buf.read(None).unwrap();
        assert_eq!(ts, 0);
        assert_eq!(data, payload(4, 2, 1).as_slice());
        assert_eq!(buf.next_read_ts(), Some(4));
    }

    #[test]
    fn rejects_a_timestamp_already_behind_the_read_cursor() {
        let mut buf = ReorderBuffer::new(4, 8, 2);
        buf.align(100);
        assert_eq!(buf.write(90, &payload(4, 2, 1)), WriteOutcome::TooOld);
    }

    #[test]
    fn second_write_to_the_same_timestamp_is_a_duplicate() {
        let mut buf = ReorderBuffer::new(4, 8, 2);
        buf.align(0);
        assert_eq!(buf.write(8, &payload(4, 2, 1)), WriteOutcome::Written);
        assert_eq!(buf.write(8, &payload(4, 2, 2)), WriteOutcome::Duplicate);
        let (_, data) = buf.read(Some(8)).unwrap();
        // the first writer's payload wins, the duplicate never overwrote it
        assert_eq!(data, payload(4, 2, 1).as_slice());
    }

    #[test]
    fn reading_an_unwritten_slot_is_an_underrun() {
        let mut buf = ReorderBuffer::new(4, 8, 2);
        buf.align(0);
        assert!(buf.read(Some(12)).is_err());
    }
}
