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

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewError {
    #[error("buffer underrun: needed {needed} bytes, have {available}")]
    Underrun { needed: usize, available: usize },
}

/// A bounds-checked, non-owning view over a byte slice with a cursor, used
/// by the PTP message codec and the RTP packet reader. Mirrors the original
/// `BufferView` used throughout the `ravennakit` wire codecs.
#[derive(Debug, Clone, Copy)]
pub struct BufferView<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BufferView<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn as_slice(&self) -> &'a [u8] {
        &self.data[self.pos..]
    }

    fn require(&self, n: usize) -> Result<(), ViewError> {
        if self.remaining() < n {
            Err(ViewError::Underrun {
                needed: n,
                available: self.remaining(),
            })
        } else {
            Ok(())
        }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], ViewError> {
        self.require(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn skip(&mut self, n: usize) -> Result<(), ViewError> {
        self.take(n).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8, ViewError> {
        Ok(self.take(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, ViewError> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16_be(&mut self) -> Result<u16, ViewError> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_i16_be(&mut self) -> Result<i16, ViewError> {
        Ok(self.read_u16_be()? as i16)
    }

    pub fn read_u32_be(&mut self) -> Result<u32, ViewError> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_u64_be(&mut self) -> Result<u64, ViewError> {
        let b = self.take(8)?;
        Ok(u64::from_be_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    pub fn read_i64_be(&mut self) -> Result<i64, ViewError> {
        Ok(self.read_u64_be()? as i64)
    }

    /// Reads a 48-bit unsigned big-endian integer (the PTP timestamp seconds field).
    pub fn read_u48_be(&mut self) -> Result<u64, ViewError> {
        let b = self.take(6)?;
        Ok(u64::from_be_bytes([
            0, 0, b[0], b[1], b[2], b[3], b[4], b[5],
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_fields() {
        let data = [0x00, 0x01, 0x00, 0x00, 0x00, 0x02, 0xff];
        let mut view = BufferView::new(&data);
        assert_eq!(view.read_u16_be().unwrap(), 1);
        assert_eq!(view.read_u32_be().unwrap(), 2);
        assert_eq!(view.read_u8().unwrap(), 0xff);
        assert!(view.read_u8().is_err());
    }

    #[test]
    fn underrun_reports_sizes() {
        let data = [0u8; 1];
        let mut view = BufferView::new(&data);
        let err = view.read_u16_be().unwrap_err();
        assert_eq!(
            err,
            ViewError::Underrun {
                needed: 2,
                available: 1
            }
        );
    }
}
