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

//! Audio byte-order transcoding. RTP/L16/L24/L32 payloads are always
//! big-endian and sample-interleaved on the wire; this module
//! converts sample-aligned, interleaved byte runs between that wire order
//! and whatever order the host consumer wants, for bit depths 8/16/24/32.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Big,
    Little,
    /// Whatever `cfg(target_endian)` resolves to on the build host.
    Native,
}

impl Endian {
    fn resolve(self) -> ResolvedEndian {
        match self {
            Endian::Big => ResolvedEndian::Big,
            Endian::Little => ResolvedEndian::Little,
            Endian::Native => {
                if cfg!(target_endian = "big") {
                    ResolvedEndian::Big
                } else {
                    ResolvedEndian::Little
                }
            }
        }
    }
}

#[derive(PartialEq, Eq)]
enum ResolvedEndian {
    Big,
    Little,
}

/// Transcodes `src`, a run of `bytes_per_sample`-wide samples in `from`
/// order, into `dst` in `to` order. `src` and `dst` must have equal, matching
/// lengths that are a multiple of `bytes_per_sample`. Interleaving is
/// preserved byte-for-byte; only the byte order within each sample changes.
pub fn transcode(src: &[u8], bytes_per_sample: usize, from: Endian, to: Endian, dst: &mut [u8]) {
    assert_eq!(src.len(), dst.len());
    assert_eq!(src.len() % bytes_per_sample, 0);

    let swap = from.resolve() != to.resolve();

    for (s, d) in src
        .chunks_exact(bytes_per_sample)
        .zip(dst.chunks_exact_mut(bytes_per_sample))
    {
        if swap {
            for i in 0..bytes_per_sample {
                d[i] = s[bytes_per_sample - 1 - i];
            }
        } else {
            d.copy_from_slice(s);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_order_round_trip_all_widths() {
        for width in [1usize, 2, 3, 4] {
            let src: Vec<u8> = (0..width as u8 * 4).collect();
            let mut swapped = vec![0u8; src.len()];
            transcode(&src, width, Endian::Big, Endian::Little, &mut swapped);
            let mut back = vec![0u8; src.len()];
            transcode(&swapped, width, Endian::Little, Endian::Big, &mut back);
            assert_eq!(src, back);
        }
    }

    #[test]
    fn double_swap_is_identity() {
        let src = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut once = [0u8; 8];
        transcode(&src, 4, Endian::Big, Endian::Little, &mut once);
        let mut twice = [0u8; 8];
        transcode(&once, 4, Endian::Little, Endian::Big, &mut twice);
        assert_eq!(src, twice);
    }

    #[test]
    fn same_order_is_copy() {
        let src = [9u8, 8, 7, 6];
        let mut dst = [0u8; 4];
        transcode(&src, 2, Endian::Big, Endian::Big, &mut dst);
        assert_eq!(src, dst);
    }
}
