// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Bit packing
//!
//! A trimmed raster of `width × height` pixels is stored as a bitstream:
//! rows in rendering order (bottom first), each row written from its leftmost
//! pixel (most significant bit). The stream is zero-padded to a whole number
//! of bytes, so the packed length is exactly `ceil(width * height / 8)`.
//!
//! This is equivalent to concatenating all rows into one arbitrary-precision
//! integer, left-shifting to a byte boundary and emitting it big-endian.

use crate::conv::{bytes_for_bits, low_mask, to_usize, Row, MAX_WIDTH};
use crate::trim::Rows;

/// Writes bit fields MSB-first into a growable byte buffer
#[derive(Debug, Default)]
pub struct BitWriter {
    data: Vec<u8>,
    /// Bits used in the last byte of `data` (0 if the buffer is aligned)
    used: u32,
}

impl BitWriter {
    /// Construct, reserving space for `bits` bits
    pub fn with_capacity(bits: usize) -> Self {
        BitWriter {
            data: Vec::with_capacity(bytes_for_bits(bits)),
            used: 0,
        }
    }

    /// Number of bits written
    pub fn len(&self) -> usize {
        if self.used == 0 {
            self.data.len() * 8
        } else {
            (self.data.len() - 1) * 8 + to_usize(self.used)
        }
    }

    /// True if nothing has been written
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append the low `bits` bits of `value`, most significant first
    pub fn write(&mut self, value: Row, bits: u32) {
        let mut remaining = bits.min(MAX_WIDTH);
        let value = value & low_mask(remaining);
        while remaining > 0 {
            if self.used == 0 {
                self.data.push(0);
            }
            let free = 8 - self.used;
            let n = free.min(remaining);
            let chunk = (value >> (remaining - n)) & low_mask(n);
            // n <= 8 so the chunk fits in one byte
            let byte = self.data.len() - 1;
            self.data[byte] |= (chunk << (free - n)) as u8;
            self.used = (self.used + n) % 8;
            remaining -= n;
        }
    }

    /// Finish, returning the zero-padded bytes
    pub fn finish(self) -> Vec<u8> {
        self.data
    }
}

/// Pack a trimmed raster
///
/// `rows` are given bottom first; each holds `width` significant bits.
/// Returns an empty vector if `width == 0` or there are no rows.
pub fn pack(rows: &[Row], width: u32) -> Vec<u8> {
    if width == 0 || rows.is_empty() {
        return Vec::new();
    }

    let mut writer = BitWriter::with_capacity(to_usize(width) * rows.len());
    for row in rows {
        writer.write(*row, width);
    }
    writer.finish()
}

/// Unpack a bitstream produced by [`pack`]
///
/// Returns `height` rows of `width` bits, bottom first. Bits beyond the end
/// of `data` read as zero.
pub fn unpack(data: &[u8], width: u32, height: u32) -> Rows {
    let width = width.min(MAX_WIDTH);
    let bit = |index: usize| -> Row {
        data.get(index / 8)
            .map(|byte| Row::from((*byte >> (7 - index % 8)) & 1))
            .unwrap_or(0)
    };

    let w = to_usize(width);
    (0..to_usize(height))
        .map(|y| (0..w).fold(0, |row, x| (row << 1) | bit(y * w + x)))
        .collect()
}
