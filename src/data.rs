// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph data types

use crate::conv::{bytes_for_bits, to_usize, Row};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Glyph bounding box
///
/// Offsets are relative to the glyph origin within its advance cell; units
/// are pixels.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct BoundingBox {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl BoundingBox {
    /// The all-zero box, used for glyphs without lit pixels
    pub const ZERO: BoundingBox = BoundingBox {
        x: 0,
        y: 0,
        width: 0,
        height: 0,
    };

    /// Construct
    #[inline]
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        BoundingBox {
            x,
            y,
            width,
            height,
        }
    }

    /// True if the box covers no pixels
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Number of pixels (bits) covered
    #[inline]
    pub fn area(&self) -> usize {
        to_usize(self.width) * to_usize(self.height)
    }
}

/// A glyph as read from the source font
///
/// `rows` holds one bitmask per scanline in *storage* order (top row first),
/// as in the source file. Only the low `bbox.width` bits of each row are
/// significant; bit `width - 1` is the leftmost pixel.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RawGlyph {
    pub bbox: BoundingBox,
    /// Horizontal advance to the next glyph origin
    pub advance: i32,
    pub rows: Vec<Row>,
}

impl RawGlyph {
    /// Rows in rendering order: bottom scanline first
    pub fn rows_bottom_up(&self) -> impl Iterator<Item = Row> + '_ {
        self.rows.iter().rev().copied()
    }
}

/// A trimmed and packed glyph
///
/// If the glyph has no lit pixel, `bbox` is [`BoundingBox::ZERO`] and `data`
/// is empty. Otherwise `data.len() == ceil(width * height / 8)`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrimmedGlyph {
    pub bbox: BoundingBox,
    /// Horizontal advance, copied from the source glyph
    pub advance: i32,
    /// Packed bitmap: row-major, bottom-to-top, MSB first
    pub data: Vec<u8>,
}

impl TrimmedGlyph {
    /// True if this glyph carries no bitmap
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.data.is_empty()
    }

    /// Expected length of `data` given `bbox`
    #[inline]
    pub fn packed_len(&self) -> usize {
        bytes_for_bits(self.bbox.area())
    }
}
