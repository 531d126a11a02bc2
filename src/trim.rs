// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph trimming
//!
//! Computes the smallest sub-rectangle of a glyph raster containing every lit
//! pixel. Rows are expected in *rendering* order: index 0 is the bottom
//! scanline. Bitmap font files store rows top-to-bottom, so callers must
//! reverse them first ([`RawGlyph::rows_bottom_up`] does this).
//!
//! Trimming is a pure function: column bounds and the retained row range are
//! computed as indices, then a single new row sequence is materialised.
//!
//! The two vertical directions are intentionally asymmetric. Removing rows
//! from the bottom only reduces the height; removing rows from the top also
//! increments the y-offset by one per row. This matches the coordinate
//! convention of the target display driver.

use crate::conv::{low_mask, to_i32_sat, to_u32, Row, MAX_WIDTH};
use crate::data::{BoundingBox, RawGlyph};
use smallvec::SmallVec;

/// A sequence of row bitmasks
///
/// Most bitmap glyphs have fewer than 32 scanlines, so these are stored
/// inline.
pub type Rows = SmallVec<[Row; 32]>;

/// Result of [`trim`]
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Trim {
    /// First retained column, counted from the leftmost pixel
    pub col_start: u32,
    /// One past the last retained column
    pub col_end: u32,
    /// Number of all-zero rows removed from the bottom
    pub bottom: u32,
    /// Number of all-zero rows removed from the top
    pub top: u32,
    /// Retained rows, bottom first, each `col_end - col_start` bits wide
    pub rows: Rows,
}

impl Trim {
    fn blank(num_rows: usize) -> Self {
        Trim {
            col_start: 0,
            col_end: 0,
            bottom: to_u32(num_rows),
            top: 0,
            rows: Rows::new(),
        }
    }

    /// Width of the retained raster
    #[inline]
    pub fn width(&self) -> u32 {
        self.col_end - self.col_start
    }

    /// Height of the retained raster
    #[inline]
    pub fn height(&self) -> u32 {
        to_u32(self.rows.len())
    }

    /// True if the source raster had no lit pixel
    #[inline]
    pub fn is_blank(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Find the occupied column range `[start, end)`
///
/// Columns are counted from the most significant of the `width` bits of each
/// row, so column 0 is the leftmost pixel. Returns `(0, 0)` if no row has a
/// lit pixel.
pub fn columns(rows: &[Row], width: u32) -> (u32, u32) {
    let width = width.min(MAX_WIDTH);
    let mask = low_mask(width);
    let spare = MAX_WIDTH - width;

    let mut start = width;
    let mut end = 0;
    for row in rows.iter().map(|row| row & mask).filter(|row| *row != 0) {
        start = start.min(row.leading_zeros() - spare);
        end = end.max(width - row.trailing_zeros());
    }

    if start >= end {
        (0, 0)
    } else {
        (start, end)
    }
}

/// Trim a raster of `width`-bit rows, given bottom row first
///
/// Never fails: a blank raster yields a [`Trim`] with no rows.
pub fn trim(rows: &[Row], width: u32) -> Trim {
    let (col_start, col_end) = columns(rows, width);
    let shift = width.min(MAX_WIDTH) - col_end;
    let keep = low_mask(col_end - col_start);
    let remask = |row: Row| row.checked_shr(shift).unwrap_or(0) & keep;

    let Some(first) = rows.iter().position(|row| remask(*row) != 0) else {
        return Trim::blank(rows.len());
    };
    let last = rows
        .iter()
        .rposition(|row| remask(*row) != 0)
        .unwrap_or(first);

    Trim {
        col_start,
        col_end,
        bottom: to_u32(first),
        top: to_u32(rows.len() - 1 - last),
        rows: rows[first..=last].iter().map(|row| remask(*row)).collect(),
    }
}

/// Trim a source glyph
///
/// Returns the new bounding box and the retained rows (bottom first). For a
/// blank glyph the box is [`BoundingBox::ZERO`] and no rows are returned.
pub fn trim_glyph(glyph: &RawGlyph) -> (BoundingBox, Rows) {
    let rows: Rows = glyph.rows_bottom_up().collect();
    let t = trim(&rows, glyph.bbox.width);
    if t.is_blank() {
        return (BoundingBox::ZERO, Rows::new());
    }

    let bbox = BoundingBox {
        x: glyph.bbox.x.saturating_add(to_i32_sat(t.col_start)),
        y: glyph.bbox.y.saturating_add(to_i32_sat(t.top)),
        width: t.width(),
        height: t.height(),
    };
    (bbox, t.rows)
}
