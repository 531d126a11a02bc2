// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Type conversion utilities
//!
//! Glyph dimensions are represented as `u32` and offsets as `i32` by this
//! library. Bitmap fonts for small displays never come close to these limits,
//! but the emitted C structures use `int8_t` fields, so narrowing is checked.

use easy_cast::{Cast, Conv};

/// Row bitmask type
///
/// Bit `k` (0 = least significant) represents one pixel column; for a glyph
/// of width `w`, bit `w - 1` is the leftmost pixel.
pub type Row = u64;

/// Maximum supported glyph width in pixels (bits per [`Row`])
pub const MAX_WIDTH: u32 = Row::BITS;

/// Convert `usize` → `u32`
///
/// This is a "safer" wrapper around `as` ensuring (on debug builds) that the
/// input value may be represented correctly by `u32`.
#[inline]
pub fn to_u32(x: usize) -> u32 {
    x.cast()
}

/// Convert `u32` → `usize`
///
/// This is a "safer" wrapper around `as` ensuring that the operation is
/// zero-extension.
#[inline]
pub fn to_usize(x: u32) -> usize {
    x.cast()
}

/// A mask of the `bits` least-significant bits
///
/// Saturates at [`MAX_WIDTH`].
#[inline]
pub fn low_mask(bits: u32) -> Row {
    if bits >= MAX_WIDTH {
        Row::MAX
    } else {
        (1 << bits) - 1
    }
}

/// Number of bytes needed to hold `bits` bits
#[inline]
pub fn bytes_for_bits(bits: usize) -> usize {
    bits.div_ceil(8)
}

/// Narrow to `i8` if the value fits
#[inline]
pub fn to_i8(x: i32) -> Option<i8> {
    i8::try_conv(x).ok()
}

/// Widen `u32` → `i32`, saturating
#[inline]
pub fn to_i32_sat(x: u32) -> i32 {
    i32::try_conv(x).unwrap_or(i32::MAX)
}
