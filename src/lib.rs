// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Bitmap font packing for embedded displays
//!
//! Converts BDF bitmap fonts into compact glyph tables: each glyph is trimmed
//! to the tightest box around its lit pixels ([`trim`]), then packed into a
//! minimal big-endian bitstream ([`pack`]). A dense table over a single-byte
//! codepoint range plus font metrics is assembled per font ([`fonts`]) and
//! emitted as C source ([`emit`]).
//!
//! ```
//! use bdf_pack::data::{BoundingBox, RawGlyph};
//! use bdf_pack::fonts::convert_glyph;
//!
//! // A 3×3 glyph (rows top first) with a blank left column
//! let glyph = RawGlyph {
//!     bbox: BoundingBox::new(0, 0, 3, 3),
//!     advance: 4,
//!     rows: vec![0b011, 0b001, 0b011],
//! };
//! let packed = convert_glyph(&glyph);
//! assert_eq!(packed.bbox, BoundingBox::new(1, 0, 2, 3));
//! assert_eq!(packed.data, [0b1101_1100]);
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod batch;
pub mod conv;
pub mod data;
pub mod emit;
pub mod fonts;
pub mod pack;
pub mod trim;

pub use batch::{BatchOptions, Error, Output};
pub use data::{BoundingBox, RawGlyph, TrimmedGlyph};
