// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font loading and assembly
//!
//! A font is read into a [`GlyphSource`] (usually a [`BdfFont`]), then
//! [`assemble`] produces a dense [`FontTable`] of trimmed and packed glyphs
//! over the configured codepoint range together with a [`FontDescriptor`].
//!
//! ### Fallback policy
//!
//! For each codepoint in the range, in order:
//!
//! 1.  If the codepoint is the fallback marker (`0x7F`), the default
//!     codepoint's glyph is used, whether or not the font has a glyph for
//!     `0x7F`. The renderer draws this entry for any unsupported character.
//! 2.  Otherwise the codepoint's own glyph is used if present, else the
//!     default codepoint's glyph.
//! 3.  If neither exists, assembly fails with a [`MissingGlyphError`].
//!
//! The default codepoint is the font's `DEFAULT_CHAR` property if present
//! (see [`Config::default_codepoint_for`]).

mod assemble;
mod bdf;
mod source;

pub use assemble::{
    assemble, convert_glyph, descriptor, resolve, Config, ConfigError, FontDescriptor, FontTable,
    MissingGlyphError, AVERAGE_WIDTH, DEFAULT_CHAR, FONT_ASCENT, FONT_DESCENT,
};
pub use bdf::{BdfFont, ParseError, ParseErrorKind};
pub use source::{GlyphSource, Lookup, Properties};
