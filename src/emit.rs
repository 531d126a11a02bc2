// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! C source emission
//!
//! Each font becomes a static glyph array followed by a font descriptor:
//!
//! ```none
//! static const ILI9341_GlyphDef ILI9341_Font_Spleen5x8_Glyphs[] = {
//!     {  0,   0,  0,  0,  5, NULL}, /*   */
//!     {  2,   0,  1,  5,  5, (const uint8_t[]){0xE8}}, /* ! */
//!     ...
//! };
//! const ILI9341_FontDef ILI9341_Font_Spleen5x8 = { 0x20, 0xFF, 50, 7, 1, ILI9341_Font_Spleen5x8_Glyphs };
//! ```
//!
//! Glyph fields are `{x, y, width, height, advance, data}`, matching the
//! driver's `int8_t` based glyph structure.

use crate::conv::{to_i32_sat, to_i8};
use crate::data::TrimmedGlyph;
use crate::fonts::{FontDescriptor, FontTable};
use encoding_rs::Encoding;
use std::fmt::{self, Write};

/// Substitute for characters which cannot be shown in a comment
pub const PLACEHOLDER: char = '\u{FFFD}';

/// First line of the declarations output
pub const DECLARATIONS_HEADER: &str = "// Header declarations";

/// Single-byte text encoding used for glyph comments
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentEncoding {
    /// ISO-8859-1: each byte maps to the code point of equal value
    Latin1,
    /// Any other encoding known to `encoding_rs`
    Other(&'static Encoding),
}

impl CommentEncoding {
    /// Select an encoding by label
    ///
    /// The ISO-8859-1 labels select true Latin-1, where bytes `0x80..=0x9F`
    /// are C1 controls. Other labels follow the WHATWG Encoding Standard.
    /// Returns `None` for unknown labels.
    pub fn for_label(label: &str) -> Option<Self> {
        let name = label.trim().to_ascii_lowercase();
        match name.as_str() {
            "iso-8859-1" | "iso8859-1" | "iso_8859-1" | "latin1" | "l1" => {
                Some(CommentEncoding::Latin1)
            }
            _ => Encoding::for_label(name.as_bytes()).map(CommentEncoding::Other),
        }
    }

    /// Decode one byte, if it maps to a single character
    pub fn decode(self, byte: u8) -> Option<char> {
        match self {
            CommentEncoding::Latin1 => Some(char::from(byte)),
            CommentEncoding::Other(encoding) => {
                let bytes = [byte];
                let text = encoding.decode_without_bom_handling_and_without_replacement(&bytes)?;
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => None,
                }
            }
        }
    }
}

/// Emission options
#[derive(Clone, Debug, PartialEq)]
pub struct EmitOptions {
    /// Symbol prefix, e.g. `ILI9341` for `ILI9341_FontDef`
    pub prefix: String,
    /// Header to `#include` at the top of the output
    pub header: String,
    /// Encoding used to annotate glyphs with their character
    pub encoding: CommentEncoding,
}

impl Default for EmitOptions {
    fn default() -> Self {
        EmitOptions {
            prefix: "ILI9341".to_string(),
            header: "ili9341_fonts.h".to_string(),
            encoding: CommentEncoding::Latin1,
        }
    }
}

impl EmitOptions {
    /// Select the comment encoding by label
    ///
    /// See [`CommentEncoding::for_label`]. Returns `None` for unknown labels.
    pub fn with_encoding_label(mut self, label: &str) -> Option<Self> {
        self.encoding = CommentEncoding::for_label(label)?;
        Some(self)
    }

    /// Name of the descriptor symbol for a font
    pub fn font_symbol(&self, name: &str) -> String {
        format!("{}_Font_{}", self.prefix, name)
    }
}

/// Derive a C identifier fragment from a file name
///
/// Removes `suffix` (if present) and drops every character which is not an
/// ASCII alphanumeric or `_`.
pub fn font_name(file_name: &str, suffix: &str) -> String {
    let stem = file_name.strip_suffix(suffix).unwrap_or(file_name);
    stem.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

/// Decode `codepoint` for a human-readable annotation
///
/// Returns [`PLACEHOLDER`] if the byte does not decode or decodes to a
/// non-printable character. No-break space and soft hyphen are kept.
pub fn comment_char(codepoint: u8, encoding: CommentEncoding) -> char {
    match encoding.decode(codepoint) {
        Some(c @ ('\u{A0}' | '\u{AD}')) => c,
        Some(c) if !c.is_control() && (c == ' ' || !c.is_whitespace()) => c,
        _ => PLACEHOLDER,
    }
}

fn check_i8(font: &str, codepoint: u8, field: &str, value: i32) {
    if to_i8(value).is_none() {
        log::warn!("{font}: glyph {codepoint:#04X}: {field} {value} does not fit in int8_t");
    }
}

/// Write one glyph table entry (without trailing newline)
pub fn write_glyph<W: Write>(w: &mut W, glyph: &TrimmedGlyph, c: char) -> fmt::Result {
    let b = glyph.bbox;
    write!(
        w,
        "    {{{:3}, {:3}, {:2}, {:2}, {:2}, ",
        b.x, b.y, b.width, b.height, glyph.advance
    )?;
    if glyph.data.is_empty() {
        w.write_str("NULL")?;
    } else {
        w.write_str("(const uint8_t[]){")?;
        for (i, byte) in glyph.data.iter().enumerate() {
            if i > 0 {
                w.write_str(", ")?;
            }
            write!(w, "0x{byte:02X}")?;
        }
        w.write_char('}')?;
    }
    write!(w, "}}, /* {c} */")
}

/// Write the source prologue
pub fn write_prologue<W: Write>(w: &mut W, options: &EmitOptions) -> fmt::Result {
    writeln!(w, "#include \"{}\"", options.header)
}

/// Write the glyph table and descriptor for one font
pub fn write_font<W: Write>(
    w: &mut W,
    options: &EmitOptions,
    name: &str,
    table: &FontTable,
    desc: &FontDescriptor,
) -> fmt::Result {
    let symbol = options.font_symbol(name);
    let prefix = &options.prefix;

    writeln!(w)?;
    writeln!(w, "static const {prefix}_GlyphDef {symbol}_Glyphs[] = {{")?;
    for (codepoint, glyph) in table.iter() {
        let b = glyph.bbox;
        check_i8(name, codepoint, "x", b.x);
        check_i8(name, codepoint, "y", b.y);
        check_i8(name, codepoint, "width", to_i32_sat(b.width));
        check_i8(name, codepoint, "height", to_i32_sat(b.height));
        check_i8(name, codepoint, "advance", glyph.advance);

        write_glyph(w, glyph, comment_char(codepoint, options.encoding))?;
        writeln!(w)?;
    }
    writeln!(w, "}};")?;
    writeln!(
        w,
        "const {prefix}_FontDef {symbol} = {{ 0x{:02X}, 0x{:02X}, {}, {}, {}, {symbol}_Glyphs }};",
        desc.start, desc.end, desc.avg_width, desc.ascent, desc.descent
    )
}

/// Write the first line of the declarations output
pub fn write_declarations_header<W: Write>(w: &mut W) -> fmt::Result {
    writeln!(w, "{DECLARATIONS_HEADER}")
}

/// Write the forward declaration for one font
pub fn write_declaration<W: Write>(w: &mut W, options: &EmitOptions, name: &str) -> fmt::Result {
    writeln!(
        w,
        "extern {}_FontDef {};",
        options.prefix,
        options.font_symbol(name)
    )
}
