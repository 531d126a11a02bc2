// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! BDF (Glyph Bitmap Distribution Format) reader
//!
//! Supports the subset of BDF 2.1 needed to extract glyph rasters and font
//! properties: `FONTBOUNDINGBOX`, the `STARTPROPERTIES` block and
//! `STARTCHAR` records with `ENCODING`, `DWIDTH`, `BBX` and `BITMAP`.
//! Unknown keywords are ignored.

use super::source::{GlyphSource, Lookup, Properties};
use crate::conv::{to_u32, to_usize, Row, MAX_WIDTH};
use crate::data::{BoundingBox, RawGlyph};
use easy_cast::Conv;
use std::collections::BTreeMap;
use thiserror::Error;

/// Kind of [`ParseError`]
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("not a BDF file (expected STARTFONT)")]
    NotBdf,
    #[error("expected {expected} integer fields after {keyword}")]
    BadFields {
        keyword: &'static str,
        expected: usize,
    },
    #[error("invalid bitmap row {0:?}")]
    BadRow(String),
    #[error("glyph width {0} exceeds the supported maximum of 64")]
    TooWide(u32),
    #[error("{0} outside of a glyph record")]
    Unexpected(String),
    #[error("glyph {name:?} has {found} bitmap rows; BBX height is {expected}")]
    RowCount {
        name: String,
        found: usize,
        expected: u32,
    },
    #[error("glyph {0:?} has no BBX")]
    MissingBbx(String),
    #[error("unexpected end of file")]
    UnexpectedEof,
}

/// Malformed BDF source
#[derive(Error, Debug, PartialEq, Eq)]
#[error("line {line}: {kind}")]
pub struct ParseError {
    /// Line number (1-based)
    pub line: usize,
    pub kind: ParseErrorKind,
}

/// A parsed BDF font
#[derive(Clone, Debug, Default)]
pub struct BdfFont {
    name: String,
    bounding_box: BoundingBox,
    properties: Properties,
    glyphs: BTreeMap<u32, RawGlyph>,
}

#[derive(Default)]
struct CharRecord {
    name: String,
    encoding: Option<i64>,
    advance: Option<i32>,
    bbox: Option<BoundingBox>,
    rows: Vec<Row>,
}

enum State {
    Start,
    Header,
    Properties,
    Char(CharRecord),
    Bitmap(CharRecord),
    End,
}

fn fields<const N: usize>(keyword: &'static str, args: &str) -> Result<[i64; N], ParseErrorKind> {
    let err = || ParseErrorKind::BadFields {
        keyword,
        expected: N,
    };
    let mut out = [0; N];
    let mut iter = args.split_whitespace();
    for slot in out.iter_mut() {
        *slot = iter.next().and_then(|s| s.parse().ok()).ok_or_else(err)?;
    }
    Ok(out)
}

fn bbox_fields(keyword: &'static str, args: &str) -> Result<BoundingBox, ParseErrorKind> {
    let err = || ParseErrorKind::BadFields {
        keyword,
        expected: 4,
    };
    let [w, h, x, y] = fields::<4>(keyword, args)?;
    Ok(BoundingBox {
        x: i32::try_conv(x).map_err(|_| err())?,
        y: i32::try_conv(y).map_err(|_| err())?,
        width: u32::try_conv(w).map_err(|_| err())?,
        height: u32::try_conv(h).map_err(|_| err())?,
    })
}

fn unquote(value: &str) -> String {
    let value = value.trim();
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        value[1..value.len() - 1].replace("\"\"", "\"")
    } else {
        value.to_string()
    }
}

/// Parse one hex row, right-aligned to `width` bits
///
/// BDF pads each row to a whole number of bytes; padding bits are dropped.
fn parse_row(line: &str, width: u32) -> Result<Row, ParseErrorKind> {
    let bad = || ParseErrorKind::BadRow(line.to_string());
    if line.is_empty() || line.len() > 32 {
        return Err(bad());
    }
    let value = u128::from_str_radix(line, 16).map_err(|_| bad())?;
    let bits = to_u32(line.len()) * 4;
    let value = if bits >= width {
        value.checked_shr(bits - width).unwrap_or(0)
    } else {
        value << (width - bits)
    };
    Row::try_from(value).map_err(|_| bad())
}

impl CharRecord {
    fn finish(self, font_bbox: BoundingBox) -> Result<Option<(u32, RawGlyph)>, ParseErrorKind> {
        let bbox = self
            .bbox
            .ok_or_else(|| ParseErrorKind::MissingBbx(self.name.clone()))?;
        if self.rows.len() != to_usize(bbox.height) {
            return Err(ParseErrorKind::RowCount {
                name: self.name,
                found: self.rows.len(),
                expected: bbox.height,
            });
        }

        let Some(codepoint) = self.encoding.and_then(|e| u32::try_conv(e).ok()) else {
            log::debug!("skipping unencoded glyph {:?}", self.name);
            return Ok(None);
        };

        let advance = self.advance.unwrap_or_else(|| {
            log::debug!("glyph {:?} has no DWIDTH; using font width", self.name);
            i32::try_conv(font_bbox.width).unwrap_or(0)
        });

        Ok(Some((
            codepoint,
            RawGlyph {
                bbox,
                advance,
                rows: self.rows,
            },
        )))
    }
}

impl BdfFont {
    /// Construct an empty font
    pub fn new(name: impl Into<String>) -> Self {
        BdfFont {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse BDF source
    ///
    /// The `name` is used to identify this font in diagnostics.
    pub fn parse(name: impl Into<String>, source: &str) -> Result<Self, ParseError> {
        let mut font = BdfFont::new(name);
        let mut state = State::Start;
        let mut line_no = 0;

        for (index, line) in source.lines().enumerate() {
            if matches!(state, State::End) {
                break;
            }
            line_no = index + 1;
            let err = |kind| ParseError {
                line: line_no,
                kind,
            };
            let line = line.trim();
            let (keyword, args) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
            if keyword.is_empty() || keyword == "COMMENT" {
                continue;
            }

            state = match state {
                State::Start if keyword == "STARTFONT" => State::Header,
                State::Start => return Err(err(ParseErrorKind::NotBdf)),
                State::Header => match keyword {
                    "FONTBOUNDINGBOX" => {
                        font.bounding_box = bbox_fields("FONTBOUNDINGBOX", args).map_err(err)?;
                        State::Header
                    }
                    "STARTPROPERTIES" => State::Properties,
                    "STARTCHAR" => State::Char(CharRecord {
                        name: args.trim().to_string(),
                        ..Default::default()
                    }),
                    "ENDFONT" => State::End,
                    "ENCODING" | "BBX" | "BITMAP" | "ENDCHAR" | "DWIDTH" => {
                        return Err(err(ParseErrorKind::Unexpected(keyword.to_string())));
                    }
                    _ => State::Header,
                },
                State::Properties => {
                    if keyword == "ENDPROPERTIES" {
                        State::Header
                    } else {
                        font.properties.insert(keyword, unquote(args));
                        State::Properties
                    }
                }
                State::Char(mut rec) => match keyword {
                    "ENCODING" => {
                        let [encoding] = fields::<1>("ENCODING", args).map_err(err)?;
                        rec.encoding = Some(encoding);
                        State::Char(rec)
                    }
                    "DWIDTH" => {
                        let [x] = fields::<1>("DWIDTH", args).map_err(err)?;
                        let x = i32::try_conv(x).map_err(|_| {
                            err(ParseErrorKind::BadFields {
                                keyword: "DWIDTH",
                                expected: 1,
                            })
                        })?;
                        rec.advance = Some(x);
                        State::Char(rec)
                    }
                    "BBX" => {
                        let bbox = bbox_fields("BBX", args).map_err(err)?;
                        if bbox.width > MAX_WIDTH {
                            return Err(err(ParseErrorKind::TooWide(bbox.width)));
                        }
                        rec.bbox = Some(bbox);
                        State::Char(rec)
                    }
                    "BITMAP" => State::Bitmap(rec),
                    "ENDCHAR" => {
                        font.push(rec).map_err(err)?;
                        State::Header
                    }
                    _ => State::Char(rec),
                },
                State::Bitmap(mut rec) => {
                    if keyword == "ENDCHAR" {
                        font.push(rec).map_err(err)?;
                        State::Header
                    } else {
                        let width = rec
                            .bbox
                            .map(|bbox| bbox.width)
                            .ok_or_else(|| err(ParseErrorKind::MissingBbx(rec.name.clone())))?;
                        rec.rows.push(parse_row(keyword, width).map_err(err)?);
                        State::Bitmap(rec)
                    }
                }
                State::End => State::End,
            };
        }

        match state {
            State::Start => Err(ParseError {
                line: line_no,
                kind: ParseErrorKind::NotBdf,
            }),
            State::Char(_) | State::Bitmap(_) | State::Properties => Err(ParseError {
                line: line_no,
                kind: ParseErrorKind::UnexpectedEof,
            }),
            State::Header | State::End => Ok(font),
        }
    }

    /// Parse BDF source from raw bytes
    ///
    /// BDF is an ASCII format, but property strings (e.g. `COPYRIGHT`) are
    /// sometimes Latin-1 encoded; invalid UTF-8 is replaced.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Result<Self, ParseError> {
        BdfFont::parse(name, &String::from_utf8_lossy(bytes))
    }

    fn push(&mut self, rec: CharRecord) -> Result<(), ParseErrorKind> {
        if let Some((codepoint, glyph)) = rec.finish(self.bounding_box)? {
            if self.glyphs.insert(codepoint, glyph).is_some() {
                log::warn!("{}: duplicate glyph for codepoint {codepoint:#04X}", self.name);
            }
        }
        Ok(())
    }

    /// Add or replace a glyph
    pub fn insert(&mut self, codepoint: u32, glyph: RawGlyph) -> Option<RawGlyph> {
        self.glyphs.insert(codepoint, glyph)
    }

    /// Access properties mutably
    pub fn properties_mut(&mut self) -> &mut Properties {
        &mut self.properties
    }

    /// Font name, as passed to the constructor
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The `FONTBOUNDINGBOX`
    pub fn bounding_box(&self) -> BoundingBox {
        self.bounding_box
    }

    /// Number of encoded glyphs
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// True if the font has no encoded glyph
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Iterate over `(codepoint, glyph)` pairs in codepoint order
    pub fn glyphs(&self) -> impl Iterator<Item = (u32, &RawGlyph)> {
        self.glyphs.iter().map(|(cp, glyph)| (*cp, glyph))
    }
}

impl GlyphSource for BdfFont {
    fn source_id(&self) -> &str {
        &self.name
    }

    fn glyph(&self, codepoint: u32) -> Lookup<'_> {
        self.glyphs.get(&codepoint).into()
    }

    fn properties(&self) -> &Properties {
        &self.properties
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = "\
STARTFONT 2.1
COMMENT sample
FONT -misc-sample-medium-r-normal--8-80-75-75-c-50-iso8859-1
SIZE 8 75 75
FONTBOUNDINGBOX 5 8 0 -1
STARTPROPERTIES 3
FAMILY_NAME \"Sample \"\"Mono\"\"\"
FONT_ASCENT 7
DEFAULT_CHAR 32
ENDPROPERTIES
CHARS 3
STARTCHAR space
ENCODING 32
SWIDTH 500 0
DWIDTH 5 0
BBX 5 8 0 -1
BITMAP
00
00
00
00
00
00
00
00
ENDCHAR
STARTCHAR A
ENCODING 65
DWIDTH 5 0
BBX 5 8 0 -1
BITMAP
00
70
88
88
F8
88
88
00
ENDCHAR
STARTCHAR unencoded
ENCODING -1
DWIDTH 5 0
BBX 1 1 0 0
BITMAP
80
ENDCHAR
ENDFONT
";

    #[test]
    fn parse_sample() {
        let font = BdfFont::parse("sample.bdf", SAMPLE).unwrap();
        assert_eq!(font.name(), "sample.bdf");
        assert_eq!(font.bounding_box(), BoundingBox::new(0, -1, 5, 8));
        assert_eq!(font.len(), 2);
        assert!(!font.is_empty());
        assert_eq!(font.properties().int("FONT_ASCENT"), Some(7));
        assert_eq!(font.properties().get("FAMILY_NAME"), Some("Sample \"Mono\""));

        let a = font.glyph(65).found().unwrap();
        assert_eq!(a.bbox, BoundingBox::new(0, -1, 5, 8));
        assert_eq!(a.advance, 5);
        assert_eq!(
            a.rows,
            [0, 0b01110, 0b10001, 0b10001, 0b11111, 0b10001, 0b10001, 0]
        );
        assert_eq!(font.glyph(66), Lookup::NotFound);

        let codepoints: Vec<u32> = font.glyphs().map(|(cp, _)| cp).collect();
        assert_eq!(codepoints, [32, 65]);
        assert!(font.glyphs().all(|(_, glyph)| glyph.rows.len() == 8));
    }

    #[test]
    fn row_padding() {
        assert_eq!(parse_row("F8", 5), Ok(0b11111));
        assert_eq!(parse_row("FFC0", 10), Ok(0x3FF));
        assert_eq!(parse_row("8", 1), Ok(1));
        assert_eq!(parse_row("80000000", 32), Ok(0x8000_0000));
        assert_eq!(parse_row("0", 8), Ok(0));
        assert!(parse_row("XY", 8).is_err());
    }

    #[test]
    fn not_bdf() {
        let err = BdfFont::parse("x", "hello world\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert_eq!(err.kind, ParseErrorKind::NotBdf);
        assert_eq!(BdfFont::parse("x", "").unwrap_err().kind, ParseErrorKind::NotBdf);
    }

    #[test]
    fn row_count_mismatch() {
        let src = "STARTFONT 2.1\nSTARTCHAR a\nENCODING 97\nBBX 2 2 0 0\nBITMAP\nC0\nENDCHAR\nENDFONT\n";
        let err = BdfFont::parse("x", src).unwrap_err();
        assert_eq!(err.line, 7);
        assert!(matches!(err.kind, ParseErrorKind::RowCount { found: 1, expected: 2, .. }));
    }

    #[test]
    fn truncated() {
        let src = "STARTFONT 2.1\nSTARTCHAR a\nENCODING 97\nBBX 2 1 0 0\nBITMAP\nC0\n";
        let err = BdfFont::parse("x", src).unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedEof);
    }

    #[test]
    fn too_wide() {
        let src = "STARTFONT 2.1\nSTARTCHAR a\nENCODING 97\nBBX 65 1 0 0\n";
        let err = BdfFont::parse("x", src).unwrap_err();
        assert_eq!(err.line, 4);
        assert_eq!(err.kind, ParseErrorKind::TooWide(65));
    }

    #[test]
    fn missing_dwidth_uses_font_width() {
        let src = "STARTFONT 2.1\nFONTBOUNDINGBOX 6 1 0 0\nSTARTCHAR a\nENCODING 97\nBBX 2 1 0 0\nBITMAP\nC0\nENDCHAR\nENDFONT\n";
        let font = BdfFont::parse("x", src).unwrap();
        let glyph = font.glyph(97).found().unwrap();
        assert_eq!(glyph.advance, 6);
        assert_eq!(glyph.rows, [0b11]);
    }
}
