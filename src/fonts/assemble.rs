// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Font table assembly

use super::source::{GlyphSource, Lookup};
use crate::conv::to_i32_sat;
use crate::data::{RawGlyph, TrimmedGlyph};
use crate::pack::pack;
use crate::trim::trim_glyph;
use easy_cast::Conv;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Metadata property: codepoint substituted for missing glyphs
pub const DEFAULT_CHAR: &str = "DEFAULT_CHAR";
/// Metadata property: average glyph width
pub const AVERAGE_WIDTH: &str = "AVERAGE_WIDTH";
/// Metadata property: font ascent
pub const FONT_ASCENT: &str = "FONT_ASCENT";
/// Metadata property: font descent
pub const FONT_DESCENT: &str = "FONT_DESCENT";

/// A codepoint has no glyph and no usable fallback
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "glyph for codepoint {codepoint:#04X} not found in font {source_id} and no default char is available"
)]
pub struct MissingGlyphError {
    pub codepoint: u32,
    pub source_id: String,
}

/// Invalid assembly [`Config`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("codepoint range {start:#04X}..={end:#04X} is empty")]
    EmptyRange { start: u8, end: u8 },
    #[error("codepoint range {start:#04X}..={end:#04X} does not contain the fallback marker {marker:#04X}")]
    MissingMarker { start: u8, end: u8, marker: u8 },
}

/// Assembly configuration
///
/// The codepoint range must contain the fallback marker: the renderer draws
/// the marker's glyph for any codepoint outside the table. This is checked by
/// [`Config::new`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    start: u8,
    end: u8,
    fallback_marker: u8,
    reference_codepoint: u32,
    default_codepoint: u32,
}

impl Config {
    /// The renderer's reserved fallback codepoint (`DEL`)
    pub const FALLBACK_MARKER: u8 = 0x7F;

    /// Construct for the inclusive range `start..=end`
    ///
    /// Other parameters take their default values.
    pub fn new(start: u8, end: u8) -> Result<Self, ConfigError> {
        let marker = Self::FALLBACK_MARKER;
        if start > end {
            return Err(ConfigError::EmptyRange { start, end });
        }
        if !(start..=end).contains(&marker) {
            return Err(ConfigError::MissingMarker { start, end, marker });
        }
        Ok(Config {
            start,
            end,
            fallback_marker: marker,
            reference_codepoint: 0x41,
            default_codepoint: 0x20,
        })
    }

    /// Set the reference glyph used when metric properties are missing
    ///
    /// Default: `0x41` (`A`).
    pub fn with_reference_codepoint(mut self, codepoint: u32) -> Self {
        self.reference_codepoint = codepoint;
        self
    }

    /// Set the default codepoint used if a font has no `DEFAULT_CHAR`
    ///
    /// Default: `0x20` (space).
    pub fn with_default_codepoint(mut self, codepoint: u32) -> Self {
        self.default_codepoint = codepoint;
        self
    }

    /// First codepoint (inclusive)
    #[inline]
    pub fn start(&self) -> u8 {
        self.start
    }

    /// Last codepoint (inclusive)
    #[inline]
    pub fn end(&self) -> u8 {
        self.end
    }

    /// The reserved fallback codepoint
    #[inline]
    pub fn fallback_marker(&self) -> u8 {
        self.fallback_marker
    }

    /// Glyph supplying metrics absent from the font properties
    #[inline]
    pub fn reference_codepoint(&self) -> u32 {
        self.reference_codepoint
    }

    /// Default codepoint for fonts without `DEFAULT_CHAR`
    #[inline]
    pub fn default_codepoint(&self) -> u32 {
        self.default_codepoint
    }

    /// Number of codepoints in the range
    #[inline]
    pub fn len(&self) -> usize {
        usize::from(self.end - self.start) + 1
    }

    /// The codepoint range
    #[inline]
    pub fn codepoints(&self) -> impl Iterator<Item = u8> {
        self.start..=self.end
    }

    /// Choose the default codepoint for `source`
    ///
    /// Uses the `DEFAULT_CHAR` property if present and valid.
    pub fn default_codepoint_for<S: GlyphSource + ?Sized>(&self, source: &S) -> u32 {
        source
            .properties()
            .int(DEFAULT_CHAR)
            .and_then(|c| u32::try_conv(c).ok())
            .unwrap_or(self.default_codepoint)
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            start: 0x20,
            end: 0xFF,
            fallback_marker: Self::FALLBACK_MARKER,
            reference_codepoint: 0x41,
            default_codepoint: 0x20,
        }
    }
}

/// Font-level metadata
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FontDescriptor {
    /// First codepoint (inclusive)
    pub start: u8,
    /// Last codepoint (inclusive)
    pub end: u8,
    pub avg_width: i32,
    pub ascent: i32,
    pub descent: i32,
}

/// Dense table of glyphs over a codepoint range
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FontTable {
    start: u8,
    glyphs: Vec<TrimmedGlyph>,
}

impl FontTable {
    /// Number of entries
    #[inline]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    /// True if the table is empty
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Get the entry for `codepoint`, if within range
    pub fn get(&self, codepoint: u8) -> Option<&TrimmedGlyph> {
        let index = codepoint.checked_sub(self.start)?;
        self.glyphs.get(usize::from(index))
    }

    /// Iterate over `(codepoint, glyph)` entries
    pub fn iter(&self) -> impl Iterator<Item = (u8, &TrimmedGlyph)> {
        (self.start..=u8::MAX).zip(self.glyphs.iter())
    }

    /// All entries, indexed by `codepoint - start`
    #[inline]
    pub fn glyphs(&self) -> &[TrimmedGlyph] {
        &self.glyphs
    }
}

/// Resolve the glyph to use for `codepoint`
///
/// The fallback marker always takes the `default_codepoint` glyph, even if
/// the font defines its own. Other codepoints use their own glyph, falling
/// back to `default_codepoint`.
pub fn resolve<'a, S: GlyphSource + ?Sized>(
    source: &'a S,
    codepoint: u32,
    default_codepoint: u32,
    fallback_marker: u32,
) -> Result<&'a RawGlyph, MissingGlyphError> {
    let lookup = if codepoint == fallback_marker {
        source.glyph(default_codepoint)
    } else {
        source.glyph(codepoint).or_else(|| {
            let fallback = source.glyph(default_codepoint);
            if let Lookup::Found(_) = fallback {
                log::debug!(
                    "{}: no glyph for {codepoint:#04X}; using {default_codepoint:#04X}",
                    source.source_id()
                );
            }
            fallback
        })
    };

    lookup.found().ok_or_else(|| MissingGlyphError {
        codepoint,
        source_id: source.source_id().to_string(),
    })
}

/// Trim and pack one glyph
pub fn convert_glyph(glyph: &RawGlyph) -> TrimmedGlyph {
    let (bbox, rows) = trim_glyph(glyph);
    TrimmedGlyph {
        bbox,
        advance: glyph.advance,
        data: pack(&rows, bbox.width),
    }
}

/// Compute the font descriptor
///
/// Each metric comes from its metadata property when present, otherwise from
/// the untrimmed reference glyph (descent defaults to zero).
pub fn descriptor<S: GlyphSource + ?Sized>(
    source: &S,
    config: &Config,
) -> Result<FontDescriptor, MissingGlyphError> {
    let props = source.properties();
    let prop = |key| props.int(key).and_then(|v| i32::try_conv(v).ok());
    let reference = || {
        source
            .glyph(config.reference_codepoint)
            .found()
            .ok_or_else(|| MissingGlyphError {
                codepoint: config.reference_codepoint,
                source_id: source.source_id().to_string(),
            })
    };

    let avg_width = match prop(AVERAGE_WIDTH) {
        Some(w) => w,
        None => to_i32_sat(reference()?.bbox.width),
    };
    let ascent = match prop(FONT_ASCENT) {
        Some(a) => a,
        None => to_i32_sat(reference()?.bbox.height),
    };
    let descent = prop(FONT_DESCENT).unwrap_or(0);

    Ok(FontDescriptor {
        start: config.start,
        end: config.end,
        avg_width,
        ascent,
        descent,
    })
}

/// Assemble the glyph table and descriptor for `source`
///
/// Every codepoint in the configured range is given an entry. Fails if some
/// codepoint has neither its own glyph nor a `default_codepoint` glyph.
pub fn assemble<S: GlyphSource + ?Sized>(
    source: &S,
    config: &Config,
    default_codepoint: u32,
) -> Result<(FontTable, FontDescriptor), MissingGlyphError> {
    let marker = u32::from(config.fallback_marker);
    let glyphs = config
        .codepoints()
        .map(|cp| resolve(source, u32::from(cp), default_codepoint, marker).map(convert_glyph))
        .collect::<Result<Vec<_>, _>>()?;

    let table = FontTable {
        start: config.start,
        glyphs,
    };
    let descriptor = descriptor(source, config)?;
    Ok((table, descriptor))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::data::BoundingBox;
    use crate::fonts::BdfFont;
    use crate::pack::unpack;

    fn block(width: u32, height: u32, advance: i32) -> RawGlyph {
        RawGlyph {
            bbox: BoundingBox::new(0, -1, width, height),
            advance,
            rows: vec![crate::conv::low_mask(width); crate::conv::to_usize(height)],
        }
    }

    fn font(codepoints: &[u32]) -> BdfFont {
        let mut font = BdfFont::new("test.bdf");
        for (i, cp) in codepoints.iter().enumerate() {
            let w = 1 + crate::conv::to_u32(i % 6);
            font.insert(*cp, block(w, 3, 7));
        }
        font
    }

    #[test]
    fn config_validation() {
        assert!(Config::new(0x20, 0xFF).is_ok());
        assert!(Config::new(0x7F, 0x7F).is_ok());
        assert_eq!(
            Config::new(0x80, 0xFF),
            Err(ConfigError::MissingMarker {
                start: 0x80,
                end: 0xFF,
                marker: 0x7F
            })
        );
        assert_eq!(
            Config::new(0x30, 0x20),
            Err(ConfigError::EmptyRange {
                start: 0x30,
                end: 0x20
            })
        );
        assert_eq!(Config::default(), Config::new(0x20, 0xFF).unwrap());
        assert_eq!(Config::default().len(), 224);
        assert_eq!(Config::default().fallback_marker(), 0x7F);
    }

    #[test]
    fn config_builders() {
        let config = Config::new(0x20, 0x7F)
            .unwrap()
            .with_reference_codepoint(0x48)
            .with_default_codepoint(0x3F);
        assert_eq!(config.reference_codepoint(), 0x48);
        assert_eq!(config.default_codepoint(), 0x3F);
        assert_eq!((config.start(), config.end()), (0x20, 0x7F));
        assert_eq!(Config::default().reference_codepoint(), 0x41);
        assert_eq!(Config::default().default_codepoint(), 0x20);
    }

    #[test]
    fn table_is_complete() {
        let cps: Vec<u32> = (0x20..=0xFF).collect();
        let font = font(&cps);
        let config = Config::default();
        let (table, desc) = assemble(&font, &config, 0x20).unwrap();
        assert_eq!(table.len(), 0xFF - 0x20 + 1);
        assert_eq!(desc.start, 0x20);
        assert_eq!(desc.end, 0xFF);
        for (cp, glyph) in table.iter() {
            assert_eq!(glyph.data.len(), glyph.packed_len(), "codepoint {cp:#04X}");
        }
        assert_eq!(table.iter().count(), table.len());
        assert_eq!(table.glyphs().len(), table.len());
        assert!(!table.is_empty());
        assert_eq!(table.get(0x20), table.glyphs().first());
        assert_eq!(table.get(0xFF), table.glyphs().last());
        assert_eq!(table.get(0x1F), None);
    }

    #[test]
    fn missing_glyph_uses_default() {
        let cps: Vec<u32> = (0x20..=0xFF).filter(|cp| *cp != 0x41).collect();
        let font = font(&cps);
        let (table, _) = assemble(&font, &Config::default(), 0x20).unwrap();
        assert_eq!(table.get(0x41), table.get(0x20));
        assert_ne!(table.get(0x42), table.get(0x20));
    }

    #[test]
    fn marker_always_uses_default() {
        let cps: Vec<u32> = (0x20..=0xFF).collect();
        let mut font = font(&cps);
        font.insert(0x7F, block(5, 5, 6));
        font.insert(0x3F, block(2, 2, 3));
        let (table, _) = assemble(&font, &Config::default(), 0x3F).unwrap();
        let expected = convert_glyph(font.glyph(0x3F).found().unwrap());
        assert_eq!(table.get(0x7F), Some(&expected));
        assert_eq!(table.get(0x3F), Some(&expected));
    }

    #[test]
    fn missing_default_fails() {
        let cps: Vec<u32> = (0x20..=0xFF).filter(|cp| *cp != 0x24).collect();
        let font = font(&cps);
        let err = assemble(&font, &Config::default(), 0x100).unwrap_err();
        assert_eq!(
            err,
            MissingGlyphError {
                codepoint: 0x24,
                source_id: "test.bdf".to_string()
            }
        );
    }

    #[test]
    fn marker_requires_default() {
        let cps: Vec<u32> = (0x20..=0xFF).collect();
        let font = font(&cps);
        let err = resolve(&font, 0x7F, 0x1000, 0x7F).unwrap_err();
        assert_eq!(err.codepoint, 0x7F);
    }

    #[test]
    fn descriptor_from_properties() {
        let mut font = font(&[0x20, 0x41]);
        font.properties_mut().insert(AVERAGE_WIDTH, "60");
        font.properties_mut().insert(FONT_ASCENT, "11");
        font.properties_mut().insert(FONT_DESCENT, "3");
        let config = Config::new(0x20, 0x7F).unwrap();
        let desc = descriptor(&font, &config).unwrap();
        assert_eq!(
            desc,
            FontDescriptor {
                start: 0x20,
                end: 0x7F,
                avg_width: 60,
                ascent: 11,
                descent: 3,
            }
        );
    }

    #[test]
    fn descriptor_from_reference_glyph() {
        let mut font = BdfFont::new("ref.bdf");
        let mut a = block(5, 7, 6);
        // trimming must not affect the metrics
        a.rows[0] = 0;
        font.insert(0x41, a);
        let desc = descriptor(&font, &Config::default()).unwrap();
        assert_eq!((desc.avg_width, desc.ascent, desc.descent), (5, 7, 0));

        let empty = BdfFont::new("empty.bdf");
        let err = descriptor(&empty, &Config::default()).unwrap_err();
        assert_eq!(err.codepoint, 0x41);
    }

    #[test]
    fn descriptor_from_configured_reference() {
        let mut font = BdfFont::new("ref.bdf");
        font.insert(0x41, block(5, 7, 6));
        font.insert(0x48, block(3, 9, 4));
        let config = Config::default().with_reference_codepoint(0x48);
        let desc = descriptor(&font, &config).unwrap();
        assert_eq!((desc.avg_width, desc.ascent, desc.descent), (3, 9, 0));

        let config = Config::default().with_reference_codepoint(0x49);
        let err = descriptor(&font, &config).unwrap_err();
        assert_eq!(err.codepoint, 0x49);
    }

    #[test]
    fn default_codepoint_property() {
        let mut font = BdfFont::new("x");
        let config = Config::default();
        assert_eq!(config.default_codepoint_for(&font), 0x20);
        let configured = Config::default().with_default_codepoint(0x3F);
        assert_eq!(configured.default_codepoint_for(&font), 0x3F);
        font.properties_mut().insert(DEFAULT_CHAR, "63");
        assert_eq!(config.default_codepoint_for(&font), 63);
        assert_eq!(configured.default_codepoint_for(&font), 63);
        font.properties_mut().insert(DEFAULT_CHAR, "-1");
        assert_eq!(config.default_codepoint_for(&font), 0x20);
    }

    #[test]
    fn five_by_seven_packs_to_three_bytes() {
        // Storage order: top row first; column 0 and the bottom row are blank
        let glyph = RawGlyph {
            bbox: BoundingBox::new(0, -2, 5, 7),
            advance: 6,
            rows: vec![
                0b01111, 0b01001, 0b01001, 0b01111, 0b01001, 0b01001, 0b00000,
            ],
        };
        let out = convert_glyph(&glyph);
        assert_eq!(out.bbox, BoundingBox::new(1, -2, 4, 6));
        assert_eq!(out.data.len(), 3);
        assert_eq!(out.data, [0x99, 0xF9, 0x9F]);
    }

    // Check that `out` is a tight, lossless encoding of `glyph`
    fn check_conversion(glyph: &RawGlyph) {
        let out = convert_glyph(glyph);
        let lit: u32 = glyph.rows.iter().map(|row| row.count_ones()).sum();
        if lit == 0 {
            assert_eq!(out.bbox, BoundingBox::ZERO, "{glyph:?}");
            assert!(out.is_blank());
            return;
        }

        let b = out.bbox;
        assert_eq!(out.data.len(), out.packed_len(), "{glyph:?}");
        let rows = unpack(&out.data, b.width, b.height);
        let (_, trimmed) = trim_glyph(glyph);
        assert_eq!(rows, trimmed, "{glyph:?}");

        // tight: first and last rows and both outer columns hold a lit pixel
        let all = rows.iter().fold(0, |acc, row| acc | row);
        assert_ne!(rows.first().copied(), Some(0), "{glyph:?}");
        assert_ne!(rows.last().copied(), Some(0), "{glyph:?}");
        assert_eq!(all & 1, 1, "{glyph:?}");
        assert_ne!(all & (1 << (b.width - 1)), 0, "{glyph:?}");

        // lossless: every lit source pixel appears at its shifted position
        let count: u32 = rows.iter().map(|row| row.count_ones()).sum();
        assert_eq!(count, lit, "{glyph:?}");
        let col_start = u32::try_conv(b.x - glyph.bbox.x).unwrap();
        let top = usize::try_conv(b.y - glyph.bbox.y).unwrap();
        let bottom = glyph.rows.len() - top - rows.len();
        for (y, src) in glyph.rows_bottom_up().enumerate() {
            for x in 0..glyph.bbox.width {
                if src >> (glyph.bbox.width - 1 - x) & 1 == 1 {
                    let row = rows[y - bottom];
                    let shift = b.width - 1 - (x - col_start);
                    assert_eq!(row >> shift & 1, 1, "{glyph:?} at ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn every_three_by_three_raster() {
        for bits in 0..512u64 {
            let glyph = RawGlyph {
                bbox: BoundingBox::new(0, 0, 3, 3),
                advance: 4,
                rows: vec![bits >> 6 & 0b111, bits >> 3 & 0b111, bits & 0b111],
            };
            check_conversion(&glyph);
        }
    }

    #[test]
    fn wide_and_ragged_rasters() {
        // xorshift: deterministic pseudo-random pixels
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        let mut next = move || {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;
            state
        };

        for width in [1, 2, 7, 8, 9, 13, 16, 17, 31, 33, 63, 64] {
            for height in [1, 2, 5, 8, 11, 16] {
                for density in 0..4 {
                    let rows = (0..height)
                        .map(|_| {
                            // sparser rows for higher `density`
                            let mut row = next();
                            for _ in 0..density {
                                row &= next();
                            }
                            row & crate::conv::low_mask(width)
                        })
                        .collect();
                    let glyph = RawGlyph {
                        bbox: BoundingBox::new(-3, -2, width, crate::conv::to_u32(height)),
                        advance: 5,
                        rows,
                    };
                    check_conversion(&glyph);
                }
            }
        }

        // isolated pixels in otherwise blank rasters
        for (x, y) in [(0, 0), (63, 0), (0, 9), (63, 9), (31, 4)] {
            let mut rows = vec![0; 10];
            rows[y] = 1 << (63 - x);
            check_conversion(&RawGlyph {
                bbox: BoundingBox::new(0, 0, 64, 10),
                advance: 64,
                rows,
            });
        }
    }

    #[test]
    fn blank_glyph_has_no_data() {
        let glyph = RawGlyph {
            bbox: BoundingBox::new(0, -2, 6, 12),
            advance: 6,
            rows: vec![0; 12],
        };
        let out = convert_glyph(&glyph);
        assert_eq!(out.bbox, BoundingBox::ZERO);
        assert_eq!(out.advance, 6);
        assert!(out.is_blank());
    }
}
