// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Glyph sources

use crate::data::RawGlyph;
use std::collections::BTreeMap;

/// Result of looking up a glyph by codepoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lookup<'a> {
    Found(&'a RawGlyph),
    NotFound,
}

impl<'a> Lookup<'a> {
    /// Convert to an `Option`
    #[inline]
    pub fn found(self) -> Option<&'a RawGlyph> {
        match self {
            Lookup::Found(glyph) => Some(glyph),
            Lookup::NotFound => None,
        }
    }

    /// Use `f` to look up a substitute if not found
    #[inline]
    pub fn or_else(self, f: impl FnOnce() -> Lookup<'a>) -> Lookup<'a> {
        match self {
            Lookup::Found(_) => self,
            Lookup::NotFound => f(),
        }
    }
}

impl<'a> From<Option<&'a RawGlyph>> for Lookup<'a> {
    fn from(glyph: Option<&'a RawGlyph>) -> Self {
        glyph.map(Lookup::Found).unwrap_or(Lookup::NotFound)
    }
}

/// Font metadata properties
///
/// String-keyed, as found in a BDF `STARTPROPERTIES` block. Values are stored
/// without surrounding quotes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    /// Construct an empty set
    #[inline]
    pub fn new() -> Self {
        Properties::default()
    }

    /// Set a property, returning any previous value
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    /// Get a property as text
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Get an integer property
    ///
    /// Returns `None` if the property is absent or not an integer.
    pub fn int(&self, key: &str) -> Option<i64> {
        self.get(key)?.trim().parse().ok()
    }

    /// Number of properties
    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True if no property is set
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(key, value)` pairs in key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// A provider of glyphs by codepoint
pub trait GlyphSource {
    /// Identifier used in diagnostics (usually a file name)
    fn source_id(&self) -> &str;

    /// Look up the glyph for `codepoint`
    fn glyph(&self, codepoint: u32) -> Lookup<'_>;

    /// Font metadata
    fn properties(&self) -> &Properties;
}
