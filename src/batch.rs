// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! Batch conversion of a font directory
//!
//! All matching files are converted in natural filename order. The output is
//! accumulated in memory; nothing is written unless every font converts.

use crate::emit::{self, EmitOptions};
use crate::fonts::{assemble, BdfFont, Config, ConfigError, MissingGlyphError, ParseError};
use std::cmp::Ordering;
use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Batch conversion errors
#[derive(Error, Debug)]
pub enum Error {
    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ParseError,
    },
    #[error(transparent)]
    MissingGlyph(#[from] MissingGlyphError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("formatting error")]
    Format(#[from] fmt::Error),
}

/// Batch options
#[derive(Clone, Debug)]
pub struct BatchOptions {
    /// Directory to scan for font files
    pub input_dir: PathBuf,
    /// Only files whose names end with this suffix are converted
    pub suffix: String,
    pub config: Config,
    pub emit: EmitOptions,
}

impl BatchOptions {
    /// Construct with default options for `input_dir`
    pub fn new(input_dir: impl Into<PathBuf>) -> Self {
        BatchOptions {
            input_dir: input_dir.into(),
            suffix: ".bdf".to_string(),
            config: Config::default(),
            emit: EmitOptions::default(),
        }
    }
}

/// Generated artifacts
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Output {
    /// C source defining glyph tables and font descriptors
    pub source: String,
    /// Forward declarations: a header line, then one line per font
    pub declarations: String,
    /// Identifier fragment of each converted font, in output order
    pub fonts: Vec<String>,
}

impl Output {
    /// Write the C source to `source` and, if given, the declarations to
    /// `declarations`
    ///
    /// Each file is first written beside its target, then all are renamed
    /// into place. On error, staged files are removed and any target already
    /// renamed is deleted again.
    pub fn write_files(&self, source: &Path, declarations: Option<&Path>) -> Result<(), Error> {
        let mut files = vec![(source, self.source.as_str())];
        files.extend(declarations.map(|path| (path, self.declarations.as_str())));
        let staged: Vec<PathBuf> = files.iter().map(|(path, _)| staging_path(path)).collect();

        let result = commit(&files, &staged);
        if result.is_err() {
            for path in &staged {
                // may not exist
                let _ = fs::remove_file(path);
            }
        }
        result
    }
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

fn commit(files: &[(&Path, &str)], staged: &[PathBuf]) -> Result<(), Error> {
    for ((_, text), partial) in files.iter().zip(staged) {
        fs::write(partial, text).map_err(|source| Error::Io {
            path: partial.clone(),
            source,
        })?;
    }

    for (i, ((path, _), partial)) in files.iter().zip(staged).enumerate() {
        if let Err(source) = fs::rename(partial, path) {
            for (done, _) in &files[..i] {
                discard(done);
            }
            return Err(Error::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    }
    Ok(())
}

/// Remove an output file after a later failure
pub fn discard(path: &Path) {
    if let Err(err) = fs::remove_file(path) {
        log::warn!("failed to remove {}: {err}", path.display());
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> impl Iterator<Item = Chunk<'_>> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digits = first.is_ascii_digit();
        let len = rest
            .find(|c: char| c.is_ascii_digit() != digits)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(len);
        rest = tail;
        Some(if digits {
            Chunk::Digits(chunk)
        } else {
            Chunk::Text(chunk)
        })
    })
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
        .then_with(|| a.len().cmp(&b.len()))
}

/// Compare strings in natural order
///
/// Runs of ASCII digits compare by numeric value, so `font5x8` sorts before
/// `font12x24`. Other text compares lexicographically.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut a_iter = chunks(a);
    let mut b_iter = chunks(b);
    loop {
        let ord = match (a_iter.next(), b_iter.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(Chunk::Digits(x)), Some(Chunk::Digits(y))) => cmp_digits(x, y),
            (Some(Chunk::Digits(_)), Some(Chunk::Text(_))) => Ordering::Less,
            (Some(Chunk::Text(_)), Some(Chunk::Digits(_))) => Ordering::Greater,
            (Some(Chunk::Text(x)), Some(Chunk::Text(y))) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
}

/// List files in `dir` whose names end with `suffix`, in natural order
pub fn discover(dir: &Path, suffix: &str) -> Result<Vec<PathBuf>, Error> {
    let io_err = |source| Error::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let entry = entry.map_err(io_err)?;
        let path = entry.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(suffix));
        if matches && path.is_file() {
            files.push(path);
        }
    }

    files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Load and parse one BDF file
pub fn load(path: &Path) -> Result<BdfFont, Error> {
    let bytes = fs::read(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    BdfFont::from_bytes(file_name(path), &bytes).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Convert one font, appending to `output`
///
/// On error, `output` is left unchanged.
pub fn convert_font(
    font: &BdfFont,
    name: &str,
    options: &BatchOptions,
    output: &mut Output,
) -> Result<(), Error> {
    let default_codepoint = options.config.default_codepoint_for(font);
    let (table, desc) = assemble(font, &options.config, default_codepoint)?;

    let mut source = String::new();
    emit::write_font(&mut source, &options.emit, name, &table, &desc)?;
    emit::write_declaration(&mut output.declarations, &options.emit, name)?;
    output.source.push_str(&source);
    output.fonts.push(name.to_string());
    Ok(())
}

/// Convert every matching font in the input directory
pub fn run(options: &BatchOptions) -> Result<Output, Error> {
    let files = discover(&options.input_dir, &options.suffix)?;
    if files.is_empty() {
        log::warn!(
            "no files matching *{} in {}",
            options.suffix,
            options.input_dir.display()
        );
    }

    let mut output = Output::default();
    emit::write_prologue(&mut output.source, &options.emit)?;
    emit::write_declarations_header(&mut output.declarations)?;

    for path in &files {
        let font = load(path)?;
        let name = emit::font_name(font.name(), &options.suffix);
        log::info!("converting {} ({} glyphs) as {name}", path.display(), font.len());
        convert_font(&font, &name, options, &mut output)?;
    }

    Ok(output)
}
