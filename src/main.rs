// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License in the LICENSE-APACHE file or at:
//     https://www.apache.org/licenses/LICENSE-2.0

//! `bdf-pack` — convert a directory of BDF fonts to C glyph tables

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use bdf_pack::emit::EmitOptions;
use bdf_pack::fonts::Config;
use bdf_pack::{batch, BatchOptions, Error};

#[derive(Parser, Debug)]
#[command(
    name = "bdf-pack",
    version,
    about = "Convert BDF bitmap fonts to packed C glyph tables"
)]
struct Cli {
    /// Directory containing font files
    #[arg(default_value = ".")]
    input_dir: PathBuf,

    /// Output C source file
    #[arg(short, long, default_value = "ili9341_fonts.c")]
    output: PathBuf,

    /// Write forward declarations to this file instead of stdout
    #[arg(long, value_name = "FILE")]
    declarations: Option<PathBuf>,

    /// File name suffix of fonts to convert
    #[arg(long, default_value = ".bdf")]
    suffix: String,

    /// First codepoint (inclusive); the range must contain 0x7F
    #[arg(long, default_value = "0x20", value_parser = parse_byte)]
    start: u8,

    /// Last codepoint (inclusive)
    #[arg(long, default_value = "0xFF", value_parser = parse_byte)]
    end: u8,

    /// Glyph supplying metrics when font properties are missing
    #[arg(long, default_value = "0x41", value_parser = parse_codepoint)]
    reference: u32,

    /// Substitute glyph for fonts without a DEFAULT_CHAR property
    #[arg(long, default_value = "0x20", value_parser = parse_codepoint)]
    default_char: u32,

    /// Symbol prefix for generated types and fonts
    #[arg(long, default_value = "ILI9341")]
    prefix: String,

    /// Header included by the generated source
    #[arg(long, default_value = "ili9341_fonts.h")]
    header: String,

    /// Text encoding used for glyph comments
    #[arg(long, default_value = "ISO-8859-1")]
    encoding: String,

    /// Increase log verbosity (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_codepoint(s: &str) -> Result<u32, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse(),
    };
    parsed.map_err(|e| format!("invalid codepoint \"{s}\": {e}"))
}

fn parse_byte(s: &str) -> Result<u8, String> {
    let codepoint = parse_codepoint(s)?;
    u8::try_from(codepoint).map_err(|_| format!("codepoint \"{s}\" is above 0xFF"))
}

impl Cli {
    fn batch_options(&self) -> Result<BatchOptions, String> {
        let config = Config::new(self.start, self.end)
            .map_err(|e| e.to_string())?
            .with_reference_codepoint(self.reference)
            .with_default_codepoint(self.default_char);
        let emit = EmitOptions {
            prefix: self.prefix.clone(),
            header: self.header.clone(),
            ..Default::default()
        }
        .with_encoding_label(&self.encoding)
        .ok_or_else(|| format!("unknown encoding \"{}\"", self.encoding))?;

        Ok(BatchOptions {
            input_dir: self.input_dir.clone(),
            suffix: self.suffix.clone(),
            config,
            emit,
        })
    }
}

fn write_outputs(cli: &Cli, output: &bdf_pack::Output) -> Result<(), Error> {
    output.write_files(&cli.output, cli.declarations.as_deref())?;
    if cli.declarations.is_none() {
        let written = io::stdout().lock().write_all(output.declarations.as_bytes());
        if let Err(source) = written {
            batch::discard(&cli.output);
            return Err(Error::Io {
                path: PathBuf::from("<stdout>"),
                source,
            });
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // Configuration is validated once, before any font is read
    let options = match cli.batch_options() {
        Ok(options) => options,
        Err(msg) => {
            eprintln!("Error: {msg}");
            return ExitCode::from(2);
        }
    };

    let result = batch::run(&options).and_then(|output| {
        write_outputs(&cli, &output)?;
        log::info!(
            "wrote {} font(s) to {}",
            output.fonts.len(),
            cli.output.display()
        );
        Ok(())
    });

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
