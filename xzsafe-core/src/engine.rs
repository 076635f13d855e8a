//! Requests and the command-line contract of the external engine.
//!
//! The engine follows the `xz` calling convention:
//!
//! - compress in place: `engine [--keep] [--force] [-N] -- <file>`
//! - decompress in place: `engine --decompress [--keep] [--force] -- <file>`
//! - stream: `engine --compress|--decompress --stdout [-N]` reading stdin
//!
//! Byte-buffer and standard-input sources are always streamed through stdin
//! and stdout, since there is no file for the engine to work on.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::config::MAX_LEVEL;
use crate::error::{Result, TranscodeError};

/// Which way the bytes go through the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Produce compressed output
    Compress,
    /// Restore the original bytes
    Decompress,
}

/// How the engine output is handed to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Run to completion and return everything at once
    Buffered,
    /// Return a lazily filled byte stream while the engine runs
    Streaming,
}

/// Origin of the bytes fed to the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A file on disk
    File(PathBuf),
    /// Bytes held in memory
    Bytes(Vec<u8>),
    /// Our own standard input, passed to the engine as its stdin
    Stdin,
}

impl Source {
    /// Path of a file source.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Source::File(path) => Some(path),
            Source::Bytes(_) | Source::Stdin => None,
        }
    }

    /// Whether the engine can only reach these bytes through its stdin.
    pub fn needs_stdio(&self) -> bool {
        !matches!(self, Source::File(_))
    }
}

/// Per-invocation switches passed to the engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineOptions {
    /// Keep the input file when working in place
    pub keep: bool,
    /// Overwrite an existing output file
    pub force: bool,
    /// Compression preset (0-9)
    pub level: Option<u32>,
}

impl EngineOptions {
    pub fn keep(mut self, keep: bool) -> Self {
        self.keep = keep;
        self
    }

    pub fn force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    pub fn level(mut self, level: Option<u32>) -> Self {
        self.level = level;
        self
    }

    /// Rejects presets the engine does not know.
    ///
    /// # Errors
    ///
    /// Returns [`TranscodeError::InvalidLevel`] for presets above 9.
    pub fn validate(&self) -> Result<()> {
        match self.level {
            Some(level) if level > MAX_LEVEL => Err(TranscodeError::InvalidLevel { level }),
            _ => Ok(()),
        }
    }
}

/// One engine invocation, fully described.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscodeRequest {
    source: Source,
    direction: Direction,
    delivery: Delivery,
    options: EngineOptions,
}

impl TranscodeRequest {
    pub fn new(source: Source, direction: Direction, delivery: Delivery) -> Self {
        Self {
            source,
            direction,
            delivery,
            options: EngineOptions::default(),
        }
    }

    /// Compress a file in place, next to the original.
    pub fn compress_file(path: impl Into<PathBuf>) -> Self {
        Self::new(
            Source::File(path.into()),
            Direction::Compress,
            Delivery::Buffered,
        )
    }

    /// Decompress a file in place.
    pub fn decompress_file(path: impl Into<PathBuf>) -> Self {
        Self::new(
            Source::File(path.into()),
            Direction::Decompress,
            Delivery::Buffered,
        )
    }

    /// Decompress a file as a byte stream.
    pub fn decompress_stream(path: impl Into<PathBuf>) -> Self {
        Self::new(
            Source::File(path.into()),
            Direction::Decompress,
            Delivery::Streaming,
        )
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn options(&self) -> EngineOptions {
        self.options
    }

    /// Whether the engine reads stdin and writes stdout instead of working on a file.
    pub fn uses_stdio(&self) -> bool {
        self.delivery == Delivery::Streaming || self.source.needs_stdio()
    }

    pub(crate) fn into_parts(self) -> (Source, Direction, Delivery, EngineOptions) {
        (self.source, self.direction, self.delivery, self.options)
    }
}

/// Builds the per-invocation engine arguments.
pub(crate) fn engine_args(
    source: &Source,
    direction: Direction,
    stdio: bool,
    options: EngineOptions,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = Vec::new();

    match direction {
        Direction::Compress if stdio => args.push("--compress".into()),
        Direction::Compress => {}
        Direction::Decompress => args.push("--decompress".into()),
    }

    if stdio {
        args.push("--stdout".into());
    } else if options.keep {
        args.push("--keep".into());
    }

    if options.force {
        args.push("--force".into());
    }

    if let (Direction::Compress, Some(level)) = (direction, options.level) {
        args.push(format!("-{level}").into());
    }

    // Only in-place invocations name the file; streams read stdin
    if let (false, Source::File(path)) = (stdio, source) {
        args.push("--".into());
        args.push(path.as_os_str().to_owned());
    }

    args
}
