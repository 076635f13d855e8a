//! Command line argument parsing for xzsafe

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use xzsafe_cli::{CliConfig, OperationMode, ENGINE_ENV};
use xzsafe_core::config::{DEFAULT_ALGORITHM, DEFAULT_ENGINE};

/// Integrity-verified xz compression
///
/// Compresses and decompresses files through the system `xz`. With `--check`
/// the original is removed only after the archive has been decompressed again
/// and its digest matched the original's.
#[derive(Parser, Debug)]
#[command(
    name = "xzsafe",
    version,
    about = "Compress, decompress, or verified-archive files through xz",
    long_about = "xzsafe delegates compression to an external xz engine. In --check mode \
                 it compresses each file, decompresses the result, compares digests and \
                 deletes the original only when they match."
)]
#[allow(clippy::struct_excessive_bools)]
pub struct XzsafeOpts {
    /// Files to process; `-` or none reads standard input
    #[arg(value_name = "FILE")]
    pub files: Vec<String>,

    /// Additional file to process
    #[arg(long = "file", value_name = "FILE", hide = true)]
    pub extra_files: Vec<String>,

    /// Compress in place (default)
    #[arg(
        short = 'z',
        long = "compress",
        alias = "deflate",
        conflicts_with_all = ["decompress", "check"]
    )]
    pub compress: bool,

    /// Decompress
    #[arg(
        short = 'd',
        long = "decompress",
        alias = "inflate",
        conflicts_with_all = ["compress", "check"]
    )]
    pub decompress: bool,

    /// Compress, verify the round trip and delete the source on match
    #[arg(
        long = "check",
        alias = "deflate-check",
        conflicts_with_all = ["compress", "decompress", "stdout"]
    )]
    pub check: bool,

    /// Write to standard output and don't delete input files
    #[arg(short = 'c', long = "stdout", alias = "to-stdout")]
    pub stdout: bool,

    /// Keep (don't delete) input files
    #[arg(short = 'k', long = "keep")]
    pub keep: bool,

    /// Force overwrite of output file
    #[arg(short = 'f', long = "force")]
    pub force: bool,

    /// Verbose mode
    #[arg(short = 'v', long = "verbose", conflicts_with = "quiet")]
    pub verbose: bool,

    /// Quiet mode (suppress warnings). Use twice to suppress errors too.
    #[arg(short = 'q', long = "quiet", conflicts_with = "verbose", action = clap::ArgAction::Count)]
    pub quiet: u8,

    /// Compression preset level 0 (fastest)
    #[arg(short = '0', group = "level")]
    pub level_0: bool,

    /// Compression preset level 1
    #[arg(short = '1', group = "level")]
    pub level_1: bool,

    /// Compression preset level 2
    #[arg(short = '2', group = "level")]
    pub level_2: bool,

    /// Compression preset level 3
    #[arg(short = '3', group = "level")]
    pub level_3: bool,

    /// Compression preset level 4
    #[arg(short = '4', group = "level")]
    pub level_4: bool,

    /// Compression preset level 5
    #[arg(short = '5', group = "level")]
    pub level_5: bool,

    /// Compression preset level 6 (engine default)
    #[arg(short = '6', group = "level")]
    pub level_6: bool,

    /// Compression preset level 7
    #[arg(short = '7', group = "level")]
    pub level_7: bool,

    /// Compression preset level 8
    #[arg(short = '8', group = "level")]
    pub level_8: bool,

    /// Compression preset level 9 (best)
    #[arg(short = '9', group = "level")]
    pub level_9: bool,

    /// Digest algorithm used by --check (xxh3, crc32, md5, sha256, blake3)
    #[arg(short = 'C', long = "checksum", value_name = "ALG", default_value = DEFAULT_ALGORITHM)]
    pub checksum: String,

    /// Engine executable
    #[arg(long = "engine", value_name = "PATH", env = ENGINE_ENV, default_value = DEFAULT_ENGINE)]
    pub engine: PathBuf,

    /// Abort an engine invocation after this many seconds
    #[arg(long = "timeout", value_name = "SECS")]
    pub timeout: Option<u64>,
}

impl XzsafeOpts {
    /// Parse command line arguments
    pub fn parse() -> Self {
        Parser::parse()
    }

    /// Determine operation mode based on flags
    pub fn operation_mode(&self) -> OperationMode {
        if self.check {
            OperationMode::Check
        } else if self.decompress {
            OperationMode::Decompress
        } else {
            OperationMode::Compress
        }
    }

    /// Get the compression level from the preset flags
    pub fn compression_level(&self) -> Option<u32> {
        [
            (self.level_0, 0),
            (self.level_1, 1),
            (self.level_2, 2),
            (self.level_3, 3),
            (self.level_4, 4),
            (self.level_5, 5),
            (self.level_6, 6),
            (self.level_7, 7),
            (self.level_8, 8),
            (self.level_9, 9),
        ]
        .iter()
        .find_map(|&(flag, level)| flag.then_some(level))
    }

    /// Every input, positional ones first
    pub fn inputs(&self) -> Vec<String> {
        self.files
            .iter()
            .chain(&self.extra_files)
            .cloned()
            .collect()
    }

    /// Build CLI configuration from the parsed options
    pub fn config(&self) -> Result<CliConfig, Box<dyn std::error::Error>> {
        let timeout = match self.timeout {
            Some(0) => return Err("--timeout must be at least one second".into()),
            Some(secs) => Some(Duration::from_secs(secs)),
            None => None,
        };

        Ok(CliConfig {
            mode: self.operation_mode(),
            force: self.force,
            keep: self.keep,
            stdout: self.stdout,
            verbose: self.verbose,
            quiet: self.quiet,
            level: self.compression_level(),
            checksum: self.checksum.clone(),
            engine: self.engine.clone(),
            timeout,
        })
    }
}
