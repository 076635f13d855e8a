//! Configuration types and constants for xzsafe CLI operations.

use std::path::PathBuf;
use std::time::Duration;

use xzsafe_core::config::{DEFAULT_ALGORITHM, DEFAULT_ENGINE, XZ_EXTENSION};
use xzsafe_core::EngineConfig;

/// Name used on the command line for standard input
pub const STDIN_MARKER: &str = "-";

/// Environment variable overriding the engine executable
pub const ENGINE_ENV: &str = "XZSAFE_ENGINE";

/// Represents different modes of operation for the CLI
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    /// Compress input data
    Compress,
    /// Decompress input data
    Decompress,
    /// Compress, verify the round trip and remove the source on success
    Check,
}

/// Configuration for CLI operations
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)]
pub struct CliConfig {
    /// Operation mode
    pub mode: OperationMode,
    /// Force overwrite existing files
    pub force: bool,
    /// Keep input files after processing
    pub keep: bool,
    /// Output to stdout
    pub stdout: bool,
    /// Verbose output
    pub verbose: bool,
    /// Quiet level (suppress warnings, then errors)
    pub quiet: u8,
    /// Compression level (0-9)
    pub level: Option<u32>,
    /// Digest algorithm used by [`OperationMode::Check`]
    pub checksum: String,
    /// Engine executable
    pub engine: PathBuf,
    /// Upper bound for one engine invocation
    pub timeout: Option<Duration>,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            mode: OperationMode::Compress,
            force: false,
            keep: false,
            stdout: false,
            verbose: false,
            quiet: 0,
            level: None,
            checksum: DEFAULT_ALGORITHM.to_string(),
            engine: PathBuf::from(DEFAULT_ENGINE),
            timeout: None,
        }
    }
}

impl CliConfig {
    /// Engine settings derived from this configuration.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new(&self.engine)
            .with_suffix(XZ_EXTENSION)
            .with_timeout(self.timeout)
    }
}
