//! Shared constants and engine configuration.

use std::ffi::{OsStr, OsString};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Executable used when no engine is configured explicitly
pub const DEFAULT_ENGINE: &str = "xz";

/// File extension the default engine appends to compressed files
pub const XZ_EXTENSION: &str = "xz";

/// Capacity of the in-memory pipe between the engine worker and the consumer
pub const DEFAULT_PIPE_CAPACITY: usize = 64 * 1024;

/// Chunk size used when hashing files and streams
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Digest algorithm used when the caller does not pick one
pub const DEFAULT_ALGORITHM: &str = "sha256";

/// Highest compression preset understood by the engine
pub const MAX_LEVEL: u32 = 9;

/// Describes how to reach the external engine and how to talk to it.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    program: PathBuf,
    leading_args: Vec<OsString>,
    suffix: String,
    pipe_capacity: NonZeroUsize,
    timeout: Option<Duration>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE)
    }
}

impl EngineConfig {
    /// Creates a configuration for the given engine executable.
    ///
    /// The executable is resolved through `PATH` when it is not a path.
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            suffix: XZ_EXTENSION.to_string(),
            pipe_capacity: NonZeroUsize::new(DEFAULT_PIPE_CAPACITY).unwrap_or(NonZeroUsize::MIN),
            timeout: None,
        }
    }

    /// Arguments placed before the per-invocation arguments on every call.
    pub fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.leading_args = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        self
    }

    /// Sets the suffix the engine appends when compressing in place.
    ///
    /// A leading dot is ignored, so `".xz"` and `"xz"` are equivalent.
    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        let suffix = suffix.into();
        self.suffix = suffix.trim_start_matches('.').to_string();
        self
    }

    /// Sets the capacity of the streaming pipe.
    pub fn with_pipe_capacity(mut self, capacity: NonZeroUsize) -> Self {
        self.pipe_capacity = capacity;
        self
    }

    /// Bounds every engine invocation. `None` waits forever.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn leading_args(&self) -> &[OsString] {
        &self.leading_args
    }

    pub fn suffix(&self) -> &str {
        &self.suffix
    }

    pub fn pipe_capacity(&self) -> usize {
        self.pipe_capacity.get()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Program name as shown in errors and log records.
    pub fn display_name(&self) -> String {
        self.program.display().to_string()
    }

    /// Path of the artifact the engine writes when compressing `source` in place.
    ///
    /// The engine appends its suffix to the full file name, so `notes.txt`
    /// becomes `notes.txt.xz` and `data` becomes `data.xz`.
    pub fn artifact_path(&self, source: &Path) -> PathBuf {
        let mut name = source.as_os_str().to_owned();
        name.push(".");
        name.push(&self.suffix);
        PathBuf::from(name)
    }
}
