//! Error types for xzsafe CLI operations.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use xzsafe_core::{ArchiveError, DigestError, TranscodeError};

/// A structured CLI error that preserves the underlying failure.
///
/// Carries the program name and input file so that `-q/-qq` can suppress
/// output without losing context.
#[derive(Debug)]
pub struct InvocationError {
    /// Program name to prefix in error output
    pub program: String,
    /// Input file path, or `None` for stdin.
    pub file: Option<String>,
    /// Underlying error produced by processing.
    pub source: CliError,
}

impl std::fmt::Display for InvocationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.file.as_deref() {
            Some(file) => write!(f, "{}: {}: {}", self.program, file, self.source),
            None => write!(f, "{}: (stdin): {}", self.program, self.source),
        }
    }
}

impl std::error::Error for InvocationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

/// Formats an error message for stderr, respecting `-q/-qq`.
///
/// # Returns
///
/// `None` when the message should be suppressed by `quiet`, otherwise a
/// single-line message suitable for stderr.
pub fn format_error_for_stderr(program: &str, quiet: u8, err: &io::Error) -> Option<String> {
    if quiet >= 2 {
        return None;
    }

    let run_err = err
        .get_ref()
        .and_then(|e| e.downcast_ref::<InvocationError>());

    if quiet >= 1 && run_err.is_some_and(|e| e.source.as_warning().is_some()) {
        return None;
    }

    if let Some(run_err) = run_err {
        return Some(run_err.to_string());
    }

    Some(format!("{program}: {err}"))
}

/// Non-fatal conditions; the file is skipped.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Warning {
    /// Input file lacks the engine suffix
    #[error("Filename has an unknown suffix, skipping")]
    InvalidExtension {
        /// Path to the input file
        path: PathBuf,
    },

    /// Input file already has the target suffix
    #[error("Already has `{suffix}` suffix, skipping")]
    AlreadyHasSuffix {
        /// Path to the input file
        path: PathBuf,
        /// The suffix that already exists
        suffix: String,
    },
}

/// Main error type for xzsafe CLI operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to open input file
    #[error("{source}")]
    OpenInput {
        /// Path to the input file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Output file already exists
    #[error("{}: Output file already exists", path.display())]
    OutputExists {
        /// Path to the existing file
        path: PathBuf,
    },

    /// Cannot determine output filename
    #[error("Cannot determine output filename")]
    InvalidOutputFilename {
        /// Path to the input file
        path: PathBuf,
    },

    /// The engine failed
    #[error(transparent)]
    Transcode(#[from] TranscodeError),

    /// The archive workflow could not run
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// Unknown digest algorithm
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// The archive workflow finished without removing the source
    #[error("archive not verified, source kept")]
    NotArchived,

    /// Verified archiving needs a named file
    #[error("--check cannot read from standard input")]
    CheckNeedsFile,

    /// Reading stdin or writing stdout failed
    #[error("{0}")]
    Stdio(#[source] io::Error),
}

/// Specialized `Result` type for xzsafe CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// This represents both "real" failures and warning/notice conditions.
#[derive(Debug, Error)]
pub enum CliError {
    /// Warning/notice condition.
    #[error(transparent)]
    Warning(#[from] Warning),

    /// Real failure condition.
    #[error(transparent)]
    Error(#[from] Error),
}

impl CliError {
    /// Returns a reference to the warning if this error represents a warning/notice.
    pub fn as_warning(&self) -> Option<&Warning> {
        match self {
            CliError::Warning(w) => Some(w),
            CliError::Error(_) => None,
        }
    }

    /// Returns a reference to the underlying "real" error, if any.
    pub fn as_error(&self) -> Option<&Error> {
        match self {
            CliError::Warning(_) => None,
            CliError::Error(e) => Some(e),
        }
    }
}

impl From<TranscodeError> for CliError {
    fn from(err: TranscodeError) -> Self {
        CliError::Error(Error::Transcode(err))
    }
}

impl From<ArchiveError> for CliError {
    fn from(err: ArchiveError) -> Self {
        CliError::Error(Error::Archive(err))
    }
}

impl From<DigestError> for CliError {
    fn from(err: DigestError) -> Self {
        CliError::Error(Error::Digest(err))
    }
}

impl CliError {
    /// The [`io::ErrorKind`] this error maps to, preserving underlying I/O kinds.
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            CliError::Warning(_) => io::ErrorKind::InvalidInput,
            CliError::Error(source) => match source {
                Error::OutputExists { .. } => io::ErrorKind::AlreadyExists,
                Error::InvalidOutputFilename { .. }
                | Error::Digest(_)
                | Error::CheckNeedsFile
                | Error::Transcode(TranscodeError::InvalidLevel { .. }) => {
                    io::ErrorKind::InvalidInput
                }
                Error::NotArchived
                | Error::Transcode(TranscodeError::EngineExitedNonzero { .. }) => {
                    io::ErrorKind::InvalidData
                }
                Error::Transcode(TranscodeError::EngineTimedOut { .. }) => io::ErrorKind::TimedOut,
                Error::Transcode(TranscodeError::SourceOpenFailed { source, .. })
                | Error::Transcode(TranscodeError::EngineSpawnFailed { source, .. })
                | Error::Transcode(TranscodeError::Pipe(source))
                | Error::OpenInput { source, .. }
                | Error::Stdio(source) => {
                    // Preserve the original error kind
                    source.kind()
                }
                Error::Archive(archive) => match archive {
                    ArchiveError::SourceUnreadable { source, .. }
                    | ArchiveError::RemoveSource { source, .. } => source.kind(),
                    ArchiveError::Digest(_) => io::ErrorKind::InvalidInput,
                },
                Error::Transcode(TranscodeError::WorkerLost) => io::ErrorKind::Other,
            },
        }
    }
}

impl From<CliError> for io::Error {
    fn from(err: CliError) -> Self {
        io::Error::new(err.kind(), err)
    }
}
