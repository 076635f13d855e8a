//! Error types for engine invocations, digests and the archive workflow.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

/// Result alias for engine invocations.
pub type Result<T> = std::result::Result<T, TranscodeError>;

/// Failure of a single engine invocation.
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// The source could not be opened; no engine was started
    #[error("{}: cannot open source: {source}", path.display())]
    SourceOpenFailed {
        /// Path of the source
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The engine executable could not be started
    #[error("{program}: cannot start engine: {source}")]
    EngineSpawnFailed {
        /// Engine executable
        program: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The engine ran and reported failure
    #[error("{program}: engine failed ({status}): {}", diagnostics.trim_end())]
    EngineExitedNonzero {
        /// Engine executable
        program: String,
        /// Exit status of the engine
        status: ExitStatus,
        /// Text the engine wrote to its error channel
        diagnostics: String,
    },

    /// The engine did not finish in time and was killed
    #[error("{program}: engine did not finish within {timeout:?}")]
    EngineTimedOut {
        /// Engine executable
        program: String,
        /// Configured limit
        timeout: Duration,
    },

    /// Compression preset outside of `0..=9`
    #[error("Unsupported preset: {level}")]
    InvalidLevel {
        /// The rejected preset
        level: u32,
    },

    /// Moving bytes to or from the engine failed
    #[error("engine pipe failed: {0}")]
    Pipe(#[source] io::Error),

    /// The streaming worker went away without reporting a status
    #[error("engine worker ended without reporting a status")]
    WorkerLost,
}

impl TranscodeError {
    /// Returns the engine failure carried by an I/O error, if any.
    ///
    /// Streams report engine failure through [`io::Error`] values that wrap a
    /// [`TranscodeError`]; this recovers it without consuming the error.
    pub fn from_io(err: &io::Error) -> Option<&TranscodeError> {
        err.get_ref()
            .and_then(|inner| inner.downcast_ref::<TranscodeError>())
    }

    /// Splits an I/O error into the engine failure it carries, or gives it back.
    ///
    /// # Errors
    ///
    /// Returns the original error unchanged when it does not wrap a
    /// [`TranscodeError`].
    pub fn try_from_io(err: io::Error) -> std::result::Result<TranscodeError, io::Error> {
        if Self::from_io(&err).is_none() {
            return Err(err);
        }
        let kind = err.kind();
        match err.into_inner() {
            Some(inner) => inner
                .downcast::<TranscodeError>()
                .map(|engine| *engine)
                .map_err(|other| io::Error::new(kind, other)),
            None => Err(io::Error::from(kind)),
        }
    }

    /// Diagnostic text captured from the engine, when the engine itself failed.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            TranscodeError::EngineExitedNonzero { diagnostics, .. } => Some(diagnostics),
            _ => None,
        }
    }
}

impl From<TranscodeError> for io::Error {
    fn from(err: TranscodeError) -> Self {
        match &err {
            TranscodeError::SourceOpenFailed { source, .. }
            | TranscodeError::EngineSpawnFailed { source, .. } => {
                // Preserve the original error kind
                io::Error::new(source.kind(), err)
            }
            TranscodeError::EngineTimedOut { .. } => io::Error::new(io::ErrorKind::TimedOut, err),
            TranscodeError::InvalidLevel { .. } => io::Error::new(io::ErrorKind::InvalidInput, err),
            TranscodeError::Pipe(source) => io::Error::new(source.kind(), err),
            TranscodeError::EngineExitedNonzero { .. } | TranscodeError::WorkerLost => {
                io::Error::other(err)
            }
        }
    }
}

/// Failure while resolving, computing or comparing digests.
#[derive(Debug, Error)]
pub enum DigestError {
    /// No strategy is registered under this name
    #[error("unsupported digest algorithm: {name}")]
    UnsupportedAlgorithm {
        /// Name the caller asked for
        name: String,
    },

    /// Two digests from different algorithms were compared
    #[error("cannot compare a {left} digest with a {right} digest")]
    AlgorithmMismatch {
        /// Algorithm of the left-hand digest
        left: String,
        /// Algorithm of the right-hand digest
        right: String,
    },

    /// Reading a file to digest it failed
    #[error("{}: {source}", path.display())]
    ReadFile {
        /// Path of the file
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

/// Failure of the archive workflow that is not one of its regular outcomes.
///
/// The source file is never removed when one of these is returned.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Digest resolution or comparison failed
    #[error(transparent)]
    Digest(#[from] DigestError),

    /// The source could not be read before compression started
    #[error("{}: cannot read source: {source}", path.display())]
    SourceUnreadable {
        /// Path of the source
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Verification succeeded but the source could not be removed
    #[error("{}: Cannot remove: {source}", path.display())]
    RemoveSource {
        /// Path of the source
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}
