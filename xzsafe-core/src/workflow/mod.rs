//! Compress, verify, and only then delete.
//!
//! [`ArchiveWorkflow::run`] walks a fixed sequence of states:
//!
//! 1. **Start**: resolve the digest algorithm and digest the original file.
//! 2. **Compressing**: compress in place, always keeping the original.
//! 3. **Decompressing**: stream the artifact back through the engine and
//!    digest every byte with the same algorithm.
//! 4. **Comparing**: on equal digests remove the original (**Committed**),
//!    otherwise leave everything as it is (**RolledBack**).
//!
//! The original file is removed from exactly one place: the equal branch of
//! the comparison. A failed compression may leave a partial artifact behind;
//! it is reported in the outcome and not cleaned up.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::digest::{Algorithm, Digest, DigestRegistry};
use crate::engine::{Direction, EngineOptions, Source};
use crate::error::{ArchiveError, DigestError, TranscodeError};
use crate::observer::{ArchiveEvent, ArchiveObserver, ArchiveState, TracingObserver};
use crate::transcode::Transcoder;


/// Terminal result of one workflow run.
#[derive(Debug)]
pub enum ArchiveOutcome {
    /// Round trip verified, source removed, artifact kept
    VerifiedAndSourceDeleted {
        artifact: PathBuf,
        reference: Digest,
        readback: Digest,
    },
    /// The decompressed artifact differs from the source; nothing removed
    VerifiedMismatch {
        artifact: PathBuf,
        reference: Digest,
        readback: Digest,
    },
    /// The engine could not compress the source; nothing removed
    CompressionFailed {
        artifact: PathBuf,
        reference: Digest,
        error: TranscodeError,
    },
    /// The engine could not decompress the artifact; nothing removed
    DecompressionFailed {
        artifact: PathBuf,
        reference: Digest,
        error: TranscodeError,
    },
    /// Reading the decompressed stream failed outside the engine; nothing removed
    ReadbackFailed {
        artifact: PathBuf,
        reference: Digest,
        error: io::Error,
    },
}

impl ArchiveOutcome {
    /// Whether the source file was removed.
    pub fn source_removed(&self) -> bool {
        matches!(self, ArchiveOutcome::VerifiedAndSourceDeleted { .. })
    }

    pub fn state(&self) -> ArchiveState {
        if self.source_removed() {
            ArchiveState::Committed
        } else {
            ArchiveState::RolledBack
        }
    }

    /// Path of the compressed artifact, whether or not it exists.
    pub fn artifact(&self) -> &Path {
        match self {
            ArchiveOutcome::VerifiedAndSourceDeleted { artifact, .. }
            | ArchiveOutcome::VerifiedMismatch { artifact, .. }
            | ArchiveOutcome::CompressionFailed { artifact, .. }
            | ArchiveOutcome::DecompressionFailed { artifact, .. }
            | ArchiveOutcome::ReadbackFailed { artifact, .. } => artifact,
        }
    }

    /// Digest of the original file.
    pub fn reference(&self) -> &Digest {
        match self {
            ArchiveOutcome::VerifiedAndSourceDeleted { reference, .. }
            | ArchiveOutcome::VerifiedMismatch { reference, .. }
            | ArchiveOutcome::CompressionFailed { reference, .. }
            | ArchiveOutcome::DecompressionFailed { reference, .. }
            | ArchiveOutcome::ReadbackFailed { reference, .. } => reference,
        }
    }

    /// Digest of the decompressed artifact, when the read-back completed.
    pub fn readback(&self) -> Option<&Digest> {
        match self {
            ArchiveOutcome::VerifiedAndSourceDeleted { readback, .. }
            | ArchiveOutcome::VerifiedMismatch { readback, .. } => Some(readback),
            _ => None,
        }
    }
}

impl fmt::Display for ArchiveOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArchiveOutcome::VerifiedAndSourceDeleted {
                artifact, reference, ..
            } => write!(
                f,
                "verified {reference}, archived as {}, source removed",
                artifact.display()
            ),
            ArchiveOutcome::VerifiedMismatch {
                reference,
                readback,
                ..
            } => write!(
                f,
                "digest mismatch (source {reference}, decompressed {readback}), source kept"
            ),
            ArchiveOutcome::CompressionFailed {
                reference, error, ..
            } => write!(f, "compression failed (source {reference}), source kept: {error}"),
            ArchiveOutcome::DecompressionFailed {
                reference, error, ..
            } => write!(f, "decompression failed (source {reference}), source kept: {error}"),
            ArchiveOutcome::ReadbackFailed {
                reference, error, ..
            } => write!(
                f,
                "reading decompressed data failed (source {reference}), source kept: {error}"
            ),
        }
    }
}

/// Runs the verified archive sequence against an engine.
#[derive(Clone)]
pub struct ArchiveWorkflow {
    transcoder: Transcoder,
    registry: DigestRegistry,
    compression: EngineOptions,
    observer: Arc<dyn ArchiveObserver>,
}

impl ArchiveWorkflow {
    /// Creates a workflow with the default digest registry, reporting to `tracing`.
    pub fn new(transcoder: Transcoder) -> Self {
        Self {
            transcoder,
            registry: DigestRegistry::default(),
            compression: EngineOptions::default(),
            observer: Arc::new(TracingObserver),
        }
    }

    pub fn with_registry(mut self, registry: DigestRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn ArchiveObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Options used for the compression step.
    ///
    /// `keep` is always forced on; the workflow decides when the source goes.
    pub fn with_compression(mut self, options: EngineOptions) -> Self {
        self.compression = options;
        self
    }

    pub fn transcoder(&self) -> &Transcoder {
        &self.transcoder
    }

    pub fn registry(&self) -> &DigestRegistry {
        &self.registry
    }

    /// Compresses `source`, verifies the artifact and removes `source` if it matches.
    ///
    /// # Returns
    ///
    /// The terminal [`ArchiveOutcome`]. Only
    /// [`ArchiveOutcome::VerifiedAndSourceDeleted`] means `source` is gone.
    ///
    /// # Errors
    ///
    /// Returns an error, leaving every file untouched, when:
    ///
    /// - `algorithm` is not registered (checked before anything else)
    /// - `source` cannot be read
    /// - verification succeeded but `source` could not be removed
    pub async fn run(
        &self,
        source: &Path,
        algorithm: &str,
    ) -> Result<ArchiveOutcome, ArchiveError> {
        let algorithm = self.registry.resolve(algorithm)?;
        let mut progress = Progress::new(source, self.observer.as_ref());

        let reference = algorithm
            .digest_file(source)
            .await
            .map_err(|err| match err {
                DigestError::ReadFile { path, source } => {
                    ArchiveError::SourceUnreadable { path, source }
                }
                other => ArchiveError::Digest(other),
            })?;
        progress.event(ArchiveEvent::ReferenceDigest(&reference));

        let artifact = self.transcoder.artifact_path(source);

        progress.advance(ArchiveState::Compressing);
        let options = self.compression.keep(true);
        if let Err(error) = self
            .transcoder
            .buffered(Source::File(source.to_path_buf()), Direction::Compress, options)
            .await
        {
            progress.fail(&error);
            return Ok(ArchiveOutcome::CompressionFailed {
                artifact,
                reference,
                error,
            });
        }

        progress.advance(ArchiveState::Decompressing);
        let readback = match self.read_back(&artifact, &algorithm).await {
            Ok(readback) => readback,
            Err(error) => {
                progress.fail(&error);
                return Ok(error.into_outcome(artifact, reference));
            }
        };
        progress.event(ArchiveEvent::ReadbackDigest(&readback));

        progress.advance(ArchiveState::Comparing);
        if !reference.matches(&readback)? {
            progress.fail(&"decompressed data does not match the source");
            return Ok(ArchiveOutcome::VerifiedMismatch {
                artifact,
                reference,
                readback,
            });
        }

        if let Err(err) = tokio::fs::remove_file(source).await {
            progress.fail(&err);
            return Err(ArchiveError::RemoveSource {
                path: source.to_path_buf(),
                source: err,
            });
        }
        progress.event(ArchiveEvent::SourceRemoved(source));
        progress.advance(ArchiveState::Committed);

        Ok(ArchiveOutcome::VerifiedAndSourceDeleted {
            artifact,
            reference,
            readback,
        })
    }

    /// Streams the artifact back through the engine and digests all of it.
    ///
    /// The worker is always joined or cancelled before this returns.
    async fn read_back(
        &self,
        artifact: &Path,
        algorithm: &Algorithm,
    ) -> Result<Digest, ReadbackError> {
        let mut stream = self
            .transcoder
            .stream(
                Source::File(artifact.to_path_buf()),
                Direction::Decompress,
                EngineOptions::default(),
            )
            .await
            .map_err(ReadbackError::Engine)?;

        match algorithm.digest_reader(&mut stream).await {
            Ok(digest) => {
                stream.finish().await?;
                Ok(digest)
            }
            Err(err) => {
                stream.cancel().await;
                Err(match TranscodeError::try_from_io(err) {
                    Ok(engine) => ReadbackError::from(engine),
                    Err(read) => ReadbackError::Read(read),
                })
            }
        }
    }
}

impl fmt::Debug for ArchiveWorkflow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchiveWorkflow")
            .field("transcoder", &self.transcoder)
            .field("registry", &self.registry)
            .field("compression", &self.compression)
            .finish_non_exhaustive()
    }
}

/// Why the read-back step stopped short of a digest.
#[derive(Debug)]
enum ReadbackError {
    /// The engine itself failed: it could not start, exited nonzero or timed out.
    Engine(TranscodeError),
    /// Moving the decompressed bytes failed while the engine was healthy.
    Read(io::Error),
}

impl ReadbackError {
    fn into_outcome(self, artifact: PathBuf, reference: Digest) -> ArchiveOutcome {
        match self {
            ReadbackError::Engine(error) => ArchiveOutcome::DecompressionFailed {
                artifact,
                reference,
                error,
            },
            ReadbackError::Read(error) => ArchiveOutcome::ReadbackFailed {
                artifact,
                reference,
                error,
            },
        }
    }
}

impl From<TranscodeError> for ReadbackError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::Pipe(source) => ReadbackError::Read(source),
            TranscodeError::WorkerLost => {
                ReadbackError::Read(io::Error::other(TranscodeError::WorkerLost))
            }
            engine => ReadbackError::Engine(engine),
        }
    }
}

impl fmt::Display for ReadbackError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReadbackError::Engine(err) => err.fmt(f),
            ReadbackError::Read(err) => err.fmt(f),
        }
    }
}

/// Current state of one run, reported to the observer on every change.
struct Progress<'a> {
    source: &'a Path,
    observer: &'a dyn ArchiveObserver,
    state: ArchiveState,
}

impl<'a> Progress<'a> {
    fn new(source: &'a Path, observer: &'a dyn ArchiveObserver) -> Self {
        Self {
            source,
            observer,
            state: ArchiveState::Start,
        }
    }

    fn advance(&mut self, to: ArchiveState) {
        let from = std::mem::replace(&mut self.state, to);
        self.event(ArchiveEvent::Transition { from, to });
    }

    fn fail(&mut self, reason: &dyn fmt::Display) {
        let reason = reason.to_string();
        self.event(ArchiveEvent::StepFailed {
            state: self.state,
            reason: &reason,
        });
        self.advance(ArchiveState::RolledBack);
    }

    fn event(&self, event: ArchiveEvent<'_>) {
        self.observer.notify(self.source, event);
    }
}
