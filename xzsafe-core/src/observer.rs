//! Progress reporting for the archive workflow.
//!
//! The workflow never prints. It reports state transitions and notable events
//! to an [`ArchiveObserver`] supplied by the caller; [`TracingObserver`]
//! forwards them to `tracing`.

use std::fmt;
use std::path::Path;

use tracing::{debug, info, warn};

use crate::digest::Digest;

/// States of the archive workflow.
///
/// The workflow only moves forward: `Start`, `Compressing`, `Decompressing`,
/// `Comparing`, then one of `Committed` or `RolledBack`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveState {
    Start,
    Compressing,
    Decompressing,
    Comparing,
    /// The round trip was verified and the source removed
    Committed,
    /// The source was left untouched
    RolledBack,
}

impl fmt::Display for ArchiveState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ArchiveState::Start => "start",
            ArchiveState::Compressing => "compressing",
            ArchiveState::Decompressing => "decompressing",
            ArchiveState::Comparing => "comparing",
            ArchiveState::Committed => "committed",
            ArchiveState::RolledBack => "rolled back",
        };
        f.write_str(name)
    }
}

/// Something worth reporting during a workflow run.
#[derive(Debug, Clone, Copy)]
pub enum ArchiveEvent<'a> {
    /// The workflow entered a new state
    Transition {
        from: ArchiveState,
        to: ArchiveState,
    },
    /// Digest of the original file, taken before compression
    ReferenceDigest(&'a Digest),
    /// Digest of the decompressed artifact
    ReadbackDigest(&'a Digest),
    /// A step failed; the source stays in place
    StepFailed {
        state: ArchiveState,
        reason: &'a str,
    },
    /// The source file was removed after verification
    SourceRemoved(&'a Path),
}

/// Receives workflow progress for one source file at a time.
pub trait ArchiveObserver: Send + Sync {
    fn notify(&self, source: &Path, event: ArchiveEvent<'_>);
}

/// Forwards workflow events to `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ArchiveObserver for TracingObserver {
    fn notify(&self, source: &Path, event: ArchiveEvent<'_>) {
        let source = source.display();
        match event {
            ArchiveEvent::Transition { from, to } => {
                debug!(%source, %from, %to, "archive state changed");
            }
            ArchiveEvent::ReferenceDigest(digest) => {
                debug!(%source, %digest, "reference digest");
            }
            ArchiveEvent::ReadbackDigest(digest) => {
                debug!(%source, %digest, "readback digest");
            }
            ArchiveEvent::StepFailed { state, reason } => {
                warn!(%source, %state, "{reason}");
            }
            ArchiveEvent::SourceRemoved(path) => {
                info!(source = %path.display(), "verified archive, removed source");
            }
        }
    }
}
