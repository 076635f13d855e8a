//! # xzsafe-core
//!
//! Integrity-verified compression on top of an external `xz` engine.
//!
//! The crate never implements a codec itself. Every compression and
//! decompression is delegated to one engine subprocess, whose output is exposed
//! either as a captured buffer or as a lazily produced byte stream fed by a
//! background worker (see [`transcode`]). On top of that, [`workflow`] runs the
//! compress, decompress, verify and conditionally-delete sequence that only
//! removes the original file once the round trip has been proven lossless.

pub mod config;
pub mod digest;
pub mod engine;
pub mod error;
pub mod observer;
pub mod transcode;
pub mod workflow;

pub use config::EngineConfig;
pub use digest::{Algorithm, Digest, DigestHasher, DigestRegistry, DigestStrategy};
pub use engine::{Delivery, Direction, EngineOptions, Source, TranscodeRequest};
pub use error::{ArchiveError, DigestError, TranscodeError};
pub use observer::{ArchiveEvent, ArchiveObserver, ArchiveState, TracingObserver};
pub use transcode::{EngineStream, Transcoded, Transcoder};
pub use workflow::{ArchiveOutcome, ArchiveWorkflow};
