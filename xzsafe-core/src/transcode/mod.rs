//! Runs one engine invocation and hands its output to the caller.
//!
//! Two delivery modes are supported:
//!
//! - **Buffered**: the engine runs to completion while stdout and stderr are
//!   captured. A nonzero exit becomes [`TranscodeError::EngineExitedNonzero`]
//!   carrying stderr; nothing partial is returned.
//! - **Streaming**: the engine's stdout is pumped into a bounded in-memory pipe
//!   by a background worker, and the reading end is returned as an
//!   [`EngineStream`]. Engine failure shows up as a read error once every
//!   byte produced before the failure has been delivered.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{ChildStdin, Command};
use tracing::debug;

use crate::config::EngineConfig;
use crate::engine::{engine_args, Delivery, Direction, EngineOptions, Source, TranscodeRequest};
use crate::error::{Result, TranscodeError};

mod buffered;
mod stream;


pub use stream::EngineStream;

/// Output of a finished or running invocation.
#[derive(Debug)]
pub enum Transcoded {
    /// Everything the engine wrote to stdout
    Buffer(Vec<u8>),
    /// Lazily produced engine output
    Stream(EngineStream),
}

impl Transcoded {
    /// Collects the whole output, draining a stream if needed.
    ///
    /// # Errors
    ///
    /// Returns the engine failure reported by a stream.
    pub async fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            Transcoded::Buffer(bytes) => Ok(bytes),
            Transcoded::Stream(stream) => stream.read_to_vec().await,
        }
    }

    pub fn into_stream(self) -> Option<EngineStream> {
        match self {
            Transcoded::Stream(stream) => Some(stream),
            Transcoded::Buffer(_) => None,
        }
    }
}

/// Data the engine reads from its stdin.
pub(crate) enum EngineInput {
    /// Nothing; the engine opens its file itself
    Nothing,
    /// An already opened file handed over as stdin
    File(std::fs::File),
    /// Bytes written to stdin by the transcoder
    Bytes(Vec<u8>),
    /// Our own stdin, inherited by the engine
    Inherit,
}

/// Spawns engine invocations for one [`EngineConfig`].
#[derive(Debug, Clone, Default)]
pub struct Transcoder {
    config: EngineConfig,
}

impl Transcoder {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Path of the artifact produced by compressing `source` in place.
    pub fn artifact_path(&self, source: &Path) -> PathBuf {
        self.config.artifact_path(source)
    }

    /// Runs `request` with the delivery mode it asks for.
    ///
    /// # Errors
    ///
    /// - [`TranscodeError::InvalidLevel`] for an unknown preset
    /// - [`TranscodeError::SourceOpenFailed`] if the source file cannot be
    ///   opened; the engine is not started in that case
    /// - [`TranscodeError::EngineSpawnFailed`] if the engine cannot be started
    /// - [`TranscodeError::EngineExitedNonzero`] and
    ///   [`TranscodeError::EngineTimedOut`] for buffered invocations
    pub async fn transcode(&self, request: TranscodeRequest) -> Result<Transcoded> {
        let (source, direction, delivery, options) = request.into_parts();
        match delivery {
            Delivery::Buffered => self
                .buffered(source, direction, options)
                .await
                .map(Transcoded::Buffer),
            Delivery::Streaming => self
                .stream(source, direction, options)
                .await
                .map(Transcoded::Stream),
        }
    }

    /// Runs the engine to completion and returns what it wrote to stdout.
    ///
    /// File sources are processed in place unless they have to be streamed;
    /// the returned buffer is then empty.
    ///
    /// # Errors
    ///
    /// See [`Transcoder::transcode`].
    pub async fn buffered(
        &self,
        source: Source,
        direction: Direction,
        options: EngineOptions,
    ) -> Result<Vec<u8>> {
        options.validate()?;
        let stdio = source.needs_stdio();
        let input = prepare_input(&source, stdio).await?;
        let command = self.command(&source, direction, stdio, options);
        buffered::run(command, input, &self.config).await
    }

    /// Starts the engine and returns its output as a stream.
    ///
    /// # Errors
    ///
    /// Only failures to get the engine running are reported here. Anything
    /// that happens afterwards surfaces through the stream.
    pub async fn stream(
        &self,
        source: Source,
        direction: Direction,
        options: EngineOptions,
    ) -> Result<EngineStream> {
        options.validate()?;
        let input = prepare_input(&source, true).await?;
        let command = self.command(&source, direction, true, options);
        stream::spawn(command, input, &self.config)
    }

    fn command(
        &self,
        source: &Source,
        direction: Direction,
        stdio: bool,
        options: EngineOptions,
    ) -> Command {
        let args = engine_args(source, direction, stdio, options);
        debug!(
            engine = %self.config.display_name(),
            ?direction,
            ?args,
            "starting engine"
        );

        let mut command = Command::new(self.config.program());
        command
            .args(self.config.leading_args())
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

/// Opens the source before the engine is spawned.
///
/// In-place invocations let the engine open the file, but the file is opened
/// here anyway so that a missing source never reaches the engine.
async fn prepare_input(source: &Source, stdio: bool) -> Result<EngineInput> {
    match source {
        Source::Bytes(bytes) => Ok(EngineInput::Bytes(bytes.clone())),
        Source::Stdin => Ok(EngineInput::Inherit),
        Source::File(path) => {
            let open_error = |source| TranscodeError::SourceOpenFailed {
                path: path.clone(),
                source,
            };
            let file = tokio::fs::File::open(path).await.map_err(open_error)?;
            if stdio {
                Ok(EngineInput::File(file.into_std().await))
            } else {
                Ok(EngineInput::Nothing)
            }
        }
    }
}

impl EngineInput {
    /// Wires the input into the command and returns bytes still to be written.
    fn attach(self, command: &mut Command) -> Option<Vec<u8>> {
        match self {
            EngineInput::Nothing => {
                command.stdin(Stdio::null());
                None
            }
            EngineInput::File(file) => {
                command.stdin(Stdio::from(file));
                None
            }
            EngineInput::Bytes(bytes) => {
                command.stdin(Stdio::piped());
                Some(bytes)
            }
            EngineInput::Inherit => {
                command.stdin(Stdio::inherit());
                None
            }
        }
    }
}

/// Writes `bytes` to the engine's stdin and closes it.
///
/// A broken pipe means the engine stopped reading early; its exit status
/// tells the real story, so that case is not an error here.
async fn feed_stdin(stdin: Option<ChildStdin>, bytes: Option<Vec<u8>>) -> std::io::Result<()> {
    let (Some(mut stdin), Some(bytes)) = (stdin, bytes) else {
        return Ok(());
    };
    match stdin.write_all(&bytes).await {
        Err(err) if err.kind() != std::io::ErrorKind::BrokenPipe => return Err(err),
        _ => {}
    }
    match stdin.shutdown().await {
        Err(err) if err.kind() != std::io::ErrorKind::BrokenPipe => Err(err),
        _ => Ok(()),
    }
}

/// Applies the configured timeout to an engine future.
async fn bounded<F, T>(timeout: Option<Duration>, program: &str, run: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout {
        None => run.await,
        Some(limit) => tokio::time::timeout(limit, run).await.map_err(|_| {
            TranscodeError::EngineTimedOut {
                program: program.to_string(),
                timeout: limit,
            }
        })?,
    }
}
