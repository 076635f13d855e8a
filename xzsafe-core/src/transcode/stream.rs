//! Streaming delivery backed by a background worker.
//!
//! The worker owns the engine process and the writing half of a bounded
//! [`tokio::io::duplex`] pipe. It copies engine stdout into the pipe, forwards
//! engine stderr line by line to `tracing`, waits for the engine to exit and
//! then reports the terminal status over a oneshot channel. The writing half
//! is closed on every path out of the worker, including timeouts and aborts,
//! because the worker future owns it.
//!
//! The reader sees all bytes first; the terminal status is consulted only when
//! the pipe reports end of input.

use std::future::Future;
use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, DuplexStream, ReadBuf,
};
use tokio::process::{Child, ChildStderr, Command};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{bounded, feed_stdin, EngineInput};
use crate::config::EngineConfig;
use crate::error::{Result, TranscodeError};

/// Where the stream is in its life cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminal {
    /// Bytes may still arrive
    Open,
    /// The engine finished successfully and every byte was read
    Finished,
    /// The engine failure has been reported to the reader
    Failed,
}

/// Single-pass byte stream produced by a running engine.
///
/// Reading yields the engine's stdout in order. When the engine fails, the
/// read following the last delivered byte returns an [`io::Error`] wrapping
/// the [`TranscodeError`]; use [`TranscodeError::from_io`] to recover it.
///
/// Dropping the stream aborts the worker, which kills the engine.
#[derive(Debug)]
pub struct EngineStream {
    pipe: DuplexStream,
    status: oneshot::Receiver<Result<()>>,
    worker: Option<JoinHandle<()>>,
    terminal: Terminal,
}

/// Starts the engine and its worker.
pub(super) fn spawn(
    mut command: Command,
    input: EngineInput,
    config: &EngineConfig,
) -> Result<EngineStream> {
    let program = config.display_name();
    let pending = input.attach(&mut command);

    let child = command
        .spawn()
        .map_err(|source| TranscodeError::EngineSpawnFailed {
            program: program.clone(),
            source,
        })?;

    let (reader, writer) = tokio::io::duplex(config.pipe_capacity());
    let (status_tx, status_rx) = oneshot::channel();
    let timeout = config.timeout();

    let worker = tokio::spawn(async move {
        let result = bounded(timeout, &program, drive(child, writer, pending, &program)).await;
        match &result {
            Ok(()) => debug!(engine = %program, "engine finished"),
            Err(err) => debug!(engine = %program, error = %err, "engine failed"),
        }
        // The reader may already be gone
        let _ = status_tx.send(result);
    });

    Ok(EngineStream {
        pipe: reader,
        status: status_rx,
        worker: Some(worker),
        terminal: Terminal::Open,
    })
}

/// Moves bytes until the engine exits and turns its exit status into a result.
async fn drive(
    mut child: Child,
    mut writer: DuplexStream,
    pending: Option<Vec<u8>>,
    program: &str,
) -> Result<()> {
    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let pump = async {
        if let Some(mut stdout) = stdout {
            tokio::io::copy(&mut stdout, &mut writer).await?;
        }
        writer.shutdown().await
    };

    let (fed, pumped, diagnostics) = tokio::join!(
        feed_stdin(stdin, pending),
        pump,
        forward_diagnostics(stderr, program)
    );
    // Close our end before waiting so a consumer blocked on read sees EOF
    drop(writer);

    let status = child.wait().await.map_err(TranscodeError::Pipe)?;
    if !status.success() {
        return Err(TranscodeError::EngineExitedNonzero {
            program: program.to_string(),
            status,
            diagnostics,
        });
    }
    fed.map_err(TranscodeError::Pipe)?;
    pumped.map_err(TranscodeError::Pipe)?;
    Ok(())
}

/// Logs every stderr line as it arrives and returns the collected text.
async fn forward_diagnostics(stderr: Option<ChildStderr>, program: &str) -> String {
    let Some(stderr) = stderr else {
        return String::new();
    };

    let mut reader = BufReader::new(stderr);
    let mut collected = String::new();
    let mut line = Vec::new();
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line).await {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                warn!(target: "xzsafe::engine", engine = %program, "{}", text.trim_end());
                collected.push_str(&text);
            }
            Err(err) => {
                debug!(engine = %program, error = %err, "lost engine diagnostics");
                break;
            }
        }
    }
    collected
}

impl EngineStream {
    /// Reads the whole stream into memory and joins the worker.
    ///
    /// # Errors
    ///
    /// Returns the engine failure, or [`TranscodeError::Pipe`] for other read
    /// errors.
    pub async fn read_to_vec(mut self) -> Result<Vec<u8>> {
        let mut bytes = Vec::new();
        if let Err(err) = self.read_to_end(&mut bytes).await {
            self.cancel().await;
            return Err(split_io(err));
        }
        self.finish().await?;
        Ok(bytes)
    }

    /// Drains whatever is left and waits for the worker to exit.
    ///
    /// A failure already returned by a read is not reported again. The worker
    /// is joined on every path, including a failed drain.
    ///
    /// # Errors
    ///
    /// Returns an engine failure that was not observed through reads yet, or
    /// [`TranscodeError::WorkerLost`] if the worker panicked.
    pub async fn finish(mut self) -> Result<()> {
        let drained = if self.terminal == Terminal::Open {
            tokio::io::copy(&mut self, &mut tokio::io::sink())
                .await
                .map(drop)
        } else {
            Ok(())
        };

        let Some(worker) = self.worker.take() else {
            return drained.map_err(split_io);
        };
        // No status reached the reader, so the engine may still be running
        if self.terminal == Terminal::Open {
            worker.abort();
        }
        let joined = worker.await;
        drained.map_err(split_io)?;
        joined.map_err(|_| TranscodeError::WorkerLost)
    }

    /// Stops the engine without reading the rest of its output.
    pub async fn cancel(mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
            // Cancellation is the expected outcome here
            let _ = worker.await;
        }
    }

    /// Whether the stream has delivered its terminal condition.
    pub fn is_terminated(&self) -> bool {
        self.terminal != Terminal::Open
    }
}

fn split_io(err: io::Error) -> TranscodeError {
    TranscodeError::try_from_io(err).unwrap_or_else(TranscodeError::Pipe)
}

impl AsyncRead for EngineStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        match this.terminal {
            Terminal::Finished => return Poll::Ready(Ok(())),
            Terminal::Failed => {
                return Poll::Ready(Err(io::Error::other("engine stream already failed")))
            }
            Terminal::Open => {}
        }

        let before = buf.filled().len();
        ready!(Pin::new(&mut this.pipe).poll_read(cx, buf))?;
        if buf.filled().len() > before || buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }

        // Pipe drained and closed: the engine's status decides how the stream ends
        match ready!(Pin::new(&mut this.status).poll(cx)) {
            Ok(Ok(())) => {
                this.terminal = Terminal::Finished;
                Poll::Ready(Ok(()))
            }
            Ok(Err(err)) => {
                this.terminal = Terminal::Failed;
                Poll::Ready(Err(err.into()))
            }
            Err(_) => {
                this.terminal = Terminal::Failed;
                Poll::Ready(Err(TranscodeError::WorkerLost.into()))
            }
        }
    }
}

impl Drop for EngineStream {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}
