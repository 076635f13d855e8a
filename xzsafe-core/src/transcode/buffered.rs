//! Run-to-completion delivery.

use tokio::process::Command;

use super::{bounded, feed_stdin, EngineInput};
use crate::config::EngineConfig;
use crate::error::{Result, TranscodeError};

/// Spawns the engine, waits for it and returns its stdout.
pub(super) async fn run(
    mut command: Command,
    input: EngineInput,
    config: &EngineConfig,
) -> Result<Vec<u8>> {
    let program = config.display_name();
    let pending = input.attach(&mut command);

    let mut child = command
        .spawn()
        .map_err(|source| TranscodeError::EngineSpawnFailed {
            program: program.clone(),
            source,
        })?;

    let stdin = child.stdin.take();
    let run = async move {
        // stdout and stderr are collected while stdin is written, so a large
        // input cannot deadlock against a full output pipe
        let (fed, output) = tokio::join!(feed_stdin(stdin, pending), child.wait_with_output());
        let output = output.map_err(TranscodeError::Pipe)?;
        Ok::<_, TranscodeError>((fed, output))
    };
    let (fed, output) = bounded(config.timeout(), &program, run).await?;

    if !output.status.success() {
        return Err(TranscodeError::EngineExitedNonzero {
            program,
            status: output.status,
            diagnostics: String::from_utf8_lossy(&output.stderr).into_owned(),
        });
    }
    fed.map_err(TranscodeError::Pipe)?;

    Ok(output.stdout)
}
