//! Per-file compression, decompression and verified archiving.

use std::path::Path;

use tokio::io::AsyncWriteExt;
use tracing::{debug, info};
use xzsafe_core::{ArchiveOutcome, ArchiveWorkflow, Direction, EngineOptions, Source, Transcoder};

use crate::config::CliConfig;
use crate::error::{Error, Result};
use crate::io::{compressed_path, copy_to_stdout, decompressed_path, ensure_output_free};

/// Engine options shared by every invocation of one run.
pub fn engine_options(config: &CliConfig) -> EngineOptions {
    EngineOptions::default()
        .keep(config.keep)
        .force(config.force)
        .level(config.level)
}

/// Compresses `input` in place, or to stdout when configured.
///
/// In place, the engine removes `input` unless `keep` is set.
///
/// # Errors
///
/// Returns an error in these cases:
///
/// - `input` already has the engine suffix (warning)
/// - The artifact exists and `force` is not set
/// - The engine fails
pub async fn compress_file(
    input: &Path,
    config: &CliConfig,
    transcoder: &Transcoder,
) -> Result<()> {
    let source = Source::File(input.to_path_buf());
    let options = engine_options(config);

    if config.stdout {
        let stream = transcoder.stream(source, Direction::Compress, options).await?;
        copy_to_stdout(stream).await?;
        return Ok(());
    }

    let output = compressed_path(input, transcoder.config().suffix(), config.force)?;
    ensure_output_free(&output, config.force)?;
    transcoder
        .buffered(source, Direction::Compress, options)
        .await?;

    info!(input = %input.display(), output = %output.display(), "compressed");
    Ok(())
}

/// Decompresses `input` in place, or streams it to stdout when configured.
///
/// # Errors
///
/// Returns an error in these cases:
///
/// - `input` lacks the engine suffix (warning, in place only)
/// - The output exists and `force` is not set
/// - The engine fails; with stdout output, after every byte the engine
///   produced has been written
pub async fn decompress_file(
    input: &Path,
    config: &CliConfig,
    transcoder: &Transcoder,
) -> Result<()> {
    let source = Source::File(input.to_path_buf());
    let options = engine_options(config);

    if config.stdout {
        let stream = transcoder
            .stream(source, Direction::Decompress, options)
            .await?;
        let written = copy_to_stdout(stream).await?;
        debug!(input = %input.display(), written, "decompressed to stdout");
        return Ok(());
    }

    let output = decompressed_path(input, transcoder.config().suffix())?;
    ensure_output_free(&output, config.force)?;
    transcoder
        .buffered(source, Direction::Decompress, options)
        .await?;

    info!(input = %input.display(), output = %output.display(), "decompressed");
    Ok(())
}

/// Transcodes stdin to stdout in the configured direction.
///
/// The engine reads our stdin directly, so input is never held in memory.
///
/// # Errors
///
/// Returns the engine failure, or [`Error::Stdio`] for standard stream errors.
pub async fn transcode_stdin(
    direction: Direction,
    config: &CliConfig,
    transcoder: &Transcoder,
) -> Result<u64> {
    let stream = transcoder
        .stream(Source::Stdin, direction, engine_options(config))
        .await?;
    copy_to_stdout(stream).await
}

/// Runs the verified archive workflow and prints its outcome on stdout.
///
/// The outcome line reads `<file>: <outcome>`.
///
/// # Errors
///
/// Returns an error when the workflow cannot run, and [`Error::NotArchived`]
/// when it finished without removing the source.
pub async fn check_file(
    input: &Path,
    config: &CliConfig,
    workflow: &ArchiveWorkflow,
) -> Result<ArchiveOutcome> {
    let outcome = workflow.run(input, &config.checksum).await?;

    let line = format!("{}: {outcome}\n", input.display());
    let mut stdout = tokio::io::stdout();
    stdout
        .write_all(line.as_bytes())
        .await
        .map_err(Error::Stdio)?;
    stdout.flush().await.map_err(Error::Stdio)?;

    if !outcome.source_removed() {
        return Err(Error::NotArchived.into());
    }
    Ok(outcome)
}
