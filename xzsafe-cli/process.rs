//! High-level file processing and CLI orchestration.

use std::io;
use std::path::Path;

use tracing::debug;
use xzsafe_core::{ArchiveWorkflow, Direction, Transcoder};

use crate::config::{CliConfig, OperationMode};
use crate::error::{CliError, Error, InvocationError, Result};
use crate::io::is_stdin;
use crate::operations::{
    check_file, compress_file, decompress_file, engine_options, transcode_stdin,
};

/// Processes a single file according to the CLI configuration.
///
/// # Parameters
///
/// * `input_path` - Path to the input file, or `-`/empty for stdin
/// * `config` - CLI configuration specifying operation mode and flags
/// * `workflow` - Archive workflow, whose transcoder also serves the plain modes
///
/// # Operation Modes
///
/// - **Compress**: in place, or to stdout with `-c` or for stdin
/// - **Decompress**: in place, or streamed to stdout with `-c` or for stdin
/// - **Check**: verified archive; never reads stdin
///
/// # Errors
///
/// Returns an error in these cases:
///
/// - Input file cannot be opened
/// - Output path cannot be derived or already exists without `force`
/// - The engine fails
/// - The archive was not verified
pub async fn process_file(
    input_path: &str,
    config: &CliConfig,
    workflow: &ArchiveWorkflow,
) -> Result<()> {
    let transcoder = workflow.transcoder();

    if is_stdin(input_path) {
        return process_stdin(config, transcoder).await;
    }

    let input = Path::new(input_path);
    tokio::fs::metadata(input)
        .await
        .map_err(|source| Error::OpenInput {
            path: input.to_path_buf(),
            source,
        })?;

    match config.mode {
        OperationMode::Compress => compress_file(input, config, transcoder).await,
        OperationMode::Decompress => decompress_file(input, config, transcoder).await,
        OperationMode::Check => check_file(input, config, workflow).await.map(|_| ()),
    }
}

async fn process_stdin(config: &CliConfig, transcoder: &Transcoder) -> Result<()> {
    let direction = match config.mode {
        OperationMode::Compress => Direction::Compress,
        OperationMode::Decompress => Direction::Decompress,
        OperationMode::Check => return Err(Error::CheckNeedsFile.into()),
    };
    let written = transcode_stdin(direction, config, transcoder).await?;
    debug!(written, ?direction, "transcoded standard input");
    Ok(())
}

/// Builds the archive workflow for `config`.
///
/// # Errors
///
/// Returns an error if the configured checksum algorithm is unknown.
pub fn build_workflow(config: &CliConfig) -> Result<ArchiveWorkflow> {
    let workflow = ArchiveWorkflow::new(Transcoder::new(config.engine_config()))
        .with_compression(engine_options(config));
    workflow.registry().resolve(&config.checksum)?;
    Ok(workflow)
}

/// Runs the CLI over every input file.
///
/// Every file is attempted even after a failure. Failures are returned in
/// order, each wrapped in an [`InvocationError`] carrying the program name
/// and file.
///
/// # Parameters
///
/// * `files` - Input file paths. Empty reads from stdin.
/// * `config` - CLI configuration.
/// * `program` - Program name to include in error messages.
///
/// # Returns
///
/// The failures; empty when every file succeeded. A configuration error is
/// reported alone, before any file is touched.
pub async fn run_cli(files: &[String], config: &CliConfig, program: &str) -> Vec<io::Error> {
    let workflow = match build_workflow(config) {
        Ok(workflow) => workflow,
        Err(err) => return vec![err.into()],
    };

    let stdin = [String::new()];
    let files = if files.is_empty() { &stdin[..] } else { files };

    let mut failures = Vec::new();
    for file in files {
        if let Err(err) = process_file(file, config, &workflow).await {
            failures.push(invocation_error(program, file, err));
        }
    }
    failures
}

fn invocation_error(program: &str, file: &str, source: CliError) -> io::Error {
    io::Error::new(
        source.kind(),
        InvocationError {
            program: program.to_string(),
            file: (!is_stdin(file)).then(|| file.to_string()),
            source,
        },
    )
}
