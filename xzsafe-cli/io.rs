//! Standard stream handling and path manipulation for the xzsafe CLI.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use xzsafe_core::{EngineStream, TranscodeError};

use crate::config::STDIN_MARKER;
use crate::error::{CliError, Error, Result, Warning};

/// Whether `path` names standard input.
pub fn is_stdin(path: &str) -> bool {
    path.is_empty() || path == STDIN_MARKER
}

/// Checks if the file name ends with `.<suffix>`.
///
/// The comparison is case-sensitive, as it is for `xz` itself.
pub fn has_engine_suffix(path: &Path, suffix: &str) -> bool {
    path.extension()
        .and_then(OsStr::to_str)
        .is_some_and(|ext| ext == suffix)
}

/// Path written by compressing `input` in place.
///
/// # Errors
///
/// Returns [`Warning::AlreadyHasSuffix`] when `input` already carries the
/// suffix and `force` is not set.
pub fn compressed_path(input: &Path, suffix: &str, force: bool) -> Result<PathBuf> {
    if !force && has_engine_suffix(input, suffix) {
        return Err(CliError::from(Warning::AlreadyHasSuffix {
            path: input.to_path_buf(),
            suffix: format!(".{suffix}"),
        }));
    }

    let mut name = input.as_os_str().to_os_string();
    name.push(".");
    name.push(suffix);
    Ok(PathBuf::from(name))
}

/// Path written by decompressing `input` in place.
///
/// # Errors
///
/// Returns an error in these cases:
///
/// - Input file lacks the engine suffix
/// - Stripping the suffix leaves no file name
pub fn decompressed_path(input: &Path, suffix: &str) -> Result<PathBuf> {
    if !has_engine_suffix(input, suffix) {
        return Err(CliError::from(Warning::InvalidExtension {
            path: input.to_path_buf(),
        }));
    }

    let stem = input
        .file_stem()
        .filter(|stem| !stem.is_empty())
        .ok_or_else(|| Error::InvalidOutputFilename {
            path: input.to_path_buf(),
        })?;

    let parent = input.parent().unwrap_or_else(|| Path::new(""));
    Ok(parent.join(stem))
}

/// Refuses to clobber an existing output unless `force` is set.
///
/// # Errors
///
/// Returns [`Error::OutputExists`] if `path` exists and `force` is `false`.
pub fn ensure_output_free(path: &Path, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Err(CliError::from(Error::OutputExists {
            path: path.to_path_buf(),
        }));
    }
    Ok(())
}

/// Copies a running engine's output to stdout and waits for the engine.
///
/// # Returns
///
/// The number of bytes written.
///
/// # Errors
///
/// Returns the engine failure if the engine failed, or [`Error::Stdio`] if
/// stdout could not be written. The engine is stopped in the latter case.
pub async fn copy_to_stdout(mut stream: EngineStream) -> Result<u64> {
    let mut stdout = tokio::io::stdout();
    let copied = match tokio::io::copy(&mut stream, &mut stdout).await {
        Ok(copied) => copied,
        Err(err) => {
            stream.cancel().await;
            return Err(match TranscodeError::try_from_io(err) {
                Ok(engine) => CliError::from(engine),
                Err(write) => CliError::from(Error::Stdio(write)),
            });
        }
    };
    stdout.flush().await.map_err(Error::Stdio)?;
    stream.finish().await?;
    Ok(copied)
}
