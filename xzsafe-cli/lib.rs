//! Shared functionality for the `xzsafe` command-line tool.
//!
//! Maps command-line configuration onto `xzsafe-core`: in-place and streaming
//! compression and decompression through the engine, plus the verified
//! archive mode, with per-file error context for stderr.

pub mod config;
pub mod error;
pub mod io;
pub mod operations;
pub mod process;


pub use config::{CliConfig, OperationMode, ENGINE_ENV, STDIN_MARKER};
pub use error::{format_error_for_stderr, CliError, Error, InvocationError, Result, Warning};
pub use io::{compressed_path, decompressed_path, has_engine_suffix};
pub use operations::{check_file, compress_file, decompress_file, engine_options};
pub use process::{build_workflow, process_file, run_cli};
