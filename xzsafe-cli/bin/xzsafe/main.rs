//! Integrity-verified xz compression
//!
//! Compresses and decompresses through an external `xz`, and archives files
//! so that the original is only deleted after a verified round trip.

use std::process;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

mod opts;

use opts::XzsafeOpts;

use xzsafe_cli::{format_error_for_stderr, run_cli, CliConfig};

const PROGRAM_NAME: &str = "xzsafe";

/// Installs a stderr subscriber; `RUST_LOG` overrides the level picked from `-v`/`-q`.
fn init_tracing(config: &CliConfig) {
    let default_level = if config.verbose {
        "debug"
    } else if config.quiet > 0 {
        "error"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .with(filter)
        .init();
}

fn main() -> std::io::Result<()> {
    let opts = XzsafeOpts::parse();

    let config = match opts.config() {
        Ok(config) => config,
        Err(err) => {
            if opts.quiet < 2 {
                eprintln!("{PROGRAM_NAME}: {err}");
            }
            process::exit(1);
        }
    };

    init_tracing(&config);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let failures = runtime.block_on(run_cli(&opts.inputs(), &config, PROGRAM_NAME));

    if !failures.is_empty() {
        for err in &failures {
            if let Some(msg) = format_error_for_stderr(PROGRAM_NAME, config.quiet, err) {
                eprintln!("{msg}");
            }
        }
        process::exit(1);
    }

    Ok(())
}
