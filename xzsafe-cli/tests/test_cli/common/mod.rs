use std::fs;
use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use xzsafe_cli::ENGINE_ENV;

mod data;

pub use data::{generate_random_data, BINARY_DATA, SAMPLE_TEXT};

/// Path of the `xzsafe` binary built by cargo
const XZSAFE_BIN: &str = env!("CARGO_BIN_EXE_xzsafe");

/// Whether the system `xz` is available; tests driving the real engine skip otherwise.
pub fn xz_available() -> bool {
    if which::which("xz").is_ok() {
        true
    } else {
        eprintln!("xz not found in PATH, skipping");
        false
    }
}

/// Output from running a binary command
#[derive(Debug)]
pub struct Output {
    pub status: ExitStatus,
    pub stdout_raw: Vec<u8>,
    pub stdout: String,
    pub stderr: String,
}

/// Shared test fixture utilities to keep filesystem interactions isolated
pub struct Fixture {
    root_dir: tempfile::TempDir,
}

impl Fixture {
    /// Create an empty fixture
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created.
    pub fn new() -> Self {
        Self {
            root_dir: tempfile::TempDir::new().unwrap(),
        }
    }

    /// Create fixture with single file
    ///
    /// # Panics
    ///
    /// Panics if the temporary directory cannot be created or if the fixture file
    /// cannot be written.
    pub fn with_file(name: &str, contents: &[u8]) -> Self {
        let fixture = Self::new();
        fixture.write(name, contents);
        fixture
    }

    /// Create fixture with multiple files
    ///
    /// # Panics
    ///
    /// Panics if any fixture file cannot be written.
    pub fn with_files(names: &[&str], contents: &[&[u8]]) -> Self {
        let fixture = Self::new();
        for (name, contents) in names.iter().zip(contents) {
            fixture.write(name, contents);
        }
        fixture
    }

    /// Get full path for a file in the fixture
    pub fn path(&self, name: &str) -> String {
        format!("{}/{}", self.root_dir.path().display(), name)
    }

    /// Get compressed path (adds .xz extension)
    pub fn compressed_path(&self, name: &str) -> String {
        format!("{}.xz", self.path(name))
    }

    /// Write a file into the fixture
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be written.
    pub fn write(&self, name: &str, contents: &[u8]) {
        fs::write(self.root_dir.path().join(name), contents).unwrap();
    }

    /// Read a file from the fixture
    ///
    /// # Panics
    ///
    /// Panics if the file cannot be read.
    pub fn read(&self, name: &str) -> Vec<u8> {
        fs::read(self.root_dir.path().join(name)).unwrap()
    }

    /// Check if a file exists in the fixture
    pub fn file_exists(&self, name: &str) -> bool {
        self.root_dir.path().join(name).exists()
    }

    /// Assert that files have expected contents
    ///
    /// # Panics
    ///
    /// Panics if any file cannot be read or if its contents don't match the
    /// expected bytes.
    pub fn assert_files(&self, names: &[&str], contents: &[&[u8]]) {
        for (name, expected_contents) in names.iter().zip(contents) {
            let actual_contents = fs::read(self.root_dir.path().join(name)).unwrap_or_default();
            assert!(actual_contents == *expected_contents, "{name} differs");
        }
    }

    pub fn root_dir_path(&self) -> &Path {
        self.root_dir.path()
    }

    /// Run `xzsafe` with the specified arguments and empty stdin
    pub async fn run(&self, args: &[&str]) -> Output {
        self.run_with_stdin(args, &[]).await
    }

    /// Run `xzsafe` with raw stdin bytes.
    ///
    /// The engine is always the system `xz` and logging is left at its defaults,
    /// whatever the environment of the test runner says.
    ///
    /// # Panics
    ///
    /// Panics if the process cannot be spawned or awaiting its output fails.
    pub async fn run_with_stdin(&self, args: &[&str], stdin: &[u8]) -> Output {
        let mut command = self.command(args);
        command.env_remove(ENGINE_ENV);
        Self::collect(command, stdin).await
    }

    /// Run `xzsafe` with the engine named through the environment
    ///
    /// # Panics
    ///
    /// Panics if the process cannot be spawned or awaiting its output fails.
    pub async fn run_with_engine_env(&self, args: &[&str], engine: &Path) -> Output {
        let mut command = self.command(args);
        command.env(ENGINE_ENV, engine);
        Self::collect(command, &[]).await
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new(XZSAFE_BIN);
        command
            .args(args)
            .current_dir(self.root_dir.path())
            .env_remove("RUST_LOG");
        command
    }

    async fn collect(mut command: Command, stdin: &[u8]) -> Output {
        let mut child = command
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .unwrap();

        let mut child_stdin = child.stdin.take();
        let feed = async move {
            if let Some(pipe) = child_stdin.as_mut() {
                // Some invocations exit before reading stdin
                if let Err(err) = pipe.write_all(stdin).await {
                    assert_eq!(err.kind(), std::io::ErrorKind::BrokenPipe, "{err}");
                }
            }
            // Dropping stdin sends EOF to the child process
            drop(child_stdin);
        };

        // Output is collected while stdin is written so large payloads cannot deadlock
        let ((), raw_output) = tokio::join!(feed, child.wait_with_output());
        let raw_output = raw_output.unwrap();
        Output {
            status: raw_output.status,
            stdout: String::from_utf8_lossy(&raw_output.stdout).into_owned(),
            stdout_raw: raw_output.stdout,
            stderr: String::from_utf8_lossy(&raw_output.stderr).into_owned(),
        }
    }
}
