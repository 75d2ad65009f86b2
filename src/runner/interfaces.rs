//! Runner I/O boundary interfaces
//!
//! This module defines trait-based abstractions for the two out-of-process
//! operations the runner performs:
//! - Notebook execution (`jupyter nbconvert --execute` invocation)
//! - Notebook parsing (reading the executed copy back in)
//!
//! These interfaces allow the runner to be driven by fakes in tests, or by a
//! different execution tool, without touching the run logic itself.

use std::ffi::OsString;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::process::Command;
use std::time::Duration;

use tracing::debug;

use super::{RunError, timeout_secs};
use crate::notebook::{CURRENT_NBFORMAT, Notebook};

// ============================================================================
// Notebook Executor Interface
// ============================================================================

/// Execute a notebook and write the executed copy to `output`.
///
/// Implementations must return `Err` when execution fails fatally. Cell-level
/// exceptions the tool records inline are not failures.
pub trait NotebookExecutor {
    fn execute(&self, input: &Path, output: &Path, timeout: Duration) -> Result<(), RunError>;
}

// ============================================================================
// Notebook Reader Interface
// ============================================================================

/// Parse an executed notebook document from disk.
pub trait NotebookReader {
    fn read(&self, path: &Path) -> Result<Notebook, RunError>;
}

// ============================================================================
// Default Implementations
// ============================================================================

/// Executes notebooks with `jupyter nbconvert --to notebook --execute`.
#[derive(Debug, Clone)]
pub struct NbconvertExecutor {
    program: OsString,
    leading_args: Vec<OsString>,
}

impl Default for NbconvertExecutor {
    fn default() -> Self {
        Self {
            program: OsString::from("jupyter"),
            leading_args: vec![OsString::from("nbconvert")],
        }
    }
}

impl NbconvertExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different `jupyter` launcher, keeping the `nbconvert` subcommand.
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Replace the whole command prefix that precedes the conversion flags.
    pub fn with_command<I, S>(program: impl Into<OsString>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            program: program.into(),
            leading_args: leading_args.into_iter().map(Into::into).collect(),
        }
    }

    /// Build the full argument list passed after the program name.
    ///
    /// The timeout is passed in whole seconds, rounded up; zero is rejected.
    pub fn args(&self, input: &Path, output: &Path, timeout: Duration) -> Result<Vec<OsString>, RunError> {
        let secs = timeout_secs(timeout).ok_or(RunError::InvalidTimeout(timeout))?;
        let mut args = self.leading_args.clone();
        args.extend(
            [
                "--to".to_string(),
                "notebook".to_string(),
                "--execute".to_string(),
                format!("--ExecutePreprocessor.timeout={}", secs),
                "--output".to_string(),
            ]
            .map(OsString::from),
        );
        args.push(output.as_os_str().to_os_string());
        args.push(input.as_os_str().to_os_string());
        Ok(args)
    }
}

impl NotebookExecutor for NbconvertExecutor {
    fn execute(&self, input: &Path, output: &Path, timeout: Duration) -> Result<(), RunError> {
        let args = self.args(input, output, timeout)?;
        debug!(program = ?self.program, ?args, "spawning notebook executor");

        let result = Command::new(&self.program)
            .args(&args)
            .output()
            .map_err(|source| RunError::Spawn {
                program: self.program.to_string_lossy().into_owned(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&result.stdout);
        if !stdout.trim().is_empty() {
            debug!(stdout = %stdout.trim_end(), "executor stdout");
        }

        if result.status.success() {
            Ok(())
        } else {
            Err(RunError::ProcessExecution {
                path: input.to_path_buf(),
                status: result.status,
                stderr: String::from_utf8_lossy(&result.stderr).trim_end().to_string(),
            })
        }
    }
}

/// Reads notebooks as nbformat v4 JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonNotebookReader;

impl NotebookReader for JsonNotebookReader {
    fn read(&self, path: &Path) -> Result<Notebook, RunError> {
        let file = File::open(path)?;
        let notebook: Notebook =
            serde_json::from_reader(BufReader::new(file)).map_err(|source| RunError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        if notebook.nbformat != CURRENT_NBFORMAT {
            return Err(RunError::UnsupportedFormat {
                path: path.to_path_buf(),
                nbformat: notebook.nbformat,
            });
        }

        Ok(notebook)
    }
}
