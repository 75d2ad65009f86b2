//! Single-notebook runner
//!
//! Executes one notebook out of process and reports the error outputs recorded
//! in the executed copy.
//!
//! ## Failure model
//!
//! Two kinds of "error" are kept apart:
//!
//! - A fatal execution failure (tool missing, non-zero exit, cell timeout,
//!   kernel crash, unparseable output) is returned as `Err(RunError)`.
//! - An exception the tool caught and recorded inline as an `error` output is
//!   data: it shows up in the returned error list.
//!
//! ## I/O Boundaries
//!
//! The subprocess and the parser sit behind the traits in `interfaces.rs`
//! (`NotebookExecutor`, `NotebookReader`) so the run logic can be exercised
//! without spawning anything.

pub mod interfaces;

use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info};

pub use interfaces::{JsonNotebookReader, NbconvertExecutor, NotebookExecutor, NotebookReader};

use crate::notebook::{Notebook, OutputRecord};

/// Per-cell execution timeout forwarded to the execution tool.
pub const DEFAULT_CELL_TIMEOUT: Duration = Duration::from_secs(500);

/// Errors that abort a notebook run
#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to launch `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("executing {} failed ({status}){}", .path.display(), stderr_suffix(.stderr))]
    ProcessExecution {
        path: PathBuf,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to parse executed notebook {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The executed copy is not an nbformat v4 document.
    ///
    /// Older documents are rejected rather than upgraded in memory. nbconvert
    /// always writes the current major version, so in practice this only
    /// fires on a corrupt or hand-written executed copy.
    #[error("{} has nbformat {nbformat}, expected 4", .path.display())]
    UnsupportedFormat { path: PathBuf, nbformat: u32 },

    #[error("cell timeout must be at least one second, got {0:?}")]
    InvalidTimeout(Duration),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!("\n{}", stderr)
    }
}

/// Whole seconds forwarded to the execution tool for `timeout`.
///
/// Sub-second remainders round up, so a limit is never silently shortened.
/// A zero timeout has no meaningful whole-second value and yields `None`.
pub fn timeout_secs(timeout: Duration) -> Option<u64> {
    let secs = timeout
        .as_secs()
        .saturating_add(u64::from(timeout.subsec_nanos() > 0));
    (secs > 0).then_some(secs)
}

/// Runs notebooks through an executor and reader.
#[derive(Debug, Clone)]
pub struct NotebookRunner<E = NbconvertExecutor, R = JsonNotebookReader> {
    executor: E,
    reader: R,
    timeout: Duration,
}

impl NotebookRunner {
    /// Runner backed by `jupyter nbconvert` with the default timeout.
    pub fn new() -> Self {
        Self::with_parts(NbconvertExecutor::new(), JsonNotebookReader)
    }
}

impl Default for NotebookRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: NotebookExecutor, R: NotebookReader> NotebookRunner<E, R> {
    pub fn with_parts(executor: E, reader: R) -> Self {
        Self {
            executor,
            reader,
            timeout: DEFAULT_CELL_TIMEOUT,
        }
    }

    /// Set the per-cell execution timeout.
    ///
    /// The tool takes whole seconds, so a fractional timeout is rounded up.
    /// A zero timeout makes every `run` fail with `RunError::InvalidTimeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Execute `path` and return the executed notebook and its error outputs.
    ///
    /// The input file is never modified. The executed copy lives in a
    /// temporary file that is removed before this returns, on success and on
    /// every error path.
    #[tracing::instrument(skip(self, path), fields(notebook = %path.as_ref().display()))]
    pub fn run(&self, path: impl AsRef<Path>) -> Result<(Notebook, Vec<OutputRecord>), RunError> {
        let path = path.as_ref();
        if timeout_secs(self.timeout).is_none() {
            return Err(RunError::InvalidTimeout(self.timeout));
        }

        // Closed immediately; the path is deleted when `executed` drops.
        let executed = tempfile::Builder::new()
            .prefix("nbtest-")
            .suffix(".ipynb")
            .tempfile()?
            .into_temp_path();
        debug!(output = %executed.display(), "executing into temporary copy");

        self.executor.execute(path, &executed, self.timeout)?;
        let notebook = self.reader.read(&executed)?;
        drop(executed);

        let errors = notebook.collect_errors();
        info!(cells = notebook.cells.len(), errors = errors.len(), "notebook executed");
        Ok((notebook, errors))
    }
}

/// Run a notebook with the default `jupyter nbconvert` runner.
pub fn run_notebook(path: impl AsRef<Path>) -> Result<(Notebook, Vec<OutputRecord>), RunError> {
    NotebookRunner::new().run(path)
}
