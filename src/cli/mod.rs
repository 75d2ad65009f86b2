//! CLI module for nbtest
//!
//! This module provides the command-line interface.
//!
//! ## Commands
//!
//! - `generate [dir]` - Write a Rust test module with one test per notebook
//! - `run <notebook>` - Execute a single notebook and list its error outputs
//! - `check [dir]` - Execute every notebook in a directory (pytest-style report)
//!
//! ## Modules
//!
//! - `commands` - Command implementations
//! - `check` - Sequential notebook session and reporting
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

pub mod check;
pub mod commands;

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::generator::DEFAULT_OUTPUT;
use crate::runner::{DEFAULT_CELL_TIMEOUT, NbconvertExecutor};

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

const VERSION: &str = crate::version::NBTEST_VERSION;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Generate and run Rust test suites for Jupyter notebooks
#[derive(Parser, Debug)]
#[command(name = "nbtest")]
#[command(version = VERSION)]
#[command(about = "Generate and run Rust test suites for Jupyter notebooks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Flags shared by every command that executes notebooks
#[derive(Args, Debug, Clone)]
pub struct ExecutionArgs {
    /// Per-cell execution timeout in seconds
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CELL_TIMEOUT.as_secs(),
          value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: u64,
    /// Jupyter launcher used to run `nbconvert`
    #[arg(long, value_name = "PROGRAM", default_value = "jupyter")]
    pub jupyter: String,
}

impl ExecutionArgs {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn executor(&self) -> NbconvertExecutor {
        NbconvertExecutor::new().with_program(&self.jupyter)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Write a Rust test module with one test per notebook
    Generate {
        /// Directory to scan for *.ipynb files
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
        /// Path of the generated module
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
        /// Per-cell timeout baked into the generated tests, in seconds
        #[arg(long, value_name = "SECS", default_value_t = DEFAULT_CELL_TIMEOUT.as_secs(),
              value_parser = clap::value_parser!(u64).range(1..))]
        timeout: u64,
        /// Path the generated code uses to reach this crate
        #[arg(long, value_name = "PATH", default_value = "nbtest")]
        crate_path: String,
    },

    /// Execute a single notebook and report its error outputs
    Run {
        /// Notebook to execute
        #[arg(value_name = "NOTEBOOK")]
        notebook: PathBuf,
        #[command(flatten)]
        exec: ExecutionArgs,
    },

    /// Execute every notebook in a directory (pytest-style)
    Check {
        /// Directory to scan for *.ipynb files
        #[arg(value_name = "DIR", default_value = ".")]
        dir: PathBuf,
        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
        /// Stop on first failure
        #[arg(short = 'x', long = "exitfirst")]
        stop_on_fail: bool,
        /// Only run notebooks whose file name contains EXPR
        #[arg(short = 'k', value_name = "EXPR")]
        filter: Option<String>,
        #[command(flatten)]
        exec: ExecutionArgs,
    },
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Execute the CLI command and return result.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    match cli.command {
        Command::Generate {
            dir,
            output,
            timeout,
            crate_path,
        } => commands::generate_tests(&dir, &output, Duration::from_secs(timeout), &crate_path),
        Command::Run { notebook, exec } => commands::run_notebook(&notebook, &exec),
        Command::Check {
            dir,
            verbose,
            stop_on_fail,
            filter,
            exec,
        } => commands::check_notebooks(
            &dir,
            &check::CheckOptions {
                verbose,
                stop_on_fail,
                filter,
            },
            &exec,
        ),
    }
}

// ============================================================================
// Tests
// ============================================================================
