//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::path::Path;
use std::time::Duration;

use crate::generator::{self, GenerateOptions, discover_notebooks};
use crate::notebook::format_errors;
use crate::runner::{JsonNotebookReader, NotebookRunner};

use super::check::{self, CheckOptions, ConsoleReporter};
use super::{CliError, CliResult, ExecutionArgs, ExitCode};

/// Write the notebook test module (`nbtest generate`).
pub fn generate_tests(dir: &Path, output: &Path, timeout: Duration, crate_path: &str) -> CliResult<ExitCode> {
    let options = GenerateOptions::new()
        .with_timeout(timeout)
        .with_crate_path(crate_path);

    let report = generator::generate(dir, output, &options).map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    println!(
        "Wrote {} notebook test(s) to {}",
        report.notebooks.len(),
        report.output.display()
    );
    if !report.skipped.is_empty() {
        println!("Skipped {} notebook(s) with non-UTF-8 file names:", report.skipped.len());
        for path in &report.skipped {
            println!("  - {}", path.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Execute one notebook (`nbtest run`).
pub fn run_notebook(notebook: &Path, exec: &ExecutionArgs) -> CliResult<ExitCode> {
    let runner = NotebookRunner::with_parts(exec.executor(), JsonNotebookReader).with_timeout(exec.timeout());

    let (nb, errors) = runner.run(notebook).map_err(|e| CliError::failure(format!("Error: {}", e)))?;

    if errors.is_empty() {
        println!("{}: {} cell(s), no errors", notebook.display(), nb.cells.len());
        return Ok(ExitCode::SUCCESS);
    }

    println!("{}: {} error output(s)", notebook.display(), errors.len());
    println!("{}", format_errors(&errors));
    Ok(ExitCode::FAILURE)
}

/// Execute every notebook in a directory (`nbtest check`).
pub fn check_notebooks(dir: &Path, options: &CheckOptions, exec: &ExecutionArgs) -> CliResult<ExitCode> {
    let notebooks = discover_notebooks(dir)
        .map_err(|e| CliError::failure(format!("Error: failed to scan {}: {}", dir.display(), e)))?;
    let notebooks = check::select_notebooks(notebooks, options.filter.as_deref());

    let runner = NotebookRunner::with_parts(exec.executor(), JsonNotebookReader).with_timeout(exec.timeout());
    let mut reporter = ConsoleReporter::new(options.verbose);

    let summary = check::run_check(&runner, &notebooks, options, &mut reporter);

    if summary.is_success() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    }
}
