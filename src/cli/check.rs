//! Notebook check session (pytest-style)
//!
//! ## CheckReporter Trait
//!
//! The session uses a `CheckReporter` trait to separate reporting from
//! execution. This allows for custom output formats (JSON, TAP, etc.) by
//! implementing the trait.
//!
//! Notebooks run strictly one after another. A notebook *fails* when it
//! recorded error outputs and *errors* when the runner itself failed.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::info;

use crate::notebook::{OutputRecord, format_errors};
use crate::runner::{NotebookExecutor, NotebookReader, NotebookRunner};

/// Options for a check session
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    pub verbose: bool,
    pub stop_on_fail: bool,
    pub filter: Option<String>,
}

/// Outcome of running a single notebook
#[derive(Debug)]
pub enum NotebookOutcome {
    Passed(Duration),
    Failed(Duration, Vec<OutputRecord>),
    Errored(Duration, String),
}

impl NotebookOutcome {
    pub fn is_pass(&self) -> bool {
        matches!(self, NotebookOutcome::Passed(_))
    }
}

/// Summary of a check session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub errored: usize,
    pub duration: Duration,
}

impl CheckSummary {
    pub fn is_success(&self) -> bool {
        self.failed == 0 && self.errored == 0
    }
}

// ============================================================================
// Check Reporter Trait
// ============================================================================

/// Trait for reporting check session results.
pub trait CheckReporter {
    /// Called once the notebook list is final
    fn on_collection_complete(&mut self, count: usize);

    /// Called before a notebook runs
    fn on_notebook_start(&mut self, _notebook: &Path) {}

    /// Called when a notebook completes
    fn on_notebook_complete(&mut self, notebook: &Path, outcome: &NotebookOutcome);

    /// Called when the session is over
    fn on_run_complete(&mut self, summary: &CheckSummary);
}

/// Default console reporter (pytest-style)
#[derive(Default)]
pub struct ConsoleReporter {
    pub verbose: bool,
    failures: Vec<(PathBuf, String)>,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            verbose,
            failures: Vec::new(),
        }
    }
}

impl CheckReporter for ConsoleReporter {
    fn on_collection_complete(&mut self, count: usize) {
        if count == 0 {
            eprintln!("No notebooks collected");
            return;
        }
        println!("\x1b[1m=================== notebook session starts ===================\x1b[0m");
        println!("collected {} notebook(s)", count);
        println!();
    }

    fn on_notebook_complete(&mut self, notebook: &Path, outcome: &NotebookOutcome) {
        let name = notebook.file_name().and_then(|n| n.to_str()).unwrap_or("unknown");

        let (status, duration) = match outcome {
            NotebookOutcome::Passed(d) => ("\x1b[32mPASSED\x1b[0m", d),
            NotebookOutcome::Failed(d, errors) => {
                self.failures.push((notebook.to_path_buf(), format_errors(errors)));
                ("\x1b[31mFAILED\x1b[0m", d)
            }
            NotebookOutcome::Errored(d, message) => {
                self.failures.push((notebook.to_path_buf(), message.clone()));
                ("\x1b[31mERROR\x1b[0m", d)
            }
        };

        if self.verbose {
            println!("{} {} ({:.0}ms)", name, status, duration.as_millis());
        } else {
            println!("{} {}", name, status);
        }
    }

    fn on_run_complete(&mut self, summary: &CheckSummary) {
        if summary.total == 0 {
            return;
        }

        if !self.failures.is_empty() {
            println!();
            println!("\x1b[1;31m=================== FAILURES ===================\x1b[0m");
            for (notebook, detail) in &self.failures {
                println!();
                println!("\x1b[1m___________ {} ___________\x1b[0m", notebook.display());
                println!();
                for line in detail.lines() {
                    println!("    {}", line.trim_start());
                }
            }
        }

        println!();
        let summary_color = if summary.is_success() { "\x1b[1;32m" } else { "\x1b[1;31m" };
        println!(
            "{}=================== {} in {:.2}s ===================\x1b[0m",
            summary_color,
            summary_parts(summary).join(", "),
            summary.duration.as_secs_f64()
        );
    }
}

fn summary_parts(summary: &CheckSummary) -> Vec<String> {
    let mut parts = Vec::new();
    if summary.passed > 0 {
        parts.push(format!("{} passed", summary.passed));
    }
    if summary.failed > 0 {
        parts.push(format!("{} failed", summary.failed));
    }
    if summary.errored > 0 {
        parts.push(format!("{} errors", summary.errored));
    }
    parts
}

/// Keep notebooks whose file name contains `filter`.
pub fn select_notebooks(notebooks: Vec<PathBuf>, filter: Option<&str>) -> Vec<PathBuf> {
    match filter {
        None => notebooks,
        Some(keyword) => notebooks
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.contains(keyword))
            })
            .collect(),
    }
}

/// Run `notebooks` in order, reporting each outcome.
pub fn run_check<E, R>(
    runner: &NotebookRunner<E, R>,
    notebooks: &[PathBuf],
    options: &CheckOptions,
    reporter: &mut dyn CheckReporter,
) -> CheckSummary
where
    E: NotebookExecutor,
    R: NotebookReader,
{
    let start_time = Instant::now();
    let mut summary = CheckSummary::default();

    reporter.on_collection_complete(notebooks.len());

    for notebook in notebooks {
        reporter.on_notebook_start(notebook);
        let start = Instant::now();

        let outcome = match runner.run(notebook) {
            Ok((_, errors)) if errors.is_empty() => NotebookOutcome::Passed(start.elapsed()),
            Ok((_, errors)) => NotebookOutcome::Failed(start.elapsed(), errors),
            Err(e) => NotebookOutcome::Errored(start.elapsed(), e.to_string()),
        };

        summary.total += 1;
        match &outcome {
            NotebookOutcome::Passed(_) => summary.passed += 1,
            NotebookOutcome::Failed(_, _) => summary.failed += 1,
            NotebookOutcome::Errored(_, _) => summary.errored += 1,
        }
        info!(notebook = %notebook.display(), passed = outcome.is_pass(), "notebook checked");

        reporter.on_notebook_complete(notebook, &outcome);

        if options.stop_on_fail && !outcome.is_pass() {
            break;
        }
    }

    summary.duration = start_time.elapsed();
    reporter.on_run_complete(&summary);
    summary
}
