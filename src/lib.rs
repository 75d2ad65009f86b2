#![forbid(unsafe_code)]
//! nbtest: notebook test-harness generator
//!
//! Turns a directory of Jupyter notebooks into a Rust test suite. Each notebook
//! becomes one `#[test]` that executes it end-to-end through `jupyter nbconvert`
//! and fails when any cell recorded an error output.
//!
//! ## Components
//!
//! - `generator` - Notebook discovery and test-module emission
//! - `runner` - Out-of-process execution of a single notebook
//! - `notebook` - Minimal notebook document model (cells, outputs)
//! - `cli` - The `nbtest` command-line interface
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Generated code**: Cell errors surface as assertion failures; runner failures are returned as `Err` so the
//!   generated test errors out instead of failing an assertion.

pub mod cli;
pub mod generator;
pub mod notebook;
pub mod runner;
pub mod version;

#[cfg(test)]
pub(crate) mod testing;

pub use generator::{
    GenerateError, GenerateOptions, GenerateReport, NotebookScan, discover_notebooks, generate, render_module,
    scan_notebooks,
};
pub use notebook::{Cell, Notebook, OutputRecord};
pub use runner::{DEFAULT_CELL_TIMEOUT, NotebookRunner, RunError, run_notebook};
