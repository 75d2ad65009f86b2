//! Notebook discovery and test-module generation
//!
//! `generate` scans one directory for `*.ipynb` files, sorts them by name, and
//! writes a Rust test module with one `test_ipynb_<i>` function per notebook.
//! Rendering is pure and deterministic: the same directory contents always
//! produce byte-identical output.

pub mod emit;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, warn};

pub use emit::test_name;

use crate::runner::DEFAULT_CELL_TIMEOUT;

/// File extension of notebook documents.
pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// Where `nbtest generate` writes the module when no output is given.
pub const DEFAULT_OUTPUT: &str = "tests/notebooks.rs";

/// Errors that occur while generating a test module
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to scan {}: {source}", .dir.display())]
    Discovery {
        dir: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid crate path `{path}`: {message}")]
    InvalidCratePath { path: String, message: String },

    #[error("cell timeout must be at least one second, got {0:?}")]
    InvalidTimeout(Duration),

    #[error("failed to emit test module: {0}")]
    Emit(String),

    #[error("failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Settings baked into the generated module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Per-cell timeout passed to the runner by every generated test
    pub timeout: Duration,
    /// Path the generated code uses to name this crate
    pub crate_path: String,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_CELL_TIMEOUT,
            crate_path: "nbtest".to_string(),
        }
    }
}

impl GenerateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the per-cell timeout
    ///
    /// Generated tests use whole seconds, so a fractional timeout is rounded
    /// up. Zero makes rendering fail with `GenerateError::InvalidTimeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the crate path (e.g. when nbtest is renamed in Cargo.toml)
    pub fn with_crate_path(mut self, crate_path: impl Into<String>) -> Self {
        self.crate_path = crate_path.into();
        self
    }
}

/// What a `generate` call wrote
#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output: PathBuf,
    pub notebooks: Vec<PathBuf>,
    /// Notebooks left out because their file names are not valid UTF-8
    pub skipped: Vec<PathBuf>,
}

/// Notebooks found directly inside a directory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotebookScan {
    /// Notebooks with UTF-8 names, sorted by path
    pub notebooks: Vec<PathBuf>,
    /// Notebooks whose names cannot be written into a Rust string literal
    pub skipped: Vec<PathBuf>,
}

/// Scan `dir` for notebook files (non-recursive).
///
/// Hidden files are skipped, as a shell `*.ipynb` glob would. Notebooks with
/// non-UTF-8 names cannot be named by a generated test and are reported in
/// `skipped` instead. Both lists are sorted by path and may be empty.
pub fn scan_notebooks(dir: &Path) -> io::Result<NotebookScan> {
    let mut scan = NotebookScan::default();

    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name() else {
            continue;
        };
        if name.as_encoded_bytes().starts_with(b".") || !path.is_file() {
            continue;
        }
        if !path.extension().is_some_and(|ext| ext == NOTEBOOK_EXTENSION) {
            continue;
        }
        if name.to_str().is_some() {
            scan.notebooks.push(path);
        } else {
            warn!(path = %path.display(), "skipping notebook with non-UTF-8 file name");
            scan.skipped.push(path);
        }
    }

    scan.notebooks.sort();
    scan.skipped.sort();
    debug!(
        dir = %dir.display(),
        count = scan.notebooks.len(),
        skipped = scan.skipped.len(),
        "discovered notebooks"
    );
    Ok(scan)
}

/// Discover notebook files directly inside `dir`, sorted by path.
///
/// See [`scan_notebooks`] for the filtering rules; skipped notebooks are
/// dropped here.
pub fn discover_notebooks(dir: &Path) -> io::Result<Vec<PathBuf>> {
    scan_notebooks(dir).map(|scan| scan.notebooks)
}

/// Render the test module for an already-discovered notebook list.
pub fn render_module(notebooks: &[PathBuf], options: &GenerateOptions) -> Result<String, GenerateError> {
    emit::emit_module(notebooks, options)
}

/// Discover notebooks in `dir` and write the test module to `output`.
///
/// `output` is truncated and rewritten; missing parent directories are created.
pub fn generate(dir: &Path, output: &Path, options: &GenerateOptions) -> Result<GenerateReport, GenerateError> {
    let NotebookScan { notebooks, skipped } = scan_notebooks(dir).map_err(|source| GenerateError::Discovery {
        dir: dir.to_path_buf(),
        source,
    })?;

    let module = render_module(&notebooks, options)?;

    let write_err = |source| GenerateError::Write {
        path: output.to_path_buf(),
        source,
    };
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(output, module).map_err(write_err)?;

    info!(output = %output.display(), tests = notebooks.len(), "wrote notebook test module");

    Ok(GenerateReport {
        output: output.to_path_buf(),
        notebooks,
        skipped,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{notebook_json, write_notebook};

    fn touch(dir: &Path, name: &str) {
        write_notebook(dir, name, &notebook_json(&[]));
    }

    fn names(paths: &[PathBuf]) -> Vec<String> {
        paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn test_discover_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.ipynb", "a.ipynb", "notes.txt", ".hidden.ipynb", "c.ipynb.bak", "A_upper.ipynb"] {
            touch(dir.path(), name);
        }
        fs::create_dir(dir.path().join("dir.ipynb")).unwrap();
        fs::create_dir(dir.path().join("nested")).unwrap();
        touch(&dir.path().join("nested"), "deep.ipynb");

        let found = discover_notebooks(dir.path()).unwrap();
        assert_eq!(names(&found), ["A_upper.ipynb", "a.ipynb", "b.ipynb"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_names_are_reported_as_skipped() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.ipynb");
        let odd = dir.path().join(OsStr::from_bytes(b"caf\xe9.ipynb"));
        // Some filesystems refuse non-UTF-8 names outright.
        if fs::write(&odd, notebook_json(&[])).is_err() {
            return;
        }
        let output = dir.path().join("notebooks.rs");

        let report = generate(dir.path(), &output, &GenerateOptions::default()).unwrap();

        assert_eq!(names(&report.notebooks), ["a.ipynb"]);
        assert_eq!(report.skipped, [odd]);
        let module = fs::read_to_string(&output).unwrap();
        assert!(!module.contains("fn test_ipynb_1()"));
    }

    #[test]
    fn test_discover_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_notebooks(dir.path()).unwrap().is_empty());
    }

    #[test]
    fn test_discover_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert!(discover_notebooks(&dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_generate_writes_one_test_per_notebook() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "b.ipynb");
        touch(dir.path(), "a.ipynb");
        let output = dir.path().join("tests").join("notebooks.rs");

        let report = generate(dir.path(), &output, &GenerateOptions::default()).unwrap();
        let module = fs::read_to_string(&output).unwrap();

        assert_eq!(names(&report.notebooks), ["a.ipynb", "b.ipynb"]);
        assert!(module.contains("fn test_ipynb_0()"));
        assert!(module.contains("fn test_ipynb_1()"));
        assert!(!module.contains("fn test_ipynb_2()"));

        let a = module.find("a.ipynb").unwrap();
        let b = module.find("b.ipynb").unwrap();
        assert!(a < b, "a.ipynb must be tested first");
    }

    #[test]
    fn test_generate_is_deterministic() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["z.ipynb", "m.ipynb", "a.ipynb"] {
            touch(dir.path(), name);
        }
        let out = tempfile::tempdir().unwrap();
        let first = out.path().join("first.rs");
        let second = out.path().join("second.rs");

        generate(dir.path(), &first, &GenerateOptions::default()).unwrap();
        generate(dir.path(), &second, &GenerateOptions::default()).unwrap();

        assert_eq!(fs::read(&first).unwrap(), fs::read(&second).unwrap());
    }

    #[test]
    fn test_generate_overwrites_previous_module() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("notebooks.rs");
        fs::write(&output, "stale contents that are much longer than a header ".repeat(100)).unwrap();

        generate(dir.path(), &output, &GenerateOptions::default()).unwrap();
        let module = fs::read_to_string(&output).unwrap();

        assert!(!module.contains("stale"));
        assert!(!module.contains("#[test]"));
    }

    #[test]
    fn test_generate_empty_dir_has_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("notebooks.rs");

        let report = generate(dir.path(), &output, &GenerateOptions::default()).unwrap();
        let module = fs::read_to_string(&output).unwrap();

        assert!(report.notebooks.is_empty());
        assert!(report.skipped.is_empty());
        assert!(module.starts_with("// Generated by nbtest"));
        assert!(module.contains("fn notebook_runner()"));
        assert!(!module.contains("#[test]"));
        syn::parse_file(&module).unwrap();
    }

    #[test]
    fn test_timeout_and_crate_path_are_emitted() {
        let options = GenerateOptions::new()
            .with_timeout(Duration::from_secs(60))
            .with_crate_path("my_nbtest");
        let module = render_module(&[PathBuf::from("a.ipynb")], &options).unwrap();

        assert!(module.contains("Duration::from_secs(60)"), "{module}");
        assert!(module.contains("use my_nbtest::runner::"), "{module}");
    }

    #[test]
    fn test_fractional_timeout_rounds_up() {
        let options = GenerateOptions::new().with_timeout(Duration::from_millis(500));
        let module = render_module(&[PathBuf::from("a.ipynb")], &options).unwrap();
        assert!(module.contains("Duration::from_secs(1)"), "{module}");

        let options = GenerateOptions::new().with_timeout(Duration::from_millis(1500));
        let module = render_module(&[PathBuf::from("a.ipynb")], &options).unwrap();
        assert!(module.contains("Duration::from_secs(2)"), "{module}");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("notebooks.rs");
        let options = GenerateOptions::new().with_timeout(Duration::ZERO);

        let err = generate(dir.path(), &output, &options).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidTimeout(_)), "got {err:?}");
        assert!(!output.exists());
    }

    #[test]
    fn test_invalid_crate_path_is_rejected() {
        let options = GenerateOptions::new().with_crate_path("not a path");
        let err = render_module(&[], &options).unwrap_err();
        assert!(matches!(err, GenerateError::InvalidCratePath { .. }), "got {err:?}");
    }

    #[test]
    fn test_awkward_file_names_are_escaped() {
        let module = render_module(&[PathBuf::from("say \"hi\".ipynb")], &GenerateOptions::default()).unwrap();
        syn::parse_file(&module).unwrap();
        assert!(module.contains(r#""say \"hi\".ipynb""#), "{module}");
    }
}
