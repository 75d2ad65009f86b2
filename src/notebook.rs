//! Notebook document model
//!
//! Only the shape nbtest depends on is typed: ordered cells, each with an
//! optional ordered list of outputs, each output tagged by `output_type`.
//! Everything else in the document is carried through as raw JSON so a parsed
//! notebook can be written back out without losing fields.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The notebook format major version nbtest reads (nbformat v4).
pub const CURRENT_NBFORMAT: u32 = 4;

/// `output_type` tag of outputs produced by a raised exception.
pub const ERROR_OUTPUT_TYPE: &str = "error";

/// A notebook document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notebook {
    pub nbformat: u32,
    #[serde(default)]
    pub nbformat_minor: u32,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

/// A single notebook cell.
///
/// Markdown and raw cells carry no `outputs` key at all, which is different
/// from a code cell that ran and produced nothing (`Some(vec![])`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    pub cell_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outputs: Option<Vec<OutputRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One output attached to a cell after execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputRecord {
    pub output_type: String,
    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl Notebook {
    /// All error outputs, in cell order then in-cell output order.
    pub fn error_outputs(&self) -> impl Iterator<Item = &OutputRecord> {
        self.cells
            .iter()
            .filter_map(|cell| cell.outputs.as_deref())
            .flatten()
            .filter(|output| output.is_error())
    }

    /// Owned copy of [`error_outputs`](Self::error_outputs).
    pub fn collect_errors(&self) -> Vec<OutputRecord> {
        self.error_outputs().cloned().collect()
    }
}

impl OutputRecord {
    pub fn is_error(&self) -> bool {
        self.output_type == ERROR_OUTPUT_TYPE
    }

    /// Exception class name of an error output.
    pub fn ename(&self) -> Option<&str> {
        self.payload.get("ename").and_then(Value::as_str)
    }

    /// Exception message of an error output.
    pub fn evalue(&self) -> Option<&str> {
        self.payload.get("evalue").and_then(Value::as_str)
    }

    /// Traceback lines of an error output (may contain ANSI escapes).
    pub fn traceback(&self) -> Vec<&str> {
        self.payload
            .get("traceback")
            .and_then(Value::as_array)
            .map(|lines| lines.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }
}

impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.ename(), self.evalue()) {
            (Some(name), Some(value)) if !value.is_empty() => write!(f, "{}: {}", name, value),
            (Some(name), _) => write!(f, "{}", name),
            _ => write!(f, "<{} output>", self.output_type),
        }
    }
}

/// Render an error list as one `ename: evalue` line per error.
pub fn format_errors(errors: &[OutputRecord]) -> String {
    errors
        .iter()
        .map(|error| format!("  - {}", error))
        .collect::<Vec<_>>()
        .join("\n")
}
