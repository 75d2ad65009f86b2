//! Shared fakes for unit tests

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::json;

use crate::runner::{NotebookExecutor, RunError};

/// "Executes" a notebook by copying it verbatim to the output path.
///
/// Inputs whose file name starts with `crash` fail the way a dead kernel does.
#[derive(Debug, Clone, Default)]
pub struct CopyExecutor {
    calls: Arc<Mutex<Vec<(PathBuf, PathBuf, Duration)>>>,
}

impl CopyExecutor {
    pub fn seen_inputs(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().iter().map(|(i, _, _)| i.clone()).collect()
    }

    pub fn seen_outputs(&self) -> Vec<PathBuf> {
        self.calls.lock().unwrap().iter().map(|(_, o, _)| o.clone()).collect()
    }

    pub fn seen_timeouts(&self) -> Vec<Duration> {
        self.calls.lock().unwrap().iter().map(|(_, _, t)| *t).collect()
    }
}

impl NotebookExecutor for CopyExecutor {
    fn execute(&self, input: &Path, output: &Path, timeout: Duration) -> Result<(), RunError> {
        self.calls
            .lock()
            .unwrap()
            .push((input.to_path_buf(), output.to_path_buf(), timeout));

        let name = input.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if name.starts_with("crash") {
            return Err(RunError::ProcessExecution {
                path: input.to_path_buf(),
                status: failed_status(),
                stderr: "nbconvert.preprocessors.execute.DeadKernelError: Kernel died".to_string(),
            });
        }

        fs::copy(input, output)?;
        Ok(())
    }
}

#[cfg(unix)]
fn failed_status() -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;
    ExitStatus::from_raw(1 << 8)
}

#[cfg(windows)]
fn failed_status() -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;
    ExitStatus::from_raw(1)
}

/// Build an executed nbformat v4 document.
///
/// `cells[i]` lists the `output_type` of each output in code cell `i`. Error
/// outputs get `ename = "E{cell}_{output}"` so tests can check ordering.
pub fn notebook_json(cells: &[&[&str]]) -> String {
    let cells: Vec<_> = cells
        .iter()
        .enumerate()
        .map(|(ci, outputs)| {
            let outputs: Vec<_> = outputs
                .iter()
                .enumerate()
                .map(|(oi, kind)| match *kind {
                    "error" => json!({
                        "output_type": "error",
                        "ename": format!("E{}_{}", ci, oi),
                        "evalue": "boom",
                        "traceback": [],
                    }),
                    "stream" => json!({"output_type": "stream", "name": "stdout", "text": "ok\n"}),
                    other => json!({"output_type": other, "data": {}, "metadata": {}}),
                })
                .collect();
            json!({
                "cell_type": "code",
                "execution_count": ci + 1,
                "metadata": {},
                "source": "",
                "outputs": outputs,
            })
        })
        .collect();

    json!({
        "nbformat": 4,
        "nbformat_minor": 5,
        "metadata": {},
        "cells": cells,
    })
    .to_string()
}

pub fn write_notebook(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}
