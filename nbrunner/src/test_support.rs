//! Test-only helpers: notebook fixtures and scripted collaborators.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use anyhow::{Result, anyhow};
use serde_json::{Map, json};

use crate::core::transform::{TransformSet, Transformer};
use crate::io::executor::{CellFailure, ExecError, ExecRequest, Executor};
use crate::io::store::write_notebook;
use crate::notebook::{Cell, CellMetadata, Notebook};

/// Notebook with the given cells and empty metadata.
pub fn notebook(cells: Vec<Cell>) -> Notebook {
    Notebook {
        nbformat: 4,
        nbformat_minor: 5,
        metadata: Map::new(),
        cells,
    }
}

/// Code cell with no tags, no outputs, and no execution count.
pub fn code_cell(source: &str) -> Cell {
    Cell::Code {
        source: source.to_string(),
        metadata: CellMetadata::default(),
        execution_count: None,
        outputs: Vec::new(),
        extra: Map::new(),
    }
}

/// Code cell carrying the given metadata tags.
pub fn tagged_code_cell(source: &str, tags: &[&str]) -> Cell {
    Cell::Code {
        source: source.to_string(),
        metadata: CellMetadata {
            tags: tags.iter().map(|t| (*t).to_string()).collect(),
            extra: Map::new(),
        },
        execution_count: None,
        outputs: Vec::new(),
        extra: Map::new(),
    }
}

/// Markdown cell with no tags.
pub fn markdown_cell(source: &str) -> Cell {
    Cell::Markdown {
        source: source.to_string(),
        metadata: CellMetadata::default(),
        extra: Map::new(),
    }
}

/// Write `nb` as `template.ipynb` under `dir`.
pub fn write_template(dir: &Path, nb: &Notebook) {
    write_notebook(&dir.join("template.ipynb"), nb).expect("write template");
}

/// Transformer that records invocations without touching the document.
#[derive(Default)]
pub struct RecordingTransformer {
    calls: AtomicUsize,
}

impl RecordingTransformer {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Transformer for RecordingTransformer {
    fn transform(&self, _notebook: &mut Notebook, _directives: &TransformSet) -> Result<usize> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(0)
    }
}

/// Scripted engine outcomes for driving runs without a kernel.
#[derive(Clone)]
pub enum ScriptedOutcome {
    /// Mark every code cell executed with a stream output.
    Complete,
    /// Fail with the given cell failure.
    CellFailure(CellFailure),
    /// Fail with an engine error message.
    EngineError(String),
}

/// Executor that replays a scripted outcome.
pub struct ScriptedExecutor {
    outcome: ScriptedOutcome,
}

impl ScriptedExecutor {
    pub fn new(outcome: ScriptedOutcome) -> Self {
        Self { outcome }
    }
}

impl Executor for ScriptedExecutor {
    fn execute(&self, notebook: &mut Notebook, _request: &ExecRequest) -> Result<(), ExecError> {
        match &self.outcome {
            ScriptedOutcome::Complete => {
                let mut count = 0;
                for cell in &mut notebook.cells {
                    if cell.outputs().is_none() {
                        continue;
                    }
                    count += 1;
                    cell.set_execution_count(Some(count));
                    if let Some(outputs) = cell.outputs_mut() {
                        outputs.push(json!({
                            "output_type": "stream",
                            "name": "stdout",
                            "text": "ok\n"
                        }));
                    }
                }
                Ok(())
            }
            ScriptedOutcome::CellFailure(failure) => Err(ExecError::Cell(failure.clone())),
            ScriptedOutcome::EngineError(message) => {
                Err(ExecError::Engine(anyhow!("{message}")))
            }
        }
    }
}

/// Traceback fixture with ANSI color escapes, ending in `Name: value` form.
pub fn colored_traceback() -> String {
    concat!(
        "\u{1b}[0;31m---------------------------------------\u{1b}[0m\n",
        "\u{1b}[0;31mZeroDivisionError\u{1b}[0m  Traceback (most recent call last)\n",
        "Cell \u{1b}[0;32mIn[1], line 1\u{1b}[0m\n",
        "\u{1b}[0;31mZeroDivisionError\u{1b}[0m: division by zero"
    )
    .to_string()
}

/// Cell failure carrying [`colored_traceback`].
pub fn division_failure() -> CellFailure {
    CellFailure {
        ename: "ZeroDivisionError".to_string(),
        evalue: "division by zero".to_string(),
        traceback: colored_traceback(),
    }
}
