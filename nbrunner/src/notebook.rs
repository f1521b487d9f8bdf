//! In-memory notebook document model (nbformat 4.x).
//!
//! Cells are tagged by `cell_type` the way the JSON encodes them. Unknown
//! fields at notebook, cell, and metadata level land in flattened maps so a
//! load -> mutate -> write round trip never drops content this crate does
//! not model. Source text accepts both the single-string and line-array
//! encodings on load and is written back as a single string (both are valid
//! nbformat encodings).

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// A notebook document: format version, metadata, and an ordered cell list.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Notebook {
    pub nbformat: u64,
    pub nbformat_minor: u64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default)]
    pub cells: Vec<Cell>,
}

/// A single notebook cell.
///
/// Only code cells carry `execution_count` and `outputs`; keeping the
/// variants separate means a written markdown cell never grows keys the
/// format forbids, and a written code cell always carries the keys it
/// requires.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cell_type", rename_all = "snake_case")]
pub enum Cell {
    Code {
        #[serde(default, deserialize_with = "multiline")]
        source: String,
        #[serde(default)]
        metadata: CellMetadata,
        #[serde(default)]
        execution_count: Option<i64>,
        #[serde(default)]
        outputs: Vec<Value>,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Markdown {
        #[serde(default, deserialize_with = "multiline")]
        source: String,
        #[serde(default)]
        metadata: CellMetadata,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
    Raw {
        #[serde(default, deserialize_with = "multiline")]
        source: String,
        #[serde(default)]
        metadata: CellMetadata,
        #[serde(flatten)]
        extra: Map<String, Value>,
    },
}

/// Cell metadata: an optional tag list plus whatever else the document carries.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct CellMetadata {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Cell {
    pub fn source(&self) -> &str {
        match self {
            Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                source
            }
        }
    }

    pub fn set_source(&mut self, new_source: impl Into<String>) {
        match self {
            Cell::Code { source, .. } | Cell::Markdown { source, .. } | Cell::Raw { source, .. } => {
                *source = new_source.into();
            }
        }
    }

    pub fn metadata(&self) -> &CellMetadata {
        match self {
            Cell::Code { metadata, .. }
            | Cell::Markdown { metadata, .. }
            | Cell::Raw { metadata, .. } => metadata,
        }
    }

    /// Whether the cell's metadata tag list contains `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata().tags.iter().any(|t| t == tag)
    }

    /// Captured outputs; `None` for non-code cells.
    pub fn outputs(&self) -> Option<&[Value]> {
        match self {
            Cell::Code { outputs, .. } => Some(outputs),
            _ => None,
        }
    }

    /// Mutable outputs; `None` for non-code cells.
    pub fn outputs_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Cell::Code { outputs, .. } => Some(outputs),
            _ => None,
        }
    }

    pub fn set_execution_count(&mut self, count: Option<i64>) {
        if let Cell::Code {
            execution_count, ..
        } = self
        {
            *execution_count = count;
        }
    }
}

/// Accept nbformat's two source encodings: a single string or a line array.
fn multiline<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Multiline {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(match Multiline::deserialize(deserializer)? {
        Multiline::Text(text) => text,
        Multiline::Lines(lines) => lines.concat(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_notebook() {
        let raw = r##"{
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {"kernelspec": {"name": "python3", "display_name": "Python 3"}},
            "cells": [
                {
                    "id": "cell-1",
                    "cell_type": "markdown",
                    "metadata": {},
                    "source": ["# Title\n", "Body."]
                },
                {
                    "id": "cell-2",
                    "cell_type": "code",
                    "metadata": {"tags": ["logging"]},
                    "execution_count": null,
                    "source": "print(\"hi\")",
                    "outputs": []
                }
            ]
        }"##;

        let notebook: Notebook = serde_json::from_str(raw).expect("parse");
        assert_eq!(notebook.cells.len(), 2);
        assert_eq!(notebook.cells[0].source(), "# Title\nBody.");
        assert_eq!(notebook.cells[1].source(), "print(\"hi\")");
        assert!(notebook.cells[1].has_tag("logging"));
        assert!(!notebook.cells[0].has_tag("logging"));
    }

    #[test]
    fn round_trip_preserves_unknown_fields() {
        let raw = r#"{
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {"language_info": {"name": "python"}},
            "cells": [
                {
                    "id": "abc",
                    "cell_type": "code",
                    "metadata": {"collapsed": true, "tags": ["keep"]},
                    "execution_count": 3,
                    "source": "x = 1",
                    "outputs": [{"output_type": "stream", "name": "stdout", "text": "ok"}],
                    "attachments": {}
                }
            ]
        }"#;

        let notebook: Notebook = serde_json::from_str(raw).expect("parse");
        let written = serde_json::to_value(&notebook).expect("serialize");

        let cell = &written["cells"][0];
        assert_eq!(cell["id"], "abc");
        assert_eq!(cell["attachments"], serde_json::json!({}));
        assert_eq!(cell["metadata"]["collapsed"], true);
        assert_eq!(cell["execution_count"], 3);
        assert_eq!(cell["outputs"][0]["name"], "stdout");
        assert_eq!(written["metadata"]["language_info"]["name"], "python");
    }

    #[test]
    fn markdown_cells_do_not_gain_code_keys() {
        let raw = r#"{
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [{"cell_type": "markdown", "metadata": {}, "source": "text"}]
        }"#;

        let notebook: Notebook = serde_json::from_str(raw).expect("parse");
        let written = serde_json::to_value(&notebook).expect("serialize");
        let cell = written["cells"][0].as_object().expect("cell object");
        assert!(!cell.contains_key("outputs"));
        assert!(!cell.contains_key("execution_count"));
    }

    #[test]
    fn code_cells_always_carry_required_keys() {
        let raw = r#"{
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [{"cell_type": "code", "metadata": {}, "source": "x", "execution_count": null, "outputs": []}]
        }"#;

        let notebook: Notebook = serde_json::from_str(raw).expect("parse");
        let written = serde_json::to_value(&notebook).expect("serialize");
        let cell = written["cells"][0].as_object().expect("cell object");
        assert!(cell.contains_key("outputs"));
        assert!(cell.contains_key("execution_count"));
        assert_eq!(cell["execution_count"], Value::Null);
    }

    #[test]
    fn set_source_applies_to_any_cell_type() {
        let raw = r#"{
            "nbformat": 4,
            "nbformat_minor": 5,
            "metadata": {},
            "cells": [{"cell_type": "raw", "metadata": {}, "source": "before"}]
        }"#;

        let mut notebook: Notebook = serde_json::from_str(raw).expect("parse");
        notebook.cells[0].set_source("after");
        assert_eq!(notebook.cells[0].source(), "after");
    }
}
