//! Notebook load/save helpers with structural schema validation.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use jsonschema::validator_for;
use serde_json::Value;

use crate::notebook::Notebook;

const NOTEBOOK_SCHEMA: &str = include_str!("../../schemas/nbformat_v4.schema.json");

/// Load a notebook from disk, validating structure before deserializing.
///
/// Validation is structural only (format version, cell shape); semantic
/// checks belong to the execution engine.
pub fn load_notebook(path: &Path) -> Result<Notebook> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read notebook {}", path.display()))?;
    let value: Value = serde_json::from_str(&contents)
        .with_context(|| format!("parse notebook {}", path.display()))?;
    validate_schema(&value)
        .with_context(|| format!("validate notebook {}", path.display()))?;
    let notebook: Notebook = serde_json::from_value(value)
        .with_context(|| format!("deserialize notebook {}", path.display()))?;
    Ok(notebook)
}

/// Write a notebook as pretty-printed JSON with a trailing newline,
/// creating parent directories as needed. Overwrites unconditionally.
pub fn write_notebook(path: &Path, notebook: &Notebook) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("create notebook dir {}", parent.display()))?;
    }
    let mut buf = serde_json::to_string_pretty(notebook).context("serialize notebook")?;
    buf.push('\n');
    fs::write(path, buf).with_context(|| format!("write notebook {}", path.display()))
}

fn validate_schema(notebook: &Value) -> Result<()> {
    let schema_value: Value =
        serde_json::from_str(NOTEBOOK_SCHEMA).context("parse embedded notebook schema")?;
    let compiled =
        validator_for(&schema_value).map_err(|err| anyhow!("invalid schema: {}", err))?;
    if !compiled.is_valid(notebook) {
        let messages = compiled
            .iter_errors(notebook)
            .map(|err| err.to_string())
            .collect::<Vec<_>>();
        return Err(anyhow!(
            "notebook schema validation failed: {}",
            messages.join("; ")
        ));
    }
    Ok(())
}
