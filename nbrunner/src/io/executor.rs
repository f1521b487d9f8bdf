//! Execution-engine abstraction.
//!
//! The [`Executor`] trait decouples run orchestration from the engine that
//! actually drives a kernel (currently `jupyter nbconvert --execute`). Tests
//! use scripted executors that mutate the document without spawning
//! processes.

use std::path::PathBuf;
use std::process::Command;
use std::time::Duration;

use anyhow::{Context, anyhow};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::core::ansi::strip_colors;
use crate::io::process::run_command_with_timeout;
use crate::io::store::{load_notebook, write_notebook};
use crate::notebook::Notebook;

/// Parameters for an engine invocation.
#[derive(Debug, Clone)]
pub struct ExecRequest {
    /// Execution root: relative paths inside executed cells resolve here.
    pub workdir: PathBuf,
    /// Kernel override; `None` uses the notebook's own kernelspec.
    pub kernel_name: Option<String>,
    /// Engine argv prefix (e.g. `["jupyter","nbconvert"]`).
    pub command: Vec<String>,
    /// Maximum wall-clock time for the engine process.
    pub timeout: Duration,
    /// Bound on captured engine stdout/stderr bytes.
    pub output_limit_bytes: usize,
}

/// A cell raised during execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellFailure {
    pub ename: String,
    pub evalue: String,
    /// Full traceback text, possibly containing ANSI color escapes.
    pub traceback: String,
}

/// Engine invocation failure modes.
#[derive(Debug, Error)]
pub enum ExecError {
    /// A cell raised; execution stopped at that cell.
    #[error("cell execution failed: {}: {}", .0.ename, .0.evalue)]
    Cell(CellFailure),
    /// The engine itself failed (spawn error, timeout, unreadable result).
    #[error(transparent)]
    Engine(#[from] anyhow::Error),
}

/// Abstraction over notebook execution engines.
pub trait Executor {
    /// Execute all cells in order, mutating `notebook` with captured outputs.
    fn execute(&self, notebook: &mut Notebook, request: &ExecRequest) -> Result<(), ExecError>;
}

/// Executor that spawns `jupyter nbconvert --to notebook --execute`.
pub struct NbconvertExecutor;

impl Executor for NbconvertExecutor {
    #[instrument(skip_all, fields(workdir = %request.workdir.display(), timeout_secs = request.timeout.as_secs()))]
    fn execute(&self, notebook: &mut Notebook, request: &ExecRequest) -> Result<(), ExecError> {
        info!("starting engine execution");

        // The engine resolves the kernel working directory from the input
        // notebook's location, so the staged copy lives inside workdir. The
        // handle removes it on every exit path.
        let staged = tempfile::Builder::new()
            .prefix(".nbrunner-")
            .suffix(".ipynb")
            .tempfile_in(&request.workdir)
            .with_context(|| format!("stage notebook in {}", request.workdir.display()))?;
        write_notebook(staged.path(), notebook).context("write staged notebook")?;

        let scratch = tempfile::tempdir().context("create engine scratch dir")?;
        let executed_path = scratch.path().join("executed.ipynb");

        let mut parts = request.command.iter();
        let program = parts.next().ok_or_else(|| anyhow!("engine command is empty"))?;
        let mut cmd = Command::new(program);
        for part in parts {
            cmd.arg(part);
        }
        cmd.arg("--to")
            .arg("notebook")
            .arg("--execute")
            .arg("--output")
            .arg("executed.ipynb")
            .arg("--output-dir")
            .arg(scratch.path());
        if let Some(kernel) = &request.kernel_name {
            cmd.arg(format!("--ExecutePreprocessor.kernel_name={kernel}"));
        }
        cmd.arg(staged.path()).current_dir(&request.workdir);

        let output = run_command_with_timeout(cmd, request.timeout, request.output_limit_bytes)
            .context("run execution engine")?;

        if output.timed_out {
            warn!(
                timeout_secs = request.timeout.as_secs(),
                "engine timed out"
            );
            return Err(ExecError::Engine(anyhow!(
                "engine timed out after {:?}",
                request.timeout
            )));
        }
        if !output.status.success() {
            let stderr = output.stderr_text();
            if let Some(failure) = parse_cell_failure(&stderr) {
                warn!(ename = %failure.ename, "cell execution failed");
                return Err(ExecError::Cell(failure));
            }
            warn!(exit_code = ?output.status.code(), "engine failed");
            return Err(ExecError::Engine(anyhow!(
                "engine exited with status {:?}: {}",
                output.status.code(),
                stderr.trim_end()
            )));
        }

        if !executed_path.exists() {
            return Err(ExecError::Engine(anyhow!(
                "engine reported success but wrote no executed notebook"
            )));
        }
        *notebook = load_notebook(&executed_path).context("read executed notebook")?;

        debug!("engine execution completed");
        Ok(())
    }
}

/// Extract the cell traceback from engine stderr.
///
/// The engine reports a failing cell as a `CellExecutionError` whose message
/// embeds the kernel traceback; everything from that line onward is the
/// traceback. The final `Name: value` line yields ename/evalue.
fn parse_cell_failure(stderr: &str) -> Option<CellFailure> {
    let marker = stderr.find("CellExecutionError")?;
    let line_start = stderr[..marker].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let traceback = stderr[line_start..].trim_end().to_string();

    let stripped = strip_colors(&traceback);
    let last_line = stripped
        .lines()
        .rev()
        .find(|line| !line.trim().is_empty())
        .unwrap_or_default();
    let (ename, evalue) = match last_line.split_once(": ") {
        Some((name, value)) => (name.trim().to_string(), value.trim().to_string()),
        None => ("CellExecutionError".to_string(), last_line.trim().to_string()),
    };

    Some(CellFailure {
        ename,
        evalue,
        traceback,
    })
}
