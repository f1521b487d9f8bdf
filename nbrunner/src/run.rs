//! Orchestration for a single notebook run.
//!
//! `run_notebook` composes the four delegated steps: load, optional cell
//! transformation, logging-cell injection, and engine execution. The executed
//! document is persisted on every exit path of the execution phase; failures
//! before execution begins leave no artifacts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::core::ansi::strip_colors;
use crate::core::inject::{LogConfig, inject_logging_cells};
use crate::core::transform::{TransformSet, Transformer};
use crate::io::config::RunnerConfig;
use crate::io::executor::{CellFailure, ExecError, ExecRequest, Executor};
use crate::io::store::{load_notebook, write_notebook};
use crate::notebook::Notebook;

/// Inputs for one notebook run.
#[derive(Debug, Clone)]
pub struct RunRequest {
    /// Template notebook to execute.
    pub template_path: PathBuf,
    /// Destination for the executed notebook; overwritten unconditionally.
    pub output_path: PathBuf,
    /// Logging configuration injected into `logging`-tagged cells.
    pub log: LogConfig,
    /// Destination for the traceback, written only on cell failure.
    pub err_path: PathBuf,
    /// Execution root for relative paths inside cells.
    pub workdir: PathBuf,
    /// Keep ANSI color escapes in the written traceback.
    pub color_err: bool,
    /// Substitution directives; `None` skips the transformer entirely.
    pub transformations: Option<TransformSet>,
}

impl RunRequest {
    /// Request with defaults: workdir is the current directory, tracebacks
    /// are color-stripped, no transformations.
    pub fn new(
        template_path: impl Into<PathBuf>,
        output_path: impl Into<PathBuf>,
        log_file: impl Into<String>,
        err_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            template_path: template_path.into(),
            output_path: output_path.into(),
            log: LogConfig::new(log_file),
            err_path: err_path.into(),
            workdir: PathBuf::from("."),
            color_err: false,
            transformations: None,
        }
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Where the executed notebook landed.
    pub output_path: PathBuf,
    /// Substitutions applied by the transformer (0 when skipped). Advisory.
    pub substitutions: usize,
    /// Cells rewritten by the logging injector.
    pub logging_cells: usize,
}

/// Failure taxonomy for [`run_notebook`].
///
/// `Execution` is the only variant produced after failure artifacts land on
/// disk: it confirms the traceback file and the partially executed notebook
/// were both written before the error returned, letting the caller decide on
/// propagation.
#[derive(Debug, Error)]
pub enum RunError {
    /// Template unreadable, malformed, or structurally invalid.
    #[error("load notebook {}", path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
    /// Transformer failure; no artifacts are written.
    #[error("transform notebook")]
    Transform(#[source] anyhow::Error),
    /// A cell raised; both failure artifacts were written first.
    #[error("cell execution failed: {}: {}", failure.ename, failure.evalue)]
    Execution {
        failure: CellFailure,
        /// Traceback artifact, already written.
        error_file: PathBuf,
        /// Partially executed notebook, already written.
        notebook: PathBuf,
    },
    /// The engine failed outright; the notebook artifact was still written,
    /// no error file is produced.
    #[error("execution engine failed")]
    Engine(#[source] anyhow::Error),
    /// An artifact write itself failed.
    #[error("write artifact {}", path.display())]
    Artifact {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

/// Load, transform, inject, execute, and persist a notebook.
///
/// On a cell failure the traceback (color-stripped unless `color_err`) goes
/// to `err_path`, the partially executed document goes to `output_path`, and
/// the failure returns as [`RunError::Execution`]. Engine failures persist
/// the document but produce no error file. Load and transform failures
/// return before any artifact is written.
#[instrument(skip_all, fields(template = %request.template_path.display()))]
pub fn run_notebook<T: Transformer, E: Executor>(
    transformer: &T,
    executor: &E,
    config: &RunnerConfig,
    request: &RunRequest,
) -> Result<RunReport, RunError> {
    let mut notebook =
        load_notebook(&request.template_path).map_err(|source| RunError::Load {
            path: request.template_path.clone(),
            source,
        })?;

    let substitutions = match &request.transformations {
        Some(directives) => transformer
            .transform(&mut notebook, directives)
            .map_err(RunError::Transform)?,
        None => 0,
    };

    let logging_cells = inject_logging_cells(&mut notebook, &request.log);

    let exec_request = ExecRequest {
        workdir: request.workdir.clone(),
        kernel_name: config.engine.kernel_name.clone(),
        command: config.engine.command.clone(),
        timeout: Duration::from_secs(config.execute_timeout_secs),
        output_limit_bytes: config.engine_output_limit_bytes,
    };

    match executor.execute(&mut notebook, &exec_request) {
        Ok(()) => {
            persist_notebook(&request.output_path, &notebook)?;
            info!(substitutions, logging_cells, "notebook run completed");
            Ok(RunReport {
                output_path: request.output_path.clone(),
                substitutions,
                logging_cells,
            })
        }
        Err(ExecError::Cell(failure)) => {
            warn!(ename = %failure.ename, "cell execution failed, writing artifacts");
            // Attempt both artifacts before reporting anything, so a failed
            // traceback write cannot block the notebook write (or vice versa).
            let traceback_written =
                write_traceback(&request.err_path, &failure.traceback, request.color_err);
            let notebook_written = persist_notebook(&request.output_path, &notebook);
            traceback_written?;
            notebook_written?;
            Err(RunError::Execution {
                failure,
                error_file: request.err_path.clone(),
                notebook: request.output_path.clone(),
            })
        }
        Err(ExecError::Engine(source)) => {
            persist_notebook(&request.output_path, &notebook)?;
            Err(RunError::Engine(source))
        }
    }
}

fn persist_notebook(path: &Path, notebook: &Notebook) -> Result<(), RunError> {
    write_notebook(path, notebook).map_err(|source| RunError::Artifact {
        path: path.to_path_buf(),
        source,
    })
}

fn write_traceback(path: &Path, traceback: &str, color: bool) -> Result<(), RunError> {
    let text = if color {
        traceback.to_string()
    } else {
        strip_colors(traceback)
    };
    fs::write(path, text).map_err(|source| RunError::Artifact {
        path: path.to_path_buf(),
        source: source.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::{SubstitutionTransformer, Substitution};
    use crate::test_support::{ScriptedExecutor, ScriptedOutcome, code_cell, notebook, write_template};

    fn request_in(dir: &Path) -> RunRequest {
        let mut request = RunRequest::new(
            dir.join("template.ipynb"),
            dir.join("out.ipynb"),
            dir.join("run.log").display().to_string(),
            dir.join("err.txt"),
        );
        request.workdir = dir.to_path_buf();
        request
    }

    #[test]
    fn load_failure_leaves_no_artifacts() {
        let temp = tempfile::tempdir().expect("tempdir");
        let request = request_in(temp.path());

        let err = run_notebook(
            &SubstitutionTransformer,
            &ScriptedExecutor::new(ScriptedOutcome::Complete),
            &RunnerConfig::default(),
            &request,
        )
        .expect_err("missing template");

        assert!(matches!(err, RunError::Load { .. }));
        assert!(!request.output_path.exists());
        assert!(!request.err_path.exists());
    }

    #[test]
    fn transform_failure_writes_no_output_notebook() {
        let temp = tempfile::tempdir().expect("tempdir");
        write_template(temp.path(), &notebook(vec![code_cell("x = 1")]));

        let mut request = request_in(temp.path());
        request.transformations = Some(TransformSet {
            substitutions: vec![Substitution {
                pattern: "(broken".to_string(),
                replacement: String::new(),
            }],
        });

        let err = run_notebook(
            &SubstitutionTransformer,
            &ScriptedExecutor::new(ScriptedOutcome::Complete),
            &RunnerConfig::default(),
            &request,
        )
        .expect_err("bad pattern");

        assert!(matches!(err, RunError::Transform(_)));
        assert!(!request.output_path.exists());
    }
}
