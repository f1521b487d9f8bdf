//! Notebook execution runner CLI.
//!
//! `run` loads a template notebook, optionally applies substitution
//! directives, injects logging configuration into `logging`-tagged cells,
//! executes through the configured engine, and writes the executed notebook
//! plus log/error artifacts. `validate` checks a notebook's structure.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use nbrunner::core::transform::SubstitutionTransformer;
use nbrunner::io::config::{load_config, load_transform_set};
use nbrunner::io::executor::NbconvertExecutor;
use nbrunner::io::store::load_notebook;
use nbrunner::logging;
use nbrunner::run::{RunRequest, run_notebook};

#[derive(Parser)]
#[command(name = "nbrunner", version, about = "Notebook execution runner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Execute a notebook template and write the executed document.
    Run {
        /// Template notebook to execute.
        #[arg(long)]
        template: PathBuf,
        /// Destination for the executed notebook.
        #[arg(long)]
        output: PathBuf,
        /// Log file configured inside `logging`-tagged cells.
        #[arg(long)]
        log_file: String,
        /// Destination for the traceback on cell failure.
        #[arg(long)]
        err_file: PathBuf,
        /// Execution root (defaults to the current directory).
        #[arg(long)]
        workdir: Option<PathBuf>,
        /// Keep ANSI color escapes in the written traceback.
        #[arg(long)]
        color_err: bool,
        /// TOML file with substitution directives.
        #[arg(long)]
        transform: Option<PathBuf>,
        /// Runner configuration file.
        #[arg(long, default_value = "nbrunner.toml")]
        config: PathBuf,
    },
    /// Load and structurally validate a notebook.
    Validate {
        /// Notebook to check.
        notebook: PathBuf,
    },
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    logging::init();
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            template,
            output,
            log_file,
            err_file,
            workdir,
            color_err,
            transform,
            config,
        } => cmd_run(
            template, output, log_file, err_file, workdir, color_err, transform, config,
        ),
        Command::Validate { notebook } => cmd_validate(&notebook),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_run(
    template: PathBuf,
    output: PathBuf,
    log_file: String,
    err_file: PathBuf,
    workdir: Option<PathBuf>,
    color_err: bool,
    transform: Option<PathBuf>,
    config_path: PathBuf,
) -> Result<()> {
    let config = load_config(&config_path)?;

    let mut request = RunRequest::new(template, output, log_file, err_file);
    if let Some(dir) = workdir {
        request.workdir = dir;
    }
    request.color_err = color_err;
    request.transformations = transform
        .as_deref()
        .map(load_transform_set)
        .transpose()
        .context("load transform directives")?;

    let report = run_notebook(
        &SubstitutionTransformer,
        &NbconvertExecutor,
        &config,
        &request,
    )?;
    println!(
        "executed notebook written to {} ({} substitutions, {} logging cells)",
        report.output_path.display(),
        report.substitutions,
        report.logging_cells
    );
    Ok(())
}

fn cmd_validate(path: &Path) -> Result<()> {
    let notebook = load_notebook(path)?;
    let code = notebook
        .cells
        .iter()
        .filter(|cell| cell.outputs().is_some())
        .count();
    println!(
        "{}: valid notebook, {} cells ({} code)",
        path.display(),
        notebook.cells.len(),
        code
    );
    Ok(())
}
