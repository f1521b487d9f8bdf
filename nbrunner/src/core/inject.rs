//! Logging-cell injection.
//!
//! Cells tagged `logging` hold placeholder logging setup in templates; before
//! execution their source is replaced wholesale with boilerplate derived from
//! an explicit [`LogConfig`], so level and destination live in structured
//! fields rather than hand-edited cell text.

use tracing::debug;

use crate::notebook::Notebook;

/// Cell tag that marks a cell for logging-config injection.
pub const LOGGING_TAG: &str = "logging";

/// Level written into injected cells.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARNING",
            LogLevel::Error => "ERROR",
        }
    }
}

/// Logging configuration for executed notebooks.
///
/// The file path is interpolated verbatim into generated cell source; callers
/// own quoting of exotic paths (a path containing `"` would produce invalid
/// generated code).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LogConfig {
    pub level: LogLevel,
    pub file: String,
}

impl LogConfig {
    /// Config at the default `INFO` level.
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            level: LogLevel::Info,
            file: file.into(),
        }
    }

    /// Generated cell source: two lines, no indentation, no trailing newline.
    pub fn cell_source(&self) -> String {
        format!(
            "log.setLevel(\"{}\")\nlog.log_to_file(\"{}\")",
            self.level.as_str(),
            self.file
        )
    }
}

/// Replace the source of every `logging`-tagged cell with boilerplate from
/// `config`, leaving all other cells untouched. Returns the number of cells
/// rewritten.
pub fn inject_logging_cells(notebook: &mut Notebook, config: &LogConfig) -> usize {
    let source = config.cell_source();
    let mut injected = 0;
    for cell in &mut notebook.cells {
        if cell.has_tag(LOGGING_TAG) {
            cell.set_source(source.clone());
            injected += 1;
        }
    }
    debug!(injected, "logging-cell injection complete");
    injected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{code_cell, notebook, tagged_code_cell};

    #[test]
    fn replaces_tagged_cell_source_exactly() {
        let mut nb = notebook(vec![
            code_cell("x = 1"),
            tagged_code_cell("# placeholder", &[LOGGING_TAG]),
        ]);

        let injected = inject_logging_cells(&mut nb, &LogConfig::new("run.log"));

        assert_eq!(injected, 1);
        assert_eq!(nb.cells[0].source(), "x = 1");
        assert_eq!(
            nb.cells[1].source(),
            "log.setLevel(\"INFO\")\nlog.log_to_file(\"run.log\")"
        );
    }

    #[test]
    fn untagged_notebook_is_untouched() {
        let mut nb = notebook(vec![code_cell("a"), code_cell("b")]);
        let before = nb.clone();

        let injected = inject_logging_cells(&mut nb, &LogConfig::new("run.log"));

        assert_eq!(injected, 0);
        assert_eq!(nb, before);
    }

    #[test]
    fn level_is_rendered_into_boilerplate() {
        let config = LogConfig {
            level: LogLevel::Debug,
            file: "debug.log".to_string(),
        };
        assert_eq!(
            config.cell_source(),
            "log.setLevel(\"DEBUG\")\nlog.log_to_file(\"debug.log\")"
        );
    }

    #[test]
    fn every_tagged_cell_is_injected() {
        let mut nb = notebook(vec![
            tagged_code_cell("one", &[LOGGING_TAG]),
            code_cell("mid"),
            tagged_code_cell("two", &[LOGGING_TAG, "other"]),
        ]);

        let injected = inject_logging_cells(&mut nb, &LogConfig::new("run.log"));

        assert_eq!(injected, 2);
        assert_eq!(nb.cells[0].source(), nb.cells[2].source());
        assert_eq!(nb.cells[1].source(), "mid");
    }
}
