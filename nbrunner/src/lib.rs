//! Notebook execution runner.
//!
//! Loads a notebook template, optionally rewrites cells through a
//! substitution transformer, injects logging configuration into
//! `logging`-tagged cells, executes the document through an external
//! execution engine, and writes the executed notebook plus separate
//! log/error artifacts. The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure document transformations (substitution, logging
//!   injection, ANSI stripping). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (notebook store, configuration,
//!   engine processes). Trait seams enable scripted fakes in tests.
//!
//! The [`run`] module coordinates core logic with I/O to implement the
//! `run` CLI command.

pub mod core;
pub mod io;
pub mod logging;
pub mod notebook;
pub mod run;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
