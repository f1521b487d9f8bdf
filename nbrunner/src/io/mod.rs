//! Side-effecting operations: filesystem, configuration, engine processes.

pub mod config;
pub mod executor;
pub mod process;
pub mod store;
