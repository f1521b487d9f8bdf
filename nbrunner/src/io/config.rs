//! Runner configuration (TOML).

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::transform::TransformSet;

/// Runner configuration.
///
/// This file is intended to be edited by humans and must remain stable and
/// automatable. Missing fields default to sensible values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RunnerConfig {
    /// Wall-clock budget for the execution engine, in seconds.
    pub execute_timeout_secs: u64,

    /// Truncate captured engine stdout/stderr beyond this many bytes.
    pub engine_output_limit_bytes: usize,

    pub engine: EngineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    /// Engine argv prefix (e.g. `["jupyter","nbconvert"]`).
    pub command: Vec<String>,

    /// Kernel override; `None` executes with the notebook's own kernelspec.
    pub kernel_name: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            command: vec!["jupyter".to_string(), "nbconvert".to_string()],
            kernel_name: None,
        }
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            execute_timeout_secs: 30 * 60,
            engine_output_limit_bytes: 100_000,
            engine: EngineConfig::default(),
        }
    }
}

impl RunnerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.execute_timeout_secs == 0 {
            return Err(anyhow!("execute_timeout_secs must be > 0"));
        }
        if self.engine_output_limit_bytes == 0 {
            return Err(anyhow!("engine_output_limit_bytes must be > 0"));
        }
        if self.engine.command.is_empty() || self.engine.command[0].trim().is_empty() {
            return Err(anyhow!("engine.command must be a non-empty array"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `RunnerConfig::default()`.
pub fn load_config(path: &Path) -> Result<RunnerConfig> {
    if !path.exists() {
        let cfg = RunnerConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: RunnerConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}

/// Load substitution directives from a TOML file.
pub fn load_transform_set(path: &Path) -> Result<TransformSet> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read transform file {}", path.display()))?;
    let set: TransformSet = toml::from_str(&contents)
        .with_context(|| format!("parse transform file {}", path.display()))?;
    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, RunnerConfig::default());
    }

    #[test]
    fn parses_partial_config_with_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("nbrunner.toml");
        fs::write(
            &path,
            "execute_timeout_secs = 60\n\n[engine]\nkernel_name = \"python3\"\n",
        )
        .expect("write");

        let cfg = load_config(&path).expect("load");

        assert_eq!(cfg.execute_timeout_secs, 60);
        assert_eq!(cfg.engine.kernel_name.as_deref(), Some("python3"));
        assert_eq!(cfg.engine.command, vec!["jupyter", "nbconvert"]);
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let cfg = RunnerConfig {
            execute_timeout_secs: 0,
            ..RunnerConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn empty_engine_command_is_rejected() {
        let mut cfg = RunnerConfig::default();
        cfg.engine.command.clear();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn loads_transform_set() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("transform.toml");
        fs::write(
            &path,
            "[[substitutions]]\npattern = \"OLD\"\nreplacement = \"NEW\"\n",
        )
        .expect("write");

        let set = load_transform_set(&path).expect("load");

        assert_eq!(set.substitutions.len(), 1);
        assert_eq!(set.substitutions[0].pattern, "OLD");
        assert_eq!(set.substitutions[0].replacement, "NEW");
    }
}
