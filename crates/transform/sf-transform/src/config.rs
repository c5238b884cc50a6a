//! Configuration types for the script filter.

use serde::{Deserialize, Serialize};
use sf_error::{Result, SfError};
use std::path::PathBuf;

/// Configuration for a script filter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    /// Inline Rhai source (mutually exclusive with script_file).
    ///
    /// The source is the body of `fn process(record) { ... }` and must
    /// evaluate to the record map.
    #[serde(default)]
    pub script: Option<String>,

    /// Path to a file holding the Rhai source.
    #[serde(default)]
    pub script_file: Option<PathBuf>,

    /// Sandbox limits for the script engine.
    #[serde(default)]
    pub limits: EngineLimits,
}

impl TransformConfig {
    /// Creates a new config with an inline script.
    pub fn with_script(script: impl Into<String>) -> Self {
        Self {
            script: Some(script.into()),
            ..Self::default()
        }
    }

    /// Creates a new config with a script file path.
    pub fn with_script_file(path: impl Into<PathBuf>) -> Self {
        Self {
            script_file: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the engine limits.
    pub fn with_limits(mut self, limits: EngineLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Returns the inline script, failing if none or both sources are set.
    pub fn inline_script(&self) -> Result<&str> {
        match (&self.script, &self.script_file) {
            (Some(script), None) => Ok(script.as_str()),
            (None, Some(path)) => Err(SfError::Config(format!(
                "script_file '{}' must be loaded before use",
                path.display()
            ))),
            (Some(_), Some(_)) => Err(SfError::Config(
                "script and script_file are mutually exclusive".to_string(),
            )),
            (None, None) => Err(SfError::Config("no script provided".to_string())),
        }
    }

    /// Resolves the script source, reading `script_file` if that is the source.
    pub async fn load_script(&self) -> Result<String> {
        match (&self.script, &self.script_file) {
            (None, Some(path)) => tokio::fs::read_to_string(path).await.map_err(|e| {
                SfError::Config(format!("failed to read {}: {e}", path.display()))
            }),
            _ => self.inline_script().map(str::to_string),
        }
    }
}

/// Sandbox limits applied to the Rhai engine.
///
/// `max_operations` is off by default: a runaway script blocks the stage
/// rather than failing on an arbitrary budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineLimits {
    pub max_expr_depth: usize,
    pub max_function_expr_depth: usize,
    pub max_call_levels: usize,
    pub max_string_size: usize,
    pub max_array_size: usize,
    pub max_map_size: usize,
    /// Operation budget per invocation. `None` means unlimited.
    pub max_operations: Option<u64>,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_expr_depth: 64,
            max_function_expr_depth: 64,
            max_call_levels: 16,
            max_string_size: 1_000_000,
            max_array_size: 10_000,
            max_map_size: 10_000,
            max_operations: None,
        }
    }
}

impl EngineLimits {
    /// Sets the per-invocation operation budget.
    pub fn with_max_operations(mut self, max_operations: u64) -> Self {
        self.max_operations = Some(max_operations);
        self
    }
}
