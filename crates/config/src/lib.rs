//! Pipeline configuration — which stages run, in what order, on what input.
//!
//! Loaded once at startup from YAML (or the built-in default) and treated as
//! read-only afterwards. Everything downstream borrows it.
//!
//! ```yaml
//! capture_limit: 1024
//! seed: |
//!   info: everything is working
//!   error: something went wrong
//! stages:
//!   - label: Read input
//!     command: cat
//!   - command: grep error
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default number of bytes retained from a stage's output
/// (one slot is reserved, so at most `capture_limit - 1` bytes survive).
pub const DEFAULT_CAPTURE_LIMIT: usize = 1024;

/// Smallest capture limit that can still hold one byte of output.
pub const MIN_CAPTURE_LIMIT: usize = 2;

/// Seed payload used when the config does not provide one.
pub const DEFAULT_SEED: &str = "info: everything is working\n\
error: something went wrong\n\
info: process completed\n\
error: disk full\n\
warning: low memory\n";

/// Errors from loading or validating a pipeline config.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("pipeline has no stages")]
    NoStages,

    #[error("stage {index} has an empty command")]
    EmptyCommand { index: usize },

    #[error("capture_limit must be at least 2, got {0}")]
    CaptureLimitTooSmall(usize),
}

/// One configured stage. `label` falls back to the command text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub command: String,
}

impl StageConfig {
    pub fn new(label: &str, command: &str) -> Self {
        Self {
            label: Some(label.to_string()),
            command: command.to_string(),
        }
    }

    /// Display label, defaulting to the command itself.
    pub fn label(&self) -> &str {
        match self.label.as_deref() {
            Some(l) if !l.trim().is_empty() => l,
            _ => self.command.trim(),
        }
    }
}

/// The whole pipeline definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default = "default_capture_limit")]
    pub capture_limit: usize,

    #[serde(default = "default_seed")]
    pub seed: String,

    /// Hand stage input over through this file instead of a stdin pipe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging_file: Option<PathBuf>,

    pub stages: Vec<StageConfig>,
}

fn default_capture_limit() -> usize {
    DEFAULT_CAPTURE_LIMIT
}

fn default_seed() -> String {
    DEFAULT_SEED.to_string()
}

impl Default for PipelineConfig {
    /// The classic log-triage pipeline: `cat | grep error | sort | uniq -c`.
    fn default() -> Self {
        Self {
            capture_limit: DEFAULT_CAPTURE_LIMIT,
            seed: DEFAULT_SEED.to_string(),
            staging_file: None,
            stages: vec![
                StageConfig::new("Read input", "cat"),
                StageConfig::new("Keep errors", "grep error"),
                StageConfig::new("Sort lines", "sort"),
                StageConfig::new("Count duplicates", "uniq -c"),
            ],
        }
    }
}

impl PipelineConfig {
    /// Parse a config from YAML text. Does not validate.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a config file, then validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the invariants the runner relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture_limit < MIN_CAPTURE_LIMIT {
            return Err(ConfigError::CaptureLimitTooSmall(self.capture_limit));
        }
        if self.stages.is_empty() {
            return Err(ConfigError::NoStages);
        }
        if let Some(index) = self.stages.iter().position(|s| s.command.trim().is_empty()) {
            return Err(ConfigError::EmptyCommand { index });
        }
        Ok(())
    }
}
