//! Configuration file handling

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::error::ValidationError;
use super::paths::config_path;
use super::Result;

/// Execution strategies the engine understands
pub const STRATEGIES: &[&str] = &["lazy", "eager"];

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Server settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Flags forwarded to the execution engine
    #[serde(default)]
    pub execution: ExecutionConfig,

    /// Failed-scenario bookkeeping
    #[serde(default)]
    pub rerun: RerunConfig,
}

/// Server settings
#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    /// How long a freshly connected client has to send its request
    #[serde(default = "default_client_timeout")]
    pub client_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            client_timeout_secs: default_client_timeout(),
        }
    }
}

fn default_client_timeout() -> u64 {
    300
}

/// Execution flags
#[derive(Debug, Clone, Deserialize)]
pub struct ExecutionConfig {
    /// Run specs in parallel streams
    #[serde(default)]
    pub parallel: bool,

    /// Number of parallel streams
    #[serde(default = "default_streams")]
    pub streams: usize,

    /// Spec distribution strategy for parallel runs
    #[serde(default = "default_strategy")]
    pub strategy: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            streams: default_streams(),
            strategy: default_strategy(),
        }
    }
}

fn default_streams() -> usize {
    4
}

fn default_strategy() -> String {
    "lazy".to_string()
}

impl ExecutionConfig {
    /// Check the flags before a run is admitted
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.parallel && self.streams == 0 {
            return Err(ValidationError::general(format!(
                "invalid number of parallel streams: {}",
                self.streams
            )));
        }
        if !STRATEGIES.contains(&self.strategy.as_str()) {
            return Err(ValidationError::general(format!(
                "invalid strategy '{}', expected one of: {}",
                self.strategy,
                STRATEGIES.join(", ")
            )));
        }
        Ok(())
    }
}

/// Rerun bookkeeping settings
#[derive(Debug, Clone, Deserialize)]
pub struct RerunConfig {
    /// Record failed scenarios after every run
    #[serde(default = "default_rerun_enabled")]
    pub enabled: bool,

    /// Where the failed scenarios are written
    #[serde(default = "default_failures_file")]
    pub failures_file: PathBuf,
}

impl Default for RerunConfig {
    fn default() -> Self {
        Self {
            enabled: default_rerun_enabled(),
            failures_file: default_failures_file(),
        }
    }
}

fn default_rerun_enabled() -> bool {
    true
}

fn default_failures_file() -> PathBuf {
    PathBuf::from(".execution").join("failures.json")
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        match config_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, or defaults if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path).map_err(|e| super::Error::FileRead {
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| super::Error::ConfigParse(e.to_string()))
    }
}
