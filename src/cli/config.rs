//! Custos configuration file handling.
//!
//! Operator-facing settings only: logging, snapshot location, and the
//! engine policy knobs that are explicitly an operator choice
//! (early-reject, cancel overrides). Registry membership and threshold are
//! NOT configured here; they are fixed per vault when the registry is
//! sealed.

use custos::authz::{EngineConfig, MemberId};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Operator configuration for the custos CLI.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CustosConfig {
    /// Engine policy knobs
    #[serde(default)]
    pub vault: VaultPolicyConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Snapshot persistence
    #[serde(default)]
    pub store: StoreConfig,
}

/// Engine policy configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VaultPolicyConfig {
    /// Reject a proposal once the threshold is mathematically unreachable
    #[serde(default)]
    pub early_reject: bool,

    /// Member identities allowed to cancel proposals they did not create
    #[serde(default)]
    pub cancel_overrides: Vec<String>,
}

impl VaultPolicyConfig {
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            early_reject: self.early_reject,
            cancel_overrides: self
                .cancel_overrides
                .iter()
                .cloned()
                .map(MemberId)
                .collect(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log file path (optional, logs to stderr if not specified)
    pub file: Option<PathBuf>,
}

/// Snapshot persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Default snapshot path (overridable with --snapshot)
    pub snapshot_path: Option<PathBuf>,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            file: None,
        }
    }
}

/// Default config location: `<data dir>/custos/config.toml`.
pub fn default_config_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("custos")
        .join("config.toml")
}

impl CustosConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        let config: CustosConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Write a default configuration file, creating parent directories.
    pub fn create_default(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let config = CustosConfig::default();
        fs::write(path, toml::to_string_pretty(&config)?)?;
        Ok(())
    }

    /// Load from `path` if given, else from the default location,
    /// generating a default file there when missing.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        match path {
            Some(path) => Self::load(path),
            None => {
                let path = default_config_path();
                if !path.exists() {
                    Self::create_default(&path)?;
                }
                Self::load(&path)
            }
        }
    }
}
