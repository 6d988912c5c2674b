//! Concord configuration file handling
//!
//! Provides default configuration generation and loading for the operator
//! CLI. Configuration files are TOML and live under the platform data
//! directory unless `--config` points elsewhere.
//!
//! Only hosting concerns are configured here (where the ledger snapshot
//! lives, where events are appended, how loudly to log). Forum parameters
//! are ledger state and change only through polls.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Default log level
const DEFAULT_LOG_LEVEL: &str = "info";

/// Operator configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConcordConfig {
    /// Ledger snapshot configuration
    pub ledger: LedgerConfig,

    /// Event delivery configuration
    #[serde(default)]
    pub events: EventsConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Path to the CBOR ledger snapshot
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EventsConfig {
    /// JSON-lines file every published event is appended to (optional)
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl ConcordConfig {
    /// Create a new configuration with the given ledger path
    pub fn new(ledger_path: PathBuf) -> Self {
        Self {
            ledger: LedgerConfig { path: ledger_path },
            events: EventsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path).map_err(|e| {
            format!(
                "Failed to read config file '{}': {} (run `concord init` first)",
                path.display(),
                e
            )
        })?;

        let config: ConcordConfig = toml::from_str(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path.display(), e))?;

        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(path, contents)
            .map_err(|e| format!("Failed to write config file '{}': {}", path.display(), e))?;

        Ok(())
    }

    /// Generate default configuration content as a string with comments
    pub fn generate_default_toml(ledger_path: &Path) -> String {
        format!(
            r#"# Concord Configuration (Operator Settings)
#
# Hosting settings only. Forum names, descriptions and membership are
# ledger state and change only through polls.

[ledger]
# CBOR snapshot holding every forum, registry, poll and ballot
path = "{ledger_path}"

[events]
# Append every published event as one JSON object per line (optional)
# log_path = "/var/lib/concord/events.jsonl"

[logging]
# Log level: trace, debug, info, warn, error
# RUST_LOG overrides this when set
level = "info"
"#,
            ledger_path = ledger_path.display()
        )
    }

    /// Create and save a default configuration file
    pub fn create_default(
        config_path: &Path,
        ledger_path: &Path,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let contents = Self::generate_default_toml(ledger_path);

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        fs::write(config_path, contents).map_err(|e| {
            format!(
                "Failed to write config file '{}': {}",
                config_path.display(),
                e
            )
        })?;

        Ok(())
    }
}

/// Base directory for Concord's files: `<data_dir>/concord`
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("concord")
}

/// Get the default config file path
pub fn default_config_path() -> PathBuf {
    default_data_dir().join("config.toml")
}

/// Get the default ledger path for a config file
///
/// The ledger is stored next to its config:
/// - Config: ~/.local/share/concord/config.toml
/// - Ledger: ~/.local/share/concord/ledger.cbor
pub fn default_ledger_path(config_path: &Path) -> PathBuf {
    config_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("ledger.cbor")
}
