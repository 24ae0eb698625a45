//! Configuration management for Dripcast

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub queue: QueueConfig,
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub path: String,
    #[serde(default)]
    pub format: QueueFormat,
}

/// Loader strategy for the queue file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueFormat {
    /// One item per non-blank line
    #[default]
    Lines,
    /// Items separated by blank lines
    Blocks,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    #[serde(default)]
    pub mode: SelectionMode,
    /// Fixed offset for the slot clock, minutes east of UTC.
    /// Never the host's local zone: slot boundaries must be identical
    /// across deployment environments.
    #[serde(default = "default_utc_offset_minutes")]
    pub utc_offset_minutes: i32,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            mode: SelectionMode::default(),
            utc_offset_minutes: default_utc_offset_minutes(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectionMode {
    #[default]
    Sequential,
    Slot,
}

fn default_utc_offset_minutes() -> i32 {
    330 // UTC+5:30
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PublisherConfig {
    /// Publisher command argv. The candidate text is piped on stdin and the
    /// external id is read from stdout. Exit 0 success, 2 duplicate,
    /// 3 rate limited, anything else transient.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// In-run attempts for transient publish failures
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Whether rate-limit responses also participate in the in-run retry
    /// loop. Off by default: the scheduler's next slot is the retry.
    #[serde(default)]
    pub retry_rate_limited: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            retry_rate_limited: false,
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from the default location, falling back to the
    /// built-in defaults when no config file exists yet
    pub fn load_or_default() -> Result<Self> {
        let config_path = resolve_config_path()?;
        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Ok(Self::default_config())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            queue: QueueConfig {
                path: "~/.local/share/dripcast/queue.txt".to_string(),
                format: QueueFormat::Lines,
            },
            ledger: LedgerConfig {
                path: "~/.local/share/dripcast/ledger.txt".to_string(),
            },
            selector: SelectorConfig::default(),
            publisher: PublisherConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("DRIPCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("dripcast").join("config.toml"))
}

/// Expand `~` in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}
