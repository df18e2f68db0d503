//! CLI configuration file support
//!
//! Loads configuration from ~/.config/parley/config.toml

use parley_core::{ChatConfig, GenerationConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternative config file.
const CONFIG_PATH_ENV: &str = "PARLEY_CONFIG";

/// CLI configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CliConfig {
    /// Default settings
    #[serde(default)]
    pub default: DefaultConfig,
    /// Conversation behaviour
    #[serde(default)]
    pub chat: ChatConfig,
    /// Generation backend
    #[serde(default)]
    pub generation: GenerationConfig,
}

/// Default configuration values
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultConfig {
    /// Default database path
    pub db_path: Option<String>,
    /// Always chat with the local echo backend
    #[serde(default)]
    pub offline: bool,
}

impl CliConfig {
    /// Load configuration from default path
    pub fn load() -> Self {
        Self::load_from_path(Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: Option<PathBuf>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content, &path),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to read config, using defaults");
                Self::default()
            }
        }
    }

    fn parse(content: &str, path: &Path) -> Self {
        match toml::from_str(content) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Get the configuration file path
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_PATH_ENV)
            && !path.trim().is_empty()
        {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|p| p.join("parley").join("config.toml"))
    }
}
