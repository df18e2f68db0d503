//! Chat and generation configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::context::PromptTemplate;

// Default configuration constants
const DEFAULT_WINDOW_SIZE: usize = 10;
const DEFAULT_HISTORY_LOAD_LIMIT: usize = 50;
const DEFAULT_HISTORY_REVIEW_LIMIT: usize = 200;
const DEFAULT_PREAMBLE: &str =
    "You are a helpful AI assistant. Continue this conversation naturally and helpfully.";
const DEFAULT_CLOSING_INSTRUCTION: &str =
    "Please provide a helpful, informative, and engaging response. Be natural and conversational.";
const DEFAULT_APOLOGY: &str =
    "Sorry, I'm having trouble responding right now. Please try again.";

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT_SECONDS: u64 = 60;
const MIN_TIMEOUT_SECONDS: u64 = 1;

/// Environment variable consulted when no API key is configured.
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("API key not found (set {API_KEY_ENV} or generation.api_key)")]
    MissingApiKey,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

/// Conversation behaviour settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChatConfig {
    /// Number of prior messages included as context.
    pub window_size: usize,
    /// Messages loaded when a session opens.
    pub history_load_limit: usize,
    /// Messages scanned when building the history review.
    pub history_review_limit: usize,
    pub preamble: String,
    pub closing_instruction: String,
    /// Text shown in place of a reply that could not be produced.
    pub apology: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            history_load_limit: DEFAULT_HISTORY_LOAD_LIMIT,
            history_review_limit: DEFAULT_HISTORY_REVIEW_LIMIT,
            preamble: DEFAULT_PREAMBLE.to_string(),
            closing_instruction: DEFAULT_CLOSING_INSTRUCTION.to_string(),
            apology: DEFAULT_APOLOGY.to_string(),
        }
    }
}

impl ChatConfig {
    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 {
            return Err(ConfigError::Invalid(
                "window_size must be at least 1".to_string(),
            ));
        }

        if self.history_load_limit == 0 {
            return Err(ConfigError::Invalid(
                "history_load_limit must be at least 1".to_string(),
            ));
        }

        if self.history_review_limit == 0 {
            return Err(ConfigError::Invalid(
                "history_review_limit must be at least 1".to_string(),
            ));
        }

        if self.apology.trim().is_empty() {
            return Err(ConfigError::Invalid("apology cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn prompt_template(&self) -> PromptTemplate {
        PromptTemplate::new(&self.preamble, &self.closing_instruction)
    }
}

/// Settings for the OpenAI-compatible generation backend
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct GenerationConfig {
    pub base_url: String,
    pub model: String,
    /// Falls back to `OPENAI_API_KEY` when unset.
    pub api_key: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: None,
            timeout_secs: DEFAULT_TIMEOUT_SECONDS,
        }
    }
}

impl GenerationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.timeout_secs < MIN_TIMEOUT_SECONDS {
            return Err(ConfigError::Invalid(format!(
                "timeout_secs must be at least {MIN_TIMEOUT_SECONDS}"
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::Invalid("model cannot be empty".to_string()));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "base_url must be an http(s) URL: {}",
                self.base_url
            )));
        }

        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Configured key, else the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .or_else(|| std::env::var(API_KEY_ENV).ok())
            .filter(|key| !key.trim().is_empty())
    }
}
