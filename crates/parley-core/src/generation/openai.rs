//! OpenAI-compatible generation client

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use parley_traits::{GenerationClient, GenerationError, GenerationResult};

use super::http_client::build_http_client;
use crate::config::{ConfigError, GenerationConfig};

/// Single-shot chat completions client.
///
/// The whole prompt is sent as one user message. No retries; the request
/// timeout is the only time bound.
pub struct OpenAiGenerationClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl OpenAiGenerationClient {
    /// Create a client against the public OpenAI endpoint
    pub fn new(api_key: impl Into<String>, timeout: Duration) -> Result<Self, ConfigError> {
        let defaults = GenerationConfig::default();
        let client =
            build_http_client(timeout).map_err(|e| ConfigError::HttpClient(e.to_string()))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: defaults.model,
            base_url: defaults.base_url,
        })
    }

    /// Build a client from configuration, resolving the API key.
    pub fn from_config(config: &GenerationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let api_key = config.resolve_api_key().ok_or(ConfigError::MissingApiKey)?;
        Ok(Self::new(api_key, config.timeout())?
            .with_model(&config.model)
            .with_base_url(&config.base_url))
    }

    /// Set the model to use
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set custom base URL (for API-compatible services)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionResponseMessage,
}

#[derive(Deserialize)]
struct CompletionResponseMessage {
    content: Option<String>,
}

fn transport_error(error: reqwest::Error) -> GenerationError {
    if error.is_timeout() {
        GenerationError::Timeout
    } else {
        GenerationError::Network(error.to_string())
    }
}

#[async_trait]
impl GenerationClient for OpenAiGenerationClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        let body = CompletionRequest {
            model: &self.model,
            messages: vec![CompletionMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(transport_error)?;

        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), model = %self.model, "Generation rejected");
            return Err(GenerationError::Rejected {
                status: status.as_u16(),
                body: text,
            });
        }

        let data: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(GenerationError::EmptyReply)
    }
}
