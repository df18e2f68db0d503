//! CLI setup module
//!
//! Handles initialization of the Parley core and the generation backend.

use anyhow::Result;
use parley_core::generation::{OpenAiGenerationClient, ScriptedGenerationClient};
use parley_core::{ParleyCore, paths};
use parley_traits::GenerationClient;
use std::sync::Arc;

use crate::config::CliConfig;

const OFFLINE_MODEL: &str = "offline-echo";

/// Build the embedded Parley core
pub async fn prepare_core(db_path: Option<String>, config: &CliConfig) -> Result<Arc<ParleyCore>> {
    let db_path = match db_path {
        Some(path) => path,
        None => paths::ensure_database_path_string()?,
    };
    Ok(Arc::new(ParleyCore::new(&db_path, config.chat.clone()).await?))
}

/// Pick the generation backend for a chat session.
pub fn build_generator(config: &CliConfig, offline: bool) -> Result<Arc<dyn GenerationClient>> {
    if offline {
        tracing::info!("Using offline echo backend");
        return Ok(Arc::new(ScriptedGenerationClient::new(OFFLINE_MODEL)));
    }

    let client = OpenAiGenerationClient::from_config(&config.generation)?;
    tracing::info!(model = %client.model(), "Using OpenAI-compatible backend");
    Ok(Arc::new(client))
}
