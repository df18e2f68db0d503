pub mod config;
pub mod context;
pub mod generation;
pub mod history;
pub mod models;
pub mod paths;
pub mod session;
pub mod storage;

pub use config::{ChatConfig, ConfigError, GenerationConfig};
pub use history::HistoryService;
pub use models::*;
pub use session::{ConversationSession, SessionError};

use parley_traits::{GenerationClient, MessageStore};
use std::sync::Arc;
use storage::Storage;
use tracing::info;

/// Core application state shared by the CLI commands
///
/// Owns the message database and the chat settings; sessions and the
/// history service are built from it on demand.
pub struct ParleyCore {
    pub storage: Arc<Storage>,
    pub config: ChatConfig,
}

impl ParleyCore {
    pub async fn new(db_path: &str, config: ChatConfig) -> anyhow::Result<Self> {
        config.validate()?;
        let storage = Arc::new(Storage::new(db_path)?);

        info!(db_path, "Initializing Parley");

        Ok(Self { storage, config })
    }

    pub fn message_store(&self) -> Arc<dyn MessageStore> {
        Arc::new(self.storage.messages.clone())
    }

    /// Open a session for a brand new conversation.
    pub fn start_session(&self, generator: Arc<dyn GenerationClient>) -> ConversationSession {
        let session = ConversationSession::new(self.message_store(), generator, &self.config);
        info!(conversation_id = %session.conversation_id(), "Started conversation");
        session
    }

    /// Open a session that appends to an existing conversation.
    pub fn resume_session(
        &self,
        conversation_id: &str,
        generator: Arc<dyn GenerationClient>,
    ) -> ConversationSession {
        info!(conversation_id, "Resuming conversation");
        ConversationSession::resume(conversation_id, self.message_store(), generator, &self.config)
    }

    pub fn history(&self) -> HistoryService {
        HistoryService::new(self.message_store(), self.config.history_review_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::ScriptedGenerationClient;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("parley.db");
        let config = ChatConfig {
            window_size: 0,
            ..ChatConfig::default()
        };
        assert!(
            ParleyCore::new(db_path.to_str().unwrap(), config)
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_session_and_history_share_store() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("parley.db");
        let core = ParleyCore::new(db_path.to_str().unwrap(), ChatConfig::default())
            .await
            .unwrap();

        let session = core.start_session(Arc::new(ScriptedGenerationClient::new("scripted")));
        session.submit("hello").await.unwrap();

        let groups = core.history().load().await.unwrap();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].conversation_id, session.conversation_id());
        assert_eq!(groups[0].message_count(), 2);
        assert_eq!(groups[0].preview, "hello...");
    }
}
