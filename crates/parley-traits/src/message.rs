//! Chat message records.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Conversation id substituted for records persisted without one.
pub const DEFAULT_CONVERSATION_ID: &str = "default";

/// Role of a chat message
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message as seen by the session and history layers.
///
/// Immutable once created. `tokens_used` is only ever set on assistant
/// replies that completed successfully.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    pub id: String,
    pub conversation_id: String,
    pub role: Role,
    pub content: String,
    /// Milliseconds since the Unix epoch.
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

impl Message {
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }
}

/// Fields needed to persist a new message. The store assigns `id` and
/// `created_at`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessageDraft {
    pub content: String,
    pub role: Role,
    pub conversation_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

impl MessageDraft {
    pub fn user(conversation_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            role: Role::User,
            conversation_id: conversation_id.into(),
            tokens_used: None,
        }
    }

    pub fn assistant(
        conversation_id: impl Into<String>,
        content: impl Into<String>,
        tokens_used: u32,
    ) -> Self {
        Self {
            content: content.into(),
            role: Role::Assistant,
            conversation_id: conversation_id.into(),
            tokens_used: Some(tokens_used),
        }
    }
}

/// On-disk message record.
///
/// Legacy records may lack `conversation_id` or `tokens_used`; converting to
/// [`Message`] is the single place where defaults are applied.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredMessage {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub role: Role,
    #[serde(default)]
    pub content: String,
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokens_used: Option<u32>,
}

impl StoredMessage {
    pub fn from_draft(id: impl Into<String>, created_at: i64, draft: MessageDraft) -> Self {
        Self {
            id: id.into(),
            conversation_id: Some(draft.conversation_id),
            role: draft.role,
            content: draft.content,
            created_at,
            tokens_used: draft.tokens_used,
        }
    }
}

impl From<StoredMessage> for Message {
    fn from(record: StoredMessage) -> Self {
        let conversation_id = record
            .conversation_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CONVERSATION_ID.to_string());

        Self {
            id: record.id,
            conversation_id,
            role: record.role,
            content: record.content,
            created_at: record.created_at,
            tokens_used: record.tokens_used,
        }
    }
}
