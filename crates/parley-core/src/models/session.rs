//! Conversation session models shared with the rendering layer.

use serde::{Deserialize, Serialize};

use parley_traits::Message;

/// Persistence state of a session entry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Delivery {
    /// Appended optimistically, store call outstanding.
    Pending,
    Persisted,
    /// Never stored: an apology, or a user message whose store call failed.
    LocalOnly,
}

/// One message in the live session sequence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionEntry {
    pub message: Message,
    pub delivery: Delivery,
}

impl SessionEntry {
    pub fn persisted(message: Message) -> Self {
        Self {
            message,
            delivery: Delivery::Persisted,
        }
    }

    pub fn pending(message: Message) -> Self {
        Self {
            message,
            delivery: Delivery::Pending,
        }
    }

    pub fn local_only(message: Message) -> Self {
        Self {
            message,
            delivery: Delivery::LocalOnly,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.delivery == Delivery::Persisted
    }
}

/// Point-in-time copy of session state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub conversation_id: String,
    pub messages: Vec<SessionEntry>,
    pub pending: bool,
    pub typing_placeholder: bool,
}

impl SessionSnapshot {
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// Change notifications for the rendering layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "data")]
pub enum SessionEvent {
    HistoryLoaded { count: usize },
    MessageAppended { entry: SessionEntry },
    /// The optimistic entry `local_id` was replaced by the stored record.
    MessageConfirmed { local_id: String, message: Message },
    TypingChanged { typing: bool },
    TurnFailed { error: String },
}

/// Result of a submitted turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    Replied(Message),
    Failed { apology: Message },
}

impl TurnOutcome {
    pub fn is_replied(&self) -> bool {
        matches!(self, TurnOutcome::Replied(_))
    }

    /// The assistant-side message appended by this turn.
    pub fn message(&self) -> &Message {
        match self {
            TurnOutcome::Replied(message) => message,
            TurnOutcome::Failed { apology } => apology,
        }
    }
}
