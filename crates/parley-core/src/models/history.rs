//! History review models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use parley_traits::Message;

/// Per-conversation counters.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationStats {
    pub user_count: usize,
    pub assistant_count: usize,
    /// Sum of `tokens_used`, absent values counted as zero.
    pub total_tokens: u64,
}

impl ConversationStats {
    pub fn message_count(&self) -> usize {
        self.user_count + self.assistant_count
    }

    pub fn record(&mut self, message: &Message) {
        if message.is_user() {
            self.user_count += 1;
        } else {
            self.assistant_count += 1;
        }
        self.total_tokens += u64::from(message.tokens_used.unwrap_or(0));
    }
}

/// Messages of one conversation as returned by the store, newest first.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ConversationGroup {
    pub conversation_id: String,
    pub messages: Vec<Message>,
    pub stats: ConversationStats,
    pub preview: String,
}

impl ConversationGroup {
    /// Timestamp of the newest message.
    pub fn latest_at(&self) -> Option<i64> {
        self.messages.first().map(|message| message.created_at)
    }

    pub fn message_count(&self) -> usize {
        self.stats.message_count()
    }

    /// Oldest-first view for transcript display.
    pub fn chronological(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().rev()
    }
}

/// Display bucket for a message date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateLabel {
    Today,
    Yesterday,
    On(NaiveDate),
}

impl fmt::Display for DateLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateLabel::Today => f.write_str("Today"),
            DateLabel::Yesterday => f.write_str("Yesterday"),
            DateLabel::On(date) => write!(f, "{}", date.format("%b %-d, %Y")),
        }
    }
}
