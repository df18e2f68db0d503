//! Message persistence abstraction.
//!
//! The conversation core only needs two operations from its record store:
//! list recent messages and create a new one. Implementations are provided
//! by downstream crates (e.g., parley-core over redb).

use async_trait::async_trait;

use crate::error::{StoreError, StoreResult};
use crate::message::{Message, MessageDraft};

/// Sort expression for newest-first listings.
pub const NEWEST_FIRST: &str = "-created_at";

/// Sort expression for oldest-first listings.
pub const OLDEST_FIRST: &str = "created_at";

/// Creation-time ordering understood by stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    NewestFirst,
    OldestFirst,
}

impl SortOrder {
    /// Parse a store sort expression. A leading `-` means descending.
    pub fn parse(expression: &str) -> StoreResult<Self> {
        match expression.trim() {
            "-created_at" | "-createdAt" => Ok(SortOrder::NewestFirst),
            "created_at" | "createdAt" => Ok(SortOrder::OldestFirst),
            other => Err(StoreError::InvalidSort(other.to_string())),
        }
    }
}

/// External record store for chat messages.
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// List at most `limit` messages across all conversations, ordered by
    /// creation time as described by `sort`.
    async fn list(&self, sort: &str, limit: usize) -> StoreResult<Vec<Message>>;

    /// Persist a new message and return it with its assigned id and timestamp.
    async fn create(&self, draft: MessageDraft) -> StoreResult<Message>;
}
