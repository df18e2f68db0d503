//! Typed message storage wrapper.
//!
//! Wraps the byte-level API from parley-storage with JSON (de)serialization
//! and implements the [`MessageStore`] seam. Records are decoded through
//! [`StoredMessage`], which is where missing legacy fields get their defaults.

use async_trait::async_trait;
use redb::Database;
use std::sync::Arc;

use parley_storage::time_utils;
use parley_traits::{
    Message, MessageDraft, MessageStore, SortOrder, StoreError, StoreResult, StoredMessage,
};

/// Typed message storage wrapper around parley_storage::MessageStorage.
#[derive(Debug, Clone)]
pub struct MessageStorage {
    inner: parley_storage::MessageStorage,
}

fn backend(error: anyhow::Error) -> StoreError {
    StoreError::Backend(format!("{error:#}"))
}

impl MessageStorage {
    /// Create a new message storage instance.
    pub fn new(db: Arc<Database>) -> anyhow::Result<Self> {
        Ok(Self {
            inner: parley_storage::MessageStorage::new(db)?,
        })
    }

    /// Persist a draft, assigning a fresh id and the current time.
    ///
    /// The timestamp never precedes the newest stored message, so a clock
    /// stepping backwards cannot list a reply before its prompt.
    pub fn create_message(&self, draft: MessageDraft) -> StoreResult<Message> {
        let id = uuid::Uuid::new_v4().to_string();
        let created_at = self
            .inner
            .append_raw(&id, time_utils::now_ms(), |created_at| {
                let record = StoredMessage::from_draft(id.clone(), created_at, draft.clone());
                Ok(serde_json::to_vec(&record)?)
            })
            .map_err(backend)?;
        Ok(Message::from(StoredMessage::from_draft(id, created_at, draft)))
    }

    /// Insert a record as-is. Used for imports and legacy-shaped fixtures.
    pub fn insert_record(&self, record: &StoredMessage) -> StoreResult<()> {
        let json = serde_json::to_vec(record).map_err(|e| StoreError::Decode {
            id: record.id.clone(),
            reason: e.to_string(),
        })?;
        self.inner
            .insert_raw(&record.id, record.created_at, &json)
            .map_err(backend)
    }

    /// Get a message by ID.
    pub fn get(&self, id: &str) -> StoreResult<Option<Message>> {
        match self.inner.get_raw(id).map_err(backend)? {
            Some(bytes) => Ok(Some(decode(id, &bytes)?)),
            None => Ok(None),
        }
    }

    /// List up to `limit` messages in the given order.
    ///
    /// Records that fail to decode are skipped with a warning so one bad
    /// record cannot hide the rest of the history.
    pub fn list_messages(&self, order: SortOrder, limit: usize) -> StoreResult<Vec<Message>> {
        let newest_first = matches!(order, SortOrder::NewestFirst);
        let raw = self.inner.list_raw(newest_first, limit).map_err(backend)?;

        let mut messages = Vec::with_capacity(raw.len());
        for (id, bytes) in raw {
            match decode(&id, &bytes) {
                Ok(message) => messages.push(message),
                Err(error) => tracing::warn!(message_id = %id, error = %error, "Skipping undecodable message"),
            }
        }
        Ok(messages)
    }

    /// Count total number of stored messages.
    pub fn count(&self) -> StoreResult<usize> {
        self.inner.count().map_err(backend)
    }
}

fn decode(id: &str, bytes: &[u8]) -> StoreResult<Message> {
    serde_json::from_slice::<StoredMessage>(bytes)
        .map(Message::from)
        .map_err(|e| StoreError::Decode {
            id: id.to_string(),
            reason: e.to_string(),
        })
}

fn join_error(error: tokio::task::JoinError) -> StoreError {
    StoreError::Backend(format!("storage task failed: {error}"))
}

#[async_trait]
impl MessageStore for MessageStorage {
    async fn list(&self, sort: &str, limit: usize) -> StoreResult<Vec<Message>> {
        let order = SortOrder::parse(sort)?;
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.list_messages(order, limit))
            .await
            .map_err(join_error)?
    }

    async fn create(&self, draft: MessageDraft) -> StoreResult<Message> {
        let storage = self.clone();
        tokio::task::spawn_blocking(move || storage.create_message(draft))
            .await
            .map_err(join_error)?
    }
}
