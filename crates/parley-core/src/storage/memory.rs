//! In-memory message store.
//!
//! Backs tests and embedding scenarios that do not want a database file.
//! Failures can be injected to exercise the session's recovery paths.

use async_trait::async_trait;
use parking_lot::Mutex;

use parley_storage::time_utils;
use parley_traits::{
    Message, MessageDraft, MessageStore, Role, SortOrder, StoreError, StoreResult,
    StoredMessage,
};

#[derive(Debug, Default)]
struct Faults {
    fail_list: bool,
    /// One-shot create failure; `Some(None)` matches any role.
    fail_create: Option<Option<Role>>,
}

/// Message store kept in process memory, in insertion order.
#[derive(Debug, Default)]
pub struct InMemoryMessageStore {
    records: Mutex<Vec<Message>>,
    faults: Mutex<Faults>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store already-materialized messages, keeping their ids and timestamps.
    pub fn with_messages(messages: Vec<Message>) -> Self {
        let store = Self::default();
        store.records.lock().extend(messages);
        store
    }

    /// Make every `list` call fail until cleared.
    pub fn set_list_failure(&self, fail: bool) {
        self.faults.lock().fail_list = fail;
    }

    /// Fail the next `create` whose draft has `role` (any role when `None`).
    pub fn fail_next_create(&self, role: Option<Role>) {
        self.faults.lock().fail_create = Some(role);
    }

    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    fn take_create_fault(&self, role: Role) -> bool {
        let mut faults = self.faults.lock();
        match faults.fail_create {
            Some(None) => {
                faults.fail_create = None;
                true
            }
            Some(Some(target)) if target == role => {
                faults.fail_create = None;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl MessageStore for InMemoryMessageStore {
    async fn list(&self, sort: &str, limit: usize) -> StoreResult<Vec<Message>> {
        let order = SortOrder::parse(sort)?;
        if self.faults.lock().fail_list {
            return Err(StoreError::Backend("injected list failure".to_string()));
        }

        let mut messages = self.records.lock().clone();
        match order {
            SortOrder::OldestFirst => messages.sort_by_key(|m| m.created_at),
            SortOrder::NewestFirst => {
                messages.reverse();
                messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            }
        }
        messages.truncate(limit);
        Ok(messages)
    }

    async fn create(&self, draft: MessageDraft) -> StoreResult<Message> {
        if self.take_create_fault(draft.role) {
            return Err(StoreError::Backend("injected create failure".to_string()));
        }

        let mut records = self.records.lock();
        let latest = records.iter().map(|m| m.created_at).max().unwrap_or(0);
        let created_at = time_utils::now_ms().max(latest);
        let id = uuid::Uuid::new_v4().to_string();
        let message = Message::from(StoredMessage::from_draft(id, created_at, draft));
        records.push(message.clone());
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_traits::{NEWEST_FIRST, OLDEST_FIRST};

    #[tokio::test]
    async fn test_create_then_list_newest_first() {
        let store = InMemoryMessageStore::new();
        let first = store.create(MessageDraft::user("c", "one")).await.unwrap();
        let second = store.create(MessageDraft::user("c", "two")).await.unwrap();

        let newest = store.list(NEWEST_FIRST, 10).await.unwrap();
        assert_eq!(newest[0].id, second.id);
        assert_eq!(newest[1].id, first.id);

        let oldest = store.list(OLDEST_FIRST, 1).await.unwrap();
        assert_eq!(oldest.len(), 1);
        assert_eq!(oldest[0].id, first.id);
    }

    #[tokio::test]
    async fn test_injected_create_failure_is_one_shot() {
        let store = InMemoryMessageStore::new();
        store.fail_next_create(Some(Role::Assistant));

        assert!(store.create(MessageDraft::user("c", "hi")).await.is_ok());
        assert!(
            store
                .create(MessageDraft::assistant("c", "reply", 1))
                .await
                .is_err()
        );
        assert!(
            store
                .create(MessageDraft::assistant("c", "reply", 1))
                .await
                .is_ok()
        );
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_list_failure() {
        let store = InMemoryMessageStore::new();
        store.set_list_failure(true);
        assert!(matches!(
            store.list(NEWEST_FIRST, 5).await,
            Err(StoreError::Backend(_))
        ));
    }
}
