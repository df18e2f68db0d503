//! History review: grouping a flat message log into conversations.
//!
//! The store returns messages newest first across every conversation. The
//! aggregator partitions them by `conversation_id` without re-sorting, so each
//! group keeps the store order and groups appear in order of their newest
//! message.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate};

use crate::models::{ConversationGroup, ConversationStats, DateLabel};
use parley_traits::{Message, MessageStore, NEWEST_FIRST, StoreResult};

/// Characters of the first user message shown as a preview.
pub const PREVIEW_CHARS: usize = 60;
pub const PREVIEW_MARKER: &str = "...";
pub const PREVIEW_PLACEHOLDER: &str = "New conversation";

/// Partition `messages` by conversation, preserving input order.
pub fn aggregate(messages: Vec<Message>) -> Vec<ConversationGroup> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut buckets: Vec<(String, Vec<Message>)> = Vec::new();

    for message in messages {
        let slot = match index.get(&message.conversation_id).copied() {
            Some(slot) => slot,
            None => {
                index.insert(message.conversation_id.clone(), buckets.len());
                buckets.push((message.conversation_id.clone(), Vec::new()));
                buckets.len() - 1
            }
        };
        buckets[slot].1.push(message);
    }

    buckets
        .into_iter()
        .map(|(conversation_id, messages)| ConversationGroup {
            stats: conversation_stats(&messages),
            preview: conversation_preview(&messages),
            conversation_id,
            messages,
        })
        .collect()
}

pub fn conversation_stats(messages: &[Message]) -> ConversationStats {
    let mut stats = ConversationStats::default();
    for message in messages {
        stats.record(message);
    }
    stats
}

/// First user message in store order, truncated, or the placeholder.
pub fn conversation_preview(messages: &[Message]) -> String {
    match messages.iter().find(|message| message.is_user()) {
        Some(message) => {
            let head: String = message.content.chars().take(PREVIEW_CHARS).collect();
            format!("{head}{PREVIEW_MARKER}")
        }
        None => PREVIEW_PLACEHOLDER.to_string(),
    }
}

/// Bucket `date` relative to `today`. Future dates get a calendar label.
pub fn classify_date(date: NaiveDate, today: NaiveDate) -> DateLabel {
    if date == today {
        DateLabel::Today
    } else if today.pred_opt() == Some(date) {
        DateLabel::Yesterday
    } else {
        DateLabel::On(date)
    }
}

fn local_datetime(timestamp_ms: i64) -> Option<DateTime<Local>> {
    DateTime::from_timestamp_millis(timestamp_ms).map(|utc| utc.with_timezone(&Local))
}

/// Label a millisecond timestamp in the local timezone.
pub fn date_label(timestamp_ms: i64, today: NaiveDate) -> Option<DateLabel> {
    local_datetime(timestamp_ms).map(|local| classify_date(local.date_naive(), today))
}

/// Local `HH:MM` for a millisecond timestamp.
pub fn format_clock(timestamp_ms: i64) -> String {
    local_datetime(timestamp_ms)
        .map(|local| local.format("%H:%M").to_string())
        .unwrap_or_else(|| "--:--".to_string())
}

pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Read side of the history review, backed by any [`MessageStore`].
#[derive(Clone)]
pub struct HistoryService {
    store: Arc<dyn MessageStore>,
    limit: usize,
}

impl HistoryService {
    pub fn new(store: Arc<dyn MessageStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Load the newest `limit` messages and group them.
    pub async fn load(&self) -> StoreResult<Vec<ConversationGroup>> {
        self.load_with_limit(self.limit).await
    }

    pub async fn load_with_limit(&self, limit: usize) -> StoreResult<Vec<ConversationGroup>> {
        let messages = self.store.list(NEWEST_FIRST, limit).await?;
        let groups = aggregate(messages);
        tracing::debug!(limit, groups = groups.len(), "Loaded conversation history");
        Ok(groups)
    }

    /// Group for one conversation, if it appears within the load window.
    pub async fn find(&self, conversation_id: &str) -> StoreResult<Option<ConversationGroup>> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|group| group.conversation_id == conversation_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryMessageStore;
    use parley_traits::{DEFAULT_CONVERSATION_ID, Role, StoreError, StoredMessage};

    fn stored(
        id: &str,
        conversation_id: Option<&str>,
        role: Role,
        content: &str,
        created_at: i64,
        tokens_used: Option<u32>,
    ) -> Message {
        Message::from(StoredMessage {
            id: id.to_string(),
            conversation_id: conversation_id.map(str::to_string),
            role,
            content: content.to_string(),
            created_at,
            tokens_used,
        })
    }

    #[test]
    fn test_grouping_includes_default_bucket() {
        let messages = vec![
            stored("1", Some("A"), Role::Assistant, "a2", 60, Some(5)),
            stored("2", None, Role::User, "legacy", 50, None),
            stored("3", Some("B"), Role::User, "b1", 40, None),
            stored("4", Some("A"), Role::User, "a1", 30, None),
            stored("5", None, Role::Assistant, "legacy reply", 20, None),
        ];
        let total = messages.len();

        let groups = aggregate(messages);
        let ids: Vec<&str> = groups.iter().map(|g| g.conversation_id.as_str()).collect();
        assert_eq!(ids, vec!["A", DEFAULT_CONVERSATION_ID, "B"]);

        let counted: usize = groups.iter().map(|g| g.message_count()).sum();
        assert_eq!(counted, total);

        let a = &groups[0];
        assert_eq!(a.stats.user_count, 1);
        assert_eq!(a.stats.assistant_count, 1);
        assert_eq!(a.stats.total_tokens, 5);
        let order: Vec<&str> = a.messages.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(order, vec!["1", "4"]);
    }

    #[test]
    fn test_long_preview_is_truncated() {
        let content = "x".repeat(100);
        let groups = aggregate(vec![stored("1", Some("c1"), Role::User, &content, 1, None)]);
        assert_eq!(groups[0].preview, format!("{}...", "x".repeat(60)));
    }

    #[test]
    fn test_preview_uses_newest_user_message() {
        let messages = vec![
            stored("3", Some("c"), Role::Assistant, "reply", 3, None),
            stored("2", Some("c"), Role::User, "second question", 2, None),
            stored("1", Some("c"), Role::User, "first question", 1, None),
        ];
        assert_eq!(conversation_preview(&messages), "second question...");
    }

    #[test]
    fn test_preview_placeholder_and_unicode() {
        let replies = vec![stored("1", Some("c"), Role::Assistant, "hi", 1, None)];
        assert_eq!(conversation_preview(&replies), PREVIEW_PLACEHOLDER);

        let wide = "é".repeat(70);
        let preview = conversation_preview(&[stored("1", Some("c"), Role::User, &wide, 1, None)]);
        assert_eq!(preview.chars().count(), 63);
    }

    #[test]
    fn test_classify_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        let earlier = NaiveDate::from_ymd_opt(2025, 3, 5).unwrap();
        let tomorrow = NaiveDate::from_ymd_opt(2025, 3, 11).unwrap();

        assert_eq!(classify_date(today, today), DateLabel::Today);
        assert_eq!(classify_date(yesterday, today), DateLabel::Yesterday);
        assert_eq!(classify_date(earlier, today), DateLabel::On(earlier));
        assert_eq!(classify_date(tomorrow, today), DateLabel::On(tomorrow));
        assert_eq!(classify_date(earlier, today).to_string(), "Mar 5, 2025");
    }

    #[test]
    fn test_date_label_uses_local_calendar() {
        let now = Local::now();
        let label = date_label(now.timestamp_millis(), now.date_naive());
        assert_eq!(label, Some(DateLabel::Today));
    }

    #[test]
    fn test_format_clock_shape() {
        let clock = format_clock(Local::now().timestamp_millis());
        assert_eq!(clock.len(), 5);
        assert_eq!(&clock[2..3], ":");
    }

    #[tokio::test]
    async fn test_service_load_and_find() {
        let store = Arc::new(InMemoryMessageStore::with_messages(vec![
            stored("1", Some("a"), Role::User, "hello", 10, None),
            stored("2", Some("b"), Role::User, "other", 20, None),
            stored("3", Some("a"), Role::Assistant, "hi", 30, Some(2)),
        ]));
        let service = HistoryService::new(store, 200);

        let groups = service.load().await.unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].conversation_id, "a");
        assert_eq!(groups[0].latest_at(), Some(30));

        let found = service.find("b").await.unwrap().unwrap();
        assert_eq!(found.preview, "other...");
        assert!(service.find("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_service_propagates_store_error() {
        let store = Arc::new(InMemoryMessageStore::new());
        store.set_list_failure(true);
        let service = HistoryService::new(store, 200);
        assert!(matches!(service.load().await, Err(StoreError::Backend(_))));
    }
}
