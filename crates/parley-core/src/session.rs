//! Conversation session: the live message sequence of one chat view.
//!
//! A session is `Idle` or awaiting a reply. `submit` appends the user message
//! optimistically, persists it, asks the generation client for a reply and
//! persists that too. Every failure folds back into `Idle` with a local-only
//! apology in place of the reply.
//!
//! The context window is computed from persisted history *before* the new
//! user message is appended, so the utterance appears in the prompt exactly
//! once, after the context block.

use std::sync::Arc;

use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::broadcast;

use crate::config::ChatConfig;
use crate::context::{PromptTemplate, build_context_block};
use crate::generation::estimate_tokens;
use crate::models::{Delivery, SessionEntry, SessionEvent, SessionSnapshot, TurnOutcome};
use parley_storage::time_utils;
use parley_traits::{
    GenerationClient, Message, MessageDraft, MessageStore, NEWEST_FIRST, Role,
};

const EVENT_BUFFER_CAPACITY: usize = 256;
const CONVERSATION_ID_PREFIX: &str = "conv_";
const LOCAL_ID_PREFIX: &str = "local_";

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionError {
    #[error("Message is empty")]
    EmptyInput,

    #[error("A reply is still pending")]
    ReplyPending,
}

/// Which stored messages `load_history` prefixes to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryScope {
    /// The newest messages across every conversation.
    AllConversations,
    /// Only messages of this session's conversation.
    ThisConversation,
}

/// Fresh conversation id, unique per call.
pub fn new_conversation_id() -> String {
    format!("{CONVERSATION_ID_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

fn new_local_id() -> String {
    format!("{LOCAL_ID_PREFIX}{}", uuid::Uuid::new_v4().simple())
}

#[derive(Debug, Default)]
struct SessionState {
    messages: Vec<SessionEntry>,
    awaiting_reply: bool,
    typing_placeholder: bool,
    history_requested: bool,
}

impl SessionState {
    /// A history load racing a turn can prefix a record the turn is about to
    /// place itself. The turn's position wins.
    fn drop_loaded_copy(&mut self, id: &str) {
        let before = self.messages.len();
        self.messages.retain(|entry| entry.message.id != id);
        if self.messages.len() != before {
            tracing::debug!(message_id = %id, "Dropped history copy of in-flight message");
        }
    }
}

struct SessionInner {
    conversation_id: String,
    store: Arc<dyn MessageStore>,
    generator: Arc<dyn GenerationClient>,
    window_size: usize,
    history_load_limit: usize,
    history_scope: HistoryScope,
    template: PromptTemplate,
    apology: String,
    state: Mutex<SessionState>,
    events: broadcast::Sender<SessionEvent>,
}

/// Handle to a conversation session. Clones share the same state.
#[derive(Clone)]
pub struct ConversationSession {
    inner: Arc<SessionInner>,
}

impl std::fmt::Debug for ConversationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversationSession")
            .field("conversation_id", &self.inner.conversation_id)
            .field("model", &self.inner.generator.model())
            .finish()
    }
}

impl ConversationSession {
    /// Start a new conversation with a generated id.
    pub fn new(
        store: Arc<dyn MessageStore>,
        generator: Arc<dyn GenerationClient>,
        config: &ChatConfig,
    ) -> Self {
        Self::build(
            new_conversation_id(),
            HistoryScope::AllConversations,
            store,
            generator,
            config,
        )
    }

    /// Continue an existing conversation; history is limited to its messages.
    pub fn resume(
        conversation_id: impl Into<String>,
        store: Arc<dyn MessageStore>,
        generator: Arc<dyn GenerationClient>,
        config: &ChatConfig,
    ) -> Self {
        Self::build(
            conversation_id.into(),
            HistoryScope::ThisConversation,
            store,
            generator,
            config,
        )
    }

    fn build(
        conversation_id: String,
        history_scope: HistoryScope,
        store: Arc<dyn MessageStore>,
        generator: Arc<dyn GenerationClient>,
        config: &ChatConfig,
    ) -> Self {
        let (events, _receiver) = broadcast::channel(EVENT_BUFFER_CAPACITY);
        Self {
            inner: Arc::new(SessionInner {
                conversation_id,
                store,
                generator,
                window_size: config.window_size,
                history_load_limit: config.history_load_limit,
                history_scope,
                template: config.prompt_template(),
                apology: config.apology.clone(),
                state: Mutex::new(SessionState::default()),
                events,
            }),
        }
    }

    pub fn conversation_id(&self) -> &str {
        &self.inner.conversation_id
    }

    pub fn history_scope(&self) -> HistoryScope {
        self.inner.history_scope
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.inner.state.lock();
        SessionSnapshot {
            conversation_id: self.inner.conversation_id.clone(),
            messages: state.messages.clone(),
            pending: state.awaiting_reply,
            typing_placeholder: state.typing_placeholder,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.inner.state.lock().awaiting_reply
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Prefix stored history to the session, once.
    ///
    /// Returns the number of messages added. A store failure is logged and
    /// leaves the session empty but usable.
    pub async fn load_history(&self) -> usize {
        {
            let mut state = self.inner.state.lock();
            if state.history_requested {
                return 0;
            }
            state.history_requested = true;
        }

        let inner = &self.inner;
        let mut loaded = match inner.store.list(NEWEST_FIRST, inner.history_load_limit).await {
            Ok(messages) => messages,
            Err(error) => {
                tracing::warn!(
                    conversation_id = %inner.conversation_id,
                    error = %error,
                    "Failed to load conversation history"
                );
                Vec::new()
            }
        };
        if inner.history_scope == HistoryScope::ThisConversation {
            loaded.retain(|message| message.conversation_id == inner.conversation_id);
        }
        loaded.reverse();

        let count = {
            let mut state = inner.state.lock();
            let mut entries: Vec<SessionEntry> = loaded
                .into_iter()
                .filter(|message| {
                    !state
                        .messages
                        .iter()
                        .any(|entry| entry.message.id == message.id)
                })
                .map(SessionEntry::persisted)
                .collect();
            let count = entries.len();
            entries.append(&mut state.messages);
            state.messages = entries;
            count
        };

        tracing::debug!(conversation_id = %inner.conversation_id, count, "History loaded");
        inner.emit(SessionEvent::HistoryLoaded { count });
        count
    }

    /// Run one user turn to completion.
    ///
    /// The turn runs on its own task, so it still resolves the session state
    /// if the returned future is dropped.
    pub async fn submit(&self, text: &str) -> Result<TurnOutcome, SessionError> {
        let content = text.trim();
        if content.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let inner = &self.inner;
        let (entry, prompt) = {
            let mut state = inner.state.lock();
            if state.awaiting_reply {
                return Err(SessionError::ReplyPending);
            }

            let context = build_context_block(
                state
                    .messages
                    .iter()
                    .filter(|entry| entry.is_persisted())
                    .map(|entry| &entry.message),
                inner.window_size,
            );
            let prompt = inner.template.assemble(&context, content);

            let entry = SessionEntry::pending(Message {
                id: new_local_id(),
                conversation_id: inner.conversation_id.clone(),
                role: Role::User,
                content: content.to_string(),
                created_at: time_utils::now_ms(),
                tokens_used: None,
            });
            state.messages.push(entry.clone());
            state.awaiting_reply = true;
            state.typing_placeholder = true;
            (entry, prompt)
        };

        let local_id = entry.message.id.clone();
        let content = entry.message.content.clone();
        inner.emit(SessionEvent::MessageAppended { entry });
        inner.emit(SessionEvent::TypingChanged { typing: true });

        let turn = tokio::spawn({
            let inner = inner.clone();
            let local_id = local_id.clone();
            async move { inner.run_turn(local_id, content, prompt).await }
        });

        match turn.await {
            Ok(outcome) => Ok(outcome),
            Err(error) => Ok(inner.fail_turn(&local_id, &format!("turn task failed: {error}"))),
        }
    }
}

impl SessionInner {
    fn emit(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }

    async fn run_turn(&self, local_id: String, content: String, prompt: String) -> TurnOutcome {
        let draft = MessageDraft::user(&self.conversation_id, content);
        match self.store.create(draft).await {
            Ok(stored) => self.confirm(&local_id, stored),
            Err(error) => return self.fail_turn(&local_id, &error.to_string()),
        }

        let reply = match self.generator.generate(&prompt).await {
            Ok(reply) => reply,
            Err(error) => return self.fail_turn(&local_id, &error.to_string()),
        };
        self.set_typing(false);

        let tokens = estimate_tokens(&reply);
        let draft = MessageDraft::assistant(&self.conversation_id, reply, tokens);
        let stored = match self.store.create(draft).await {
            Ok(stored) => stored,
            Err(error) => return self.fail_turn(&local_id, &error.to_string()),
        };

        let entry = SessionEntry::persisted(stored.clone());
        {
            let mut state = self.state.lock();
            state.drop_loaded_copy(&stored.id);
            state.messages.push(entry.clone());
            state.awaiting_reply = false;
        }
        self.emit(SessionEvent::MessageAppended { entry });

        tracing::info!(
            conversation_id = %self.conversation_id,
            model = %self.generator.model(),
            tokens_used = tokens,
            "Reply received"
        );
        TurnOutcome::Replied(stored)
    }

    /// Replace the optimistic entry with the stored record.
    fn confirm(&self, local_id: &str, stored: Message) {
        {
            let mut state = self.state.lock();
            state.drop_loaded_copy(&stored.id);
            if let Some(entry) = state
                .messages
                .iter_mut()
                .find(|entry| entry.message.id == local_id)
            {
                *entry = SessionEntry::persisted(stored.clone());
            }
        }
        self.emit(SessionEvent::MessageConfirmed {
            local_id: local_id.to_string(),
            message: stored,
        });
    }

    fn set_typing(&self, typing: bool) {
        let changed = {
            let mut state = self.state.lock();
            let changed = state.typing_placeholder != typing;
            state.typing_placeholder = typing;
            changed
        };
        if changed {
            self.emit(SessionEvent::TypingChanged { typing });
        }
    }

    /// Fold a failed turn back into `Idle` with a local apology.
    fn fail_turn(&self, local_id: &str, error: &str) -> TurnOutcome {
        tracing::warn!(
            conversation_id = %self.conversation_id,
            error = %error,
            "Turn failed, substituting apology"
        );
        self.set_typing(false);

        let apology = Message {
            id: new_local_id(),
            conversation_id: self.conversation_id.clone(),
            role: Role::Assistant,
            content: self.apology.clone(),
            created_at: time_utils::now_ms(),
            tokens_used: None,
        };
        let entry = SessionEntry::local_only(apology.clone());
        {
            let mut state = self.state.lock();
            if let Some(user_entry) = state.messages.iter_mut().find(|entry| {
                entry.message.id == local_id && entry.delivery == Delivery::Pending
            }) {
                user_entry.delivery = Delivery::LocalOnly;
            }
            state.messages.push(entry.clone());
            state.awaiting_reply = false;
        }

        self.emit(SessionEvent::TurnFailed {
            error: error.to_string(),
        });
        self.emit(SessionEvent::MessageAppended { entry });
        TurnOutcome::Failed { apology }
    }
}
