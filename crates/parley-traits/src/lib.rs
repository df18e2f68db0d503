//! Parley Traits - Shared message types and seam abstractions.
//!
//! This crate provides the interfaces the conversation core depends on:
//! - Message, Role, MessageDraft and the loose on-disk StoredMessage record
//! - MessageStore (list/create persistence seam) and SortOrder parsing
//! - GenerationClient (prompt in, reply text out)
//! - StoreError and GenerationError

pub mod error;
pub mod generation;
pub mod message;
pub mod store;

// ── Top-level re-exports ─────────────────────────────────────────────

pub use error::{GenerationError, GenerationResult, StoreError, StoreResult};
pub use generation::GenerationClient;
pub use message::{DEFAULT_CONVERSATION_ID, Message, MessageDraft, Role, StoredMessage};
pub use store::{MessageStore, NEWEST_FIRST, OLDEST_FIRST, SortOrder};
