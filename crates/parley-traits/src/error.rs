//! Error types shared across the store and generation seams.

use thiserror::Error;

/// Persistence failure surfaced by a [`crate::MessageStore`].
///
/// Stores never retry; the caller decides what a failure means.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Failed to decode message {id}: {reason}")]
    Decode { id: String, reason: String },

    #[error("Unsupported sort expression: {0}")]
    InvalidSort(String),
}

/// Failure reported by a [`crate::GenerationClient`].
///
/// The conversation core treats every variant the same way.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerationError {
    #[error("Generation request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Generation rejected (status {status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("Invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("Generation returned an empty reply")]
    EmptyReply,
}

/// Result type alias for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for generation calls
pub type GenerationResult<T> = std::result::Result<T, GenerationError>;
