//! Storage layer with typed wrappers around parley-storage.
//!
//! This module provides type-safe access to the storage layer by wrapping
//! the byte-level APIs from parley-storage with the message model.

pub mod memory;
pub mod message;

use anyhow::Result;
use redb::Database;
use std::path::Path;
use std::sync::Arc;

pub use memory::InMemoryMessageStore;
pub use message::MessageStorage;

/// Central storage manager that initializes all storage subsystems.
pub struct Storage {
    pub messages: MessageStorage,
}

impl Storage {
    /// Create a new storage instance at the given path.
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let db = Arc::new(Database::create(path.as_ref())?);
        let messages = MessageStorage::new(db)?;

        Ok(Self { messages })
    }
}
