//! Parley Storage - Low-level storage layer
//!
//! This crate provides the persistence layer for Parley, using redb as the
//! embedded database. It exposes byte-level APIs so it does not depend on the
//! message model; typed wrappers live in parley-core.
//!
//! # Tables
//!
//! - `messages:data` - Serialized message records keyed by id
//! - `messages:index` - Creation-time index (`<created_at>:<seq>` -> id)
//! - `messages:meta` - Insertion sequence counter

pub mod message;
pub mod paths;
pub mod time_utils;

pub use message::MessageStorage;
