//! Path utilities for Parley directory resolution.
//!
//! This is the canonical source for shared path functions. Re-exported by
//! parley-core for convenience.

use anyhow::Result;
use std::path::PathBuf;

const PARLEY_DIR: &str = ".parley";
const DB_FILE: &str = "parley.db";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the Parley directory.
const PARLEY_DIR_ENV: &str = "PARLEY_DIR";

/// Resolve the Parley data directory.
/// Priority: PARLEY_DIR env var > ~/.parley/
pub fn resolve_parley_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(PARLEY_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(PARLEY_DIR))
        .ok_or_else(|| anyhow::anyhow!("Failed to determine home directory"))
}

/// Ensure the Parley directory exists and return its path.
pub fn ensure_parley_dir() -> Result<PathBuf> {
    let dir = resolve_parley_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Ensure the data directory exists and return the database path:
/// ~/.parley/parley.db
pub fn ensure_database_path() -> Result<PathBuf> {
    Ok(ensure_parley_dir()?.join(DB_FILE))
}

/// Get the logs directory: ~/.parley/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = ensure_parley_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
