//! Data directory resolution, shared with parley-storage.

pub use parley_storage::paths::*;

/// Convenience helper returning the database path as a UTF-8 string.
pub fn ensure_database_path_string() -> anyhow::Result<String> {
    Ok(ensure_database_path()?.to_string_lossy().into_owned())
}
