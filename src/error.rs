//! Store error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during store operations.
///
/// A record that cannot be found by id is not an error; see
/// [`UpdateOutcome`](crate::UpdateOutcome) and [`RemoveOutcome`](crate::RemoveOutcome).
#[derive(Debug, Error)]
pub enum StoreError {
    /// Stored text under a key is not valid JSON.
    #[error("Malformed data under key '{key}': {source}")]
    Malformed {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// Stored JSON under a key is not an array.
    #[error("Value under key '{key}' is not a collection")]
    NotACollection { key: String },

    /// Append on a key that has not been initialized.
    #[error("Collection '{key}' does not exist")]
    CollectionMissing { key: String },

    /// Update payload is not a JSON object, so its id cannot be set.
    #[error("Update payload for key '{key}' is not a JSON object")]
    NotAnObject { key: String },

    /// Write would exceed the medium's capacity.
    #[error("Quota exceeded writing key '{key}': {needed} bytes needed, limit is {limit}")]
    QuotaExceeded { key: String, needed: usize, limit: usize },

    /// Another process holds the medium's lock.
    #[error("Store at {path:?} is locked by another process")]
    Locked { path: PathBuf },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub(crate) fn malformed(key: &str, source: serde_json::Error) -> Self {
        Self::Malformed {
            key: key.to_string(),
            source,
        }
    }

    pub(crate) fn collection_missing(key: &str) -> Self {
        Self::CollectionMissing { key: key.to_string() }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
