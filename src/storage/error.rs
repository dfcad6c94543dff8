//! Error types for the persistent store layer.

use std::io;
use thiserror::Error;

/// Errors surfaced by storage backends and the [`Store`](super::Store) facade.
///
/// A missing key is never an error; `get` returns `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The primary backend's context is gone (e.g. the extension was
    /// reloaded while a page still holds a stale handle). The store reacts
    /// by retrying the operation on its in-memory fallback.
    #[error("storage context invalidated")]
    ContextInvalidated,

    /// Filesystem failure while reading or writing the backing file.
    #[error("storage I/O failure on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A value could not be serialized to or deserialized from its stored
    /// JSON representation.
    #[error("storage value serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The backend did not answer within the store's bounded timeout.
    #[error("storage operation '{operation}' timed out after {timeout_ms} ms")]
    Timeout {
        operation: &'static str,
        timeout_ms: u64,
    },
}

impl StorageError {
    /// True when the error means the primary backend can no longer be used
    /// and the fallback should take over.
    pub fn is_context_invalidated(&self) -> bool {
        matches!(self, StorageError::ContextInvalidated)
    }
}
