//! Error taxonomy of the notification center.
//!
//! Feature modules are expected to log and continue on any of these; a
//! failure to notify must never interrupt the feature's primary function.

use thiserror::Error;

use crate::config::ConfigError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum NotifyError {
    /// Malformed emit payload, rejected before any state change.
    #[error("invalid emit payload: field '{field}' {reason}")]
    InvalidData { field: &'static str, reason: String },

    /// The backing store was unavailable and the fallback failed too. The
    /// center retries on the next operation rather than latching a
    /// permanent failure flag.
    #[error("notification storage unavailable: {0}")]
    Storage(#[from] StorageError),

    /// The collection write failed after a record was constructed; the
    /// in-memory state was rolled back to its pre-operation snapshot.
    #[error("failed to persist notification collection during '{operation}': {source}")]
    Persistence {
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("invalid notification center configuration: {0}")]
    Config(#[from] ConfigError),
}

impl NotifyError {
    pub fn invalid_data(field: &'static str, reason: impl Into<String>) -> Self {
        NotifyError::InvalidData {
            field,
            reason: reason.into(),
        }
    }

    pub fn persistence(operation: &'static str, source: StorageError) -> Self {
        NotifyError::Persistence { operation, source }
    }
}
