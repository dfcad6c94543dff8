//! Storage backend trait and the in-memory implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;

use super::error::StorageError;

/// A key-value backend the [`Store`](super::Store) can run against.
///
/// Values are plain JSON so every backend stores the same representation the
/// extension's `storage.local` area would hold.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StorageError>;
    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StorageError>;
    async fn remove(&self, key: &str) -> Result<(), StorageError>;
    async fn clear(&self) -> Result<(), StorageError>;
}

/// Volatile backend backed by a `HashMap`.
///
/// Doubles as the store's fallback area and as the primary backend for
/// tests and short-lived contexts.
#[derive(Default)]
pub struct MemoryBackend {
    cells: RwLock<HashMap<String, JsonValue>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.cells.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cells.read().await.is_empty()
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StorageError> {
        Ok(self.cells.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StorageError> {
        self.cells.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.cells.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.cells.write().await.clear();
        Ok(())
    }
}
