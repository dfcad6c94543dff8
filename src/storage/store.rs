//! The store facade: primary backend, transparent fallback, change events.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, warn};

use super::backend::{MemoryBackend, StorageBackend};
use super::error::StorageError;

/// Default bound on a single backend round-trip. Local storage only, so a
/// backend that takes longer than this is treated as unresponsive.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(2);

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Change notification fired after every successful mutation.
///
/// Holders of a cloned [`Store`] in the same process observe each other's
/// writes through these, the way extension contexts observe
/// `storage.onChanged`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Updated(String),
    Removed(String),
    Cleared,
}

impl StoreEvent {
    /// Whether the event may affect the value stored under `key`.
    pub fn touches(&self, key: &str) -> bool {
        match self {
            StoreEvent::Updated(k) | StoreEvent::Removed(k) => k == key,
            StoreEvent::Cleared => true,
        }
    }
}

struct StoreInner {
    primary: Arc<dyn StorageBackend>,
    fallback: MemoryBackend,
    events: broadcast::Sender<StoreEvent>,
    op_timeout: Duration,
}

/// Key-value store with a defined fallback path.
///
/// Every operation runs against the primary backend under a bounded
/// timeout. When the primary reports its context as invalidated, the
/// operation transparently retries on a page-local in-memory area and no
/// error reaches the caller. Cloning is cheap and clones share state and
/// the change-event channel.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn new(primary: Arc<dyn StorageBackend>) -> Self {
        Self::with_timeout(primary, DEFAULT_OP_TIMEOUT)
    }

    pub fn with_timeout(primary: Arc<dyn StorageBackend>, op_timeout: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                primary,
                fallback: MemoryBackend::new(),
                events,
                op_timeout,
            }),
        }
    }

    /// Store backed purely by memory. Useful for tests and throwaway
    /// contexts.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryBackend::new()))
    }

    /// Subscribe to change events. Dropping the receiver unsubscribes.
    pub fn subscribe_changes(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    /// Reads and deserializes the value under `key`. A missing key is
    /// `Ok(None)`, never an error.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, StorageError> {
        match self.get_value(key).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Serializes `value` and fully overwrites the entry under `key`.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<(), StorageError> {
        let json = serde_json::to_value(value)?;
        self.set_value(key, json).await?;
        self.publish(StoreEvent::Updated(key.to_string()));
        Ok(())
    }

    pub async fn remove(&self, key: &str) -> Result<(), StorageError> {
        let op = self.bounded("remove", self.inner.primary.remove(key)).await;
        match op {
            Err(e) if e.is_context_invalidated() => {
                self.warn_fallback("remove", key);
                self.inner.fallback.remove(key).await?;
            }
            other => other?,
        }
        self.publish(StoreEvent::Removed(key.to_string()));
        Ok(())
    }

    pub async fn clear(&self) -> Result<(), StorageError> {
        let op = self.bounded("clear", self.inner.primary.clear()).await;
        match op {
            Err(e) if e.is_context_invalidated() => {
                self.warn_fallback("clear", "*");
                self.inner.fallback.clear().await?;
            }
            other => other?,
        }
        self.publish(StoreEvent::Cleared);
        Ok(())
    }

    async fn get_value(&self, key: &str) -> Result<Option<JsonValue>, StorageError> {
        match self.bounded("get", self.inner.primary.get(key)).await {
            Err(e) if e.is_context_invalidated() => {
                self.warn_fallback("get", key);
                self.inner.fallback.get(key).await
            }
            other => other,
        }
    }

    async fn set_value(&self, key: &str, value: JsonValue) -> Result<(), StorageError> {
        match self.bounded("set", self.inner.primary.set(key, value.clone())).await {
            Err(e) if e.is_context_invalidated() => {
                self.warn_fallback("set", key);
                self.inner.fallback.set(key, value).await
            }
            other => other,
        }
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        fut: impl std::future::Future<Output = Result<T, StorageError>>,
    ) -> Result<T, StorageError> {
        match timeout(self.inner.op_timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(StorageError::Timeout {
                operation,
                timeout_ms: self.inner.op_timeout.as_millis() as u64,
            }),
        }
    }

    fn warn_fallback(&self, operation: &str, key: &str) {
        warn!(operation, key, "primary storage context invalidated, using page-local fallback");
    }

    fn publish(&self, event: StoreEvent) {
        if self.inner.events.send(event).is_err() {
            debug!("no active store change listeners");
        }
    }
}
