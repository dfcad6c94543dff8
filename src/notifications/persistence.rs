//! Store-backed collection persistence.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::storage::Store;

use super::errors::NotifyError;
use super::persistence_iface::CollectionProvider;
use super::types::NotificationRecord;

/// The sole persisted representation of the collection lives under this
/// key. Nothing outside this module may write it directly.
pub const NOTIFICATIONS_KEY: &str = "sidekick_notifications";

pub struct StoreCollectionProvider {
    store: Store,
    key: String,
}

impl StoreCollectionProvider {
    pub fn new(store: Store) -> Self {
        Self::with_key(store, NOTIFICATIONS_KEY)
    }

    pub fn with_key(store: Store, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }
}

#[async_trait]
impl CollectionProvider for StoreCollectionProvider {
    fn storage_key(&self) -> &str {
        &self.key
    }

    async fn load(&self) -> Result<Vec<NotificationRecord>, NotifyError> {
        debug!(key = %self.key, "loading notification collection");
        match self.store.get::<Vec<NotificationRecord>>(&self.key).await? {
            Some(records) => Ok(records),
            None => {
                info!(key = %self.key, "no persisted notifications, starting empty");
                Ok(Vec::new())
            }
        }
    }

    async fn save(&self, records: &[NotificationRecord]) -> Result<(), NotifyError> {
        debug!(key = %self.key, count = records.len(), "saving notification collection");
        self.store
            .set(&self.key, &records)
            .await
            .map_err(|source| NotifyError::persistence("save", source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notifications::types::{EmitRequest, NotificationId};
    use crate::storage::{FileBackend, Store};
    use std::sync::Arc;
    use tempfile::tempdir;

    fn record(title: &str, created_at: i64) -> NotificationRecord {
        NotificationRecord::new(
            EmitRequest {
                module_id: "test-module".to_string(),
                title: title.to_string(),
                ..Default::default()
            },
            NotificationId::generate(created_at),
            created_at,
        )
    }

    #[tokio::test]
    async fn missing_key_loads_as_empty() {
        let provider = StoreCollectionProvider::new(Store::in_memory());
        assert!(provider.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_preserves_order_and_fields() {
        let provider = StoreCollectionProvider::new(Store::in_memory());
        let records = vec![record("first", 1), record("second", 2)];

        provider.save(&records).await.unwrap();
        let loaded = provider.load().await.unwrap();
        assert_eq!(loaded, records);
    }

    /// Backend that accepts reads but refuses every write.
    struct ReadOnlyBackend;

    #[async_trait::async_trait]
    impl crate::storage::StorageBackend for ReadOnlyBackend {
        async fn get(
            &self,
            _key: &str,
        ) -> Result<Option<serde_json::Value>, crate::storage::StorageError> {
            Ok(None)
        }
        async fn set(
            &self,
            key: &str,
            _value: serde_json::Value,
        ) -> Result<(), crate::storage::StorageError> {
            Err(crate::storage::StorageError::Io {
                path: key.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            })
        }
        async fn remove(&self, _key: &str) -> Result<(), crate::storage::StorageError> {
            Ok(())
        }
        async fn clear(&self) -> Result<(), crate::storage::StorageError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn save_failure_maps_to_persistence_error() {
        let provider = StoreCollectionProvider::new(Store::new(Arc::new(ReadOnlyBackend)));
        match provider.save(&[record("blocked", 1)]).await {
            Err(NotifyError::Persistence { operation, .. }) => assert_eq!(operation, "save"),
            other => panic!("expected persistence error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn survives_reopening_the_backing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("s.json");

        let backend = Arc::new(FileBackend::open(&path).await.unwrap());
        let provider = StoreCollectionProvider::new(Store::new(backend));
        let records = vec![record("durable", 7)];
        provider.save(&records).await.unwrap();

        let reopened = Arc::new(FileBackend::open(&path).await.unwrap());
        let fresh = StoreCollectionProvider::new(Store::new(reopened));
        assert_eq!(fresh.load().await.unwrap(), records);
    }
}
