use async_trait::async_trait;

use super::errors::NotifyError;
use super::types::NotificationRecord;

/// Mediates load/save of the full ordered collection.
///
/// The center is the only caller; the seam exists so tests can inject
/// failing providers and exercise the rollback path.
#[async_trait]
pub trait CollectionProvider: Send + Sync {
    /// Store key the collection lives under, used to match external
    /// change events.
    fn storage_key(&self) -> &str;

    async fn load(&self) -> Result<Vec<NotificationRecord>, NotifyError>;
    async fn save(&self, records: &[NotificationRecord]) -> Result<(), NotifyError>;
}
