//! The notification center: single authoritative registry for all
//! notifications emitted by feature modules.
//!
//! The center owns the persisted collection. It validates and
//! deduplicates incoming emits, enforces the capacity policy, persists
//! through its [`CollectionProvider`], and fans out snapshots to
//! in-context subscribers. Cross-context holders of the same store learn
//! of writes through [`watch`](NotificationCenter::watch).

use std::sync::Arc;

use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::CenterConfig;
use crate::storage::Store;

use super::errors::NotifyError;
use super::persistence::StoreCollectionProvider;
use super::persistence_iface::CollectionProvider;
use super::types::{
    now_millis, EmitRequest, ListFilter, NotificationId, NotificationRecord, NotificationStats,
};

/// Snapshot handed to subscribers after every successful mutation,
/// chronological (oldest first).
pub type CollectionSnapshot = Arc<Vec<NotificationRecord>>;

pub struct NotificationCenter {
    provider: Arc<dyn CollectionProvider>,
    config: CenterConfig,
    /// Chronological by `created_at`, insertion order on ties. The lock is
    /// held across the persist call so concurrent mutations serialize and
    /// a last-write-wins race on the full collection cannot occur.
    records: Mutex<Vec<NotificationRecord>>,
    events: broadcast::Sender<CollectionSnapshot>,
}

impl NotificationCenter {
    /// Builds a center over an explicit provider, loading the persisted
    /// collection.
    pub async fn load(
        provider: Arc<dyn CollectionProvider>,
        config: CenterConfig,
    ) -> Result<Arc<Self>, NotifyError> {
        config.validate()?;
        let mut records = provider.load().await?;
        records.sort_by_key(|r| r.created_at);
        info!(count = records.len(), "notification center loaded");
        let (events, _) = broadcast::channel(config.broadcast_capacity);
        Ok(Arc::new(Self {
            provider,
            config,
            records: Mutex::new(records),
            events,
        }))
    }

    /// Convenience constructor over the default store-backed provider.
    pub async fn with_store(store: &Store, config: CenterConfig) -> Result<Arc<Self>, NotifyError> {
        Self::load(Arc::new(StoreCollectionProvider::new(store.clone())), config).await
    }

    pub fn config(&self) -> &CenterConfig {
        &self.config
    }

    /// Accepts a notification from a feature module.
    ///
    /// Returns the stored record: a freshly created one, or the existing
    /// unread record when the emit falls inside the dedup window. Emit is
    /// atomic; if the persist fails, no in-memory state changes and
    /// [`NotifyError::Persistence`] propagates.
    pub async fn emit(&self, request: EmitRequest) -> Result<NotificationRecord, NotifyError> {
        validate(&request)?;

        let mut records = self.records.lock().await;
        let now = now_millis();

        // A zero window turns deduplication off entirely.
        let window_ms = self.config.dedup_window_ms();
        if window_ms > 0 {
            if let Some(existing) = records.iter().rev().find(|r| {
                !r.read
                    && r.module_id == request.module_id
                    && r.title == request.title
                    && r.message == request.message
                    && now.saturating_sub(r.created_at) <= window_ms
            }) {
                debug!(module_id = %request.module_id, id = %existing.id, "emit collapsed into dedup window");
                return Ok(existing.clone());
            }
        }

        let mut id = NotificationId::generate(now);
        while records.iter().any(|r| r.id == id) {
            id = NotificationId::generate(now);
        }
        let record = NotificationRecord::new(request, id, now);

        let mut next = records.clone();
        next.push(record.clone());
        next.sort_by_key(|r| r.created_at);
        if next.len() > self.config.max_records {
            let excess = next.len() - self.config.max_records;
            debug!(evicted = excess, "collection over capacity, evicting oldest");
            next.drain(..excess);
        }

        self.provider.save(&next).await?;
        *records = next;
        self.publish(&records);
        info!(module_id = %record.module_id, id = %record.id, "notification emitted");
        Ok(record)
    }

    /// Ordered view of the collection, newest first. Filters are
    /// conjunctive.
    pub async fn list(&self, filter: &ListFilter) -> Vec<NotificationRecord> {
        self.records
            .lock()
            .await
            .iter()
            .rev()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect()
    }

    /// Marks one record read. Missing ids are tolerated silently; a race
    /// with eviction is not an error. Idempotent.
    pub async fn mark_read(&self, id: &NotificationId) -> Result<(), NotifyError> {
        let mut records = self.records.lock().await;
        let Some(pos) = records.iter().position(|r| &r.id == id) else {
            debug!(%id, "mark_read on unknown id, ignoring");
            return Ok(());
        };
        if records[pos].read {
            return Ok(());
        }

        let mut next = records.clone();
        next[pos].mark_read();
        self.provider.save(&next).await?;
        *records = next;
        self.publish(&records);
        Ok(())
    }

    pub async fn mark_all_read(&self) -> Result<(), NotifyError> {
        let mut records = self.records.lock().await;
        if records.iter().all(|r| r.read) {
            return Ok(());
        }

        let mut next = records.clone();
        for record in next.iter_mut() {
            record.mark_read();
        }
        self.provider.save(&next).await?;
        *records = next;
        self.publish(&records);
        Ok(())
    }

    /// Deletes one record. Missing ids are tolerated silently.
    pub async fn clear(&self, id: &NotificationId) -> Result<(), NotifyError> {
        let mut records = self.records.lock().await;
        let Some(pos) = records.iter().position(|r| &r.id == id) else {
            debug!(%id, "clear on unknown id, ignoring");
            return Ok(());
        };

        let mut next = records.clone();
        next.remove(pos);
        self.provider.save(&next).await?;
        *records = next;
        self.publish(&records);
        Ok(())
    }

    pub async fn clear_all(&self) -> Result<(), NotifyError> {
        let mut records = self.records.lock().await;
        if records.is_empty() {
            return Ok(());
        }

        let next = Vec::new();
        self.provider.save(&next).await?;
        *records = next;
        self.publish(&records);
        info!("notification collection cleared");
        Ok(())
    }

    pub async fn stats(&self) -> NotificationStats {
        let records = self.records.lock().await;
        NotificationStats {
            total: records.len(),
            unread: records.iter().filter(|r| !r.read).count(),
        }
    }

    /// Subscribes to collection snapshots. Dropping the receiver
    /// unsubscribes.
    pub fn subscribe(&self) -> broadcast::Receiver<CollectionSnapshot> {
        self.events.subscribe()
    }

    /// Reloads the collection from the provider and re-notifies listeners
    /// if it differs from the in-memory view. Echoes of this center's own
    /// writes are no-ops.
    pub async fn resync(&self) -> Result<(), NotifyError> {
        let mut loaded = self.provider.load().await?;
        loaded.sort_by_key(|r| r.created_at);

        let mut records = self.records.lock().await;
        if *records != loaded {
            debug!(count = loaded.len(), "external write detected, re-syncing collection");
            *records = loaded;
            self.publish(&records);
        }
        Ok(())
    }

    /// Spawns a task that follows the store's change events and re-syncs
    /// on writes to the notifications key from other contexts. The task
    /// ends when the store is dropped; abort the handle to stop earlier.
    pub fn watch(self: &Arc<Self>, store: &Store) -> JoinHandle<()> {
        let center = Arc::clone(self);
        let mut changes = store.subscribe_changes();
        tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(event) if event.touches(center.provider.storage_key()) => {
                        if let Err(e) = center.resync().await {
                            warn!(error = %e, "re-sync after store change failed");
                        }
                    }
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "store change listener lagged, re-syncing");
                        if let Err(e) = center.resync().await {
                            warn!(error = %e, "re-sync after lag failed");
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("store change listener terminated");
        })
    }

    fn publish(&self, records: &[NotificationRecord]) {
        if self.events.send(Arc::new(records.to_vec())).is_err() {
            debug!("no active notification listeners");
        }
    }
}

fn validate(request: &EmitRequest) -> Result<(), NotifyError> {
    if request.module_id.trim().is_empty() {
        return Err(NotifyError::invalid_data("module_id", "must be non-empty"));
    }
    if request.title.trim().is_empty() {
        return Err(NotifyError::invalid_data("title", "must be non-empty"));
    }
    Ok(())
}
