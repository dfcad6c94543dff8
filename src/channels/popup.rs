//! Popup list renderer: the read model behind the extension popup.

use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::notifications::{ListFilter, NotificationCenter, NotificationRecord, NotifyError};

/// Pure read-side consumer of the center.
///
/// On open it fetches the full list and subscribes; every snapshot refreshes
/// the rows, so the popup can never diverge from the persisted source of
/// truth. User interactions forward to the center. Dropping the handle (or
/// calling [`close`](PopupList::close)) unsubscribes.
pub struct PopupList {
    center: Arc<NotificationCenter>,
    rows: Arc<RwLock<Vec<NotificationRecord>>>,
    listener: JoinHandle<()>,
}

impl PopupList {
    pub async fn open(center: Arc<NotificationCenter>) -> Self {
        // Subscribe before the initial fetch so a mutation interleaving
        // between the two is replayed instead of missed.
        let mut snapshots = center.subscribe();
        let rows = Arc::new(RwLock::new(center.list(&ListFilter::default()).await));

        let task_rows = Arc::clone(&rows);
        let task_center = Arc::clone(&center);
        let listener = tokio::spawn(async move {
            loop {
                match snapshots.recv().await {
                    Ok(snapshot) => {
                        // Snapshots arrive chronological; the popup shows
                        // newest first.
                        *task_rows.write().await =
                            snapshot.iter().rev().cloned().collect();
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "popup listener lagged, refetching full list");
                        *task_rows.write().await = task_center.list(&ListFilter::default()).await;
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("popup listener terminated");
        });

        Self {
            center,
            rows,
            listener,
        }
    }

    /// Rows to render, newest first.
    pub async fn rows(&self) -> Vec<NotificationRecord> {
        self.rows.read().await.clone()
    }

    pub async fn unread_count(&self) -> usize {
        self.rows.read().await.iter().filter(|r| !r.read).count()
    }

    pub async fn mark_read(&self, record: &NotificationRecord) -> Result<(), NotifyError> {
        self.center.mark_read(&record.id).await
    }

    pub async fn mark_all_read(&self) -> Result<(), NotifyError> {
        self.center.mark_all_read().await
    }

    pub async fn clear(&self, record: &NotificationRecord) -> Result<(), NotifyError> {
        self.center.clear(&record.id).await
    }

    pub async fn clear_all(&self) -> Result<(), NotifyError> {
        self.center.clear_all().await
    }

    /// Unsubscribes and drops the read model.
    pub fn close(self) {}
}

impl Drop for PopupList {
    fn drop(&mut self) {
        self.listener.abort();
    }
}
