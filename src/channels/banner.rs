//! In-page banner feed: transient surfacing of newly arrived records.

use std::collections::{HashSet, VecDeque};
use std::sync::Arc;

use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::notifications::{
    ListFilter, NotificationCenter, NotificationId, NotificationRecord, NotifyError,
};

/// How many banners may be on screen at once before the oldest is pushed
/// out.
pub const DEFAULT_MAX_VISIBLE: usize = 3;

struct FeedState {
    visible: VecDeque<NotificationRecord>,
    /// Ids already surfaced (or present before the feed opened); only
    /// records arriving after open become banners.
    surfaced: HashSet<NotificationId>,
}

impl FeedState {
    fn apply(&mut self, snapshot: &[NotificationRecord], max_visible: usize) {
        // A record read or cleared elsewhere leaves the screen too.
        self.visible
            .retain(|shown| snapshot.iter().any(|r| r.id == shown.id && !r.read));

        for record in snapshot {
            if record.read || self.surfaced.contains(&record.id) {
                continue;
            }
            self.surfaced.insert(record.id.clone());
            if self.visible.len() >= max_visible {
                self.visible.pop_front();
            }
            self.visible.push_back(record.clone());
        }
    }
}

/// Read-side consumer that turns fresh unread records into transient
/// banners. Holds no state beyond what the center's snapshots provide.
pub struct BannerFeed {
    center: Arc<NotificationCenter>,
    state: Arc<RwLock<FeedState>>,
    listener: JoinHandle<()>,
}

impl BannerFeed {
    pub async fn open(center: Arc<NotificationCenter>) -> Self {
        Self::with_max_visible(center, DEFAULT_MAX_VISIBLE).await
    }

    pub async fn with_max_visible(center: Arc<NotificationCenter>, max_visible: usize) -> Self {
        // Subscribe before seeding so a mutation interleaving with the
        // initial fetch is replayed instead of missed.
        let mut snapshots = center.subscribe();
        let existing = center.list(&ListFilter::default()).await;
        let state = Arc::new(RwLock::new(FeedState {
            visible: VecDeque::new(),
            surfaced: existing.into_iter().map(|r| r.id).collect(),
        }));
        let task_state = Arc::clone(&state);
        let task_center = Arc::clone(&center);
        let listener = tokio::spawn(async move {
            loop {
                match snapshots.recv().await {
                    Ok(snapshot) => {
                        task_state.write().await.apply(&snapshot, max_visible);
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!(missed = n, "banner listener lagged, refetching full list");
                        let snapshot: Vec<_> = task_center
                            .list(&ListFilter::default())
                            .await
                            .into_iter()
                            .rev()
                            .collect();
                        task_state.write().await.apply(&snapshot, max_visible);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            debug!("banner listener terminated");
        });

        Self {
            center,
            state,
            listener,
        }
    }

    /// Banners currently on screen, oldest first.
    pub async fn visible(&self) -> Vec<NotificationRecord> {
        self.state.read().await.visible.iter().cloned().collect()
    }

    /// User dismissal: the record is marked read, which also removes it
    /// from the screen of every other open channel.
    pub async fn dismiss(&self, record: &NotificationRecord) -> Result<(), NotifyError> {
        self.center.mark_read(&record.id).await
    }
}

impl Drop for BannerFeed {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CenterConfig;
    use crate::notifications::EmitRequest;
    use crate::storage::Store;
    use std::time::Duration;

    fn request(title: &str) -> EmitRequest {
        EmitRequest {
            module_id: "mug-warning".to_string(),
            title: title.to_string(),
            ..Default::default()
        }
    }

    async fn wait_for_visible(feed: &BannerFeed, expected: usize) -> Vec<NotificationRecord> {
        for _ in 0..100 {
            let visible = feed.visible().await;
            if visible.len() == expected {
                return visible;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("banner feed never reached {expected} visible banners");
    }

    async fn dedup_free_center() -> Arc<NotificationCenter> {
        NotificationCenter::with_store(
            &Store::in_memory(),
            CenterConfig {
                dedup_window_secs: 0,
                ..Default::default()
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn records_present_before_open_do_not_banner() {
        let center = dedup_free_center().await;
        center.emit(request("old news")).await.unwrap();

        let feed = BannerFeed::open(Arc::clone(&center)).await;
        center.emit(request("breaking")).await.unwrap();

        let visible = wait_for_visible(&feed, 1).await;
        assert_eq!(visible[0].title, "breaking");
    }

    #[tokio::test]
    async fn visible_count_is_capped_oldest_first_out() {
        let center = dedup_free_center().await;
        let feed = BannerFeed::with_max_visible(Arc::clone(&center), 2).await;

        for i in 0..3 {
            center.emit(request(&format!("b{i}"))).await.unwrap();
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        // Wait for the last emit to surface before asserting the cap.
        for _ in 0..100 {
            if feed
                .visible()
                .await
                .iter()
                .any(|r| r.title == "b2")
            {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let visible = feed.visible().await;
        assert_eq!(visible.len(), 2);
        assert_eq!(visible[0].title, "b1");
        assert_eq!(visible[1].title, "b2");
    }

    #[tokio::test]
    async fn dismiss_marks_read_and_hides_everywhere() {
        let center = dedup_free_center().await;
        let feed = BannerFeed::open(Arc::clone(&center)).await;

        center.emit(request("dismiss me")).await.unwrap();
        let visible = wait_for_visible(&feed, 1).await;

        feed.dismiss(&visible[0]).await.unwrap();
        wait_for_visible(&feed, 0).await;
        assert!(center.list(&ListFilter::unread()).await.is_empty());
    }

    #[tokio::test]
    async fn read_elsewhere_removes_the_banner() {
        let center = dedup_free_center().await;
        let feed = BannerFeed::open(Arc::clone(&center)).await;

        let record = center.emit(request("seen in popup")).await.unwrap();
        wait_for_visible(&feed, 1).await;

        center.mark_read(&record.id).await.unwrap();
        wait_for_visible(&feed, 0).await;
    }
}
