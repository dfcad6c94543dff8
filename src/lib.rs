//! Notification center core for the Sidekick assistant.
//!
//! Independent feature modules (gym switch, mug warning, stock advisor,
//! ...) emit structured records through [`NotificationCenter::emit`]; the
//! center validates, deduplicates, persists, and fans them out to the
//! delivery channels (popup list, in-page banner feed). Persistence goes
//! through [`Store`], a key-value facade with a transparent in-memory
//! fallback for invalidated primary contexts.
//!
//! Feature modules receive the center by dependency injection at startup
//! and only ever see its public operations; the storage key is owned by
//! this crate.

pub mod channels;
pub mod config;
pub mod logging;
pub mod notifications;
pub mod storage;

pub use channels::{BannerFeed, PopupList};
pub use config::{CenterConfig, ConfigError};
pub use notifications::{
    CollectionProvider, CollectionSnapshot, EmitRequest, ListFilter, NotificationAction,
    NotificationCenter, NotificationId, NotificationKind, NotificationRecord, NotificationStats,
    NotifyError, StoreCollectionProvider, NOTIFICATIONS_KEY,
};
pub use storage::{FileBackend, MemoryBackend, StorageBackend, StorageError, Store, StoreEvent};
