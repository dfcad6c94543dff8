// Core notification logic: record model, errors, persistence, center.

pub mod center;
pub mod errors;
pub mod persistence;
pub mod persistence_iface;
pub mod types;

pub use center::{CollectionSnapshot, NotificationCenter};
pub use errors::NotifyError;
pub use persistence::{StoreCollectionProvider, NOTIFICATIONS_KEY};
pub use persistence_iface::CollectionProvider;
pub use types::{
    EmitRequest, ListFilter, NotificationAction, NotificationId, NotificationKind,
    NotificationRecord, NotificationStats,
};
