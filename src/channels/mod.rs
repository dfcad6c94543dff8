//! Delivery channels: passive read-side consumers of the center.

pub mod banner;
pub mod popup;

pub use banner::{BannerFeed, DEFAULT_MAX_VISIBLE};
pub use popup::PopupList;
