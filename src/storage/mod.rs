//! Durable key-value persistence with an in-memory fallback.
//!
//! Every other component goes through [`Store`]. Backends are pluggable
//! behind [`StorageBackend`]; the file backend stands in for the
//! extension's `storage.local` area and the memory backend for the
//! page-local fallback that takes over when the primary context is
//! invalidated.

pub mod backend;
pub mod error;
pub mod file;
pub mod store;

pub use backend::{MemoryBackend, StorageBackend};
pub use error::StorageError;
pub use file::FileBackend;
pub use store::{Store, StoreEvent, DEFAULT_OP_TIMEOUT};
