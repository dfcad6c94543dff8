//! File-backed storage backend.
//!
//! Persists the whole key-value map as one pretty-printed JSON document,
//! the same shape a browser extension's `storage.local` snapshot has. The
//! map is read once on open and kept in memory; every mutation rewrites
//! the file.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::sync::RwLock;
use tracing::debug;

use super::backend::StorageBackend;
use super::error::StorageError;

pub struct FileBackend {
    path: PathBuf,
    cells: RwLock<HashMap<String, JsonValue>>,
    invalidated: AtomicBool,
}

impl FileBackend {
    /// Opens the backing file, loading any existing map. A missing file
    /// starts an empty map; it is created on the first write.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let cells = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "storage file not found, starting empty");
                HashMap::new()
            }
            Err(source) => return Err(Self::io_error(&path, source)),
        };
        Ok(Self {
            path,
            cells: RwLock::new(cells),
            invalidated: AtomicBool::new(false),
        })
    }

    /// Marks this backend's context as gone. Every subsequent operation
    /// fails with [`StorageError::ContextInvalidated`], which the store
    /// answers by switching to its fallback area. Models an extension
    /// reload observed by a page holding a stale handle.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::SeqCst);
    }

    pub fn is_invalidated(&self) -> bool {
        self.invalidated.load(Ordering::SeqCst)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_live(&self) -> Result<(), StorageError> {
        if self.is_invalidated() {
            return Err(StorageError::ContextInvalidated);
        }
        Ok(())
    }

    fn io_error(path: &Path, source: io::Error) -> StorageError {
        StorageError::Io {
            path: path.display().to_string(),
            source,
        }
    }

    async fn flush(&self, cells: &HashMap<String, JsonValue>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| Self::io_error(&self.path, e))?;
            }
        }
        let bytes = serde_json::to_vec_pretty(cells)?;
        tokio::fs::write(&self.path, bytes)
            .await
            .map_err(|e| Self::io_error(&self.path, e))
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, StorageError> {
        self.ensure_live()?;
        Ok(self.cells.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: JsonValue) -> Result<(), StorageError> {
        self.ensure_live()?;
        let mut cells = self.cells.write().await;
        // Stage on a working copy; the map only commits what reached disk.
        let mut next = cells.clone();
        next.insert(key.to_string(), value);
        self.flush(&next).await?;
        *cells = next;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.ensure_live()?;
        let mut cells = self.cells.write().await;
        let mut next = cells.clone();
        next.remove(key);
        self.flush(&next).await?;
        *cells = next;
        Ok(())
    }

    async fn clear(&self) -> Result<(), StorageError> {
        self.ensure_live()?;
        let mut cells = self.cells.write().await;
        let next = HashMap::new();
        self.flush(&next).await?;
        *cells = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[tokio::test]
    async fn round_trips_through_the_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");

        let backend = FileBackend::open(&path).await.unwrap();
        backend.set("answer", json!(42)).await.unwrap();
        drop(backend);

        let reopened = FileBackend::open(&path).await.unwrap();
        assert_eq!(reopened.get("answer").await.unwrap(), Some(json!(42)));
    }

    #[tokio::test]
    async fn missing_file_starts_empty() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("fresh.json")).await.unwrap();
        assert_eq!(backend.get("anything").await.unwrap(), None);
    }

    #[tokio::test]
    async fn invalidated_backend_rejects_every_operation() {
        let dir = tempdir().unwrap();
        let backend = FileBackend::open(dir.path().join("store.json")).await.unwrap();
        backend.set("k", json!(1)).await.unwrap();

        backend.invalidate();
        assert!(backend.get("k").await.unwrap_err().is_context_invalidated());
        assert!(backend
            .set("k", json!(2))
            .await
            .unwrap_err()
            .is_context_invalidated());
        assert!(backend.remove("k").await.unwrap_err().is_context_invalidated());
        assert!(backend.clear().await.unwrap_err().is_context_invalidated());
    }

    #[tokio::test]
    async fn failed_flush_commits_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("store.json");
        let backend = FileBackend::open(&path).await.unwrap();
        backend.set("kept", json!("on disk")).await.unwrap();

        // A directory at the backing path makes every flush fail.
        tokio::fs::remove_file(&path).await.unwrap();
        tokio::fs::create_dir(&path).await.unwrap();

        assert!(backend.set("phantom", json!(1)).await.is_err());
        assert_eq!(backend.get("phantom").await.unwrap(), None);

        assert!(backend.remove("kept").await.is_err());
        assert_eq!(backend.get("kept").await.unwrap(), Some(json!("on disk")));

        assert!(backend.clear().await.is_err());
        assert_eq!(backend.get("kept").await.unwrap(), Some(json!("on disk")));
    }

    #[tokio::test]
    async fn corrupt_file_surfaces_serialization_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        tokio::fs::write(&path, b"not json at all").await.unwrap();

        match FileBackend::open(&path).await {
            Err(StorageError::Serialization(_)) => {}
            other => panic!("expected serialization error, got {:?}", other.map(|_| ())),
        }
    }
}
