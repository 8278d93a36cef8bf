//! Blob store contract and reference backends.
//!
//! The [`BlobStore`] trait is the only way the crate touches stored bytes:
//! write at a deterministic path, read back, existence check, idempotent
//! delete, and public-URL resolution. Resources and the materializer are
//! written against the trait so a host can plug in object storage or a
//! CDN-backed store without touching lifecycle logic.
//!
//! Two implementations ship with the crate:
//!
//! - [`MemoryStore`] — a `Mutex<HashMap>`; the default for unit tests and
//!   for hosts that stage uploads before committing them elsewhere.
//! - [`LocalStore`] — files under a root directory, paths mirrored 1:1.
//!
//! Paths are relative, `/`-separated strings. `delete` must not fail on an
//! already-absent path; callers rely on that for best-effort cascades.

use std::collections::HashMap;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
}

/// Byte storage + URL resolution contract.
pub trait BlobStore: Sync {
    /// Store bytes at `path`, overwriting any existing blob.
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError>;

    /// Read the blob at `path`.
    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError>;

    /// Whether a blob exists at `path`.
    fn exists(&self, path: &str) -> bool;

    /// Delete the blob at `path`. Deleting an absent path is `Ok`.
    fn delete(&self, path: &str) -> Result<(), StoreError>;

    /// Public URL for the blob at `path`.
    fn url_for(&self, path: &str) -> String;
}

/// In-memory store. `Mutex` (not `RefCell`) so it is `Sync` and shareable
/// across test threads.
#[derive(Default)]
pub struct MemoryStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    base_url: String,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            base_url: "memory:/".to_string(),
        }
    }

    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            blobs: Mutex::new(HashMap::new()),
            base_url: base_url.into(),
        }
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of stored paths.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.blobs.lock().unwrap().keys().cloned().collect();
        paths.sort();
        paths
    }
}

impl BlobStore for MemoryStore {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        self.blobs
            .lock()
            .unwrap()
            .insert(path.to_string(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        self.blobs
            .lock()
            .unwrap()
            .get(path)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> bool {
        self.blobs.lock().unwrap().contains_key(path)
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        self.blobs.lock().unwrap().remove(path);
        Ok(())
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

/// Filesystem store rooted at a directory.
///
/// Blob paths map 1:1 to files under the root; parent directories are
/// created on write. Paths with `..` or absolute components are rejected so
/// a hostile path can never escape the root.
pub struct LocalStore {
    root: PathBuf,
    base_url: String,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into(),
        }
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StoreError> {
        let rel = Path::new(path);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || !safe {
            return Err(StoreError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

impl BlobStore for LocalStore {
    fn write(&self, path: &str, bytes: &[u8]) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(full, bytes)?;
        Ok(())
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StoreError> {
        let full = self.resolve(path)?;
        match std::fs::read(full) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(StoreError::NotFound(path.to_string()))
            }
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path).map(|p| p.is_file()).unwrap_or(false)
    }

    fn delete(&self, path: &str) -> Result<(), StoreError> {
        let full = self.resolve(path)?;
        match std::fs::remove_file(full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(StoreError::Io(e)),
        }
    }

    fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), path)
}
