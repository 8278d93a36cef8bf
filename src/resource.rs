//! File and image resources: the per-attachment state machine.
//!
//! A [`FileResource`] tracks one uploaded file through its lifecycle:
//! attach (content lands in the blob store, metadata is captured), rename
//! (a pure metadata operation that records where the blob used to live),
//! and delete (best-effort blob removal, metadata reset). An
//! [`ImageResource`] wraps a `FileResource` and adds intrinsic dimensions
//! plus a rendition map maintained by the materializer.
//!
//! Renaming never touches the store by itself. The resource records its
//! `previous_path` and, for images, raises `need_recut`; the host then
//! decides whether to relocate the existing renditions or cut fresh ones
//! at the new paths.

use crate::codec::{CodecError, ImageCodec, RASTER_EXTENSIONS};
use crate::naming::{normalize_extension, slugify, split_name};
use crate::store::{BlobStore, StoreError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Read};
use thiserror::Error;
use tracing::warn;

const DIGEST_CHUNK: usize = 64 * 1024;

#[derive(Error, Debug)]
pub enum AttachError {
    #[error("file `{0}` is empty")]
    EmptyFile(String),
    #[error("unsupported resource `{name}`: {reason}")]
    UnsupportedResource { name: String, reason: String },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] CodecError),
}

/// The model field an attachment belongs to. Determines the storage
/// directory, so two fields on one model never share blob paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldRef {
    pub model: String,
    pub field: String,
}

impl FieldRef {
    pub fn new(model: impl Into<String>, field: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            field: field.into(),
        }
    }

    /// Directory prefix under which this field's blobs live.
    pub fn storage_dir(&self) -> String {
        format!("{}/{}", slugify(&self.model), slugify(&self.field))
    }
}

/// Lifecycle state, derived from the metadata rather than stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    /// Never attached.
    Empty,
    /// Attached, path and metadata agree.
    Attached,
    /// Renamed since attach; the blob may still sit at `previous_path`.
    Renamed,
    /// Attached but the renditions no longer reflect the content.
    Stale,
    /// Deleted; metadata survives but no blob is referenced.
    Deleted,
}

/// Metadata for one attached file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileResource {
    /// Display name as uploaded, extension stripped.
    pub name: String,
    /// Slug used in the stored path. `None` until attached.
    pub slug: Option<String>,
    /// Lowercased extension without the dot. Empty for extensionless files.
    pub extension: String,
    /// SHA-256 of the content, hex encoded. Empty until attached.
    pub hash: String,
    /// Content length in bytes.
    pub size: u64,
    pub created: DateTime<Utc>,
    pub uploaded: Option<DateTime<Utc>>,
    pub modified: DateTime<Utc>,
    /// Field ownership; fixes the storage directory.
    pub owner: FieldRef,
    /// Current blob path, `None` until attached or after delete.
    pub path: Option<String>,
    /// Where the blob lived before the last rename.
    pub previous_path: Option<String>,
}

impl FileResource {
    pub fn new(owner: FieldRef) -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            slug: None,
            extension: String::new(),
            hash: String::new(),
            size: 0,
            created: now,
            uploaded: None,
            modified: now,
            owner,
            path: None,
            previous_path: None,
        }
    }

    /// Content gate, called before [`attach`](Self::attach). Plain files
    /// accept anything.
    pub fn accept(&self, _bytes: &[u8], _filename: &str) -> bool {
        true
    }

    pub fn state(&self) -> ResourceState {
        match (&self.path, &self.uploaded) {
            (Some(_), _) if self.previous_path.is_some() => ResourceState::Renamed,
            (Some(_), _) => ResourceState::Attached,
            (None, Some(_)) => ResourceState::Deleted,
            (None, None) => ResourceState::Empty,
        }
    }

    /// Stream content into the store and capture metadata.
    ///
    /// The content is digested in 64 KiB chunks while buffering, so the
    /// hash costs one pass regardless of file size. Empty content is
    /// rejected before anything is written. Re-attaching over existing
    /// content removes the blobs the resource owned at its old paths once
    /// the new blob is in place.
    pub fn attach<R: Read>(
        &mut self,
        store: &dyn BlobStore,
        mut reader: R,
        filename: &str,
    ) -> Result<(), AttachError> {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        let mut bytes = Vec::new();
        let mut chunk = vec![0u8; DIGEST_CHUNK];
        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            hasher.update(&chunk[..n]);
            bytes.extend_from_slice(&chunk[..n]);
        }
        if bytes.is_empty() {
            return Err(AttachError::EmptyFile(filename.to_string()));
        }

        let split = split_name(filename);
        let slug = slugify(&split.base);
        let extension = normalize_extension(&split.extension);
        let path = blob_path(&self.owner, &slug, &extension);
        let stale: Vec<String> = [self.path.clone(), self.previous_path.clone()]
            .into_iter()
            .flatten()
            .filter(|old| *old != path)
            .collect();
        store.write(&path, &bytes)?;

        for old in stale {
            if let Err(err) = store.delete(&old) {
                warn!(path = %old, error = %err, "failed to delete replaced blob");
            }
        }

        let now = Utc::now();
        self.name = split.base;
        self.slug = Some(slug);
        self.extension = extension;
        self.hash = format!("{:x}", hasher.finalize());
        self.size = bytes.len() as u64;
        self.uploaded = Some(now);
        self.modified = now;
        self.path = Some(path);
        self.previous_path = None;
        Ok(())
    }

    /// Rename the resource. Pure metadata: the blob is not moved here.
    ///
    /// The old path is recorded in `previous_path` so the host can either
    /// relocate the blob or regenerate at the new location. A rename to
    /// the current slug is a no-op.
    pub fn rename(&mut self, new_base: &str) {
        let slug = slugify(new_base);
        if self.slug.as_deref() == Some(slug.as_str()) {
            return;
        }
        if let Some(current) = self.path.take() {
            self.previous_path = Some(current);
        }
        self.name = new_base.to_string();
        self.path = Some(blob_path(&self.owner, &slug, &self.extension));
        self.slug = Some(slug);
        self.modified = Utc::now();
    }

    /// Delete the stored blob and reset content metadata. Best effort:
    /// a store failure is logged, not propagated, and a second call is
    /// harmless.
    pub fn delete_file(&mut self, store: &dyn BlobStore) {
        for path in [self.path.take(), self.previous_path.take()]
            .into_iter()
            .flatten()
        {
            if let Err(err) = store.delete(&path) {
                warn!(path = %path, error = %err, "failed to delete blob");
            }
        }
        self.hash.clear();
        self.size = 0;
        self.modified = Utc::now();
    }

    /// Public URL of the current blob, if attached.
    pub fn url(&self, store: &dyn BlobStore) -> Option<String> {
        self.path.as_deref().map(|p| store.url_for(p))
    }
}

fn blob_path(owner: &FieldRef, slug: &str, extension: &str) -> String {
    if extension.is_empty() {
        format!("{}/{}", owner.storage_dir(), slug)
    } else {
        format!("{}/{}.{}", owner.storage_dir(), slug, extension)
    }
}

/// One generated rendition of an image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rendition {
    pub path: String,
    pub width: u32,
    pub height: u32,
}

/// An attached image: file metadata plus intrinsic dimensions and the
/// rendition map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageResource {
    pub file: FileResource,
    pub width: u32,
    pub height: u32,
    /// Host-defined named crop region, carried as metadata.
    pub crop_region: Option<String>,
    /// Renditions keyed by variation name.
    pub renditions: BTreeMap<String, Rendition>,
    /// Set when the renditions no longer reflect the source, e.g. after
    /// attach or rename. Cleared by the materializer once everything is
    /// current.
    pub need_recut: bool,
}

impl ImageResource {
    pub fn new(owner: FieldRef) -> Self {
        Self {
            file: FileResource::new(owner),
            width: 0,
            height: 0,
            crop_region: None,
            renditions: BTreeMap::new(),
            need_recut: false,
        }
    }

    /// Content gate: the bytes must look like a raster image.
    pub fn accept(&self, bytes: &[u8], _filename: &str) -> bool {
        image::guess_format(bytes).is_ok()
    }

    /// Attach image content. The codec must support the extension and be
    /// able to probe dimensions, otherwise the upload is rejected with
    /// [`AttachError::UnsupportedResource`] before anything is stored.
    pub fn attach<R: Read>(
        &mut self,
        store: &dyn BlobStore,
        codec: &dyn ImageCodec,
        mut reader: R,
        filename: &str,
    ) -> Result<(), AttachError> {
        let split = split_name(filename);
        let extension = normalize_extension(&split.extension);
        if !codec.supports(&extension) {
            return Err(AttachError::UnsupportedResource {
                name: filename.to_string(),
                reason: format!(
                    "extension `{extension}` is not a supported raster format ({})",
                    RASTER_EXTENSIONS.join(", ")
                ),
            });
        }

        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        if bytes.is_empty() {
            return Err(AttachError::EmptyFile(filename.to_string()));
        }
        let dims = codec
            .probe(&bytes)
            .map_err(|err| AttachError::UnsupportedResource {
                name: filename.to_string(),
                reason: err.to_string(),
            })?;

        self.file.attach(store, bytes.as_slice(), filename)?;
        // The new content invalidates every existing rendition; their blobs
        // belong to this resource and nothing else references them.
        for (name, rendition) in std::mem::take(&mut self.renditions) {
            if let Err(err) = store.delete(&rendition.path) {
                warn!(variation = %name, path = %rendition.path, error = %err,
                    "failed to delete replaced rendition");
            }
        }
        self.width = dims.width;
        self.height = dims.height;
        self.need_recut = true;
        Ok(())
    }

    /// Rename the image. Renditions keep their old paths until the host
    /// relocates or regenerates them, so this raises `need_recut`.
    pub fn rename(&mut self, new_base: &str) {
        let before = self.file.slug.clone();
        self.file.rename(new_base);
        if self.file.slug != before {
            self.need_recut = true;
        }
    }

    /// Delete the original and every rendition. Best effort, idempotent.
    pub fn delete_file(&mut self, store: &dyn BlobStore) {
        for (name, rendition) in std::mem::take(&mut self.renditions) {
            if let Err(err) = store.delete(&rendition.path) {
                warn!(variation = %name, path = %rendition.path, error = %err,
                    "failed to delete rendition");
            }
        }
        self.file.delete_file(store);
        self.need_recut = false;
    }

    /// Like [`FileResource::state`], but an attached image whose
    /// renditions need recutting reports [`ResourceState::Stale`].
    pub fn state(&self) -> ResourceState {
        match self.file.state() {
            ResourceState::Attached if self.need_recut => ResourceState::Stale,
            other => other,
        }
    }
}
