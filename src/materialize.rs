//! Rendition production: turning a variation set into stored blobs.
//!
//! The [`Materializer`] owns the machinery around a single image resource:
//! it reads the original from the blob store, runs the codec per resolved
//! variation, writes each rendition next to the original, and records the
//! result on the resource. Failures are collected per variation and never
//! abort the run, so one bad encode leaves every other rendition in place.
//!
//! When a [`TaskQueue`] is attached, [`materialize`](Materializer::materialize)
//! defers instead: it enqueues the pending variation names and produces
//! nothing synchronously. A worker later drives the same call on a
//! materializer without a queue.
//!
//! After a rename, [`relocate`](Materializer::relocate) moves the original
//! and every rendition to their new paths without re-encoding anything.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, warn};

use crate::codec::{CodecError, ImageCodec, TransformParams};
use crate::queue::TaskQueue;
use crate::resource::{ImageResource, Rendition};
use crate::sizing::{compute_output_box, SizingError};
use crate::store::{BlobStore, StoreError};
use crate::variations::{VariationSet, VariationSpec};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MaterializeError {
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Sizing(#[from] SizingError),
    #[error("postprocess failed: {0}")]
    Postprocess(String),
}

/// Hook run on each finished rendition when its variation declares a
/// `postprocess` command.
pub trait Postprocessor: Sync {
    fn run(&self, command: &str, rendition_path: &str) -> Result<(), String>;
}

/// What one materialization run did.
#[derive(Debug, Default)]
pub struct MaterializeOutcome {
    /// Variations written during this run.
    pub produced: BTreeSet<String>,
    /// Variations that failed, with the reason. Never aborts the run.
    pub failed: BTreeMap<String, MaterializeError>,
    /// True when the work was handed to the task queue instead.
    pub deferred: bool,
}

impl MaterializeOutcome {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Renditions present vs. expected, from [`Materializer::verify`].
#[derive(Debug, Default, PartialEq)]
pub struct VerifyReport {
    /// Resolved variations with no stored rendition.
    pub missing: Vec<String>,
    /// Recorded renditions no resolved variation accounts for.
    pub orphans: Vec<String>,
}

impl VerifyReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.orphans.is_empty()
    }
}

pub struct Materializer<'a> {
    store: &'a dyn BlobStore,
    codec: &'a dyn ImageCodec,
    queue: Option<&'a dyn TaskQueue>,
    postprocessor: Option<&'a dyn Postprocessor>,
}

impl<'a> Materializer<'a> {
    pub fn new(store: &'a dyn BlobStore, codec: &'a dyn ImageCodec) -> Self {
        Self {
            store,
            codec,
            queue: None,
            postprocessor: None,
        }
    }

    /// Defer materialization to `queue` instead of cutting synchronously.
    pub fn with_queue(mut self, queue: &'a dyn TaskQueue) -> Self {
        self.queue = Some(queue);
        self
    }

    pub fn with_postprocessor(mut self, postprocessor: &'a dyn Postprocessor) -> Self {
        self.postprocessor = Some(postprocessor);
        self
    }

    /// Produce renditions for `image` per the resolved `set`.
    ///
    /// `requested` narrows the run to the named variations and forces them
    /// to be recut even when fresh; `None` covers the whole set, skipping
    /// renditions that already exist unless `need_recut` is raised.
    ///
    /// `need_recut` is cleared only when the run ends with no failures and
    /// every resolved variation present.
    pub fn materialize(
        &self,
        image: &mut ImageResource,
        set: &VariationSet,
        requested: Option<&BTreeSet<String>>,
    ) -> MaterializeOutcome {
        let mut outcome = MaterializeOutcome::default();
        let Some(original_path) = image.file.path.clone() else {
            return outcome;
        };

        let targets: Vec<&VariationSpec> = set
            .iter()
            .filter(|spec| requested.is_none_or(|names| names.contains(&spec.name)))
            .collect();

        if let Some(queue) = self.queue {
            let pending: Vec<String> = targets
                .iter()
                .filter(|spec| self.needs_cut(image, spec, requested))
                .map(|spec| spec.name.clone())
                .collect();
            if !pending.is_empty() {
                queue.enqueue("materialize", &original_path, &pending);
            }
            outcome.deferred = true;
            return outcome;
        }

        // The original must live at the current path before any rendition
        // is cut next to it. After a rename it may still sit at the old
        // location.
        let source = match self.ensure_original(image, &original_path) {
            Ok(bytes) => bytes,
            Err(err) => {
                warn!(path = %original_path, error = %err, "original unavailable");
                image.need_recut = true;
                outcome.failed.insert("<original>".to_string(), err);
                return outcome;
            }
        };

        for spec in &targets {
            if !self.needs_cut(image, spec, requested) {
                continue;
            }
            match self.cut_one(image, spec, &original_path, &source) {
                Ok(rendition) => {
                    debug!(variation = %spec.name, path = %rendition.path, "rendition written");
                    if let Some(old) = image.renditions.insert(spec.name.clone(), rendition) {
                        let current = &image.renditions[&spec.name].path;
                        if old.path != *current {
                            if let Err(err) = self.store.delete(&old.path) {
                                warn!(path = %old.path, error = %err,
                                    "failed to delete stale rendition");
                            }
                        }
                    }
                    outcome.produced.insert(spec.name.clone());
                }
                Err(err) => {
                    warn!(variation = %spec.name, error = %err, "rendition failed");
                    outcome.failed.insert(spec.name.clone(), err);
                }
            }
        }

        if outcome.failed.is_empty()
            && set.iter().all(|spec| image.renditions.contains_key(&spec.name))
        {
            image.need_recut = false;
        }
        outcome
    }

    /// Move the original and every rendition to the paths implied by the
    /// current name, without re-encoding. Used after rename when the pixels
    /// have not changed.
    pub fn relocate(&self, image: &mut ImageResource) -> MaterializeOutcome {
        let mut outcome = MaterializeOutcome::default();
        let Some(new_path) = image.file.path.clone() else {
            return outcome;
        };

        if let Some(old_path) = image.file.previous_path.clone() {
            match self.copy_blob(&old_path, &new_path) {
                Ok(()) => {
                    if let Err(err) = self.store.delete(&old_path) {
                        warn!(path = %old_path, error = %err, "failed to delete old original");
                    }
                    image.file.previous_path = None;
                }
                Err(err) => {
                    warn!(from = %old_path, to = %new_path, error = %err,
                        "failed to relocate original");
                    image.need_recut = true;
                    outcome.failed.insert("<original>".to_string(), err);
                    return outcome;
                }
            }
        }

        let moved: Vec<(String, Rendition)> = image
            .renditions
            .iter()
            .map(|(name, r)| (name.clone(), r.clone()))
            .collect();
        for (name, rendition) in moved {
            // Keep the old rendition's extension; the pixels do not change.
            let ext = if rendition.path.ends_with(&format!(".{name}")) {
                String::new()
            } else {
                rendition
                    .path
                    .rsplit_once('.')
                    .map_or(String::new(), |(_, e)| e.to_string())
            };
            let target = rendition_path(&new_path, &name, &ext);
            if target == rendition.path {
                continue;
            }
            match self.copy_blob(&rendition.path, &target) {
                Ok(()) => {
                    if let Err(err) = self.store.delete(&rendition.path) {
                        warn!(path = %rendition.path, error = %err,
                            "failed to delete old rendition");
                    }
                    if let Some(entry) = image.renditions.get_mut(&name) {
                        entry.path = target.clone();
                    }
                    outcome.produced.insert(name);
                }
                Err(err) => {
                    warn!(variation = %name, from = %rendition.path, to = %target,
                        error = %err, "failed to relocate rendition");
                    outcome.failed.insert(name, err);
                }
            }
        }

        if outcome.failed.is_empty() {
            image.need_recut = false;
        } else {
            image.need_recut = true;
        }
        outcome
    }

    /// Compare the recorded rendition map against the resolved set and the
    /// store.
    pub fn verify(&self, image: &ImageResource, set: &VariationSet) -> VerifyReport {
        let mut report = VerifyReport::default();
        for spec in set {
            let present = image
                .renditions
                .get(&spec.name)
                .is_some_and(|r| self.store.exists(&r.path));
            if !present {
                report.missing.push(spec.name.clone());
            }
        }
        for name in image.renditions.keys() {
            if set.get(name).is_none() {
                report.orphans.push(name.clone());
            }
        }
        report
    }

    fn needs_cut(
        &self,
        image: &ImageResource,
        spec: &VariationSpec,
        requested: Option<&BTreeSet<String>>,
    ) -> bool {
        if requested.is_some() || image.need_recut {
            return true;
        }
        !image
            .renditions
            .get(&spec.name)
            .is_some_and(|r| self.store.exists(&r.path))
    }

    fn ensure_original(
        &self,
        image: &mut ImageResource,
        path: &str,
    ) -> Result<Vec<u8>, MaterializeError> {
        if self.store.exists(path) {
            if let Some(previous) = image.file.previous_path.take() {
                if previous != path {
                    if let Err(err) = self.store.delete(&previous) {
                        warn!(path = %previous, error = %err, "failed to delete old original");
                    }
                }
            }
            return Ok(self.store.read(path)?);
        }
        let Some(previous) = image.file.previous_path.clone() else {
            return Err(MaterializeError::Store(StoreError::NotFound(
                path.to_string(),
            )));
        };
        let bytes = self.store.read(&previous)?;
        self.store.write(path, &bytes)?;
        if let Err(err) = self.store.delete(&previous) {
            warn!(path = %previous, error = %err, "failed to delete old original");
        }
        // The original now lives at the current path; the old location must
        // not be consulted again even if renditions fail below.
        image.file.previous_path = None;
        Ok(bytes)
    }

    fn cut_one(
        &self,
        image: &ImageResource,
        spec: &VariationSpec,
        original_path: &str,
        source: &[u8],
    ) -> Result<Rendition, MaterializeError> {
        let output =
            compute_output_box(image.width, image.height, spec.width, spec.height, spec.policy)?;
        let format = spec.format.resolve(&image.file.extension);
        let params = TransformParams {
            width: output.width,
            height: output.height,
            crop: output.crop,
            format,
            quality: spec.quality,
        };
        let encoded = self.codec.transform(source, &params)?;

        let ext = cut_extension(spec, &image.file.extension);
        let path = rendition_path(original_path, &spec.name, &ext);
        self.store.write(&path, &encoded)?;

        if let Some(command) = &spec.postprocess {
            let runner = self
                .postprocessor
                .ok_or_else(|| MaterializeError::Postprocess(format!(
                    "variation `{}` declares `{command}` but no postprocessor is attached",
                    spec.name
                )))?;
            runner
                .run(command, &path)
                .map_err(MaterializeError::Postprocess)?;
        }

        Ok(Rendition {
            path,
            width: output.width,
            height: output.height,
        })
    }

    fn copy_blob(&self, from: &str, to: &str) -> Result<(), MaterializeError> {
        let bytes = self.store.read(from)?;
        self.store.write(to, &bytes)?;
        Ok(())
    }
}

/// Rendition path next to the original: `{dir}/{stem}.{variation}.{ext}`.
fn rendition_path(original: &str, variation: &str, ext: &str) -> String {
    let (dir, filename) = match original.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, original),
    };
    let stem = filename.rsplit_once('.').map_or(filename, |(s, _)| s);
    let name = if ext.is_empty() {
        format!("{stem}.{variation}")
    } else {
        format!("{stem}.{variation}.{ext}")
    };
    match dir {
        Some(dir) => format!("{dir}/{name}"),
        None => name,
    }
}

/// Extension for a freshly cut rendition. `Auto` keeps the source
/// extension verbatim (so `jpg` stays `jpg`); a fixed format names its own.
fn cut_extension(spec: &VariationSpec, source_ext: &str) -> String {
    match spec.format {
        crate::variations::OutputFormat::Auto => source_ext.to_string(),
        fixed => fixed.resolve(source_ext).extension().to_string(),
    }
}
