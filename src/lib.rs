//! # mediabind
//!
//! A file, image and gallery attachment layer. Host applications hand it
//! uploads; it owns the blob lifecycle (attach, rename, delete), cuts
//! declaratively configured image variations, and groups attachments into
//! ordered, typed collections with a tracked cover image.
//!
//! # Architecture: Resources, Variations, Collections
//!
//! ```text
//! upload bytes ──► sniff ──► FileResource / ImageResource   (resource)
//!                               │
//!                               ▼
//!            VariationSet (TOML) ──► Materializer ──► renditions in BlobStore
//!                               │
//!                               ▼
//!                     Collection (ordered items, cover, ItemRepr)
//! ```
//!
//! The three layers are independently usable: a single image field needs
//! only `resource` + `variations` + `materialize`; a gallery adds
//! `collection` on top. Everything external sits behind a trait so hosts
//! swap implementations without touching this crate:
//!
//! - [`store::BlobStore`] — where bytes live and what their public URLs are
//! - [`codec::ImageCodec`] — how pixels are probed and re-encoded
//! - [`queue::TaskQueue`] — whether renditions are cut now or by a worker
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`naming`] | Filename splitting, extension normalization, slugs |
//! | [`store`] | `BlobStore` trait plus in-memory and local-disk backends |
//! | [`codec`] | `ImageCodec` trait and the pure-Rust `image` backend |
//! | [`queue`] | `TaskQueue` trait for deferring rendition work |
//! | [`sizing`] | Pure output-box math: clip, fit, one-axis-free, no upscale |
//! | [`variations`] | TOML variation config and the shorthand resolver |
//! | [`resource`] | `FileResource` / `ImageResource` lifecycle state machines |
//! | [`materialize`] | Cuts, relocates and verifies renditions |
//! | [`collection`] | Typed, ordered collections with cover tracking |
//!
//! # Design Decisions
//!
//! ## Traits at the Edges, Structs in the Middle
//!
//! Storage, codecs and queues are the only things that differ between
//! hosts, so they are the only trait objects. The domain types in between
//! (`FileResource`, `VariationSet`, `Collection`) are plain owned structs:
//! serializable, cloneable, and testable without a filesystem.
//!
//! ## Renames Are Metadata First
//!
//! Renaming a resource never moves bytes by itself. The resource records
//! where its blob used to live and raises `need_recut`; the host then
//! picks cheap relocation ([`materialize::Materializer::relocate`]) or a
//! full recut. Keeping the store out of `rename` makes the operation
//! infallible and keeps rename semantics identical for files and images.
//!
//! ## Pure-Rust Imaging
//!
//! All pixel work goes through the [`image`] crate. No ImageMagick, no
//! external binaries to install or shell out to: `cargo build` is the
//! whole setup, and the codec trait keeps the door open for hosts that
//! want a different backend.

pub mod codec;
pub mod collection;
pub mod materialize;
pub mod naming;
pub mod queue;
pub mod resource;
pub mod sizing;
pub mod store;
pub mod variations;

#[cfg(test)]
pub(crate) mod test_helpers;
