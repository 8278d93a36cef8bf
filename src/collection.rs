//! Collections: ordered, typed groups of attached items.
//!
//! A [`CollectionSchema`] declares which item types a collection accepts
//! (in priority order) and which variations its images carry. Uploads are
//! routed by content sniffing: each type's accept predicate sees the raw
//! bytes and filename, and the first declared type that accepts wins, so
//! an SVG never lands in the raster image type even when its extension
//! lies.
//!
//! A [`Collection`] keeps its items ordered, tracks a cover image via
//! explicit save/remove hooks, and exposes a client-facing
//! [`ItemRepr`] per item.

use std::sync::Arc;

use chrono::SecondsFormat;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::codec::ImageCodec;
use crate::materialize::{MaterializeOutcome, Materializer};
use crate::resource::{AttachError, FieldRef, FileResource, ImageResource};
use crate::store::BlobStore;
use crate::variations::VariationSet;

/// Items omitted from a reorder request sort after every listed one.
pub const ORDER_LAST: u32 = 1 << 20;

#[derive(Error, Debug)]
pub enum CollectionError {
    #[error("unknown item type `{0}`")]
    InvalidItemType(String),
    #[error("item type `{tag}` holds {expected:?} payloads, got {actual:?}")]
    ItemTypeMismatch {
        tag: String,
        expected: ItemKind,
        actual: ItemKind,
    },
    #[error(transparent)]
    Attach(#[from] AttachError),
}

/// Payload shape of an item type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    File,
    Image,
    Svg,
}

/// Content gate: raw bytes plus the uploaded filename.
pub type AcceptFn = fn(&[u8], &str) -> bool;

/// Accepts SVG documents: optional BOM and whitespace, then an `<svg` root
/// (possibly behind an XML declaration).
pub fn accept_svg(bytes: &[u8], _filename: &str) -> bool {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.trim_start_matches('\u{feff}').trim_start(),
        Err(_) => return false,
    };
    text.starts_with("<svg")
        || (text.starts_with("<?xml") && text.contains("<svg"))
}

/// Accepts anything the `image` crate recognizes as a raster format.
pub fn accept_raster(bytes: &[u8], _filename: &str) -> bool {
    image::guess_format(bytes).is_ok()
}

/// Accepts everything. Place last as the catch-all.
pub fn accept_any(_bytes: &[u8], _filename: &str) -> bool {
    true
}

/// One item type a collection accepts.
#[derive(Debug, Clone)]
pub struct ItemTypeDef {
    pub tag: &'static str,
    pub kind: ItemKind,
    pub accept: AcceptFn,
}

/// Declares what a collection holds and how its images are cut.
#[derive(Debug, Clone, Default)]
pub struct CollectionSchema {
    pub name: String,
    item_types: Vec<ItemTypeDef>,
    pub variations: VariationSet,
}

impl CollectionSchema {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            item_types: Vec::new(),
            variations: VariationSet::default(),
        }
    }

    /// Register an item type. Re-registering a tag replaces the earlier
    /// definition in place, keeping its priority.
    pub fn with_item_type(mut self, def: ItemTypeDef) -> Self {
        match self.item_types.iter_mut().find(|t| t.tag == def.tag) {
            Some(slot) => *slot = def,
            None => self.item_types.push(def),
        }
        self
    }

    pub fn with_variations(mut self, variations: VariationSet) -> Self {
        self.variations = variations;
        self
    }

    pub fn item_type(&self, tag: &str) -> Option<&ItemTypeDef> {
        self.item_types.iter().find(|t| t.tag == tag)
    }

    pub fn item_types(&self) -> &[ItemTypeDef] {
        &self.item_types
    }

    /// Sniff an upload against the declared types, first match wins.
    pub fn detect_file_type(&self, bytes: &[u8], filename: &str) -> Option<&'static str> {
        self.item_types
            .iter()
            .find(|t| (t.accept)(bytes, filename))
            .map(|t| t.tag)
    }

    /// Images only.
    pub fn image_gallery(variations: VariationSet) -> Self {
        Self::new("image_gallery")
            .with_item_type(ItemTypeDef {
                tag: "image",
                kind: ItemKind::Image,
                accept: accept_raster,
            })
            .with_variations(variations)
    }

    /// SVGs, raster images, and arbitrary files, in that sniffing order.
    pub fn media_gallery(variations: VariationSet) -> Self {
        Self::new("media_gallery")
            .with_item_type(ItemTypeDef {
                tag: "svg",
                kind: ItemKind::Svg,
                accept: accept_svg,
            })
            .with_item_type(ItemTypeDef {
                tag: "image",
                kind: ItemKind::Image,
                accept: accept_raster,
            })
            .with_item_type(ItemTypeDef {
                tag: "file",
                kind: ItemKind::File,
                accept: accept_any,
            })
            .with_variations(variations)
    }
}

/// The typed resource an item carries.
#[derive(Debug, Clone, PartialEq)]
pub enum ItemPayload {
    File(FileResource),
    Image(ImageResource),
    Svg(FileResource),
}

impl ItemPayload {
    pub fn kind(&self) -> ItemKind {
        match self {
            ItemPayload::File(_) => ItemKind::File,
            ItemPayload::Image(_) => ItemKind::Image,
            ItemPayload::Svg(_) => ItemKind::Svg,
        }
    }

    /// The underlying file metadata, whatever the kind.
    pub fn as_file(&self) -> &FileResource {
        match self {
            ItemPayload::File(file) | ItemPayload::Svg(file) => file,
            ItemPayload::Image(image) => &image.file,
        }
    }

    pub fn as_image(&self) -> Option<&ImageResource> {
        match self {
            ItemPayload::Image(image) => Some(image),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageResource> {
        match self {
            ItemPayload::Image(image) => Some(image),
            _ => None,
        }
    }
}

/// One member of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionItem {
    pub id: u64,
    pub collection_id: u64,
    pub item_type: &'static str,
    pub order: u32,
    pub caption: String,
    pub payload: ItemPayload,
}

/// An ordered, typed group of attachments with a tracked cover image.
pub struct Collection {
    pub id: u64,
    pub schema: Arc<CollectionSchema>,
    pub owner: FieldRef,
    cover: Option<u64>,
    items: Vec<CollectionItem>,
    next_item_id: u64,
}

impl Collection {
    pub fn new(id: u64, schema: Arc<CollectionSchema>, owner: FieldRef) -> Self {
        Self {
            id,
            schema,
            owner,
            cover: None,
            items: Vec::new(),
            next_item_id: 1,
        }
    }

    /// Route an upload to the first accepting item type and attach it.
    pub fn add_upload(
        &mut self,
        store: &dyn BlobStore,
        codec: &dyn ImageCodec,
        bytes: &[u8],
        filename: &str,
    ) -> Result<u64, CollectionError> {
        let tag = self.schema.detect_file_type(bytes, filename).ok_or_else(|| {
            CollectionError::Attach(AttachError::UnsupportedResource {
                name: filename.to_string(),
                reason: format!("no item type of `{}` accepts this content", self.schema.name),
            })
        })?;
        // detect_file_type only returns registered tags
        let kind = self.schema.item_type(tag).map(|t| t.kind).unwrap_or(ItemKind::File);

        let payload = match kind {
            ItemKind::Image => {
                let mut image = ImageResource::new(self.owner.clone());
                image.attach(store, codec, bytes, filename)?;
                ItemPayload::Image(image)
            }
            ItemKind::Svg => {
                let mut file = FileResource::new(self.owner.clone());
                file.attach(store, bytes, filename)?;
                ItemPayload::Svg(file)
            }
            ItemKind::File => {
                let mut file = FileResource::new(self.owner.clone());
                file.attach(store, bytes, filename)?;
                ItemPayload::File(file)
            }
        };
        self.insert_item(tag, payload)
    }

    /// Insert a pre-built payload under an explicitly named item type.
    pub fn insert_item(
        &mut self,
        tag: &str,
        payload: ItemPayload,
    ) -> Result<u64, CollectionError> {
        let def = self
            .schema
            .item_type(tag)
            .ok_or_else(|| CollectionError::InvalidItemType(tag.to_string()))?;
        if def.kind != payload.kind() {
            return Err(CollectionError::ItemTypeMismatch {
                tag: tag.to_string(),
                expected: def.kind,
                actual: payload.kind(),
            });
        }

        let id = self.next_item_id;
        self.next_item_id += 1;
        let order = self
            .items
            .iter()
            .map(|i| i.order)
            .max()
            .map_or(0, |max| max.saturating_add(1));
        self.items.push(CollectionItem {
            id,
            collection_id: self.id,
            item_type: def.tag,
            order,
            caption: String::new(),
            payload,
        });
        debug!(collection = self.id, item = id, item_type = def.tag, "item added");
        self.on_item_saved(id);
        Ok(id)
    }

    pub fn item(&self, id: u64) -> Option<&CollectionItem> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_mut(&mut self, id: u64) -> Option<&mut CollectionItem> {
        self.items.iter_mut().find(|i| i.id == id)
    }

    /// Items sorted by order, optionally narrowed to one registered item
    /// type. Asking for a tag the schema does not declare is an error, not
    /// an empty list.
    pub fn get_items(
        &self,
        item_type: Option<&str>,
    ) -> Result<Vec<&CollectionItem>, CollectionError> {
        if let Some(tag) = item_type {
            if self.schema.item_type(tag).is_none() {
                return Err(CollectionError::InvalidItemType(tag.to_string()));
            }
        }
        let mut items: Vec<&CollectionItem> = self
            .items
            .iter()
            .filter(|i| item_type.is_none_or(|t| i.item_type == t))
            .collect();
        items.sort_by_key(|i| (i.order, i.id));
        Ok(items)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cover(&self) -> Option<u64> {
        self.cover
    }

    pub fn cover_item(&self) -> Option<&CollectionItem> {
        self.cover.and_then(|id| self.item(id))
    }

    /// Save hook: adopt the item as cover when none is set and the item is
    /// an image.
    pub fn on_item_saved(&mut self, id: u64) {
        if self.cover.is_some() {
            return;
        }
        if let Some(item) = self.item(id) {
            if item.payload.as_image().is_some() {
                self.cover = Some(id);
            }
        }
    }

    /// Removal hook: recompute the cover as the earliest-ordered remaining
    /// image, or clear it.
    pub fn on_item_removed(&mut self, id: u64) {
        if self.cover != Some(id) {
            return;
        }
        let mut images: Vec<&CollectionItem> = self
            .items
            .iter()
            .filter(|i| i.payload.as_image().is_some())
            .collect();
        images.sort_by_key(|i| (i.order, i.id));
        self.cover = images.first().map(|i| i.id);
    }

    /// Remove an item and delete its blobs. Unknown ids are a no-op.
    pub fn remove_item(&mut self, id: u64, store: &dyn BlobStore) {
        let Some(pos) = self.items.iter().position(|i| i.id == id) else {
            return;
        };
        let mut item = self.items.remove(pos);
        match &mut item.payload {
            ItemPayload::Image(image) => image.delete_file(store),
            ItemPayload::File(file) | ItemPayload::Svg(file) => file.delete_file(store),
        }
        self.on_item_removed(id);
    }

    /// Reassign orders per the given id sequence. Listed ids take their
    /// position as order; omitted ids are parked at [`ORDER_LAST`], sorting
    /// after every listed one (ties among parked items resolve by id).
    pub fn reorder(&mut self, ids: &[u64]) {
        let position = |id: u64| {
            ids.iter()
                .position(|&x| x == id)
                .map_or(ORDER_LAST, |p| p as u32)
        };
        self.items.sort_by_key(|i| (position(i.id), i.order, i.id));
        for item in &mut self.items {
            item.order = position(item.id);
        }
    }

    /// Cut renditions for one image item. `None` when the id is unknown or
    /// the item is not an image.
    pub fn materialize_item(
        &mut self,
        id: u64,
        materializer: &Materializer<'_>,
    ) -> Option<MaterializeOutcome> {
        let variations = self.schema.variations.clone();
        let image = self.item_mut(id)?.payload.as_image_mut()?;
        Some(materializer.materialize(image, &variations, None))
    }

    /// Client-facing representation of one item.
    pub fn item_repr(&self, id: u64, store: &dyn BlobStore) -> Option<ItemRepr> {
        let item = self.item(id)?;
        let file = item.payload.as_file();
        let preview = item.payload.as_image().and_then(|image| {
            self.schema
                .variations
                .names()
                .find_map(|name| image.renditions.get(name))
                .map(|r| store.url_for(&r.path))
        });
        let rfc3339 = |t: &chrono::DateTime<chrono::Utc>| {
            t.to_rfc3339_opts(SecondsFormat::Secs, true)
        };
        Some(ItemRepr {
            id: item.id,
            collection_id: item.collection_id,
            item_type: item.item_type.to_string(),
            name: file.name.clone(),
            extension: file.extension.clone(),
            caption: item.caption.clone(),
            size: file.size,
            order: item.order,
            preview,
            url: file.url(store),
            created: rfc3339(&file.created),
            uploaded: file.uploaded.as_ref().map(rfc3339),
            modified: rfc3339(&file.modified),
        })
    }
}

/// Wire shape sent to clients. Field names are camelCase and timestamps
/// RFC 3339 in UTC.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRepr {
    pub id: u64,
    pub collection_id: u64,
    pub item_type: String,
    pub name: String,
    pub extension: String,
    pub caption: String,
    pub size: u64,
    pub order: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub created: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uploaded: Option<String>,
    pub modified: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::RustCodec;
    use crate::store::MemoryStore;
    use crate::test_helpers::{gallery_owner, jpeg_bytes, png_bytes, svg_bytes};

    fn media_collection() -> Collection {
        let variations =
            VariationSet::from_toml("[thumb]\nsize = [16, 16]\n\n[wide]\nsize = [32, 16]\n")
                .unwrap();
        Collection::new(
            1,
            Arc::new(CollectionSchema::media_gallery(variations)),
            gallery_owner(),
        )
    }

    // =========================================================================
    // Content sniffing
    // =========================================================================

    #[test]
    fn uploads_route_by_content_in_declared_order() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();

        let svg = collection
            .add_upload(&store, &codec, &svg_bytes(), "logo.svg")
            .unwrap();
        let image = collection
            .add_upload(&store, &codec, &jpeg_bytes(32, 32), "shot.jpg")
            .unwrap();
        let file = collection
            .add_upload(&store, &codec, b"%PDF-1.4 fake", "paper.pdf")
            .unwrap();

        assert_eq!(collection.item(svg).unwrap().item_type, "svg");
        assert_eq!(collection.item(image).unwrap().item_type, "image");
        assert_eq!(collection.item(file).unwrap().item_type, "file");
    }

    #[test]
    fn svg_with_raster_extension_is_still_svg() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let id = collection
            .add_upload(&store, &codec, &svg_bytes(), "sneaky.png")
            .unwrap();
        assert_eq!(collection.item(id).unwrap().item_type, "svg");
    }

    #[test]
    fn image_only_schema_rejects_other_content() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let schema = CollectionSchema::image_gallery(VariationSet::default());
        let mut collection = Collection::new(1, Arc::new(schema), gallery_owner());

        let err = collection
            .add_upload(&store, &codec, b"just text", "notes.txt")
            .unwrap_err();
        assert!(matches!(
            err,
            CollectionError::Attach(AttachError::UnsupportedResource { .. })
        ));
        assert!(collection.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn accept_svg_handles_xml_prolog_and_bom() {
        assert!(accept_svg(b"<svg></svg>", "a.svg"));
        assert!(accept_svg(
            b"<?xml version=\"1.0\"?>\n<svg></svg>",
            "a.svg"
        ));
        assert!(accept_svg("\u{feff}  <svg/>".as_bytes(), "a.svg"));
        assert!(!accept_svg(b"<html></html>", "a.svg"));
        assert!(!accept_svg(&[0xff, 0xd8, 0xff], "a.svg"));
    }

    // =========================================================================
    // Item types and validation
    // =========================================================================

    #[test]
    fn insert_item_rejects_unknown_tag() {
        let mut collection = media_collection();
        let err = collection
            .insert_item("video", ItemPayload::File(FileResource::new(gallery_owner())))
            .unwrap_err();
        assert!(matches!(err, CollectionError::InvalidItemType(tag) if tag == "video"));
    }

    #[test]
    fn insert_item_rejects_kind_mismatch() {
        let mut collection = media_collection();
        let err = collection
            .insert_item("image", ItemPayload::File(FileResource::new(gallery_owner())))
            .unwrap_err();
        assert!(matches!(
            err,
            CollectionError::ItemTypeMismatch {
                expected: ItemKind::Image,
                actual: ItemKind::File,
                ..
            }
        ));
    }

    #[test]
    fn replacing_an_item_type_keeps_its_priority() {
        fn reject_all(_: &[u8], _: &str) -> bool {
            false
        }
        let schema = CollectionSchema::media_gallery(VariationSet::default()).with_item_type(
            ItemTypeDef {
                tag: "svg",
                kind: ItemKind::Svg,
                accept: reject_all,
            },
        );
        assert_eq!(schema.item_types()[0].tag, "svg");
        // SVG content now falls through to the raster sniffer, then `file`.
        assert_eq!(schema.detect_file_type(&svg_bytes(), "a.svg"), Some("file"));
    }

    // =========================================================================
    // Ordering
    // =========================================================================

    #[test]
    fn items_are_ordered_by_insertion() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let a = collection.add_upload(&store, &codec, b"a", "a.txt").unwrap();
        let b = collection.add_upload(&store, &codec, b"b", "b.txt").unwrap();
        let ordered: Vec<u64> = collection.get_items(None).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ordered, vec![a, b]);
    }

    #[test]
    fn reorder_assigns_positions_and_parks_omitted_items_last() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let a = collection.add_upload(&store, &codec, b"a", "a.txt").unwrap();
        let b = collection.add_upload(&store, &codec, b"b", "b.txt").unwrap();
        let c = collection.add_upload(&store, &codec, b"c", "c.txt").unwrap();

        collection.reorder(&[c, a]);
        let ordered: Vec<u64> = collection.get_items(None).unwrap().iter().map(|i| i.id).collect();
        assert_eq!(ordered, vec![c, a, b]);
        assert_eq!(collection.item(c).unwrap().order, 0);
        assert_eq!(collection.item(a).unwrap().order, 1);
        assert_eq!(collection.item(b).unwrap().order, ORDER_LAST);
    }

    #[test]
    fn get_items_filters_by_item_type() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        collection.add_upload(&store, &codec, b"doc", "doc.txt").unwrap();
        let image = collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "pic.png")
            .unwrap();

        let images = collection.get_items(Some("image")).unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0].id, image);
    }

    #[test]
    fn get_items_rejects_unregistered_tag() {
        let collection = media_collection();
        let err = collection.get_items(Some("video")).unwrap_err();
        assert!(matches!(err, CollectionError::InvalidItemType(tag) if tag == "video"));
    }

    // =========================================================================
    // Cover tracking
    // =========================================================================

    #[test]
    fn first_image_becomes_cover() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        collection.add_upload(&store, &codec, b"doc", "doc.txt").unwrap();
        assert_eq!(collection.cover(), None);

        let first = collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "one.png")
            .unwrap();
        collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "two.png")
            .unwrap();
        assert_eq!(collection.cover(), Some(first));
    }

    #[test]
    fn deleting_the_cover_promotes_the_earliest_remaining_image() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let first = collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "one.png")
            .unwrap();
        let second = collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "two.png")
            .unwrap();
        let third = collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "three.png")
            .unwrap();

        // Reorder so `third` precedes `second`, then drop the cover.
        collection.reorder(&[first, third, second]);
        collection.remove_item(first, &store);
        assert_eq!(collection.cover(), Some(third));

        collection.remove_item(third, &store);
        collection.remove_item(second, &store);
        assert_eq!(collection.cover(), None);
    }

    #[test]
    fn removing_a_non_cover_item_keeps_the_cover() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let first = collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "one.png")
            .unwrap();
        let second = collection
            .add_upload(&store, &codec, &png_bytes(8, 8), "two.png")
            .unwrap();
        collection.remove_item(second, &store);
        assert_eq!(collection.cover(), Some(first));
    }

    // =========================================================================
    // Removal cascade
    // =========================================================================

    #[test]
    fn remove_item_deletes_original_and_renditions() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let id = collection
            .add_upload(&store, &codec, &png_bytes(64, 64), "pic.png")
            .unwrap();
        let materializer = Materializer::new(&store, &codec);
        collection.materialize_item(id, &materializer).unwrap();
        assert_eq!(store.len(), 3); // original + thumb + wide

        collection.remove_item(id, &store);
        assert!(store.is_empty());
        assert!(collection.is_empty());

        // Unknown id afterwards is a no-op.
        collection.remove_item(id, &store);
    }

    // =========================================================================
    // ItemRepr
    // =========================================================================

    #[test]
    fn item_repr_serializes_camel_case_with_rfc3339_times() {
        let store = MemoryStore::with_base_url("https://cdn.test/m");
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let id = collection
            .add_upload(&store, &codec, &png_bytes(64, 64), "My Pic.png")
            .unwrap();
        collection.item_mut(id).unwrap().caption = "hello".to_string();
        collection.materialize_item(id, &Materializer::new(&store, &codec));

        let repr = collection.item_repr(id, &store).unwrap();
        assert_eq!(repr.item_type, "image");
        assert_eq!(repr.name, "My Pic");
        assert_eq!(repr.extension, "png");
        assert_eq!(
            repr.url.as_deref(),
            Some("https://cdn.test/m/page/gallery/my-pic.png")
        );
        // Preview points at the first declared variation.
        assert_eq!(
            repr.preview.as_deref(),
            Some("https://cdn.test/m/page/gallery/my-pic.thumb.png")
        );

        let json = serde_json::to_value(&repr).unwrap();
        assert!(json.get("collectionId").is_some());
        assert!(json.get("itemType").is_some());
        assert!(json.get("collection_id").is_none());
        let created = json["created"].as_str().unwrap();
        assert!(created.ends_with('Z'), "expected UTC timestamp, got {created}");
        assert_eq!(json["caption"], "hello");
    }

    #[test]
    fn item_repr_for_plain_file_has_no_preview() {
        let store = MemoryStore::new();
        let codec = RustCodec::new();
        let mut collection = media_collection();
        let id = collection.add_upload(&store, &codec, b"doc", "doc.txt").unwrap();
        let repr = collection.item_repr(id, &store).unwrap();
        assert_eq!(repr.preview, None);
        assert_eq!(repr.size, 3);
    }
}
