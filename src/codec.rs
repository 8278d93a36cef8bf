//! Image codec contract and the pure-Rust backend.
//!
//! The [`ImageCodec`] trait defines the three operations every backend must
//! support: probe (dimensions), transform (crop + resize + re-encode), and
//! extension support sniffing. The rest of the crate only decides *which*
//! renditions to produce; pixel work goes through this seam.
//!
//! The production implementation is [`RustCodec`] — the `image` crate end to
//! end, statically linked, no system dependencies:
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Probe | `ImageReader::with_guessed_format` + `into_dimensions` |
//! | Decode (JPEG, PNG, WebP, GIF) | `image` crate (pure Rust decoders) |
//! | Crop | `DynamicImage::crop_imm` |
//! | Resize | `resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` |
//! | Encode → PNG / WebP / GIF | `DynamicImage::write_to` |
//!
//! WebP output is lossless (the only WebP encoder the `image` crate ships);
//! the quality parameter applies to JPEG.

use crate::sizing::CropBox;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::ImageReader;
use serde::{Deserialize, Serialize};
use std::io::Cursor;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("decode failed: {0}")]
    Decode(String),
    #[error("encode failed: {0}")]
    Encode(String),
}

/// Result of a probe operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Concrete output formats a rendition can be encoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Jpeg,
    Png,
    Webp,
    Gif,
}

/// Extensions with working decoders compiled in.
pub const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif"];

impl MediaFormat {
    /// Canonical file extension (lowercase, no dot).
    pub fn extension(self) -> &'static str {
        match self {
            MediaFormat::Jpeg => "jpeg",
            MediaFormat::Png => "png",
            MediaFormat::Webp => "webp",
            MediaFormat::Gif => "gif",
        }
    }

    /// Parse from an extension or version token. `jpg` and `jpeg` both map
    /// to [`MediaFormat::Jpeg`].
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(MediaFormat::Jpeg),
            "png" => Some(MediaFormat::Png),
            "webp" => Some(MediaFormat::Webp),
            "gif" => Some(MediaFormat::Gif),
            _ => None,
        }
    }

    fn image_format(self) -> image::ImageFormat {
        match self {
            MediaFormat::Jpeg => image::ImageFormat::Jpeg,
            MediaFormat::Png => image::ImageFormat::Png,
            MediaFormat::Webp => image::ImageFormat::WebP,
            MediaFormat::Gif => image::ImageFormat::Gif,
        }
    }
}

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quality(pub u32);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(90)
    }
}

/// Full specification for one transform: optional crop, exact output box,
/// output format and encode quality.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropBox>,
    pub format: MediaFormat,
    pub quality: Quality,
}

/// Trait for image codec backends.
pub trait ImageCodec: Sync {
    /// Probe image dimensions from raw bytes.
    fn probe(&self, bytes: &[u8]) -> Result<Dimensions, CodecError>;

    /// Crop, resize and re-encode raw bytes per `params`.
    fn transform(&self, bytes: &[u8], params: &TransformParams) -> Result<Vec<u8>, CodecError>;

    /// Whether the codec can decode content with this extension.
    fn supports(&self, extension: &str) -> bool;
}

/// Pure Rust codec using the `image` crate.
pub struct RustCodec;

impl RustCodec {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageCodec for RustCodec {
    fn probe(&self, bytes: &[u8]) -> Result<Dimensions, CodecError> {
        let reader = ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        let (width, height) = reader
            .into_dimensions()
            .map_err(|e| CodecError::Decode(e.to_string()))?;
        Ok(Dimensions { width, height })
    }

    fn transform(&self, bytes: &[u8], params: &TransformParams) -> Result<Vec<u8>, CodecError> {
        let img = image::load_from_memory(bytes).map_err(|e| CodecError::Decode(e.to_string()))?;

        let img = match params.crop {
            Some(c) => img.crop_imm(c.x, c.y, c.width, c.height),
            None => img,
        };
        let img = if (img.width(), img.height()) != (params.width, params.height) {
            img.resize_exact(params.width, params.height, FilterType::Lanczos3)
        } else {
            img
        };

        let mut out = Cursor::new(Vec::new());
        match params.format {
            MediaFormat::Jpeg => {
                let encoder = JpegEncoder::new_with_quality(&mut out, params.quality.value() as u8);
                img.to_rgb8()
                    .write_with_encoder(encoder)
                    .map_err(|e| CodecError::Encode(e.to_string()))?;
            }
            other => img
                .write_to(&mut out, other.image_format())
                .map_err(|e| CodecError::Encode(e.to_string()))?,
        }
        Ok(out.into_inner())
    }

    fn supports(&self, extension: &str) -> bool {
        let ext = extension.to_ascii_lowercase();
        RASTER_EXTENSIONS.contains(&ext.as_str())
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Mock codec that records operations without decoding anything.
    /// Uses Mutex (not RefCell) so it is Sync like the real backends.
    #[derive(Default)]
    pub struct MockCodec {
        pub probe_results: Mutex<Vec<Dimensions>>,
        pub operations: Mutex<Vec<RecordedOp>>,
        pub fail_transform_for: Mutex<Vec<(u32, u32)>>,
    }

    #[derive(Debug, Clone, PartialEq)]
    pub enum RecordedOp {
        Probe(usize),
        Transform {
            width: u32,
            height: u32,
            crop: Option<CropBox>,
            format: MediaFormat,
            quality: u32,
        },
    }

    impl MockCodec {
        pub fn new() -> Self {
            Self::default()
        }

        /// Probe answers are consumed in order; the last one repeats.
        pub fn with_dimensions(dims: Vec<Dimensions>) -> Self {
            Self {
                probe_results: Mutex::new(dims),
                ..Self::default()
            }
        }

        /// Make transforms for the given output box fail.
        pub fn failing_for(self, width: u32, height: u32) -> Self {
            self.fail_transform_for.lock().unwrap().push((width, height));
            self
        }

        pub fn get_operations(&self) -> Vec<RecordedOp> {
            self.operations.lock().unwrap().clone()
        }
    }

    impl ImageCodec for MockCodec {
        fn probe(&self, bytes: &[u8]) -> Result<Dimensions, CodecError> {
            self.operations
                .lock()
                .unwrap()
                .push(RecordedOp::Probe(bytes.len()));
            let mut results = self.probe_results.lock().unwrap();
            if results.len() > 1 {
                Ok(results.remove(0))
            } else {
                results
                    .first()
                    .copied()
                    .ok_or_else(|| CodecError::Decode("no mock dimensions".to_string()))
            }
        }

        fn transform(
            &self,
            _bytes: &[u8],
            params: &TransformParams,
        ) -> Result<Vec<u8>, CodecError> {
            self.operations.lock().unwrap().push(RecordedOp::Transform {
                width: params.width,
                height: params.height,
                crop: params.crop,
                format: params.format,
                quality: params.quality.value(),
            });
            if self
                .fail_transform_for
                .lock()
                .unwrap()
                .contains(&(params.width, params.height))
            {
                return Err(CodecError::Encode(format!(
                    "mock failure at {}x{}",
                    params.width, params.height
                )));
            }
            Ok(format!("{}x{}:{}", params.width, params.height, params.format.extension())
                .into_bytes())
        }

        fn supports(&self, extension: &str) -> bool {
            RASTER_EXTENSIONS.contains(&extension.to_ascii_lowercase().as_str())
        }
    }

    // =========================================================================
    // MediaFormat / Quality
    // =========================================================================

    #[test]
    fn format_from_extension_aliases_jpg() {
        assert_eq!(MediaFormat::from_extension("jpg"), Some(MediaFormat::Jpeg));
        assert_eq!(MediaFormat::from_extension("JPEG"), Some(MediaFormat::Jpeg));
        assert_eq!(MediaFormat::from_extension("webp"), Some(MediaFormat::Webp));
        assert_eq!(MediaFormat::from_extension("svg"), None);
    }

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_90() {
        assert_eq!(Quality::default().value(), 90);
    }

    // =========================================================================
    // RustCodec against synthetic images
    // =========================================================================

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let img = image::DynamicImage::new_rgb8(width, height);
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, image::ImageFormat::Png).unwrap();
        out.into_inner()
    }

    #[test]
    fn rust_codec_probes_dimensions() {
        let codec = RustCodec::new();
        let dims = codec.probe(&png_bytes(320, 240)).unwrap();
        assert_eq!(
            dims,
            Dimensions {
                width: 320,
                height: 240
            }
        );
    }

    #[test]
    fn rust_codec_rejects_garbage() {
        let codec = RustCodec::new();
        assert!(codec.probe(b"definitely not an image").is_err());
    }

    #[test]
    fn rust_codec_transform_produces_exact_box() {
        let codec = RustCodec::new();
        let out = codec
            .transform(
                &png_bytes(400, 300),
                &TransformParams {
                    width: 100,
                    height: 50,
                    crop: Some(CropBox {
                        x: 0,
                        y: 75,
                        width: 400,
                        height: 150,
                    }),
                    format: MediaFormat::Png,
                    quality: Quality::default(),
                },
            )
            .unwrap();
        let dims = codec.probe(&out).unwrap();
        assert_eq!((dims.width, dims.height), (100, 50));
    }

    #[test]
    fn rust_codec_transform_reformats_to_jpeg() {
        let codec = RustCodec::new();
        let out = codec
            .transform(
                &png_bytes(64, 64),
                &TransformParams {
                    width: 32,
                    height: 32,
                    crop: None,
                    format: MediaFormat::Jpeg,
                    quality: Quality::new(80),
                },
            )
            .unwrap();
        assert_eq!(
            image::guess_format(&out).unwrap(),
            image::ImageFormat::Jpeg
        );
    }

    #[test]
    fn rust_codec_supports_raster_extensions_only() {
        let codec = RustCodec::new();
        assert!(codec.supports("jpg"));
        assert!(codec.supports("PNG"));
        assert!(!codec.supports("svg"));
        assert!(!codec.supports("pdf"));
    }

    // =========================================================================
    // MockCodec
    // =========================================================================

    #[test]
    fn mock_records_transform() {
        let codec = MockCodec::new();
        codec
            .transform(
                b"",
                &TransformParams {
                    width: 200,
                    height: 100,
                    crop: None,
                    format: MediaFormat::Webp,
                    quality: Quality::new(85),
                },
            )
            .unwrap();

        let ops = codec.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Transform {
                width: 200,
                height: 100,
                format: MediaFormat::Webp,
                quality: 85,
                ..
            }
        ));
    }

    #[test]
    fn mock_probe_repeats_last_dimension() {
        let codec = MockCodec::with_dimensions(vec![Dimensions {
            width: 800,
            height: 600,
        }]);
        assert_eq!(codec.probe(b"x").unwrap().width, 800);
        assert_eq!(codec.probe(b"x").unwrap().width, 800);
    }
}
