//! Pure calculation functions for variation output boxes.
//!
//! All functions here are pure and testable without any I/O or images.
//!
//! Given a source size and a target box, [`compute_output_box`] decides the
//! final rendition dimensions plus an optional centered crop region:
//!
//! - both target axes set + [`FitPolicy::Clip`]: crop the source to the
//!   target aspect (centered), output is exactly the target box;
//! - both target axes set + [`FitPolicy::NoClip`]: scale down (never up)
//!   to fit entirely within the box, no cropping;
//! - one target axis `0` (unconstrained): the free axis follows the source
//!   aspect ratio, and neither axis ever exceeds the source.
//!
//! Aspect comparisons use integer cross-multiplication; only the final
//! pixel values are rounded (to nearest, 1 px floor).

use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SizingError {
    #[error("invalid source dimensions: {0}x{1}")]
    InvalidSourceDimensions(u32, u32),
}

/// How a variation fills its target box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitPolicy {
    /// Crop to the exact box, preserving aspect via a centered crop.
    Clip,
    /// Scale to fit within the box, preserving aspect, no cropping.
    NoClip,
}

/// A crop region within the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Final rendition dimensions plus the crop to apply first, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputBox {
    pub width: u32,
    pub height: u32,
    pub crop: Option<CropBox>,
}

/// Round `value * num / den` to the nearest integer, 1 px floor.
fn scaled(value: u32, num: u32, den: u32) -> u32 {
    let px = (value as f64 * num as f64 / den as f64).round() as u32;
    px.max(1)
}

/// Compute the output box for one variation.
///
/// `target_w` / `target_h` of `0` mean "unconstrained along this axis".
/// Fails with [`SizingError::InvalidSourceDimensions`] when either source
/// axis is zero.
pub fn compute_output_box(
    source_w: u32,
    source_h: u32,
    target_w: u32,
    target_h: u32,
    policy: FitPolicy,
) -> Result<OutputBox, SizingError> {
    if source_w == 0 || source_h == 0 {
        return Err(SizingError::InvalidSourceDimensions(source_w, source_h));
    }

    let out = match (target_w, target_h) {
        // Fully unconstrained: source passthrough.
        (0, 0) => OutputBox {
            width: source_w,
            height: source_h,
            crop: None,
        },
        // Width fixed, height follows source aspect. Never exceed the source.
        (w, 0) => {
            let w = w.min(source_w);
            OutputBox {
                width: w,
                height: scaled(source_h, w, source_w),
                crop: None,
            }
        }
        // Height fixed, width follows source aspect.
        (0, h) => {
            let h = h.min(source_h);
            OutputBox {
                width: scaled(source_w, h, source_h),
                height: h,
                crop: None,
            }
        }
        (w, h) => match policy {
            FitPolicy::Clip => OutputBox {
                width: w,
                height: h,
                crop: Some(centered_crop(source_w, source_h, w, h)),
            },
            FitPolicy::NoClip => fit_within(source_w, source_h, w, h),
        },
    };
    Ok(out)
}

/// Centered crop within the source matching the target aspect ratio.
fn centered_crop(source_w: u32, source_h: u32, target_w: u32, target_h: u32) -> CropBox {
    // Source wider than target aspect: src_w/src_h > tgt_w/tgt_h,
    // compared by cross-multiplication to stay in integers.
    if (source_w as u64) * (target_h as u64) > (source_h as u64) * (target_w as u64) {
        let crop_w = scaled(source_h, target_w, target_h).min(source_w);
        CropBox {
            x: (source_w - crop_w) / 2,
            y: 0,
            width: crop_w,
            height: source_h,
        }
    } else {
        let crop_h = scaled(source_w, target_h, target_w).min(source_h);
        CropBox {
            x: 0,
            y: (source_h - crop_h) / 2,
            width: source_w,
            height: crop_h,
        }
    }
}

/// Scale down (never up) to fit entirely within the target box.
fn fit_within(source_w: u32, source_h: u32, target_w: u32, target_h: u32) -> OutputBox {
    let fits = source_w <= target_w && source_h <= target_h;
    if fits {
        return OutputBox {
            width: source_w,
            height: source_h,
            crop: None,
        };
    }
    // Which axis constrains harder: tgt_w/src_w vs tgt_h/src_h,
    // cross-multiplied.
    if (target_w as u64) * (source_h as u64) <= (target_h as u64) * (source_w as u64) {
        OutputBox {
            width: target_w,
            height: scaled(source_h, target_w, source_w).min(target_h),
            crop: None,
        }
    } else {
        OutputBox {
            width: scaled(source_w, target_h, source_h).min(target_w),
            height: target_h,
            crop: None,
        }
    }
}
