//! Centralized filename normalization for storage paths.
//!
//! Every blob path this crate generates goes through the same two helpers:
//! [`split_name`] separates an upload's base name from its extension, and
//! [`slugify`] turns the base name into a lowercase, filesystem- and URL-safe
//! slug. Extensions are always stored lowercase and without a leading dot.
//!
//! ## Examples
//!
//! - `"Holiday Photo.JPG"` → slug `holiday-photo`, extension `jpg`
//! - `"archive.tar.gz"` → slug `archive-tar`, extension `gz`
//! - `"????"` (nothing slug-safe) → slug `file`

/// Result of splitting an upload name into base name and extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitName {
    /// Base name as given, extension stripped. Never empty for non-empty input.
    pub base: String,
    /// Extension, lowercased, without the leading dot. Empty if none.
    pub extension: String,
}

/// Split a filename into base name and lowercase extension.
///
/// The split is on the *last* dot, so multi-dot names keep their inner dots
/// in the base. A leading dot (hidden files) is part of the base, not an
/// extension marker.
pub fn split_name(filename: &str) -> SplitName {
    match filename.rfind('.') {
        Some(pos) if pos > 0 && pos < filename.len() - 1 => SplitName {
            base: filename[..pos].to_string(),
            extension: filename[pos + 1..].to_ascii_lowercase(),
        },
        _ => SplitName {
            base: filename.trim_end_matches('.').to_string(),
            extension: String::new(),
        },
    }
}

/// Normalize an extension: lowercase, no leading dot.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim_start_matches('.').to_ascii_lowercase()
}

/// Turn an arbitrary display name into a storage-safe slug.
///
/// Lowercases, keeps ASCII alphanumerics, and collapses every other run of
/// characters into a single dash. A name with nothing to keep becomes `file`
/// so a storage path is always constructible.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_dash = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    if slug.is_empty() {
        slug.push_str("file");
    }
    slug
}
