//! Declarative variation configuration and the spec resolver.
//!
//! A variation is a named derived rendition of a source image: a target box,
//! a fit policy, an output format, and encode parameters. Hosts declare
//! variations per image field or per gallery subclass, in TOML:
//!
//! ```toml
//! [mobile]
//! size = [640, 0]            # 0 = unconstrained along this axis
//! clip = false
//! versions = ["webp", "2x"]  # auto-derive format/density siblings
//!
//! [desktop]
//! size = [1280, 720]
//! format = "jpeg"
//! quality = 85
//! ```
//!
//! [`VariationSet::resolve`] expands the declaration into a flat, ordered
//! mapping of name → [`VariationSpec`]. Version shorthands (`2x`, `3x`,
//! `webp`, `jpeg`, `png`, `gif`) each derive one additional spec named
//! `{base}_{version}`, emitted immediately after their base; a density and
//! a format requested together additionally derive the combination
//! (`mobile_webp_2x`). Expansion is one level deep: derived entries never
//! re-expand.
//!
//! Explicitly declared names always win over shorthand-derived ones, so
//! `desktop_2x` can be declared with its own size even while `desktop`
//! requests a `2x` version. Configuration is validated at load time; a
//! malformed declaration fails fast with [`ConfigError`] and is never
//! retried per-call.

use crate::codec::{MediaFormat, Quality};
use crate::sizing::FitPolicy;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
    #[error("variation `{name}`: unknown version token `{token}`")]
    UnknownVersion { name: String, token: String },
    #[error("duplicate variation name `{0}`")]
    DuplicateVariation(String),
}

/// Output format of a rendition. `Auto` inherits the source format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Auto,
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl OutputFormat {
    /// Concrete encode format, falling back to the source extension for
    /// `Auto` (and to JPEG when the source extension is not a raster
    /// format the codec knows).
    pub fn resolve(self, source_extension: &str) -> MediaFormat {
        match self {
            OutputFormat::Auto => {
                MediaFormat::from_extension(source_extension).unwrap_or(MediaFormat::Jpeg)
            }
            OutputFormat::Jpeg => MediaFormat::Jpeg,
            OutputFormat::Png => MediaFormat::Png,
            OutputFormat::Webp => MediaFormat::Webp,
            OutputFormat::Gif => MediaFormat::Gif,
        }
    }

    fn from_media(format: MediaFormat) -> Self {
        match format {
            MediaFormat::Jpeg => OutputFormat::Jpeg,
            MediaFormat::Png => OutputFormat::Png,
            MediaFormat::Webp => OutputFormat::Webp,
            MediaFormat::Gif => OutputFormat::Gif,
        }
    }
}

/// Per-variation post-processing declaration.
///
/// `postprocess = "command"` names the command to run on the finished
/// rendition; `postprocess = false` explicitly skips post-processing for
/// this variation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Postprocess {
    Disabled(bool),
    Command(String),
}

/// One declared variation, as written in config. Unknown keys are rejected
/// to catch typos early.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariationConfig {
    /// Target box as `[width, height]`; `0` means unconstrained.
    pub size: [u32; 2],
    /// Crop to the exact box (`true`) or scale to fit (`false`).
    #[serde(default = "default_clip")]
    pub clip: bool,
    #[serde(default)]
    pub format: OutputFormat,
    /// Encode quality (1-100). Defaults per [`Quality`].
    #[serde(default)]
    pub quality: Option<u32>,
    /// Version shorthands: `2x`, `3x`, and format names. Case-insensitive,
    /// deduplicated.
    #[serde(default)]
    pub versions: Vec<String>,
    #[serde(default)]
    pub postprocess: Option<Postprocess>,
}

fn default_clip() -> bool {
    true
}

impl Default for VariationConfig {
    fn default() -> Self {
        Self {
            size: [0, 0],
            clip: true,
            format: OutputFormat::Auto,
            quality: None,
            versions: Vec::new(),
            postprocess: None,
        }
    }
}

/// A resolved, immutable variation spec.
#[derive(Debug, Clone, PartialEq)]
pub struct VariationSpec {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub policy: FitPolicy,
    pub format: OutputFormat,
    pub quality: Quality,
    pub postprocess: Option<String>,
}

/// A recognized version shorthand.
enum VersionToken {
    Density(u32),
    Format(MediaFormat),
}

fn parse_version_token(token: &str) -> Option<VersionToken> {
    match token.to_ascii_lowercase().as_str() {
        "2x" => Some(VersionToken::Density(2)),
        "3x" => Some(VersionToken::Density(3)),
        other => MediaFormat::from_extension(other).map(VersionToken::Format),
    }
}

/// Flat, ordered mapping of variation name → resolved spec.
///
/// Resolution is a pure function of the input declaration: the same config
/// always resolves to the same ordered set.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct VariationSet {
    entries: Vec<VariationSpec>,
}

impl VariationSet {
    /// Resolve an ordered declaration into the flat variation set.
    pub fn resolve(raw: &[(String, VariationConfig)]) -> Result<Self, ConfigError> {
        // Last declaration wins for duplicate explicit names; the first
        // occurrence keeps its position in the ordering.
        let mut deduped: Vec<(String, VariationConfig)> = Vec::new();
        for (name, config) in raw {
            match deduped.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = config.clone(),
                None => deduped.push((name.clone(), config.clone())),
            }
        }
        let explicit: HashSet<&str> = deduped.iter().map(|(n, _)| n.as_str()).collect();

        let mut entries: Vec<VariationSpec> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        for (name, config) in &deduped {
            validate(name, config)?;
            let base = build_spec(name.clone(), config);
            seen.insert(name.clone());
            entries.push(base.clone());

            for (derived_name, derived) in derive_versions(name, &base, config)? {
                // Explicit declarations always win over derived names.
                if explicit.contains(derived_name.as_str()) {
                    continue;
                }
                if !seen.insert(derived_name.clone()) {
                    return Err(ConfigError::DuplicateVariation(derived_name));
                }
                entries.push(derived);
            }
        }

        Ok(Self { entries })
    }

    /// Parse and resolve a TOML declaration (one table per variation).
    /// Declaration order is preserved.
    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(text)?;
        let mut raw = Vec::with_capacity(table.len());
        for (name, value) in table {
            let config: VariationConfig = value.try_into()?;
            raw.push((name, config));
        }
        Self::resolve(&raw)
    }

    pub fn get(&self, name: &str) -> Option<&VariationSpec> {
        self.entries.iter().find(|spec| spec.name == name)
    }

    /// Names in resolution order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|spec| spec.name.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VariationSpec> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a VariationSet {
    type Item = &'a VariationSpec;
    type IntoIter = std::slice::Iter<'a, VariationSpec>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn validate(name: &str, config: &VariationConfig) -> Result<(), ConfigError> {
    if config.size == [0, 0] {
        return Err(ConfigError::Validation(format!(
            "variation `{name}`: size must be nonzero on at least one axis"
        )));
    }
    if let Some(q) = config.quality {
        if q == 0 || q > 100 {
            return Err(ConfigError::Validation(format!(
                "variation `{name}`: quality must be 1-100"
            )));
        }
    }
    Ok(())
}

fn build_spec(name: String, config: &VariationConfig) -> VariationSpec {
    VariationSpec {
        name,
        width: config.size[0],
        height: config.size[1],
        policy: if config.clip {
            FitPolicy::Clip
        } else {
            FitPolicy::NoClip
        },
        format: config.format,
        quality: config.quality.map(Quality::new).unwrap_or_default(),
        postprocess: match &config.postprocess {
            Some(Postprocess::Command(cmd)) => Some(cmd.clone()),
            _ => None,
        },
    }
}

/// Expand one entry's version shorthands into derived specs, in emission
/// order: format siblings, density multipliers, then format x density
/// combinations. One level only.
fn derive_versions(
    name: &str,
    base: &VariationSpec,
    config: &VariationConfig,
) -> Result<Vec<(String, VariationSpec)>, ConfigError> {
    let mut densities: Vec<u32> = Vec::new();
    let mut formats: Vec<MediaFormat> = Vec::new();

    for token in &config.versions {
        match parse_version_token(token) {
            Some(VersionToken::Density(n)) => {
                if !densities.contains(&n) {
                    densities.push(n);
                }
            }
            Some(VersionToken::Format(f)) => {
                if !formats.contains(&f) {
                    formats.push(f);
                }
            }
            None => {
                return Err(ConfigError::UnknownVersion {
                    name: name.to_string(),
                    token: token.clone(),
                });
            }
        }
    }

    let mut derived = Vec::new();
    for format in &formats {
        let derived_name = format!("{name}_{}", format.extension());
        derived.push((
            derived_name.clone(),
            VariationSpec {
                name: derived_name,
                format: OutputFormat::from_media(*format),
                ..base.clone()
            },
        ));
    }
    for n in &densities {
        let derived_name = format!("{name}_{n}x");
        derived.push((
            derived_name.clone(),
            VariationSpec {
                name: derived_name,
                width: base.width.saturating_mul(*n),
                height: base.height.saturating_mul(*n),
                ..base.clone()
            },
        ));
    }
    for format in &formats {
        for n in &densities {
            let derived_name = format!("{name}_{}_{n}x", format.extension());
            derived.push((
                derived_name.clone(),
                VariationSpec {
                    name: derived_name,
                    width: base.width.saturating_mul(*n),
                    height: base.height.saturating_mul(*n),
                    format: OutputFormat::from_media(*format),
                    ..base.clone()
                },
            ));
        }
    }
    Ok(derived)
}
