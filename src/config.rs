//! Pipeline configuration.
//!
//! Handles loading, validating, and merging `gallery.toml`. Stock defaults are
//! overridden by whatever the user file sets, and CLI path flags override
//! both.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! input_dir = "assets/gallery-source"
//! output_dir = "public/gallery"
//! manifest_path = "public/gallery/manifest.json"
//! url_prefix = "/gallery"
//!
//! [scan]
//! exclude = ["placeholder", "icon", "logo", "thumb"]
//!
//! [scan.roots]                # directory name → category
//! tattoos = "tattoo"
//! piercings = "piercing"
//! portraits = "portrait"
//!
//! [images]
//! widths = [400, 800, 1200, 2400]
//! jpeg_max_width = 800        # JPEG fallbacks up to this width
//! display_width = 800         # preferred `src` variant
//!
//! [quality]
//! webp = 82
//! jpeg = 88
//!
//! [manifest]
//! featured_count = 6
//! eager_count = 4
//! default_date = "2024-01"
//!
//! [[metadata.styles]]         # extra style rules, checked before built-ins
//! category = "tattoo"
//! label = "Ornamental"
//! keywords = ["ornamental", "mandala"]
//!
//! [processing]
//! max_processes = 1           # 1 = sequential
//! ```
//!
//! Config files are sparse — override just the values you want. Unknown keys
//! are rejected to catch typos early.

use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Default config file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "gallery.toml";

/// Pipeline configuration loaded from `gallery.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalleryConfig {
    /// Root of the original photographs.
    pub input_dir: PathBuf,
    /// Where variants are written (`<output_dir>/<category>/...`).
    pub output_dir: PathBuf,
    /// Where the manifest JSON is written.
    pub manifest_path: PathBuf,
    /// Public URL under which `output_dir` is served.
    pub url_prefix: String,
    pub scan: ScanConfig,
    pub images: ImagesConfig,
    pub quality: QualityConfig,
    pub manifest: ManifestConfig,
    pub metadata: MetadataConfig,
    pub processing: ProcessingConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("assets/gallery-source"),
            output_dir: PathBuf::from("public/gallery"),
            manifest_path: PathBuf::from("public/gallery/manifest.json"),
            url_prefix: "/gallery".to_string(),
            scan: ScanConfig::default(),
            images: ImagesConfig::default(),
            quality: QualityConfig::default(),
            manifest: ManifestConfig::default(),
            metadata: MetadataConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl GalleryConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.images.widths.is_empty() {
            return Err(ConfigError::Validation(
                "images.widths must not be empty".into(),
            ));
        }
        if self.images.widths.contains(&0) {
            return Err(ConfigError::Validation(
                "images.widths values must be non-zero".into(),
            ));
        }
        for (name, q) in [("webp", self.quality.webp), ("jpeg", self.quality.jpeg)] {
            if !(1..=100).contains(&q) {
                return Err(ConfigError::Validation(format!(
                    "quality.{name} must be 1-100"
                )));
            }
        }
        if !is_year_month(&self.manifest.default_date) {
            return Err(ConfigError::Validation(
                "manifest.default_date must look like YYYY-MM".into(),
            ));
        }
        if !self.url_prefix.starts_with('/') || self.url_prefix.ends_with('/') {
            return Err(ConfigError::Validation(
                "url_prefix must start with '/' and not end with '/'".into(),
            ));
        }
        if self.scan.roots.keys().any(|k| k.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "scan.roots directory names must not be empty".into(),
            ));
        }
        for rule in &self.metadata.styles {
            if rule.label.trim().is_empty() || rule.keywords.is_empty() {
                return Err(ConfigError::Validation(
                    "metadata.styles entries need a label and at least one keyword".into(),
                ));
            }
        }
        Ok(())
    }

    /// Apply CLI path overrides.
    pub fn with_overrides(
        mut self,
        input_dir: Option<PathBuf>,
        output_dir: Option<PathBuf>,
        manifest_path: Option<PathBuf>,
    ) -> Self {
        if let Some(dir) = input_dir {
            self.input_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        if let Some(path) = manifest_path {
            self.manifest_path = path;
        }
        self
    }
}

fn is_year_month(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() != 7 || bytes[4] != b'-' {
        return false;
    }
    let (year, month) = (&s[..4], &s[5..]);
    year.bytes().all(|b| b.is_ascii_digit())
        && month
            .parse::<u32>()
            .is_ok_and(|m| (1..=12).contains(&m))
}

/// Source discovery settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Directory name (case-insensitive) → category for everything below it.
    pub roots: BTreeMap<String, Category>,
    /// File names containing any of these markers are ignored.
    pub exclude: Vec<String>,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            roots: BTreeMap::from([
                ("piercings".to_string(), Category::Piercing),
                ("portraits".to_string(), Category::Portrait),
                ("tattoos".to_string(), Category::Tattoo),
            ]),
            exclude: ["placeholder", "icon", "logo", "thumb"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

/// Variant size ladder settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Target widths to generate. Widths above the source width are skipped.
    pub widths: Vec<u32>,
    /// JPEG fallbacks are generated for widths up to and including this value.
    pub jpeg_max_width: u32,
    /// Preferred width for the record's `src`.
    pub display_width: u32,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            widths: vec![400, 800, 1200, 2400],
            jpeg_max_width: 800,
            display_width: 800,
        }
    }
}

/// Encoder quality settings (1 = worst, 100 = best).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct QualityConfig {
    pub webp: u32,
    pub jpeg: u32,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self { webp: 82, jpeg: 88 }
    }
}

/// Manifest shaping settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ManifestConfig {
    /// Records flagged `featured`, counted from the top of the sorted list.
    pub featured_count: usize,
    /// Records rendered eagerly with `priority`, counted from the top.
    pub eager_count: usize,
    /// Date bucket used when a file name carries no recognizable date.
    pub default_date: String,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            featured_count: 6,
            eager_count: 4,
            default_date: "2024-01".to_string(),
        }
    }
}

/// Extra filename heuristics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MetadataConfig {
    /// Style rules consulted before the built-in vocabulary.
    pub styles: Vec<StyleRuleConfig>,
}

/// A user-defined style keyword rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StyleRuleConfig {
    pub category: Category,
    pub label: String,
    pub keywords: Vec<String>,
}

/// Parallel processing settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of images processed at once. `1` keeps the run
    /// strictly sequential. Values larger than the core count are clamped.
    pub max_processes: usize,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self { max_processes: 1 }
    }
}

/// Resolve the effective thread count from config.
///
/// Caps at the number of available cores — the user can constrain down, not up.
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.clamp(1, cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(GalleryConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<GalleryConfig, ConfigError> {
    let base = stock_defaults_value();
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: GalleryConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from a TOML file.
///
/// A missing file yields the stock defaults; a present but invalid file is
/// an error.
pub fn load_config(path: &Path) -> Result<GalleryConfig, ConfigError> {
    if !path.exists() {
        return resolve_config(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    resolve_config(Some(value))
}

/// Returns a fully-commented stock `gallery.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Studio Gallery Configuration
# ============================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Root of the original photographs.
input_dir = "assets/gallery-source"

# Where resized variants are written, one subdirectory per category.
output_dir = "public/gallery"

# Where the manifest consumed by the site is written.
manifest_path = "public/gallery/manifest.json"

# Public URL that serves output_dir.
url_prefix = "/gallery"

# ---------------------------------------------------------------------------
# Source discovery
# ---------------------------------------------------------------------------
[scan]
# File names containing any of these markers are skipped.
exclude = ["placeholder", "icon", "logo", "thumb"]

# Directory name -> category. The directory right below a category
# directory names the artist: tattoos/<artist>/<photo>.jpg
[scan.roots]
piercings = "piercing"
portraits = "portrait"
tattoos = "tattoo"

# ---------------------------------------------------------------------------
# Variants
# ---------------------------------------------------------------------------
[images]
# Target widths. Widths larger than the source are never generated.
widths = [400, 800, 1200, 2400]

# JPEG fallbacks are produced for widths up to and including this value.
jpeg_max_width = 800

# Preferred variant width for each record's `src`.
display_width = 800

[quality]
webp = 82
jpeg = 88

# ---------------------------------------------------------------------------
# Manifest
# ---------------------------------------------------------------------------
[manifest]
# Number of newest records flagged as featured.
featured_count = 6

# Number of newest records marked loading="eager" and priority.
eager_count = 4

# Date bucket for files whose names carry no date.
default_date = "2024-01"

# ---------------------------------------------------------------------------
# Filename heuristics
# ---------------------------------------------------------------------------
# Extra style rules are checked before the built-in vocabulary.
# [[metadata.styles]]
# category = "tattoo"
# label = "Ornamental"
# keywords = ["ornamental", "mandala"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Images processed at once. 1 keeps the run sequential.
max_processes = 1
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = GalleryConfig::default();
        assert_eq!(config.images.widths, vec![400, 800, 1200, 2400]);
        assert_eq!(config.quality.webp, 82);
        assert_eq!(config.quality.jpeg, 88);
        assert_eq!(config.scan.roots.get("tattoos"), Some(&Category::Tattoo));
        assert_eq!(config.manifest.default_date, "2024-01");
        assert_eq!(config.processing.max_processes, 1);
    }

    #[test]
    fn default_config_is_valid() {
        assert!(GalleryConfig::default().validate().is_ok());
    }

    #[test]
    fn parse_partial_config() {
        let toml = r#"
[images]
widths = [400, 800, 1200]
"#;
        let config: GalleryConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.images.widths, vec![400, 800, 1200]);
        // Defaults preserved
        assert_eq!(config.images.jpeg_max_width, 800);
        assert_eq!(config.quality.webp, 82);
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("gallery.toml")).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn load_config_merges_nested_tables() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(
            &path,
            r#"
output_dir = "dist/gallery"

[scan.roots]
flash = "tattoo"

[quality]
webp = 75
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("dist/gallery"));
        assert_eq!(config.quality.webp, 75);
        assert_eq!(config.quality.jpeg, 88);
        // Merged, not replaced
        assert_eq!(config.scan.roots.get("flash"), Some(&Category::Tattoo));
        assert_eq!(config.scan.roots.get("tattoos"), Some(&Category::Tattoo));
    }

    #[test]
    fn load_config_reads_style_rules() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(
            &path,
            r#"
[[metadata.styles]]
category = "tattoo"
label = "Ornamental"
keywords = ["ornamental", "mandala"]
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.metadata.styles.len(), 1);
        assert_eq!(config.metadata.styles[0].category, Category::Tattoo);
        assert_eq!(config.metadata.styles[0].label, "Ornamental");
    }

    #[test]
    fn unknown_keys_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(&path, "[images]\nsizes = [100]\n").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("gallery.toml");
        fs::write(&path, "this is not toml [").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn validate_rejects_empty_widths() {
        let mut config = GalleryConfig::default();
        config.images.widths.clear();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn validate_rejects_zero_width() {
        let mut config = GalleryConfig::default();
        config.images.widths = vec![0, 400];
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_quality() {
        let mut config = GalleryConfig::default();
        config.quality.jpeg = 0;
        assert!(config.validate().is_err());
        config.quality.jpeg = 101;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_bad_default_date() {
        let mut config = GalleryConfig::default();
        for bad in ["2024", "2024-13", "24-01", "2024/01"] {
            config.manifest.default_date = bad.to_string();
            assert!(config.validate().is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn validate_rejects_bad_url_prefix() {
        let mut config = GalleryConfig::default();
        config.url_prefix = "gallery".to_string();
        assert!(config.validate().is_err());
        config.url_prefix = "/gallery/".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn overrides_replace_paths() {
        let config = GalleryConfig::default().with_overrides(
            Some(PathBuf::from("in")),
            None,
            Some(PathBuf::from("out/m.json")),
        );
        assert_eq!(config.input_dir, PathBuf::from("in"));
        assert_eq!(config.output_dir, PathBuf::from("public/gallery"));
        assert_eq!(config.manifest_path, PathBuf::from("out/m.json"));
    }

    #[test]
    fn stock_config_parses_to_defaults() {
        let value: toml::Value = toml::from_str(stock_config_toml()).unwrap();
        let config = resolve_config(Some(value)).unwrap();
        assert_eq!(config, GalleryConfig::default());
    }

    #[test]
    fn merge_toml_overlay_wins() {
        let base: toml::Value = toml::from_str("a = 1\n[t]\nx = 1\ny = 2\n").unwrap();
        let overlay: toml::Value = toml::from_str("[t]\ny = 3\n").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged["a"].as_integer(), Some(1));
        assert_eq!(merged["t"]["x"].as_integer(), Some(1));
        assert_eq!(merged["t"]["y"].as_integer(), Some(3));
    }

    #[test]
    fn effective_threads_at_least_one() {
        assert!(effective_threads(&ProcessingConfig { max_processes: 0 }) >= 1);
        assert_eq!(effective_threads(&ProcessingConfig { max_processes: 1 }), 1);
    }
}
