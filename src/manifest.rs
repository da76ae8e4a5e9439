//! The gallery manifest.
//!
//! Final stage of the pipeline: orders the processed records, marks the ones
//! the site renders first, computes stats and writes `manifest.json`.
//!
//! ```json
//! {
//!   "version": "1.0",
//!   "generatedAt": "2026-03-01T12:00:00Z",
//!   "stats": { "totalImages": 1, "totalVariants": 3, "totalSize": 91234, ... },
//!   "images": [
//!     {
//!       "id": "debi-sleeve-blackwork",
//!       "original": "tattoos/debi/sleeve-blackwork.jpg",
//!       "title": "Sleeve Blackwork",
//!       "category": "tattoo",
//!       "variants": [ { "width": 400, "format": "webp", ... }, ... ],
//!       "src": "/gallery/tattoo/debi-sleeve-blackwork@800w.webp",
//!       "featured": true,
//!       "loading": "eager",
//!       "priority": true,
//!       ...
//!     }
//!   ]
//! }
//! ```
//!
//! The file is replaced as a whole: written to a temporary sibling first,
//! then renamed over the target, so the site never reads a half-written
//! manifest.

use crate::config::ManifestConfig;
use crate::imaging::OutputFormat;
use crate::metadata::MetadataConfidence;
use crate::types::Category;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_VERSION: &str = "1.0";

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    pub version: String,
    pub generated_at: String,
    pub stats: ManifestStats,
    pub images: Vec<ImageRecord>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestStats {
    pub total_images: usize,
    pub total_variants: usize,
    /// Sum of variant file sizes.
    pub total_size: u64,
    /// Sum of original file sizes.
    pub original_size: u64,
    pub by_category: BTreeMap<String, usize>,
    pub by_artist: BTreeMap<String, usize>,
    pub by_date: BTreeMap<String, usize>,
    pub featured: usize,
}

/// A resized file as the site references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantRef {
    pub width: u32,
    pub format: OutputFormat,
    pub filename: String,
    pub url: String,
    pub size: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Loading {
    Eager,
    Lazy,
}

/// One published photograph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageRecord {
    pub id: String,
    /// Source path relative to the input root.
    pub original: String,
    pub original_size: u64,
    pub title: String,
    pub alt: String,
    pub category: Category,
    pub artist: String,
    pub style: String,
    /// `YYYY-MM` bucket.
    pub date: String,
    pub width: u32,
    pub height: u32,
    pub aspect_ratio: String,
    pub variants: Vec<VariantRef>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub srcset: String,
    pub src: String,
    pub featured: bool,
    pub loading: Loading,
    pub priority: bool,
    pub confidence: MetadataConfidence,
}

/// Current time in RFC 3339, UTC, second precision.
pub fn timestamp_now() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
}

/// Order records and assign presentation flags.
///
/// Newest date bucket first, then artist, then id. The first
/// `featured_count` records are featured; the first `eager_count` are
/// loaded eagerly with priority.
pub fn build_manifest(
    mut records: Vec<ImageRecord>,
    config: &ManifestConfig,
    generated_at: String,
) -> Manifest {
    records.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| a.artist.cmp(&b.artist))
            .then_with(|| a.id.cmp(&b.id))
    });

    for (i, record) in records.iter_mut().enumerate() {
        record.featured = i < config.featured_count;
        let eager = i < config.eager_count;
        record.loading = if eager { Loading::Eager } else { Loading::Lazy };
        record.priority = eager;
    }

    Manifest {
        version: MANIFEST_VERSION.to_string(),
        generated_at,
        stats: compute_stats(&records),
        images: records,
    }
}

pub fn compute_stats(records: &[ImageRecord]) -> ManifestStats {
    let mut stats = ManifestStats {
        total_images: records.len(),
        ..ManifestStats::default()
    };
    for record in records {
        stats.total_variants += record.variants.len();
        stats.total_size += record.variants.iter().map(|v| v.size).sum::<u64>();
        stats.original_size += record.original_size;
        *stats
            .by_category
            .entry(record.category.as_str().to_string())
            .or_default() += 1;
        *stats.by_artist.entry(record.artist.clone()).or_default() += 1;
        *stats.by_date.entry(record.date.clone()).or_default() += 1;
        if record.featured {
            stats.featured += 1;
        }
    }
    stats
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write the manifest as pretty JSON, replacing any previous file whole.
pub fn write_manifest(manifest: &Manifest, path: &Path) -> Result<(), ManifestError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(manifest)?;
    let tmp = temp_path(path);
    fs::write(&tmp, json)?;
    if let Err(e) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(e.into());
    }
    log::info!(
        "Wrote manifest with {} images to {}",
        manifest.images.len(),
        path.display()
    );
    Ok(())
}

pub fn read_manifest(path: &Path) -> Result<Manifest, ManifestError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}
