//! Variant generation and record assembly.
//!
//! Stage 2 of the gallery pipeline. Takes the sources found by the scanner,
//! writes the responsive variants of each one and turns it into an
//! [`ImageRecord`] ready for the manifest.
//!
//! ## Output Structure
//!
//! ```text
//! public/gallery/
//! ├── manifest.json
//! ├── tattoo/
//! │   ├── debi-sleeve-blackwork@400w.webp
//! │   ├── debi-sleeve-blackwork@400w.jpg      # JPEG fallback (<= 800w)
//! │   ├── debi-sleeve-blackwork@800w.webp
//! │   ├── debi-sleeve-blackwork@800w.jpg
//! │   └── debi-sleeve-blackwork@1200w.webp    # 2400w skipped: source is 1600px
//! └── piercing/
//!     └── ...
//! ```
//!
//! ## Ids
//!
//! Each source gets the id `<artist-slug>-<stem-slug>`. When several sources
//! share that id (`rose.jpg` and `rose.png`), each of them gets an 8-digit
//! hash of its own relative path appended instead. An id is a function of the
//! source's path alone, so adding or removing a photo never moves another
//! photo onto variant files written for a different source.
//!
//! ## Failure Isolation
//!
//! An image that cannot be identified, decoded or encoded is logged, reported
//! as a [`ProcessEvent::ImageFailed`] and left out of the result. The rest of
//! the batch carries on.
//!
//! ## Parallel Processing
//!
//! Images are processed with [rayon](https://docs.rs/rayon) on the global
//! pool. With `max_processes = 1` the pool has a single thread and the run is
//! sequential. Result order always follows the input order.

use crate::config::GalleryConfig;
use crate::imaging::{
    BackendError, ImageBackend, OutputFormat, Quality, RustBackend, VariantConfig, VariantStatus,
    aspect_ratio_label, create_variants, get_dimensions,
};
use crate::manifest::{ImageRecord, Loading, VariantRef};
use crate::metadata::MetadataRules;
use crate::naming;
use crate::summary::RunSummary;
use crate::types::SourceImage;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Output directory {} is not writable: {source}", path.display())]
    OutputNotWritable {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Create `output_dir` and make sure files can be written into it.
///
/// Run before any image work: an unusable output directory is a setup
/// error, not a failure of every single image.
pub fn prepare_output_dir(output_dir: &Path) -> Result<(), ProcessError> {
    let not_writable = |source: std::io::Error| ProcessError::OutputNotWritable {
        path: output_dir.to_path_buf(),
        source,
    };
    std::fs::create_dir_all(output_dir).map_err(not_writable)?;
    let check = output_dir.join(".studio-gallery-write-check");
    std::fs::write(&check, b"").map_err(not_writable)?;
    std::fs::remove_file(&check).map_err(not_writable)
}

/// Configuration for the processing stage.
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub variants: VariantConfig,
    pub output_dir: PathBuf,
    pub url_prefix: String,
    /// Preferred width of each record's `src`.
    pub display_width: u32,
    pub rules: MetadataRules,
}

impl ProcessConfig {
    /// Build a ProcessConfig from GalleryConfig values.
    pub fn from_gallery_config(config: &GalleryConfig, dry_run: bool) -> Self {
        Self {
            variants: VariantConfig {
                widths: config.images.widths.clone(),
                jpeg_max_width: config.images.jpeg_max_width,
                webp_quality: Quality::new(config.quality.webp),
                jpeg_quality: Quality::new(config.quality.jpeg),
                dry_run,
            },
            output_dir: config.output_dir.clone(),
            url_prefix: config.url_prefix.clone(),
            display_width: config.images.display_width,
            rules: MetadataRules::from_config(&config.metadata, &config.manifest.default_date),
        }
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::from_gallery_config(&GalleryConfig::default(), false)
    }
}

/// Status of one variant, for progress display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantInfo {
    /// Display label, e.g. `"800w webp"`.
    pub label: String,
    pub status: VariantStatus,
}

/// Progress events emitted during processing.
///
/// Sent through an optional channel so the caller can display progress
/// as images complete, even when processing runs in parallel.
#[derive(Debug, Clone)]
pub enum ProcessEvent {
    ImageProcessed {
        /// 1-based position in scan order.
        index: usize,
        total: usize,
        id: String,
        title: String,
        source_path: String,
        variants: Vec<VariantInfo>,
        skipped_upscale: Vec<u32>,
    },
    ImageFailed {
        index: usize,
        total: usize,
        source_path: String,
        error: String,
    },
}

/// Everything produced for one successfully processed source.
struct ProcessedImage {
    record: ImageRecord,
    summary: RunSummary,
    variants: Vec<VariantInfo>,
    skipped_upscale: Vec<u32>,
}

/// Records of the successfully processed images plus run accounting.
#[derive(Debug)]
pub struct ProcessResult {
    /// In scan order; sorting happens in the manifest stage.
    pub records: Vec<ImageRecord>,
    pub summary: RunSummary,
}

/// Assign a unique id to every source, in order.
///
/// Sources whose base ids collide all get a suffix hashed from their own
/// relative path, so an id never depends on which other files are present.
pub fn assign_ids(sources: &[SourceImage]) -> Vec<String> {
    let bases: Vec<String> = sources.iter().map(base_id).collect();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for base in &bases {
        *counts.entry(base.as_str()).or_default() += 1;
    }

    let mut used = HashSet::new();
    sources
        .iter()
        .zip(&bases)
        .map(|(source, base)| {
            let id = if counts.get(base.as_str()).copied().unwrap_or(0) > 1 {
                format!("{}-{}", base, path_hash(&source.relative_path))
            } else {
                base.clone()
            };
            // A hashed id can still clash with another base id.
            let mut candidate = id.clone();
            let mut n = 2;
            while used.contains(&candidate) {
                candidate = format!("{}-{}", id, n);
                n += 1;
            }
            used.insert(candidate.clone());
            candidate
        })
        .collect()
}

/// First 8 hex digits of the SHA-256 of a relative path.
fn path_hash(relative_path: &str) -> String {
    Sha256::digest(relative_path.as_bytes())[..4]
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect()
}

fn base_id(source: &SourceImage) -> String {
    let (stem, _) = naming::split_extension(&source.filename);
    let artist = naming::sanitize_slug(&source.artist);
    let stem = naming::sanitize_slug(stem);
    match (artist.is_empty(), stem.is_empty()) {
        (false, false) => format!("{}-{}", artist, stem),
        (false, true) => artist,
        (true, false) => stem,
        (true, true) => "image".to_string(),
    }
}

/// Process all sources with the production backend.
pub fn process(
    sources: &[SourceImage],
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> ProcessResult {
    process_with_backend(&RustBackend::new(), sources, config, progress)
}

/// Process images using a specific backend (allows testing with mock).
pub fn process_with_backend(
    backend: &impl ImageBackend,
    sources: &[SourceImage],
    config: &ProcessConfig,
    progress: Option<Sender<ProcessEvent>>,
) -> ProcessResult {
    let ids = assign_ids(sources);
    let total = sources.len();
    log::info!("Processing {} images", total);

    let outcomes: Vec<Result<ProcessedImage, ProcessError>> = sources
        .par_iter()
        .zip(ids.par_iter())
        .enumerate()
        .map_with(progress, |progress, (i, (source, id))| {
            let outcome = process_image(backend, source, id, config);
            let event = match &outcome {
                Ok(processed) => {
                    log::debug!(
                        "{} -> {} ({} variants)",
                        source.relative_path,
                        processed.record.id,
                        processed.variants.len()
                    );
                    ProcessEvent::ImageProcessed {
                        index: i + 1,
                        total,
                        id: processed.record.id.clone(),
                        title: processed.record.title.clone(),
                        source_path: source.relative_path.clone(),
                        variants: processed.variants.clone(),
                        skipped_upscale: processed.skipped_upscale.clone(),
                    }
                }
                Err(e) => {
                    log::warn!("Failed to process {}: {}", source.relative_path, e);
                    ProcessEvent::ImageFailed {
                        index: i + 1,
                        total,
                        source_path: source.relative_path.clone(),
                        error: e.to_string(),
                    }
                }
            };
            if let Some(tx) = progress {
                tx.send(event).ok();
            }
            outcome
        })
        .collect();

    let mut records = Vec::with_capacity(outcomes.len());
    let mut summary = RunSummary::default();
    for (source, outcome) in sources.iter().zip(outcomes) {
        match outcome {
            Ok(processed) => {
                records.push(processed.record);
                summary = summary.merge(processed.summary);
            }
            Err(e) => {
                summary = summary.merge(RunSummary::for_failure(
                    source.path.clone(),
                    e.to_string(),
                ));
            }
        }
    }

    ProcessResult { records, summary }
}

/// Identify, generate variants and synthesize metadata for one source.
fn process_image(
    backend: &impl ImageBackend,
    source: &SourceImage,
    id: &str,
    config: &ProcessConfig,
) -> Result<ProcessedImage, ProcessError> {
    let (width, height) = get_dimensions(backend, &source.path)?;
    let category = source.category.as_str();
    let output_dir = config.output_dir.join(category);

    let outcome = create_variants(
        backend,
        &source.path,
        &output_dir,
        id,
        (width, height),
        &config.variants,
    )?;
    for skipped in &outcome.skipped_upscale {
        log::debug!(
            "{}: skipping {}w, source is only {}px wide",
            source.relative_path,
            skipped,
            width
        );
    }

    let variants: Vec<VariantRef> = outcome
        .variants
        .iter()
        .map(|v| VariantRef {
            width: v.width,
            format: v.format,
            filename: v.filename.clone(),
            url: format!("{}/{}/{}", config.url_prefix, category, v.filename),
            size: v.size,
        })
        .collect();

    let display = select_display_variant(&variants, config.display_width);
    let src = display
        .map(|v| v.url.clone())
        .unwrap_or_else(|| source.relative_path.clone());
    let display_bytes = display.map(|v| v.size).unwrap_or(source.byte_size);

    let summary = RunSummary::for_image(
        source.byte_size,
        &outcome.variants,
        outcome.skipped_upscale.len(),
        display_bytes,
    );

    let meta = config
        .rules
        .synthesize(&source.filename, &source.artist, source.category);

    let record = ImageRecord {
        id: id.to_string(),
        original: source.relative_path.clone(),
        original_size: source.byte_size,
        title: meta.title,
        alt: meta.alt,
        category: source.category,
        artist: source.artist.clone(),
        style: meta.style,
        date: meta.date,
        width,
        height,
        aspect_ratio: aspect_ratio_label(width, height),
        srcset: build_srcset(&variants),
        variants,
        src,
        featured: false,
        loading: Loading::Lazy,
        priority: false,
        confidence: meta.confidence,
    };
    let infos = outcome
        .variants
        .iter()
        .map(|v| VariantInfo {
            label: format!("{}w {}", v.width, v.format),
            status: v.status,
        })
        .collect();

    Ok(ProcessedImage {
        record,
        summary,
        variants: infos,
        skipped_upscale: outcome.skipped_upscale,
    })
}

/// `"<url> <w>w, ..."` over the WebP variants.
pub fn build_srcset(variants: &[VariantRef]) -> String {
    variants
        .iter()
        .filter(|v| v.format == OutputFormat::Webp)
        .map(|v| format!("{} {}w", v.url, v.width))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Pick the variant a record's `src` points at.
///
/// WebP at `display_width`, else the largest WebP below it, else the
/// smallest WebP, else any variant.
pub fn select_display_variant(variants: &[VariantRef], display_width: u32) -> Option<&VariantRef> {
    let webp = || variants.iter().filter(|v| v.format == OutputFormat::Webp);
    webp()
        .find(|v| v.width == display_width)
        .or_else(|| {
            webp()
                .filter(|v| v.width < display_width)
                .max_by_key(|v| v.width)
        })
        .or_else(|| webp().min_by_key(|v| v.width))
        .or_else(|| variants.first())
}
