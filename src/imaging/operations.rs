//! High-level image operations.
//!
//! These functions combine calculations with backend execution. They decide
//! which (width, format) pairs an image needs, skip the ones already on disk,
//! and hand the rest to the backend in a single batch.

use super::backend::{BackendError, ImageBackend};
use super::calculations::{PlannedSize, formats_for_width, plan_ladder};
use super::params::{OutputFormat, Quality, ResizeTarget};
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// Configuration for variant generation.
#[derive(Debug, Clone)]
pub struct VariantConfig {
    /// Size ladder (target widths).
    pub widths: Vec<u32>,
    /// JPEG fallbacks are produced for widths up to and including this one.
    pub jpeg_max_width: u32,
    pub webp_quality: Quality,
    pub jpeg_quality: Quality,
    /// Plan only: report what would be written without touching disk.
    pub dry_run: bool,
}

impl Default for VariantConfig {
    fn default() -> Self {
        Self {
            widths: vec![400, 800, 1200, 2400],
            jpeg_max_width: 800,
            webp_quality: Quality::new(82),
            jpeg_quality: Quality::new(88),
            dry_run: false,
        }
    }
}

/// How a variant came to be present in this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantStatus {
    /// Encoded in this run.
    Encoded,
    /// Already on disk from an earlier run; left untouched.
    Existing,
    /// Dry run: would have been encoded.
    Planned,
}

/// One resized file for a source image.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedVariant {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub filename: String,
    pub path: PathBuf,
    /// Bytes on disk (0 for planned variants).
    pub size: u64,
    pub status: VariantStatus,
}

/// Everything the generator did for one source image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VariantOutcome {
    /// Width ascending, WebP before JPEG at equal width.
    pub variants: Vec<GeneratedVariant>,
    /// Ladder widths skipped because they exceed the source width.
    pub skipped_upscale: Vec<u32>,
}

/// Output file name for a variant: `<id>@<width>w.<ext>`.
pub fn variant_filename(id: &str, width: u32, format: OutputFormat) -> String {
    format!("{}@{}w.{}", id, width, format.extension())
}

/// Create the variants of one source image.
///
/// Widths wider than the source are skipped. For every remaining
/// (width, format) pair the destination is checked first: an existing file
/// is reused as-is, otherwise the pair is queued. All queued pairs are
/// encoded from one decode of the source. In dry-run mode nothing is
/// written and queued pairs are reported as [`VariantStatus::Planned`].
pub fn create_variants(
    backend: &impl ImageBackend,
    source: &Path,
    output_dir: &Path,
    id: &str,
    original_dims: (u32, u32),
    config: &VariantConfig,
) -> Result<VariantOutcome> {
    let plan = plan_ladder(original_dims, &config.widths);
    let mut variants = Vec::new();
    let mut targets = Vec::new();

    for PlannedSize { width, height } in plan.sizes {
        for format in formats_for_width(width, config.jpeg_max_width) {
            let filename = variant_filename(id, width, format);
            let path = output_dir.join(&filename);

            let (status, size) = if path.is_file() {
                (VariantStatus::Existing, std::fs::metadata(&path)?.len())
            } else if config.dry_run {
                (VariantStatus::Planned, 0)
            } else {
                let quality = match format {
                    OutputFormat::Webp => config.webp_quality,
                    OutputFormat::Jpeg => config.jpeg_quality,
                };
                targets.push(ResizeTarget {
                    output: path.clone(),
                    width,
                    height,
                    format,
                    quality,
                });
                (VariantStatus::Encoded, 0)
            };

            variants.push(GeneratedVariant {
                width,
                height,
                format,
                filename,
                path,
                size,
                status,
            });
        }
    }

    if !targets.is_empty() {
        std::fs::create_dir_all(output_dir)?;
        backend.resize(source, &targets)?;
        for variant in variants
            .iter_mut()
            .filter(|v| v.status == VariantStatus::Encoded)
        {
            variant.size = std::fs::metadata(&variant.path)?.len();
        }
    }

    Ok(VariantOutcome {
        variants,
        skipped_upscale: plan.skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use tempfile::TempDir;

    fn widths(outcome: &VariantOutcome) -> Vec<(u32, OutputFormat)> {
        outcome
            .variants
            .iter()
            .map(|v| (v.width, v.format))
            .collect()
    }

    #[test]
    fn get_dimensions_calls_backend() {
        let backend = MockBackend::with_dimensions(1920, 1080);
        let dims = get_dimensions(&backend, Path::new("/test.jpg")).unwrap();
        assert_eq!(dims, (1920, 1080));
    }

    #[test]
    fn variant_filename_format() {
        assert_eq!(
            variant_filename("debi-sleeve-blackwork", 800, OutputFormat::Webp),
            "debi-sleeve-blackwork@800w.webp"
        );
        assert_eq!(
            variant_filename("x", 400, OutputFormat::Jpeg),
            "x@400w.jpg"
        );
    }

    #[test]
    fn create_variants_full_ladder_order() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let outcome = create_variants(
            &backend,
            Path::new("/src/a.jpg"),
            tmp.path(),
            "a",
            (2400, 1600),
            &VariantConfig::default(),
        )
        .unwrap();

        assert_eq!(
            widths(&outcome),
            vec![
                (400, OutputFormat::Webp),
                (400, OutputFormat::Jpeg),
                (800, OutputFormat::Webp),
                (800, OutputFormat::Jpeg),
                (1200, OutputFormat::Webp),
                (2400, OutputFormat::Webp),
            ]
        );
        assert!(outcome.skipped_upscale.is_empty());
        assert!(
            outcome
                .variants
                .iter()
                .all(|v| v.status == VariantStatus::Encoded && v.size > 0)
        );
    }

    #[test]
    fn create_variants_skips_upscale() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();

        let outcome = create_variants(
            &backend,
            Path::new("/src/a.jpg"),
            tmp.path(),
            "a",
            (1000, 750),
            &VariantConfig::default(),
        )
        .unwrap();

        assert!(outcome.variants.iter().all(|v| v.width <= 1000));
        assert_eq!(outcome.skipped_upscale, vec![1200, 2400]);
        assert_eq!(backend.resize_count(), 4);
    }

    #[test]
    fn create_variants_uses_per_format_quality() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let config = VariantConfig {
            widths: vec![400],
            ..VariantConfig::default()
        };

        create_variants(
            &backend,
            Path::new("/src/a.jpg"),
            tmp.path(),
            "a",
            (800, 600),
            &config,
        )
        .unwrap();

        let ops = backend.get_operations();
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize { format: OutputFormat::Webp, quality: 82, height: 300, .. }
        ));
        assert!(matches!(
            &ops[1],
            RecordedOp::Resize { format: OutputFormat::Jpeg, quality: 88, .. }
        ));
    }

    #[test]
    fn create_variants_reuses_existing_files() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("a@400w.webp"), b"already here").unwrap();
        let backend = MockBackend::new();
        let config = VariantConfig {
            widths: vec![400],
            ..VariantConfig::default()
        };

        let outcome = create_variants(
            &backend,
            Path::new("/src/a.jpg"),
            tmp.path(),
            "a",
            (800, 600),
            &config,
        )
        .unwrap();

        assert_eq!(outcome.variants[0].status, VariantStatus::Existing);
        assert_eq!(outcome.variants[0].size, 12);
        assert_eq!(outcome.variants[1].status, VariantStatus::Encoded);
        assert_eq!(backend.resize_count(), 1);
    }

    #[test]
    fn create_variants_second_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new();
        let config = VariantConfig::default();

        create_variants(&backend, Path::new("/a.jpg"), tmp.path(), "a", (1600, 900), &config)
            .unwrap();
        let first = backend.resize_count();
        let outcome =
            create_variants(&backend, Path::new("/a.jpg"), tmp.path(), "a", (1600, 900), &config)
                .unwrap();

        assert_eq!(backend.resize_count(), first);
        assert!(
            outcome
                .variants
                .iter()
                .all(|v| v.status == VariantStatus::Existing)
        );
    }

    #[test]
    fn create_variants_dry_run_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let out_dir = tmp.path().join("tattoo");
        let backend = MockBackend::new();
        let config = VariantConfig {
            dry_run: true,
            ..VariantConfig::default()
        };

        let outcome = create_variants(
            &backend,
            Path::new("/a.jpg"),
            &out_dir,
            "a",
            (1600, 900),
            &config,
        )
        .unwrap();

        assert!(!out_dir.exists());
        assert_eq!(backend.resize_count(), 0);
        assert!(
            outcome
                .variants
                .iter()
                .all(|v| v.status == VariantStatus::Planned && v.size == 0)
        );
    }

    #[test]
    fn create_variants_propagates_backend_failure() {
        let tmp = TempDir::new().unwrap();
        let backend = MockBackend::new().failing_on("broken.jpg");

        let result = create_variants(
            &backend,
            Path::new("/src/broken.jpg"),
            tmp.path(),
            "broken",
            (1600, 900),
            &VariantConfig::default(),
        );
        assert!(result.is_err());
    }
}
