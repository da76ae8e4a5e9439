//! Run accounting.
//!
//! Each image produces its own [`RunSummary`]; the batch folds them together
//! with [`RunSummary::merge`]. There is no shared counter, so parallel and
//! sequential runs report the same totals.

use crate::imaging::{GeneratedVariant, VariantStatus};
use std::path::PathBuf;

/// An image that could not be processed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedImage {
    pub path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub discovered: usize,
    pub excluded: usize,
    pub processed: usize,
    pub failed: Vec<FailedImage>,
    pub variants_written: usize,
    pub variants_existing: usize,
    pub variants_planned: usize,
    pub variants_skipped_upscale: usize,
    pub original_bytes: u64,
    pub variant_bytes: u64,
    /// Bytes of each processed image's display (`src`) variant.
    pub display_bytes: u64,
}

impl RunSummary {
    /// Summary for one successfully processed image.
    pub fn for_image(
        original_bytes: u64,
        variants: &[GeneratedVariant],
        skipped_upscale: usize,
        display_bytes: u64,
    ) -> Self {
        let mut summary = Self {
            processed: 1,
            original_bytes,
            variants_skipped_upscale: skipped_upscale,
            display_bytes,
            ..Self::default()
        };
        for variant in variants {
            match variant.status {
                VariantStatus::Encoded => summary.variants_written += 1,
                VariantStatus::Existing => summary.variants_existing += 1,
                VariantStatus::Planned => summary.variants_planned += 1,
            }
            summary.variant_bytes += variant.size;
        }
        summary
    }

    /// Summary for one failed image.
    pub fn for_failure(path: PathBuf, error: String) -> Self {
        Self {
            failed: vec![FailedImage { path, error }],
            ..Self::default()
        }
    }

    /// Combine two summaries. Associative, with `default()` as identity.
    pub fn merge(mut self, other: Self) -> Self {
        self.discovered += other.discovered;
        self.excluded += other.excluded;
        self.processed += other.processed;
        self.failed.extend(other.failed);
        self.variants_written += other.variants_written;
        self.variants_existing += other.variants_existing;
        self.variants_planned += other.variants_planned;
        self.variants_skipped_upscale += other.variants_skipped_upscale;
        self.original_bytes += other.original_bytes;
        self.variant_bytes += other.variant_bytes;
        self.display_bytes += other.display_bytes;
        self
    }

    pub fn has_failures(&self) -> bool {
        !self.failed.is_empty()
    }

    /// Bytes saved by serving the display variants instead of the originals.
    /// Zero when the variants are larger.
    pub fn saved_bytes(&self) -> u64 {
        self.original_bytes.saturating_sub(self.display_bytes)
    }
}
