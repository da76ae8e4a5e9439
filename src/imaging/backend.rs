//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the pipeline needs:
//! identify (read dimensions) and resize (decode once, write every requested
//! target). The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend).

use super::params::ResizeTarget;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
///
/// `Sync` so a backend can be shared across the rayon pool.
pub trait ImageBackend: Sync {
    /// Get image dimensions without a full decode where possible.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode `source` once and write each target.
    ///
    /// Targets are written in order; the first failure aborts the rest.
    fn resize(&self, source: &Path, targets: &[ResizeTarget]) -> Result<(), BackendError>;
}
