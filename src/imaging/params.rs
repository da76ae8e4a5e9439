//! Parameter types for image operations.
//!
//! These structs describe *what* to encode, not *how*. They are the interface
//! between [`operations`](super::operations), which decides which variants an
//! image needs, and the [`backend`](super::backend), which does the pixel work.
//!
//! - [`Quality`] — lossy encoding quality (1–100). Clamped on construction.
//! - [`OutputFormat`] — the encodings the pipeline emits.
//! - [`ResizeTarget`] — one output file: path, dimensions, format, quality.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Quality setting for lossy image encoding (1-100).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quality(u32);

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
        Self(85)
    }
}

/// Encoded format of a generated variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    Webp,
    Jpeg,
}

impl OutputFormat {
    /// File extension used for generated files.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Webp => "webp",
            OutputFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Webp => f.write_str("webp"),
            OutputFormat::Jpeg => f.write_str("jpeg"),
        }
    }
}

/// A single file to produce from a decoded source.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeTarget {
    pub output: PathBuf,
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}
