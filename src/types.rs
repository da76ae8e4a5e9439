//! Shared types used across pipeline stages.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Placeholder artist for sources outside any `<category>/<artist>/` directory.
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Gallery category of a source image.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Tattoo,
    Piercing,
    Portrait,
    #[default]
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Tattoo => "tattoo",
            Category::Piercing => "piercing",
            Category::Portrait => "portrait",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Encoding of an original file, from its extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Jpeg,
    Png,
}

impl SourceFormat {
    /// Map a (case-insensitive) extension to a supported source format.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(SourceFormat::Jpeg),
            "png" => Some(SourceFormat::Png),
            _ => None,
        }
    }
}

/// An original image discovered on disk. Never modified by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    /// Absolute (or input-root-joined) path to the file.
    pub path: PathBuf,
    /// Path relative to the input root, `/`-separated.
    pub relative_path: String,
    pub filename: String,
    pub category: Category,
    /// Lowercased artist directory name, or [`UNKNOWN_ARTIST`].
    pub artist: String,
    pub byte_size: u64,
    pub format: SourceFormat,
}

/// Whether a heuristic field came from a real match or a fallback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    Heuristic,
    None,
}
