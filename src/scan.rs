//! Source discovery.
//!
//! Stage 1 of the gallery pipeline. Walks the input tree and returns every
//! original photograph that should be published, tagged with its category and
//! artist.
//!
//! ## Directory Structure
//!
//! ```text
//! assets/gallery-source/           # Input root
//! ├── tattoos/                     # Category directory (see [scan.roots])
//! │   ├── debi/                    # Artist directory
//! │   │   ├── sleeve-blackwork.jpg
//! │   │   └── rose-2023-05-14.png
//! │   └── flash-wall.jpg           # No artist dir → "Unknown Artist"
//! ├── piercings/
//! │   └── mara/
//! │       └── helix-gold.jpg
//! ├── portraits/
//! │   └── team-shot.jpg
//! └── shop-front.jpg               # Outside any category → "other"
//! ```
//!
//! ## Filters
//!
//! A file is a source when all of these hold:
//! - extension is `jpg`, `jpeg` or `png` (any case)
//! - the name is not a generated variant (`name@800w.webp`)
//! - the name contains no exclusion marker (`placeholder`, `icon`, ...)
//!
//! Hidden files and directories are skipped entirely. Entries are visited in
//! file-name order, so the result is identical across runs and platforms.

use crate::config::ScanConfig;
use crate::naming;
use crate::types::{Category, SourceFormat, SourceImage, UNKNOWN_ARTIST};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Input path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Failed to walk input tree: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Outcome of a scan.
///
/// A missing input root is a normal "nothing to do yet" state for a fresh
/// checkout, so it is reported as a value rather than an error.
#[derive(Debug)]
pub enum ScanResult {
    Found {
        sources: Vec<SourceImage>,
        /// Relative paths of supported files skipped by an exclusion marker.
        excluded: Vec<String>,
    },
    NotFound(PathBuf),
}

/// Discover source images under `root`.
pub fn scan(root: &Path, config: &ScanConfig) -> Result<ScanResult, ScanError> {
    if !root.exists() {
        return Ok(ScanResult::NotFound(root.to_path_buf()));
    }
    if !root.is_dir() {
        return Err(ScanError::NotADirectory(root.to_path_buf()));
    }
    log::info!("Scanning {}", root.display());

    let roots: HashMap<String, Category> = config
        .roots
        .iter()
        .map(|(dir, category)| (dir.to_lowercase(), *category))
        .collect();
    let markers: Vec<String> = config
        .exclude
        .iter()
        .filter(|m| !m.is_empty())
        .map(|m| m.to_lowercase())
        .collect();

    let mut sources = Vec::new();
    let mut excluded = Vec::new();

    let walker = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    for entry in walker {
        // Only an unreadable root is fatal; anything below it is skipped.
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) if e.depth() > 0 => {
                log::warn!("Skipping unreadable entry: {e}");
                continue;
            }
            Err(e) => return Err(e.into()),
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(root) else {
            continue;
        };
        let segments: Vec<String> = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect();
        let Some((filename, dirs)) = segments.split_last() else {
            continue;
        };
        let relative_path = segments.join("/");

        let (_, ext) = naming::split_extension(filename);
        let Some(format) = ext.and_then(SourceFormat::from_extension) else {
            log::debug!("Skipping unsupported file {relative_path}");
            continue;
        };
        if naming::is_variant_filename(filename) {
            log::debug!("Skipping generated variant {relative_path}");
            continue;
        }
        let lower_name = filename.to_lowercase();
        if markers.iter().any(|m| lower_name.contains(m.as_str())) {
            log::debug!("Excluding {relative_path}");
            excluded.push(relative_path);
            continue;
        }

        let byte_size = match entry.metadata() {
            Ok(metadata) => metadata.len(),
            Err(e) => {
                log::warn!("Skipping {relative_path}: {e}");
                continue;
            }
        };
        let (category, artist) = classify(dirs, &roots);
        sources.push(SourceImage {
            path: entry.path().to_path_buf(),
            relative_path,
            filename: filename.clone(),
            category,
            artist,
            byte_size,
            format,
        });
    }

    log::info!(
        "Found {} source images ({} excluded)",
        sources.len(),
        excluded.len()
    );
    Ok(ScanResult::Found { sources, excluded })
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.file_name().to_string_lossy().starts_with('.')
}

/// Category from the first directory listed in `roots`; artist from the
/// directory right below it.
fn classify(dirs: &[String], roots: &HashMap<String, Category>) -> (Category, String) {
    for (i, dir) in dirs.iter().enumerate() {
        if let Some(category) = roots.get(&dir.to_lowercase()) {
            let artist = dirs
                .get(i + 1)
                .map(|a| a.to_lowercase())
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string());
            return (*category, artist);
        }
    }
    (Category::Other, UNKNOWN_ARTIST.to_string())
}
