//! Post-build integrity check.
//!
//! Compares a written manifest with the files under the output directory.
//! Nothing is modified; problems are collected and returned so the CLI can
//! print all of them at once.

use crate::manifest::{Manifest, compute_stats};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// One inconsistency between the manifest and the disk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyProblem {
    #[error("duplicate id {0}")]
    DuplicateId(String),
    #[error("{id}: src {src} is neither a variant nor the original")]
    DanglingSrc { id: String, src: String },
    #[error("{id}: variant url {url} is outside the url prefix")]
    OutsidePrefix { id: String, url: String },
    #[error("{id}: variant file missing: {}", .path.display())]
    MissingFile { id: String, path: PathBuf },
    #[error("{id}: {} is {actual} bytes, manifest says {expected}", .path.display())]
    SizeMismatch {
        id: String,
        path: PathBuf,
        expected: u64,
        actual: u64,
    },
    #[error("stats do not match the image list")]
    StatsMismatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    pub images_checked: usize,
    pub variants_checked: usize,
    pub problems: Vec<VerifyProblem>,
}

impl VerifyReport {
    pub fn is_ok(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Check `manifest` against the variant files under `output_dir`.
pub fn verify(manifest: &Manifest, output_dir: &Path, url_prefix: &str) -> VerifyReport {
    let mut report = VerifyReport {
        images_checked: manifest.images.len(),
        ..VerifyReport::default()
    };
    let prefix = format!("{}/", url_prefix.trim_end_matches('/'));
    let mut seen = HashSet::new();

    for record in &manifest.images {
        if !seen.insert(record.id.as_str()) {
            report
                .problems
                .push(VerifyProblem::DuplicateId(record.id.clone()));
        }

        let src_known = record.src == record.original
            || record.variants.iter().any(|v| v.url == record.src);
        if !src_known {
            report.problems.push(VerifyProblem::DanglingSrc {
                id: record.id.clone(),
                src: record.src.clone(),
            });
        }

        for variant in &record.variants {
            report.variants_checked += 1;
            let Some(relative) = variant.url.strip_prefix(&prefix) else {
                report.problems.push(VerifyProblem::OutsidePrefix {
                    id: record.id.clone(),
                    url: variant.url.clone(),
                });
                continue;
            };
            let path = output_dir.join(relative);
            match std::fs::metadata(&path) {
                Ok(meta) if meta.is_file() => {
                    if meta.len() != variant.size {
                        report.problems.push(VerifyProblem::SizeMismatch {
                            id: record.id.clone(),
                            path,
                            expected: variant.size,
                            actual: meta.len(),
                        });
                    }
                }
                _ => report.problems.push(VerifyProblem::MissingFile {
                    id: record.id.clone(),
                    path,
                }),
            }
        }
    }

    if compute_stats(&manifest.images) != manifest.stats {
        report.problems.push(VerifyProblem::StatsMismatch);
    }

    log::info!(
        "Verified {} images, {} variants: {} problems",
        report.images_checked,
        report.variants_checked,
        report.problems.len()
    );
    report
}
