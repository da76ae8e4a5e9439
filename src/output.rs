//! CLI output formatting for all pipeline stages.
//!
//! # Information-First Display
//!
//! Every entity leads with its semantic identity (category, artist, title)
//! and shows file paths as indented `Source:` context lines, so the output
//! reads as a gallery inventory while still tracing back to files.
//!
//! # Output Format
//!
//! ## Scan
//!
//! ```text
//! tattoo (3 photos)
//!     debi (2 photos)
//!         001 sleeve-blackwork.jpg
//!             Source: tattoos/debi/sleeve-blackwork.jpg
//!
//! Excluded
//!     tattoos/debi/studio-logo.png
//! ```
//!
//! ## Process
//!
//! ```text
//! [001/012] Sleeve Blackwork
//!     Source: tattoos/debi/sleeve-blackwork.jpg
//!     400w webp: encoded
//!     400w jpeg: cached
//!     2400w: skipped (source too narrow)
//! [002/012] FAILED tattoos/debi/broken.jpg
//!     Error: Image processing failed: ...
//! ```
//!
//! ## Summary
//!
//! ```text
//! Processed 11 of 12 images (1 failed, 2 excluded)
//! Variants: 40 encoded, 14 cached, 0 planned, 6 skipped
//! Size: 48.2 MB originals → 3.1 MB display (45.1 MB saved)
//! ```
//!
//! # Architecture
//!
//! Each stage has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::imaging::VariantStatus;
use crate::process::ProcessEvent;
use crate::summary::RunSummary;
use crate::types::SourceImage;
use crate::verify::VerifyReport;
use std::collections::BTreeMap;
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn photos(n: usize) -> String {
    if n == 1 {
        "1 photo".to_string()
    } else {
        format!("{} photos", n)
    }
}

/// Human-readable byte count (`1.5 MB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn status_label(status: VariantStatus) -> &'static str {
    match status {
        VariantStatus::Encoded => "encoded",
        VariantStatus::Existing => "cached",
        VariantStatus::Planned => "planned",
    }
}

// ============================================================================
// Stage 1: Scan output
// ============================================================================

/// Format discovered sources grouped by category, then artist.
pub fn format_scan_output(sources: &[SourceImage], excluded: &[String]) -> Vec<String> {
    let mut lines = Vec::new();

    let mut grouped: BTreeMap<&str, BTreeMap<&str, Vec<&SourceImage>>> = BTreeMap::new();
    for source in sources {
        grouped
            .entry(source.category.as_str())
            .or_default()
            .entry(source.artist.as_str())
            .or_default()
            .push(source);
    }

    for (category, artists) in &grouped {
        let count: usize = artists.values().map(Vec::len).sum();
        lines.push(format!("{} ({})", category, photos(count)));
        for (artist, images) in artists {
            lines.push(format!("{}{} ({})", indent(1), artist, photos(images.len())));
            for (i, image) in images.iter().enumerate() {
                lines.push(format!(
                    "{}{} {}",
                    indent(2),
                    format_index(i + 1),
                    image.filename
                ));
                lines.push(format!("{}Source: {}", indent(3), image.relative_path));
            }
        }
    }

    if !excluded.is_empty() {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.push("Excluded".to_string());
        for path in excluded {
            lines.push(format!("{}{}", indent(1), path));
        }
    }

    if sources.is_empty() {
        lines.push("No source images found".to_string());
    }
    lines
}

/// Print scan output to stdout.
pub fn print_scan_output(sources: &[SourceImage], excluded: &[String]) {
    for line in format_scan_output(sources, excluded) {
        println!("{}", line);
    }
}

/// Guidance shown when the input directory does not exist yet.
pub fn format_input_missing(input_dir: &Path) -> Vec<String> {
    vec![
        format!("Input directory {} does not exist.", input_dir.display()),
        "Nothing to do. Add photos as <category>/<artist>/<photo>.jpg, e.g.:".to_string(),
        format!("{}tattoos/debi/sleeve-blackwork.jpg", indent(1)),
        "or point --input (or input_dir in gallery.toml) at your photo folder.".to_string(),
    ]
}

pub fn print_input_missing(input_dir: &Path) {
    for line in format_input_missing(input_dir) {
        println!("{}", line);
    }
}

// ============================================================================
// Stage 2: Process output
// ============================================================================

/// Format a single process progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::ImageProcessed {
            index,
            total,
            title,
            source_path,
            variants,
            skipped_upscale,
            ..
        } => {
            let mut lines = vec![
                format!("[{}/{}] {}", format_index(*index), format_index(*total), title),
                format!("{}Source: {}", indent(1), source_path),
            ];
            for variant in variants {
                lines.push(format!(
                    "{}{}: {}",
                    indent(1),
                    variant.label,
                    status_label(variant.status)
                ));
            }
            for width in skipped_upscale {
                lines.push(format!(
                    "{}{}w: skipped (source too narrow)",
                    indent(1),
                    width
                ));
            }
            lines
        }
        ProcessEvent::ImageFailed {
            index,
            total,
            source_path,
            error,
        } => vec![
            format!(
                "[{}/{}] FAILED {}",
                format_index(*index),
                format_index(*total),
                source_path
            ),
            format!("{}Error: {}", indent(1), error),
        ],
    }
}

// ============================================================================
// Summary
// ============================================================================

/// Format the end-of-run summary.
pub fn format_summary(summary: &RunSummary, dry_run: bool) -> Vec<String> {
    let mut lines = Vec::new();
    let attempted = summary.processed + summary.failed.len();

    lines.push(format!(
        "{} {} of {} images ({} failed, {} excluded)",
        if dry_run { "Planned" } else { "Processed" },
        summary.processed,
        attempted,
        summary.failed.len(),
        summary.excluded
    ));
    lines.push(format!(
        "Variants: {} encoded, {} cached, {} planned, {} skipped",
        summary.variants_written,
        summary.variants_existing,
        summary.variants_planned,
        summary.variants_skipped_upscale
    ));
    if !dry_run {
        lines.push(format!(
            "Size: {} originals \u{2192} {} display ({} saved)",
            format_bytes(summary.original_bytes),
            format_bytes(summary.display_bytes),
            format_bytes(summary.saved_bytes())
        ));
    }

    if summary.has_failures() {
        lines.push("Failed".to_string());
        for failure in &summary.failed {
            lines.push(format!("{}{}", indent(1), failure.path.display()));
            lines.push(format!("{}Error: {}", indent(2), failure.error));
        }
    }
    lines
}

pub fn print_summary(summary: &RunSummary, dry_run: bool) {
    for line in format_summary(summary, dry_run) {
        println!("{}", line);
    }
}

// ============================================================================
// Verify output
// ============================================================================

pub fn format_verify_report(report: &VerifyReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Checked {} images, {} variants",
        report.images_checked, report.variants_checked
    )];
    if report.is_ok() {
        lines.push("Manifest is consistent".to_string());
    } else {
        lines.push(format!("{} problems", report.problems.len()));
        for problem in &report.problems {
            lines.push(format!("{}{}", indent(1), problem));
        }
    }
    lines
}

pub fn print_verify_report(report: &VerifyReport) {
    for line in format_verify_report(report) {
        println!("{}", line);
    }
}
