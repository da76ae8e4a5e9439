//! Pure calculation functions for variant dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

use super::params::OutputFormat;

/// A ladder width that fits inside the source, with its scaled height.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannedSize {
    pub width: u32,
    pub height: u32,
}

/// Which ladder widths to generate for a source, and which were dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LadderPlan {
    /// Widths to generate, ascending.
    pub sizes: Vec<PlannedSize>,
    /// Ladder widths wider than the source. Never upscaled.
    pub skipped: Vec<u32>,
}

/// Split the size ladder into widths to generate and widths to skip.
///
/// A width equal to the source width is kept (a re-encode at native size);
/// anything wider is skipped. Heights preserve the source aspect ratio and
/// never round down to zero.
///
/// ```text
/// source 1600x1200, ladder [400, 800, 1200, 2400]
///   → sizes   400x300, 800x600, 1200x900
///   → skipped 2400
/// ```
pub fn plan_ladder(original: (u32, u32), widths: &[u32]) -> LadderPlan {
    let (orig_w, _) = original;
    let mut ladder: Vec<u32> = widths.to_vec();
    ladder.sort_unstable();
    ladder.dedup();

    let mut plan = LadderPlan::default();
    for width in ladder {
        if width == 0 {
            continue;
        }
        if width > orig_w {
            plan.skipped.push(width);
            continue;
        }
        plan.sizes.push(PlannedSize {
            width,
            height: scaled_height(original, width),
        });
    }
    plan
}

/// Height for `width` that keeps the source aspect ratio, at least 1px.
pub fn scaled_height(original: (u32, u32), width: u32) -> u32 {
    let (orig_w, orig_h) = original;
    if orig_w == 0 {
        return 1;
    }
    let h = (orig_h as f64 * width as f64 / orig_w as f64).round() as u32;
    h.max(1)
}

/// Formats generated at a given width: WebP always, JPEG up to `jpeg_max_width`.
pub fn formats_for_width(width: u32, jpeg_max_width: u32) -> Vec<OutputFormat> {
    if width <= jpeg_max_width {
        vec![OutputFormat::Webp, OutputFormat::Jpeg]
    } else {
        vec![OutputFormat::Webp]
    }
}

/// Reduced aspect ratio string, e.g. `(1600, 1200)` → `"4:3"`.
pub fn aspect_ratio_label(width: u32, height: u32) -> String {
    if width == 0 || height == 0 {
        return format!("{}:{}", width, height);
    }
    let d = gcd(width, height);
    format!("{}:{}", width / d, height / d)
}

fn gcd(a: u32, b: u32) -> u32 {
    if b == 0 { a } else { gcd(b, a % b) }
}
