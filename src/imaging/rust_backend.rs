//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG) | `image` crate |
//! | Identify | `image::image_dimensions` (header only) |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → WebP (lossy) | `webp::Encoder` (libwebp) |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (baseline) |
//!
//! Every encoded file is written to a `.partial` sibling and renamed into
//! place, so an interrupted run never leaves a truncated variant behind for
//! the existence check to mistake as finished.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, ResizeTarget};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageReader};
use std::path::{Path, PathBuf};

/// Backend built on the `image` and `webp` crates.
#[derive(Debug, Default)]
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Largest width or height libwebp can encode.
const WEBP_MAX_DIMENSION: u32 = 16383;

fn encode_webp(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    let (w, h) = (img.width(), img.height());
    if w > WEBP_MAX_DIMENSION || h > WEBP_MAX_DIMENSION {
        return Err(BackendError::ProcessingFailed(format!(
            "WebP encode failed: {}x{} exceeds the {}px limit",
            w, h, WEBP_MAX_DIMENSION
        )));
    }
    // `Encoder::encode` unwraps libwebp errors; `encode_simple` returns them.
    let encoded = if img.color().has_alpha() {
        let rgba = img.to_rgba8();
        webp::Encoder::from_rgba(rgba.as_raw(), w, h)
            .encode_simple(false, quality as f32)
            .map(|mem| mem.to_vec())
    } else {
        let rgb = img.to_rgb8();
        webp::Encoder::from_rgb(rgb.as_raw(), w, h)
            .encode_simple(false, quality as f32)
            .map(|mem| mem.to_vec())
    };
    encoded.map_err(|e| BackendError::ProcessingFailed(format!("WebP encode failed: {:?}", e)))
}

fn encode_jpeg(img: &DynamicImage, quality: u32) -> Result<Vec<u8>, BackendError> {
    // JPEG has no alpha channel; flatten to RGB.
    let rgb = img.to_rgb8();
    let mut buf = Vec::new();
    JpegEncoder::new_with_quality(&mut buf, quality as u8)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| BackendError::ProcessingFailed(format!("JPEG encode failed: {}", e)))?;
    Ok(buf)
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".partial");
    path.with_file_name(name)
}

/// Write bytes next to `path` and rename over it.
fn write_replacing(path: &Path, bytes: &[u8]) -> Result<(), BackendError> {
    let tmp = partial_path(path);
    std::fs::write(&tmp, bytes)?;
    if let Err(e) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(e.into());
    }
    Ok(())
}

fn save_target(img: &DynamicImage, target: &ResizeTarget) -> Result<(), BackendError> {
    let bytes = match target.format {
        OutputFormat::Webp => encode_webp(img, target.quality.value())?,
        OutputFormat::Jpeg => encode_jpeg(img, target.quality.value())?,
    };
    if bytes.is_empty() {
        return Err(BackendError::ProcessingFailed(format!(
            "Encoder produced no data for {}",
            target.output.display()
        )));
    }
    write_replacing(&target.output, &bytes)
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, source: &Path, targets: &[ResizeTarget]) -> Result<(), BackendError> {
        if targets.is_empty() {
            return Ok(());
        }
        let img = load_image(source)?;
        for target in targets {
            let resized = img.resize_exact(target.width, target.height, FilterType::Lanczos3);
            save_target(&resized, target)?;
        }
        Ok(())
    }
}
