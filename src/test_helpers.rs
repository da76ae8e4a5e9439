//! Shared test utilities.
//!
//! Small synthetic images and source trees, generated on the fly so tests
//! need no binary fixtures.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_test_jpeg(&tmp.path().join("tattoos/debi/rose.jpg"), 1600, 1200);
//! touch(tmp.path(), "tattoos/debi/notes.txt");
//! ```

use image::{ImageBuffer, Rgb, Rgba};
use std::path::Path;

/// Create parent directories of `path`.
fn ensure_parent(path: &Path) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
}

/// Write a placeholder file at `root/relative`, creating directories.
///
/// Contents are not an image; use for scanner tests only.
pub fn touch(root: &Path, relative: &str) {
    let path = root.join(relative);
    ensure_parent(&path);
    std::fs::write(&path, b"not really an image").unwrap();
}

/// Write a gradient RGB JPEG of the given size.
pub fn write_test_jpeg(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x + y) % 256) as u8])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

/// Write a half-transparent RGBA PNG of the given size.
pub fn write_test_png(path: &Path, width: u32, height: u32) {
    ensure_parent(path);
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgba([(x % 256) as u8, (y % 256) as u8, 128, if x < width / 2 { 255 } else { 64 }])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}
