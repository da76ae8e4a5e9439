//! Image processing — decode, resize, re-encode.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | Lanczos3 via `image` |
//! | **Encode** | `webp` (lossy) and `image`'s JPEG encoder |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for ladder and dimension math (unit testable)
//! - **Parameters**: Data structures describing encode targets
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
pub mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::aspect_ratio_label;
pub use operations::{
    GeneratedVariant, VariantConfig, VariantOutcome, VariantStatus, create_variants,
    get_dimensions, variant_filename,
};
pub use params::{OutputFormat, Quality, ResizeTarget};
pub use rust_backend::RustBackend;
