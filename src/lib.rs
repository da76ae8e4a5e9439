//! # Studio Gallery
//!
//! Build-time image optimizer for a tattoo and piercing studio website.
//! A folder of original photographs goes in; responsive WebP/JPEG variants
//! and a `manifest.json` describing them come out. Originals are never
//! modified.
//!
//! # Architecture: Four-Stage Pipeline
//!
//! ```text
//! 1. Scan       assets/gallery-source/  →  SourceImage list
//! 2. Variants   SourceImage             →  public/gallery/<category>/<id>@<w>w.<ext>
//! 3. Metadata   file name               →  title, alt, style, date
//! 4. Manifest   records                 →  public/gallery/manifest.json
//! ```
//!
//! Data flows one way. Each stage is a function of its inputs, so tests can
//! drive any stage without the others, and the variant stage can run against
//! a mock backend instead of real encoders.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Stage 1: walks the input tree, classifies category and artist |
//! | [`process`] | Stage 2: ids, variants and record assembly, per-image failure isolation |
//! | [`metadata`] | Stage 3: filename heuristics for style, date, title and alt text |
//! | [`manifest`] | Stage 4: ordering, featured/eager flags, stats, atomic JSON write |
//! | [`verify`] | Optional post-build check of a manifest against the disk |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, encode |
//! | [`config`] | `gallery.toml` loading, merging over stock defaults, validation |
//! | [`naming`] | File name conventions: variant suffixes, words, slugs |
//! | [`summary`] | Run accounting folded from per-image results |
//! | [`output`] | CLI output formatting |
//! | [`types`] | Shared types (`Category`, `SourceImage`, `Confidence`) |
//!
//! # Design Decisions
//!
//! ## Idempotent Reruns
//!
//! A variant's file name is fully determined by the image id, width and
//! format. Before encoding, the generator checks whether that file exists and
//! reuses it if so. Encoders write to a `.partial` sibling and rename, so an
//! interrupted run never leaves a truncated file that would later pass the
//! existence check.
//!
//! ## Failures Stay Local
//!
//! One corrupt photo must not block a site deploy. Identify, decode and
//! encode errors are caught per image, logged, listed in the run summary and
//! the image is left out of the manifest. Only setup problems (bad config,
//! unreadable input tree, unwritable manifest) stop the run.
//!
//! ## Heuristics Are Labelled
//!
//! Titles, styles and dates are guessed from file names. Every record
//! carries a `confidence` block saying which fields came from a real match
//! and which are fallbacks, so the site (or a human) can tell them apart.

pub mod config;
pub mod imaging;
pub mod manifest;
pub mod metadata;
pub mod naming;
pub mod output;
pub mod process;
pub mod scan;
pub mod summary;
pub mod types;
pub mod verify;

#[cfg(test)]
pub(crate) mod test_helpers;
