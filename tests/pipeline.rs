//! End-to-end pipeline tests against the real image backend.
//!
//! Each test builds a small source tree of synthetic photos in a temp
//! directory, runs scan → process → manifest, and checks what lands on disk.

use image::{ImageBuffer, Rgb, Rgba};
use std::path::{Path, PathBuf};
use studio_gallery::config::GalleryConfig;
use studio_gallery::imaging::OutputFormat;
use studio_gallery::manifest::{self, Loading, Manifest};
use studio_gallery::process::{self, ProcessConfig, ProcessResult};
use studio_gallery::scan::{self, ScanResult};
use studio_gallery::types::{Category, Confidence, SourceImage};
use studio_gallery::verify;
use tempfile::TempDir;

fn write_jpeg(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = ImageBuffer::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    img.save_with_format(path, image::ImageFormat::Jpeg).unwrap();
}

fn write_png(path: &Path, width: u32, height: u32) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let img = ImageBuffer::from_fn(width, height, |x, _| {
        Rgba([200, 40, (x % 256) as u8, 180])
    });
    img.save_with_format(path, image::ImageFormat::Png).unwrap();
}

fn write_solid_jpeg(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    ImageBuffer::from_pixel(width, height, Rgb(color))
        .save_with_format(path, image::ImageFormat::Jpeg)
        .unwrap();
}

fn write_solid_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    ImageBuffer::from_pixel(width, height, Rgb(color))
        .save_with_format(path, image::ImageFormat::Png)
        .unwrap();
}

struct Gallery {
    _tmp: TempDir,
    config: GalleryConfig,
}

impl Gallery {
    fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();
        let config = GalleryConfig::default().with_overrides(
            Some(root.join("source")),
            Some(root.join("public/gallery")),
            Some(root.join("public/gallery/manifest.json")),
        );
        Self { _tmp: tmp, config }
    }

    fn source(&self, relative: &str) -> PathBuf {
        self.config.input_dir.join(relative)
    }

    fn output(&self, relative: &str) -> PathBuf {
        self.config.output_dir.join(relative)
    }

    fn scan(&self) -> Vec<SourceImage> {
        match scan::scan(&self.config.input_dir, &self.config.scan).unwrap() {
            ScanResult::Found { sources, .. } => sources,
            ScanResult::NotFound(p) => panic!("input missing: {}", p.display()),
        }
    }

    /// Run all stages; write the manifest unless `dry_run`.
    fn build(&self, dry_run: bool) -> (ProcessResult, Manifest) {
        let sources = self.scan();
        let config = ProcessConfig::from_gallery_config(&self.config, dry_run);
        let result = process::process(&sources, &config, None);
        let manifest = manifest::build_manifest(
            result.records.clone(),
            &self.config.manifest,
            manifest::timestamp_now(),
        );
        if !dry_run {
            manifest::write_manifest(&manifest, &self.config.manifest_path).unwrap();
        }
        (result, manifest)
    }
}

#[test]
fn sleeve_blackwork_end_to_end() {
    let gallery = Gallery::new();
    write_jpeg(&gallery.source("tattoos/debi/sleeve-blackwork.jpg"), 1600, 1600);

    let (result, _) = gallery.build(false);
    assert!(result.summary.failed.is_empty());

    for name in [
        "debi-sleeve-blackwork@400w.webp",
        "debi-sleeve-blackwork@400w.jpg",
        "debi-sleeve-blackwork@800w.webp",
        "debi-sleeve-blackwork@800w.jpg",
        "debi-sleeve-blackwork@1200w.webp",
    ] {
        let path = gallery.output(&format!("tattoo/{name}"));
        assert!(path.is_file(), "{name} missing");
    }
    assert!(!gallery.output("tattoo/debi-sleeve-blackwork@2400w.webp").exists());
    assert!(!gallery.output("tattoo/debi-sleeve-blackwork@1200w.jpg").exists());
    assert_eq!(
        image::image_dimensions(gallery.output("tattoo/debi-sleeve-blackwork@800w.jpg")).unwrap(),
        (800, 800)
    );

    let written = manifest::read_manifest(&gallery.config.manifest_path).unwrap();
    assert_eq!(written.version, "1.0");
    assert_eq!(written.images.len(), 1);
    let record = &written.images[0];
    assert_eq!(record.id, "debi-sleeve-blackwork");
    assert_eq!(record.original, "tattoos/debi/sleeve-blackwork.jpg");
    assert_eq!(record.title, "Sleeve Blackwork");
    assert_eq!(record.category, Category::Tattoo);
    assert_eq!(record.artist, "debi");
    assert_eq!(record.style, "Blackwork");
    assert_eq!(record.date, "2024-01");
    assert_eq!((record.width, record.height), (1600, 1600));
    assert_eq!(record.aspect_ratio, "1:1");
    assert_eq!(record.variants.len(), 5);
    assert!(record.variants.iter().all(|v| v.size > 0));
    assert_eq!(record.src, "/gallery/tattoo/debi-sleeve-blackwork@800w.webp");
    assert!(record.featured);
    assert_eq!(record.loading, Loading::Eager);
    assert!(record.priority);
    assert_eq!(record.confidence.style, Confidence::Heuristic);
    assert_eq!(record.confidence.date, Confidence::None);

    assert_eq!(written.stats.total_images, 1);
    assert_eq!(written.stats.total_variants, 5);
    assert_eq!(
        written.stats.total_size,
        record.variants.iter().map(|v| v.size).sum::<u64>()
    );

    let report = verify::verify(&written, &gallery.config.output_dir, &gallery.config.url_prefix);
    assert!(report.is_ok(), "{:?}", report.problems);
}

#[test]
fn rerun_reuses_every_variant() {
    let gallery = Gallery::new();
    write_jpeg(&gallery.source("tattoos/debi/rose.jpg"), 900, 600);
    write_png(&gallery.source("piercings/mara/helix.png"), 500, 500);

    let (first, first_manifest) = gallery.build(false);
    let rose = gallery.output("tattoo/debi-rose@800w.webp");
    let before = std::fs::read(&rose).unwrap();
    let modified = std::fs::metadata(&rose).unwrap().modified().unwrap();

    let (second, second_manifest) = gallery.build(false);
    assert_eq!(second.summary.variants_written, 0);
    assert_eq!(second.summary.variants_existing, first.summary.variants_written);
    assert_eq!(std::fs::read(&rose).unwrap(), before);
    assert_eq!(std::fs::metadata(&rose).unwrap().modified().unwrap(), modified);
    assert_eq!(first_manifest.images, second_manifest.images);
}

#[test]
fn sources_are_never_upscaled() {
    let gallery = Gallery::new();
    write_jpeg(&gallery.source("tattoos/debi/small.jpg"), 500, 400);
    write_jpeg(&gallery.source("tattoos/debi/tiny.jpg"), 300, 200);

    let (result, manifest) = gallery.build(false);
    for record in &manifest.images {
        assert!(record.variants.iter().all(|v| v.width <= record.width));
    }

    let tiny = manifest.images.iter().find(|r| r.id == "debi-tiny").unwrap();
    assert!(tiny.variants.is_empty());
    assert_eq!(tiny.src, tiny.original);

    let small = manifest.images.iter().find(|r| r.id == "debi-small").unwrap();
    let widths: Vec<u32> = small.variants.iter().map(|v| v.width).collect();
    assert_eq!(widths, vec![400, 400]);
    assert_eq!(result.summary.variants_skipped_upscale, 3 + 4);
}

#[test]
fn corrupt_image_does_not_stop_the_batch() {
    let gallery = Gallery::new();
    for name in ["a", "b", "d", "e"] {
        write_jpeg(&gallery.source(&format!("tattoos/debi/{name}.jpg")), 640, 480);
    }
    let broken = gallery.source("tattoos/debi/c.jpg");
    std::fs::write(&broken, b"\xFF\xD8 this is not a real jpeg").unwrap();

    let (result, manifest) = gallery.build(false);
    assert_eq!(manifest.images.len(), 4);
    assert!(manifest.images.iter().all(|r| r.id != "debi-c"));
    assert_eq!(result.summary.processed, 4);
    assert_eq!(result.summary.failed.len(), 1);
    assert_eq!(result.summary.failed[0].path, broken);

    let written = manifest::read_manifest(&gallery.config.manifest_path).unwrap();
    assert_eq!(written.stats.total_images, 4);
}

#[test]
fn too_tall_for_webp_fails_alone() {
    let mut gallery = Gallery::new();
    gallery.config.images.widths = vec![400];
    write_jpeg(&gallery.source("tattoos/debi/a.jpg"), 800, 600);
    write_jpeg(&gallery.source("tattoos/debi/b.jpg"), 400, 17000);
    write_jpeg(&gallery.source("tattoos/debi/c.jpg"), 800, 600);

    let (result, manifest) = gallery.build(false);
    let mut ids: Vec<&str> = manifest.images.iter().map(|r| r.id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["debi-a", "debi-c"]);
    assert_eq!(result.summary.failed.len(), 1);
    assert_eq!(result.summary.failed[0].path, gallery.source("tattoos/debi/b.jpg"));
    assert!(gallery.config.manifest_path.is_file());
}

#[test]
fn new_photo_never_reuses_another_photos_variants() {
    let gallery = Gallery::new();
    write_solid_png(&gallery.source("tattoos/debi/rose.png"), 500, 500, [255, 0, 0]);
    let (first, _) = gallery.build(false);
    assert_eq!(first.records[0].id, "debi-rose");

    write_solid_jpeg(&gallery.source("tattoos/debi/rose.jpg"), 500, 500, [0, 0, 255]);
    let (second, manifest) = gallery.build(false);
    assert_eq!(second.summary.variants_existing, 0);
    assert_eq!(second.summary.variants_written, 4);
    assert!(manifest.images.iter().all(|r| r.id != "debi-rose"));

    let blue = manifest
        .images
        .iter()
        .find(|r| r.original == "tattoos/debi/rose.jpg")
        .unwrap();
    let jpeg = blue
        .variants
        .iter()
        .find(|v| v.format == OutputFormat::Jpeg)
        .unwrap();
    let pixel = image::open(gallery.output(&format!("tattoo/{}", jpeg.filename)))
        .unwrap()
        .to_rgb8()
        .get_pixel(10, 10)
        .0;
    assert!(pixel[2] > 200 && pixel[0] < 50, "{pixel:?}");
}

#[test]
fn dry_run_leaves_disk_untouched() {
    let gallery = Gallery::new();
    write_jpeg(&gallery.source("tattoos/debi/rose.jpg"), 1000, 800);

    let (result, manifest) = gallery.build(true);
    assert!(!gallery.config.output_dir.exists());
    assert!(!gallery.config.manifest_path.exists());
    assert_eq!(result.summary.variants_written, 0);
    // 400w and 800w, each as WebP and JPEG
    assert_eq!(result.summary.variants_planned, 4);
    assert_eq!(manifest.images[0].variants.len(), 4);
}

#[test]
fn manifest_order_and_flags_are_deterministic() {
    let gallery = Gallery::new();
    let names = [
        "tattoos/zed/koi-2022-03-01.jpg",
        "tattoos/amy/rose-2023-07-10.jpg",
        "tattoos/bob/dagger-20230710.jpg",
        "piercings/mara/helix.jpg",
        "tattoos/amy/swallow-2021-01-05.jpg",
        "portraits/team.jpg",
    ];
    for name in names {
        write_jpeg(&gallery.source(name), 420, 420);
    }

    let (_, manifest) = gallery.build(false);
    let ids: Vec<&str> = manifest.images.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(
        ids,
        vec![
            // Undated names fall into the 2024-01 bucket
            "unknown-artist-team",
            "mara-helix",
            "amy-rose-2023-07-10",
            "bob-dagger-20230710",
            "zed-koi-2022-03-01",
            "amy-swallow-2021-01-05",
        ]
    );
    let eager: Vec<bool> = manifest
        .images
        .iter()
        .map(|r| r.loading == Loading::Eager)
        .collect();
    assert_eq!(eager, vec![true, true, true, true, false, false]);
    assert!(manifest.images.iter().all(|r| r.featured));

    let (_, again) = gallery.build(false);
    let again_ids: Vec<&str> = again.images.iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, again_ids);
}

#[test]
fn stats_match_records() {
    let gallery = Gallery::new();
    write_jpeg(&gallery.source("tattoos/debi/a.jpg"), 1300, 900);
    write_jpeg(&gallery.source("piercings/mara/b.jpg"), 820, 820);
    write_png(&gallery.source("other-shot.png"), 450, 300);

    let (_, manifest) = gallery.build(false);
    let stats = &manifest.stats;
    assert_eq!(stats.total_images, manifest.images.len());
    assert_eq!(
        stats.total_variants,
        manifest.images.iter().map(|r| r.variants.len()).sum::<usize>()
    );
    assert_eq!(stats.by_category.values().sum::<usize>(), 3);
    assert_eq!(stats.by_category.get("other"), Some(&1));
    assert_eq!(stats.by_artist.values().sum::<usize>(), 3);
    assert_eq!(stats.by_date.get("2024-01"), Some(&3));
    assert_eq!(
        stats.original_size,
        manifest.images.iter().map(|r| r.original_size).sum::<u64>()
    );
}

#[test]
fn missing_input_is_not_an_error() {
    let gallery = Gallery::new();
    let result = scan::scan(&gallery.config.input_dir, &gallery.config.scan).unwrap();
    assert!(matches!(result, ScanResult::NotFound(_)));
}
