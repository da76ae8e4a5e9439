use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use studio_gallery::config::{self, GalleryConfig};
use studio_gallery::summary::RunSummary;
use studio_gallery::{manifest, output, process, scan, verify};

/// Flags for the build command.
#[derive(clap::Args, Clone)]
struct BuildArgs {
    /// Plan only: report what would be written without touching disk
    #[arg(long)]
    dry_run: bool,

    /// Exit with an error if any image fails to process
    #[arg(long)]
    strict: bool,

    /// Check the written manifest against the output directory afterwards
    #[arg(long)]
    verify: bool,
}

#[derive(Parser)]
#[command(name = "studio-gallery")]
#[command(about = "Build-time image optimizer for the studio gallery")]
#[command(long_about = "\
Build-time image optimizer for the studio gallery

Turns a folder of original photographs into responsive WebP/JPEG variants
and a manifest.json the site reads at runtime. Originals are never modified.

Source layout:

  assets/gallery-source/
  ├── tattoos/                     # Category (see [scan.roots])
  │   └── debi/                    # Artist
  │       ├── sleeve-blackwork.jpg # Style and title come from the name
  │       └── rose-2023-05-14.png  # Dates in names set the date bucket
  ├── piercings/
  │   └── mara/
  │       └── helix-gold.jpg
  └── portraits/
      └── team.jpg

Output:

  public/gallery/
  ├── manifest.json
  └── tattoo/
      ├── debi-sleeve-blackwork@400w.webp
      ├── debi-sleeve-blackwork@400w.jpg
      └── ...

Variants already on disk are reused, so reruns only encode what is new.

Run 'studio-gallery gen-config' to generate a documented gallery.toml.")]
#[command(version)]
struct Cli {
    /// Config file (missing file = stock defaults)
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE, global = true)]
    config: PathBuf,

    /// Source photo directory (overrides input_dir)
    #[arg(long, global = true)]
    input: Option<PathBuf>,

    /// Variant output directory (overrides output_dir)
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Manifest path (overrides manifest_path)
    #[arg(long, global = true)]
    manifest: Option<PathBuf>,

    /// Log debug details to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the full pipeline: scan → variants → manifest
    Build(BuildArgs),
    /// List the source images that would be processed
    Scan,
    /// Check an existing manifest against the output directory
    Verify,
    /// Print a stock gallery.toml with all options documented
    GenConfig,
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let Cli {
        config: config_path,
        input,
        output: output_dir,
        manifest: manifest_path,
        verbose,
        command,
    } = Cli::parse();
    init_logging(verbose);

    let load = move || -> Result<GalleryConfig, config::ConfigError> {
        Ok(config::load_config(&config_path)?.with_overrides(input, output_dir, manifest_path))
    };

    match command {
        Command::Build(args) => run_build(&load()?, &args),
        Command::Scan => run_scan(&load()?),
        Command::Verify => run_verify(&load()?),
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Logs go to stderr; stdout carries the inventory and summary.
fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format_timestamp(None)
        .init();
}

fn run_scan(config: &GalleryConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    match scan::scan(&config.input_dir, &config.scan)? {
        scan::ScanResult::NotFound(path) => output::print_input_missing(&path),
        scan::ScanResult::Found { sources, excluded } => {
            output::print_scan_output(&sources, &excluded)
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_build(
    config: &GalleryConfig,
    args: &BuildArgs,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    println!("==> Stage 1: Scanning {}", config.input_dir.display());
    let (sources, excluded) = match scan::scan(&config.input_dir, &config.scan)? {
        scan::ScanResult::NotFound(path) => {
            output::print_input_missing(&path);
            return Ok(ExitCode::SUCCESS);
        }
        scan::ScanResult::Found { sources, excluded } => (sources, excluded),
    };
    println!(
        "Found {} source images ({} excluded)",
        sources.len(),
        excluded.len()
    );

    println!("==> Stage 2: Generating variants → {}", config.output_dir.display());
    if args.dry_run {
        println!("Dry run: nothing will be written");
    } else {
        process::prepare_output_dir(&config.output_dir)?;
    }
    init_thread_pool(&config.processing);
    let process_config = process::ProcessConfig::from_gallery_config(config, args.dry_run);
    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            for line in output::format_process_event(&event) {
                println!("{}", line);
            }
        }
    });
    let result = process::process(&sources, &process_config, Some(tx));
    printer.join().ok();

    let summary = RunSummary {
        discovered: sources.len(),
        excluded: excluded.len(),
        ..RunSummary::default()
    }
    .merge(result.summary);

    println!("==> Stage 3: Writing manifest → {}", config.manifest_path.display());
    let manifest = manifest::build_manifest(
        result.records,
        &config.manifest,
        manifest::timestamp_now(),
    );
    if args.dry_run {
        println!(
            "Would write {} images to {}",
            manifest.images.len(),
            config.manifest_path.display()
        );
    } else {
        manifest::write_manifest(&manifest, &config.manifest_path)?;
    }

    output::print_summary(&summary, args.dry_run);

    let mut ok = true;
    if args.verify && !args.dry_run {
        println!("==> Verifying manifest");
        let report = verify::verify(&manifest, &config.output_dir, &config.url_prefix);
        output::print_verify_report(&report);
        ok &= report.is_ok();
    }
    if args.strict && summary.has_failures() {
        log::error!("{} images failed (--strict)", summary.failed.len());
        ok = false;
    }

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn run_verify(config: &GalleryConfig) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let manifest = read_existing_manifest(&config.manifest_path)?;
    let report = verify::verify(&manifest, &config.output_dir, &config.url_prefix);
    output::print_verify_report(&report);
    Ok(if report.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn read_existing_manifest(
    path: &Path,
) -> Result<manifest::Manifest, Box<dyn std::error::Error>> {
    manifest::read_manifest(path)
        .map_err(|e| format!("Cannot read manifest {}: {}", path.display(), e).into())
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores; the user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
