//! ghostmark-import - Convert a Ghost export into markdown posts
//!
//! Usage:
//!   ghostmark-import
//!   ghostmark-import -i ghost-export.json -o src/content/blog
//!   ghostmark-import --ghost-url https://blog.example.com --image-mode local
//!   ghostmark-import --dry-run --report import-report.json

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser as ClapParser, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};

use ghostmark::config::{SiteConfig, CONFIG_FILENAME};
use ghostmark::importer::{GhostImporter, ImageMode, ImportOptions, ImportReport};
use ghostmark::logging::init_logger;

#[derive(ValueEnum, Clone, Debug)]
enum ImageModeArg {
    /// Keep the image URL from the export
    Remote,
    /// Reference images in the local asset directory
    Local,
    /// Not implemented yet, same as remote
    Hybrid,
}

#[derive(ValueEnum, Clone, Debug)]
enum ReportFormat {
    /// JSON format
    Json,
    /// Human-readable text
    Text,
}

#[derive(ClapParser)]
#[command(
    version,
    about = "Convert a Ghost JSON export into markdown posts",
    long_about = "Writes one <slug>.md file per published post of a Ghost export.\n\n\
                  Existing files are never overwritten; those posts are reported as\n\
                  skipped. Draft posts are left out."
)]
struct Cli {
    /// Config file
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Ghost export JSON file
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Directory the posts are written to
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Site URL that replaces __GHOST_URL__
    #[arg(long, value_name = "URL")]
    ghost_url: Option<String>,

    /// How feature images are referenced
    #[arg(long, value_enum)]
    image_mode: Option<ImageModeArg>,

    /// Generate import report
    #[arg(long, value_name = "REPORT_FILE")]
    report: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value = "json")]
    report_format: ReportFormat,

    /// Dry run (convert without writing any post)
    #[arg(long)]
    dry_run: bool,

    /// debug log file
    #[arg(short, long, value_name = "FILE")]
    debuglogfile: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logger(args.verbose.log_level_filter(), args.debuglogfile.as_deref())?;

    let config = SiteConfig::load(&args.config)?;
    let mut options = ImportOptions::from_config(&config).with_dry_run(args.dry_run);
    if let Some(dir) = args.output_dir {
        options.output_dir = dir;
    }
    if let Some(url) = args.ghost_url {
        options = options.with_ghost_url(url);
    }
    if let Some(mode) = args.image_mode {
        options = options.with_image_mode(match mode {
            ImageModeArg::Remote => ImageMode::Remote,
            ImageModeArg::Local => ImageMode::Local,
            ImageModeArg::Hybrid => ImageMode::Hybrid,
        });
    }
    if options.ghost_url.is_none() {
        log::warn!("no ghost_url configured, __GHOST_URL__ placeholders will be left as is");
    }

    let input = args.input.unwrap_or(config.import.input);
    let importer = GhostImporter::new(options);
    let report = importer
        .run(&input)
        .with_context(|| format!("import of {} failed", input.display()))?;

    eprintln!("\n{}", report.to_text());

    if let Some(report_path) = args.report {
        write_report(&report, &report_path, &args.report_format)?;
        eprintln!("✓ Report written to {}", report_path.display());
    }

    Ok(())
}

fn write_report(report: &ImportReport, path: &Path, format: &ReportFormat) -> anyhow::Result<()> {
    let content = match format {
        ReportFormat::Json => report.to_json()?,
        ReportFormat::Text => report.to_text(),
    };
    fs::write(path, content).with_context(|| format!("cannot write report to {}", path.display()))?;
    Ok(())
}
