//! ghostmark-export - Export blog posts to a Ghost import file
//!
//! Usage:
//!   ghostmark-export
//!   ghostmark-export --blog-dir src/content/blog -o ghost-import.json
//!   ghostmark-export --slugs posts-to-export.txt

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser as ClapParser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use ghostmark::config::{SiteConfig, CONFIG_FILENAME};
use ghostmark::exporter::{ExportOptions, Exporter};
use ghostmark::logging::init_logger;

#[derive(ClapParser)]
#[command(
    version,
    about = "Export markdown/MDX posts to a Ghost import file",
    long_about = "Converts every .md/.mdx file of the blog directory into a single Ghost\n\
                  bulk import JSON file.\n\n\
                  If the slugs file exists and lists at least one slug (one per line,\n\
                  '#' starts a comment), only those posts are exported."
)]
struct Cli {
    /// Config file
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Directory containing the posts
    #[arg(short, long, value_name = "DIR")]
    blog_dir: Option<PathBuf>,

    /// Output JSON file
    #[arg(short, long, value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// File listing the slugs to export
    #[arg(short, long, value_name = "FILE")]
    slugs: Option<PathBuf>,

    /// Base URL local images are rebased onto
    #[arg(long, value_name = "URL")]
    asset_base_url: Option<String>,

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
    let mut options = ExportOptions::from_config(&config);
    if let Some(dir) = args.blog_dir {
        options = options.with_blog_dir(dir);
    }
    if let Some(output) = args.output {
        options = options.with_output(output);
    }
    if let Some(slugs) = args.slugs {
        options = options.with_slugs_file(Some(slugs));
    }
    if let Some(url) = args.asset_base_url {
        options = options.with_asset_base_url(url);
    }

    let blog_dir = options.blog_dir.clone();
    let report = Exporter::new(options)
        .run()
        .with_context(|| format!("export of {} failed", blog_dir.display()))?;

    if report.is_empty() {
        eprintln!("⚠ No posts to export");
        return Ok(());
    }

    eprintln!("\n{}", report);
    eprintln!("\nNext steps:");
    eprintln!("  1. Review the generated file");
    eprintln!("  2. Upload images to Ghost separately if needed");
    eprintln!("  3. Import it in Ghost Admin: Settings → Advanced → Import/Export");
    Ok(())
}
