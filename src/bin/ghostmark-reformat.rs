//! ghostmark-reformat - Tidy up imported markdown posts
//!
//! Usage:
//!   ghostmark-reformat --all
//!   ghostmark-reformat --wrap 80 --promote-headings post.md other.md
//!   ghostmark-reformat --all --dry-run

use std::path::PathBuf;

use clap::Parser as ClapParser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use ghostmark::config::{SiteConfig, CONFIG_FILENAME};
use ghostmark::logging::init_logger;
use ghostmark::reformat::{markdown_files, reformat_file, FileOutcome, FormatOptions};

#[derive(ClapParser)]
#[command(
    version,
    about = "Reformat markdown posts for readability",
    long_about = "Ensures a blank line before every heading, and optionally promotes\n\
                  h4-h6 headings and wraps plain paragraphs.\n\n\
                  Frontmatter is left untouched."
)]
struct Cli {
    /// Markdown files to process
    files: Vec<PathBuf>,

    /// Process every .md file of the blog directory
    #[arg(long)]
    all: bool,

    /// Wrap paragraphs at this column (values below 40 disable wrapping)
    #[arg(long, value_name = "COLUMN", default_value_t = 0)]
    wrap: usize,

    /// Convert h4 to h2, h5 to h3 and h6 to h4
    #[arg(long)]
    promote_headings: bool,

    /// Show changes without writing
    #[arg(long)]
    dry_run: bool,

    /// Config file
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// debug log file
    #[arg(short, long, value_name = "FILE")]
    debuglogfile: Option<PathBuf>,
    #[command(flatten)]
    verbose: Verbosity<InfoLevel>,
}

fn main() -> anyhow::Result<()> {
    let args = Cli::parse();
    init_logger(args.verbose.log_level_filter(), args.debuglogfile.as_deref())?;

    let files = if args.all {
        let config = SiteConfig::load(&args.config)?;
        markdown_files(&config.content.blog_dir)?
    } else {
        args.files
            .iter()
            .filter(|path| path.extension().is_some_and(|ext| ext == "md"))
            .cloned()
            .collect()
    };

    if files.is_empty() {
        eprintln!("No files specified. Use --all or specify files.");
        std::process::exit(1);
    }

    let options = FormatOptions::default()
        .with_wrap(args.wrap)
        .with_promote_headings(args.promote_headings);

    eprintln!("Processing {} file(s)...", files.len());
    let mut changed = 0;
    let mut failed = 0;

    for path in &files {
        let name = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
        eprintln!("\n{}", name);

        match reformat_file(path, &options, args.dry_run) {
            Ok(FileOutcome::Unchanged) => eprintln!("  No changes needed"),
            Ok(FileOutcome::Formatted) => {
                changed += 1;
                eprintln!("  ✓ Formatted");
            }
            Ok(FileOutcome::WouldChange { preview, total }) => {
                changed += 1;
                eprintln!("  Changes would be made:");
                for change in &preview {
                    eprintln!("  Line {}:", change.line);
                    eprintln!("  - {}", change.before);
                    eprintln!("  + {}", change.after);
                }
                if total > preview.len() {
                    eprintln!("  ... and {} more differences", total - preview.len());
                }
            }
            Err(e) => {
                failed += 1;
                log::error!("{}", e);
                eprintln!("  ✗ {}", e);
            }
        }
    }

    eprintln!(
        "\nDone: {} changed, {} unchanged, {} failed",
        changed,
        files.len() - changed - failed,
        failed
    );
    Ok(())
}
