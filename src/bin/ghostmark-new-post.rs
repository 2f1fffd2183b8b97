//! ghostmark-new-post - Create a draft post from a template
//!
//! Usage:
//!   ghostmark-new-post "My new article"

use std::path::PathBuf;

use clap::Parser as ClapParser;
use clap_verbosity_flag::{InfoLevel, Verbosity};

use ghostmark::config::{SiteConfig, CONFIG_FILENAME};
use ghostmark::logging::init_logger;
use ghostmark::new_post::create_post;

#[derive(ClapParser)]
#[command(version, about = "Create a new draft post", long_about = None)]
struct Cli {
    /// Title of the post
    title: Option<String>,

    /// Config file
    #[arg(short, long, value_name = "FILE", default_value = CONFIG_FILENAME)]
    config: PathBuf,

    /// Directory the post is created in
    #[arg(short, long, value_name = "DIR")]
    blog_dir: Option<PathBuf>,

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
    let blog_dir = args.blog_dir.unwrap_or(config.content.blog_dir);
    let title = args.title.unwrap_or_default();
    let today = chrono::Utc::now().date_naive();

    let post = match create_post(&blog_dir, &title, &config.author.name, today) {
        Ok(post) => post,
        Err(e) => {
            eprintln!("✗ {}", e);
            eprintln!("Usage: ghostmark-new-post \"Title of the post\"");
            std::process::exit(1);
        }
    };

    println!("✓ Created {}", post.path.display());
    println!("  Slug: {}", post.slug);
    println!();
    println!("Next steps:");
    println!("  1. Fill in the description");
    println!("  2. Add tags");
    println!("  3. Add a cover image if needed");
    println!("  4. Write the content");
    println!("  5. Set draft: false when ready to publish");
    Ok(())
}
