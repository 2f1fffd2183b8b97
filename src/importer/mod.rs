//! Ghost export to markdown importer
//!
//! Reads a Ghost JSON export and writes one `<slug>.md` file per published
//! post. Content is taken from the richest representation available:
//! - mobiledoc, when present and parseable
//! - HTML otherwise
//! - plain text as a last resort

mod converter;
mod html;
mod mobiledoc;
mod options;
mod report;

pub use converter::{post_slug, ConvertedPost, PostConverter};
pub use html::{decode_entities, html_to_markdown};
pub use mobiledoc::{mobiledoc_to_markdown, MobiledocError};
pub use options::{ImageMode, ImportOptions, GHOST_URL_PLACEHOLDER};
pub use report::{ContentSource, ImportFailure, ImportReport, ImportStatistics, ImportWarning, WarningKind};

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use thiserror::Error;

use crate::ghost::{GhostDatabase, GhostDocument};

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read Ghost export {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("invalid Ghost export: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Ghost export contains no database")]
    EmptyExport,
    #[error("failed to create output directory {path:?}: {source}")]
    CreateDir {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to write {path:?}: {source}")]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("cannot derive a slug for {title:?}")]
    EmptySlug { title: String },
    #[error("slug {slug:?} is already used by another post of this export")]
    DuplicateSlug { slug: String },
}

/// Ghost export importer
pub struct GhostImporter {
    options: ImportOptions,
}

impl GhostImporter {
    pub fn new(options: ImportOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ImportOptions {
        &self.options
    }

    /// Parse an export, accepting both the `{"db": [...]}` wrapper and a bare
    /// database object.
    pub fn parse(json: &str) -> Result<GhostDatabase, ImportError> {
        let document: GhostDocument = serde_json::from_str(json)?;
        document.into_database().ok_or(ImportError::EmptyExport)
    }

    pub fn load(path: &Path) -> Result<GhostDatabase, ImportError> {
        let json = fs::read_to_string(path).map_err(|source| ImportError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        Self::parse(&json)
    }

    /// Import every published post of `input`.
    pub fn run(&self, input: &Path) -> Result<ImportReport, ImportError> {
        let db = Self::load(input)?;
        let mut report = self.import(&db)?;
        report.input_file = input.display().to_string();
        Ok(report)
    }

    /// Import every published post of `db`. Per-post problems are recorded
    /// in the report; only failing to create the output directory is fatal.
    pub fn import(&self, db: &GhostDatabase) -> Result<ImportReport, ImportError> {
        let start_time = Instant::now();
        let output_dir = &self.options.output_dir;
        let mut report = ImportReport::new(
            "",
            &output_dir.display().to_string(),
            self.options.image_mode,
            self.options.dry_run,
        );

        let data = &db.data;
        report.statistics.total_posts = data.posts.len();
        log::info!(
            "found {} posts, {} tags, {} users",
            data.posts.len(),
            data.tags.len(),
            data.users.len()
        );

        if !self.options.dry_run && !output_dir.exists() {
            fs::create_dir_all(output_dir).map_err(|source| ImportError::CreateDir {
                source,
                path: output_dir.clone(),
            })?;
        }

        let converter = PostConverter::new(&self.options, data);
        let mut claimed_slugs = HashSet::new();
        for post in &data.posts {
            if !post.is_published() {
                log::debug!("excluding {:?} ({})", post.title, post.status);
                report.statistics.drafts_excluded += 1;
                continue;
            }

            let converted = match converter.convert(post) {
                Ok(converted) => converted,
                Err(e) => {
                    log::error!("failed to import {:?}: {}", post.title, e);
                    report.add_failure(&post.title, e.to_string());
                    continue;
                }
            };

            if !claimed_slugs.insert(converted.slug.clone()) {
                let e = ImportError::DuplicateSlug { slug: converted.slug };
                log::error!("failed to import {:?}: {}", post.title, e);
                report.add_failure(&post.title, e.to_string());
                continue;
            }

            let path = output_dir.join(converted.file_name());
            if path.exists() {
                log::warn!("skipping {:?}: {} already exists", post.title, path.display());
                report.statistics.skipped += 1;
                continue;
            }

            report.statistics.increment_source(converted.source);
            for warning in converted.warnings {
                report.add_warning(warning);
            }

            if !self.options.dry_run {
                if let Err(source) = fs::write(&path, &converted.markdown) {
                    let e = ImportError::Write { source, path };
                    log::error!("failed to import {:?}: {}", post.title, e);
                    report.add_failure(&post.title, e.to_string());
                    continue;
                }
            }

            log::info!("imported {:?} -> {}", post.title, converted.slug);
            report.statistics.imported += 1;
        }

        report.duration_ms = start_time.elapsed().as_millis() as u64;
        Ok(report)
    }
}
