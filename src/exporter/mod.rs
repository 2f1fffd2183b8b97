//! Markdown/MDX content directory → Ghost bulk import JSON.

pub mod assembler;
pub mod html;
pub mod markup;

pub use assembler::{format_ghost_date, GhostAssembler, GHOST_DATE_FORMAT};
pub use html::{markdown_to_html, HtmlOptions};

use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config::{AuthorSection, SiteConfig};
use crate::frontmatter::{parse_document, FrontmatterError};
use crate::ghost::{GhostExport, IdGenerator, UuidGenerator};
use crate::slug::slug_from_path;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to read {path:?}: {source}")]
    Read {
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
    #[error("invalid content directory pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error(transparent)]
    Frontmatter(#[from] FrontmatterError),
    #[error("invalid {field} {value:?}")]
    InvalidDate { field: &'static str, value: String },
    #[error("slug {slug:?} is already used by {first:?}")]
    DuplicateSlug { slug: String, first: PathBuf },
    #[error("failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Everything the exporter needs to know, resolved from config and CLI.
#[derive(Debug, Clone)]
pub struct ExportOptions {
    pub blog_dir: PathBuf,
    pub output: PathBuf,
    /// Optional list of slugs to restrict the export to
    pub slugs_file: Option<PathBuf>,
    pub ghost_version: String,
    pub author: AuthorSection,
    pub html: HtmlOptions,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self::from_config(&SiteConfig::default())
    }
}

impl ExportOptions {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            blog_dir: config.content.blog_dir.clone(),
            output: config.export.output.clone(),
            slugs_file: Some(config.export.slugs_file.clone()),
            ghost_version: config.export.ghost_version.clone(),
            author: config.author.clone(),
            html: HtmlOptions {
                asset_base_url: config.export.asset_base_url.clone(),
            },
        }
    }

    pub fn with_blog_dir(mut self, blog_dir: impl Into<PathBuf>) -> Self {
        self.blog_dir = blog_dir.into();
        self
    }

    pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
        self.output = output.into();
        self
    }

    pub fn with_slugs_file(mut self, slugs_file: Option<PathBuf>) -> Self {
        self.slugs_file = slugs_file;
        self
    }

    pub fn with_asset_base_url(mut self, url: impl Into<String>) -> Self {
        self.html.asset_base_url = url.into();
        self
    }
}

/// Outcome of an export run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub posts: usize,
    pub drafts: usize,
    pub tags: usize,
    pub users: usize,
    pub failed: Vec<(PathBuf, String)>,
    /// Where the bundle was written; `None` when there was nothing to export
    pub output: Option<PathBuf>,
}

impl ExportReport {
    pub fn is_empty(&self) -> bool {
        self.output.is_none()
    }
}

impl fmt::Display for ExportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Export Summary")?;
        writeln!(f, "==============")?;
        writeln!(f, "Posts:   {} ({} drafts)", self.posts, self.drafts)?;
        writeln!(f, "Tags:    {}", self.tags)?;
        writeln!(f, "Users:   {}", self.users)?;
        writeln!(f, "Failed:  {}", self.failed.len())?;
        for (path, reason) in &self.failed {
            writeln!(f, "  ✗ {}: {}", path.display(), reason)?;
        }
        match &self.output {
            Some(output) => write!(f, "Output:  {}", output.display()),
            None => write!(f, "Output:  (nothing written)"),
        }
    }
}

/// Batch exporter over a content directory.
pub struct Exporter<G: IdGenerator = UuidGenerator> {
    options: ExportOptions,
    ids: G,
    now: Option<DateTime<Utc>>,
}

impl Exporter<UuidGenerator> {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            ids: UuidGenerator,
            now: None,
        }
    }
}

impl<G: IdGenerator> Exporter<G> {
    pub fn with_id_generator<H: IdGenerator>(self, ids: H) -> Exporter<H> {
        Exporter {
            options: self.options,
            ids,
            now: self.now,
        }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    /// Content files to export, sorted, filtered by the slugs file if one
    /// exists and lists at least one slug.
    pub fn collect_files(&self) -> Result<Vec<PathBuf>, ExportError> {
        let dir = glob::Pattern::escape(&self.options.blog_dir.to_string_lossy());
        let mut files = Vec::new();
        for extension in ["md", "mdx"] {
            let pattern = format!("{}/*.{}", dir, extension);
            files.extend(glob::glob(&pattern)?.filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    log::warn!("skipping unreadable entry: {}", e);
                    None
                }
            }));
        }
        files.sort();

        let Some(wanted) = self.wanted_slugs()? else {
            return Ok(files);
        };

        let files: Vec<PathBuf> = files
            .into_iter()
            .filter(|path| wanted.contains(&slug_from_path(path)))
            .collect();

        let found: BTreeSet<String> = files.iter().map(|path| slug_from_path(path)).collect();
        for slug in wanted.difference(&found) {
            log::warn!("slug {:?} listed in the slugs file has no matching post", slug);
        }
        Ok(files)
    }

    fn wanted_slugs(&self) -> Result<Option<BTreeSet<String>>, ExportError> {
        let Some(path) = self.options.slugs_file.as_deref().filter(|p| p.exists()) else {
            return Ok(None);
        };
        let text = fs::read_to_string(path).map_err(|source| ExportError::Read {
            source,
            path: path.to_path_buf(),
        })?;
        let slugs = parse_slug_list(&text);
        if slugs.is_empty() {
            log::info!("{} lists no slugs, exporting all posts", path.display());
            return Ok(None);
        }
        log::info!("exporting {} post(s) listed in {}", slugs.len(), path.display());
        Ok(Some(slugs))
    }

    /// Convert `files` into one bundle. Files that fail are reported and
    /// left out.
    pub fn build(self, files: &[PathBuf]) -> (GhostExport, ExportReport) {
        let mut assembler = GhostAssembler::new(
            self.ids,
            &self.options.author,
            &self.options.ghost_version,
            &self.options.html.asset_base_url,
        );
        if let Some(now) = self.now {
            assembler = assembler.with_now(now);
        }

        let mut report = ExportReport::default();
        let mut used_slugs: HashMap<String, PathBuf> = HashMap::new();
        for path in files {
            let slug = slug_from_path(path);
            let result = match used_slugs.get(&slug) {
                Some(first) => Err(ExportError::DuplicateSlug {
                    slug: slug.clone(),
                    first: first.clone(),
                }),
                None => export_file(&mut assembler, path, &slug, &self.options.html),
            };
            match result {
                Ok(draft) => {
                    used_slugs.insert(slug, path.clone());
                    if draft {
                        report.drafts += 1;
                    }
                }
                Err(e) => {
                    log::error!("failed to process {}: {}", path.display(), e);
                    report.failed.push((path.clone(), e.to_string()));
                }
            }
        }

        report.posts = assembler.post_count();
        report.tags = assembler.tag_count();
        report.users = assembler.user_count();
        (assembler.finish(), report)
    }

    /// Collect, convert and write the bundle to the configured output.
    pub fn run(self) -> Result<ExportReport, ExportError> {
        let files = self.collect_files()?;
        if files.is_empty() {
            log::warn!("no posts to export in {}", self.options.blog_dir.display());
            return Ok(ExportReport::default());
        }
        log::info!("processing {} post(s)", files.len());

        let output = self.options.output.clone();
        let (export, mut report) = self.build(&files);
        write_export(&export, &output)?;
        report.output = Some(output);
        Ok(report)
    }
}

/// Slugs from a slugs file: one per line, blank lines and `#` comments
/// ignored.
pub fn parse_slug_list(text: &str) -> BTreeSet<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Returns whether the post is a draft.
fn export_file<G: IdGenerator>(
    assembler: &mut GhostAssembler<G>,
    path: &Path,
    slug: &str,
    options: &HtmlOptions,
) -> Result<bool, ExportError> {
    let content = fs::read_to_string(path).map_err(|source| ExportError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    let document = parse_document(&content)?;
    let html = markdown_to_html(&document.body, options);
    let post = assembler.add_post(slug, &document.frontmatter, html)?;
    log::info!("processed {:?}", post.title);
    Ok(!post.is_published())
}

pub fn write_export(export: &GhostExport, path: &Path) -> Result<(), ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::Write {
            source,
            path: parent.to_path_buf(),
        })?;
    }
    let json = serde_json::to_string_pretty(export)?;
    fs::write(path, json).map_err(|source| ExportError::Write {
        source,
        path: path.to_path_buf(),
    })
}
