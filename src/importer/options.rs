//! Import options and types for Ghost to markdown conversion

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;

/// Placeholder Ghost writes instead of the site URL in exported content.
pub const GHOST_URL_PLACEHOLDER: &str = "__GHOST_URL__";

/// How feature images are referenced from imported posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageMode {
    /// Keep the URL from the export
    #[default]
    Remote,
    /// Point at a local asset directory, by file name
    Local,
    /// Not implemented yet; behaves like `Remote`
    Hybrid,
}

impl std::fmt::Display for ImageMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageMode::Remote => write!(f, "remote"),
            ImageMode::Local => write!(f, "local"),
            ImageMode::Hybrid => write!(f, "hybrid"),
        }
    }
}

/// Options for Ghost import
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Directory the markdown files are written to
    pub output_dir: PathBuf,
    /// Site URL substituted for `__GHOST_URL__`
    pub ghost_url: Option<String>,
    pub image_mode: ImageMode,
    /// Prefix for feature images in `Local` mode
    pub local_image_dir: String,
    /// Author used when a post has none in the export
    pub default_author: String,
    /// Convert everything but write nothing
    pub dry_run: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self::from_config(&SiteConfig::default())
    }
}

impl ImportOptions {
    /// Create new import options writing to `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            output_dir: config.import_output_dir().to_path_buf(),
            ghost_url: config.import.ghost_url.clone(),
            image_mode: config.import.image_mode,
            local_image_dir: config.import.local_image_dir.clone(),
            default_author: config.author.name.clone(),
            dry_run: false,
        }
    }

    pub fn with_ghost_url(mut self, url: impl Into<String>) -> Self {
        self.ghost_url = Some(url.into());
        self
    }

    pub fn with_image_mode(mut self, mode: ImageMode) -> Self {
        self.image_mode = mode;
        self
    }

    pub fn with_default_author(mut self, author: impl Into<String>) -> Self {
        self.default_author = author.into();
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
