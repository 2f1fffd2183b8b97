//! Project configuration.
//!
//! Settings live in an optional `ghostmark.toml` at the project root. Every
//! section and every key has a default, so an absent file is equivalent to
//! an empty one:
//!
//! ```toml
//! [content]
//! blog_dir = "src/content/blog"
//!
//! [author]
//! name = "Jane Doe"
//! slug = "jane-doe"
//! email = "jane@example.com"
//!
//! [export]
//! output = "ghost-import.json"
//! slugs_file = "posts-to-export.txt"
//! asset_base_url = "https://blog.example.com/content/images"
//!
//! [import]
//! input = "ghost-export.json"
//! ghost_url = "https://blog.example.com"
//! image_mode = "local"
//! ```

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::importer::ImageMode;

pub const CONFIG_FILENAME: &str = "ghostmark.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub content: ContentSection,
    pub author: AuthorSection,
    pub export: ExportSection,
    pub import: ImportSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    pub blog_dir: PathBuf,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            blog_dir: PathBuf::from("src/content/blog"),
        }
    }
}

/// The single author every exported post is attributed to, and the fallback
/// author for imported posts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct AuthorSection {
    pub name: String,
    pub slug: String,
    pub email: String,
}

impl Default for AuthorSection {
    fn default() -> Self {
        Self {
            name: "Benoît Huron".to_string(),
            slug: "benoit-huron".to_string(),
            email: "author@example.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportSection {
    pub output: PathBuf,
    pub slugs_file: PathBuf,
    pub ghost_version: String,
    /// Absolute URL that local `../../assets/...` images are rebased onto
    pub asset_base_url: String,
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            output: PathBuf::from("ghost-import.json"),
            slugs_file: PathBuf::from("posts-to-export.txt"),
            ghost_version: "6.0.0".to_string(),
            asset_base_url: "https://example.com/images".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImportSection {
    pub input: PathBuf,
    /// Defaults to `content.blog_dir`
    pub output_dir: Option<PathBuf>,
    /// Replaces the `__GHOST_URL__` placeholder found in Ghost exports
    pub ghost_url: Option<String>,
    pub image_mode: ImageMode,
    pub local_image_dir: String,
}

impl Default for ImportSection {
    fn default() -> Self {
        Self {
            input: PathBuf::from("ghost-export.json"),
            output_dir: None,
            ghost_url: None,
            image_mode: ImageMode::default(),
            local_image_dir: "../../assets/ghost-images/".to_string(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file at {path:?}: {source}")]
    Io {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse config file at {path:?}: {source}")]
    Parse {
        #[source]
        source: toml::de::Error,
        path: PathBuf,
    },
}

impl SiteConfig {
    /// Load `path`, or the defaults if it does not exist.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            source,
            path: path.to_path_buf(),
        })?;
        let config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            source,
            path: path.to_path_buf(),
        })?;
        log::debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Load the config file that belongs to `project_root`.
    pub fn load_from_root(project_root: &Path) -> Result<Self, ConfigError> {
        Self::load(&project_root.join(CONFIG_FILENAME))
    }

    pub fn import_output_dir(&self) -> &Path {
        self.import
            .output_dir
            .as_deref()
            .unwrap_or(&self.content.blog_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_file() {
        let config = SiteConfig::from_toml("").unwrap();
        assert_eq!(config.content.blog_dir, PathBuf::from("src/content/blog"));
        assert_eq!(config.export.ghost_version, "6.0.0");
        assert_eq!(config.import.image_mode, ImageMode::Remote);
        assert_eq!(config.import_output_dir(), Path::new("src/content/blog"));
    }

    #[test]
    fn test_partial_sections() {
        let config = SiteConfig::from_toml(
            r#"
            [author]
            name = "Ada"

            [import]
            ghost_url = "https://blog.example.com"
            image_mode = "local"
            output_dir = "imported"
            "#,
        )
        .unwrap();
        assert_eq!(config.author.name, "Ada");
        assert_eq!(config.author.email, "author@example.com");
        assert_eq!(config.import.ghost_url.as_deref(), Some("https://blog.example.com"));
        assert_eq!(config.import.image_mode, ImageMode::Local);
        assert_eq!(config.import_output_dir(), Path::new("imported"));
    }

    #[test]
    fn test_missing_file_yields_defaults() {
        let config = SiteConfig::load(Path::new("/nonexistent/ghostmark.toml")).unwrap();
        assert_eq!(config.export.output, PathBuf::from("ghost-import.json"));
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILENAME);
        fs::write(&path, "[export\noutput = 1").unwrap();
        assert!(matches!(SiteConfig::load(&path), Err(ConfigError::Parse { .. })));
    }
}
