//! Import report types

use super::options::ImageMode;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Which representation of a post its markdown body was produced from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentSource {
    Mobiledoc,
    Html,
    Plaintext,
    /// The post had no usable content at all
    Empty,
}

impl std::fmt::Display for ContentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentSource::Mobiledoc => write!(f, "mobiledoc"),
            ContentSource::Html => write!(f, "html"),
            ContentSource::Plaintext => write!(f, "plaintext"),
            ContentSource::Empty => write!(f, "empty"),
        }
    }
}

/// Type of warning during import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// A richer content representation could not be used
    ContentFallback,
    /// `__GHOST_URL__` left in place because no site URL is configured
    UnresolvedPlaceholder,
    /// Image mode that is accepted but not implemented
    UnimplementedImageMode,
}

impl std::fmt::Display for WarningKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WarningKind::ContentFallback => write!(f, "content_fallback"),
            WarningKind::UnresolvedPlaceholder => write!(f, "unresolved_placeholder"),
            WarningKind::UnimplementedImageMode => write!(f, "unimplemented_image_mode"),
        }
    }
}

/// A warning generated while converting one post
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportWarning {
    /// Title of the post
    pub post: String,
    pub kind: WarningKind,
    pub message: String,
}

impl std::fmt::Display for ImportWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.post, self.message)
    }
}

/// A post that could not be imported
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportFailure {
    pub post: String,
    pub message: String,
}

/// Counters for one import run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImportStatistics {
    /// Posts in the export, drafts included
    pub total_posts: usize,
    pub imported: usize,
    /// Destination file already existed
    pub skipped: usize,
    pub failed: usize,
    /// Non-published posts left out of the batch
    pub drafts_excluded: usize,
    /// Count of posts per content source
    pub content_sources: HashMap<String, usize>,
}

impl ImportStatistics {
    pub fn increment_source(&mut self, source: ContentSource) {
        *self.content_sources.entry(source.to_string()).or_insert(0) += 1;
    }
}

/// Complete import report
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportReport {
    pub input_file: String,
    pub output_dir: String,
    pub image_mode: ImageMode,
    pub dry_run: bool,
    /// Timestamp of the run
    pub timestamp: String,
    pub duration_ms: u64,
    pub statistics: ImportStatistics,
    pub warnings: Vec<ImportWarning>,
    pub failures: Vec<ImportFailure>,
}

impl ImportReport {
    pub fn new(input: &str, output_dir: &str, image_mode: ImageMode, dry_run: bool) -> Self {
        Self {
            input_file: input.to_string(),
            output_dir: output_dir.to_string(),
            image_mode,
            dry_run,
            timestamp: chrono::Utc::now().to_rfc3339(),
            duration_ms: 0,
            statistics: ImportStatistics::default(),
            warnings: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn add_warning(&mut self, warning: ImportWarning) {
        self.warnings.push(warning);
    }

    pub fn add_failure(&mut self, post: &str, message: impl Into<String>) {
        self.statistics.failed += 1;
        self.failures.push(ImportFailure {
            post: post.to_string(),
            message: message.into(),
        });
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Convert to human-readable text format
    pub fn to_text(&self) -> String {
        let stats = &self.statistics;
        let mut output = String::new();

        output.push_str("Ghost Import Report\n");
        output.push_str("===================\n");
        output.push_str(&format!("Input:  {}\n", self.input_file));
        output.push_str(&format!("Output: {}\n", self.output_dir));
        output.push_str(&format!("Images: {}\n", self.image_mode));
        output.push_str(&format!("Date:   {}\n", self.timestamp));
        output.push_str(&format!("Time:   {}ms\n\n", self.duration_ms));

        output.push_str("Statistics\n");
        output.push_str("----------\n");
        output.push_str(&format!("Posts in export: {}\n", stats.total_posts));
        output.push_str(&format!("Imported:        {}\n", stats.imported));
        output.push_str(&format!("Skipped:         {}\n", stats.skipped));
        output.push_str(&format!("Failed:          {}\n", stats.failed));
        output.push_str(&format!("Drafts excluded: {}\n\n", stats.drafts_excluded));

        if !stats.content_sources.is_empty() {
            output.push_str("Content sources\n");
            output.push_str("---------------\n");
            let mut sources: Vec<_> = stats.content_sources.iter().collect();
            sources.sort_by(|a, b| b.1.cmp(a.1).then(a.0.cmp(b.0)));
            for (source, count) in sources {
                output.push_str(&format!("✓ {}: {}\n", source, count));
            }
            output.push('\n');
        }

        if !self.warnings.is_empty() {
            output.push_str("Warnings\n");
            output.push_str("--------\n");
            for warning in &self.warnings {
                output.push_str(&format!("⚠ {}\n", warning));
            }
            output.push('\n');
        }

        if !self.failures.is_empty() {
            output.push_str("Failures\n");
            output.push_str("--------\n");
            for failure in &self.failures {
                output.push_str(&format!("✗ {:?}: {}\n", failure.post, failure.message));
            }
            output.push('\n');
        }

        output.push_str("Result\n");
        output.push_str("------\n");
        if self.dry_run {
            output.push_str("ℹ Dry run, no files were written\n");
        } else if stats.failed > 0 {
            output.push_str("✓ Import completed with failures\n");
        } else {
            output.push_str("✓ Import completed successfully\n");
        }

        output
    }
}
