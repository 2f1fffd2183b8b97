//! Readability fixes for imported markdown.
//!
//! Frontmatter is kept byte for byte; only the body is touched. Lines inside
//! fenced code blocks are never treated as headings or wrapped.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::frontmatter::split_frontmatter;

/// Narrower wrap widths are ignored.
pub const MIN_WRAP_WIDTH: usize = 40;

static HEADING: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^#{1,6}\s").unwrap());
static PROMOTABLE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(#{4,6})\s+").unwrap());
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d+\. ").unwrap());

#[derive(Debug, Error)]
pub enum ReformatError {
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
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Wrap plain paragraphs at this column; 0 disables wrapping
    pub wrap: usize,
    /// h4 → h2, h5 → h3, h6 → h4
    pub promote_headings: bool,
}

impl FormatOptions {
    pub fn with_wrap(mut self, wrap: usize) -> Self {
        self.wrap = wrap;
        self
    }

    pub fn with_promote_headings(mut self, promote: bool) -> Self {
        self.promote_headings = promote;
        self
    }
}

fn is_fence(line: &str) -> bool {
    line.trim_start().starts_with("```")
}

/// Format a whole file.
pub fn format_markdown(content: &str, options: &FormatOptions) -> String {
    let body = match split_frontmatter(content) {
        Ok(Some((_, body))) => body,
        _ => return format_body(content, options),
    };

    let frontmatter = &content[..content.len() - body.len()];
    let body = body.trim_start_matches('\n').trim_end_matches('\n');
    format!("{}\n{}\n", frontmatter, format_body(body, options))
}

fn format_body(body: &str, options: &FormatOptions) -> String {
    let mut result = ensure_blank_lines_before_headings(body);
    if options.promote_headings {
        result = promote_headings(&result);
    }
    if options.wrap > 0 {
        result = wrap_text(&result, options.wrap);
    }
    result
}

/// Insert an empty line before every heading that directly follows text.
pub fn ensure_blank_lines_before_headings(content: &str) -> String {
    let mut result: Vec<&str> = Vec::new();
    let mut in_fence = false;
    let mut previous: Option<&str> = None;

    for line in content.split('\n') {
        if is_fence(line) {
            in_fence = !in_fence;
        } else if !in_fence && HEADING.is_match(line) {
            if previous.is_some_and(|prev| !prev.trim().is_empty()) {
                result.push("");
            }
        }
        result.push(line);
        previous = Some(line);
    }

    result.join("\n")
}

/// Move h4–h6 up two levels.
pub fn promote_headings(content: &str) -> String {
    let mut in_fence = false;
    content
        .split('\n')
        .map(|line| {
            if is_fence(line) {
                in_fence = !in_fence;
                return line.to_string();
            }
            if in_fence {
                return line.to_string();
            }
            match PROMOTABLE.captures(line) {
                Some(caps) => {
                    let level = caps[1].len() - 2;
                    format!("{} {}", "#".repeat(level), &line[caps[0].len()..])
                }
                None => line.to_string(),
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Paragraphs that must keep their line structure.
fn is_unwrappable(paragraph: &str) -> bool {
    paragraph.starts_with('#')
        || paragraph.starts_with('>')
        || paragraph.starts_with("- ")
        || paragraph.starts_with("* ")
        || ORDERED_ITEM.is_match(paragraph)
        || paragraph.contains("![")
        || paragraph.contains("](")
        || paragraph.contains("http://")
        || paragraph.contains("https://")
        || paragraph.starts_with('|')
        || paragraph.starts_with('<')
        || paragraph.starts_with("    ")
        || paragraph.lines().any(is_fence)
}

/// Greedy word wrap of plain paragraphs at `width` columns.
pub fn wrap_text(text: &str, width: usize) -> String {
    if width < MIN_WRAP_WIDTH {
        return text.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    let mut in_fence = false;

    for paragraph in text.split("\n\n") {
        let fences = paragraph.lines().filter(|line| is_fence(line)).count();
        let keep = in_fence || is_unwrappable(paragraph);
        if fences % 2 == 1 {
            in_fence = !in_fence;
        }

        if keep {
            lines.push(paragraph.to_string());
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        for word in paragraph.split(' ') {
            if current.chars().count() + word.chars().count() < width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
            } else {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
        lines.push(String::new());
    }

    lines.join("\n").trim().to_string()
}

/// One differing line between two versions of a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineChange {
    /// 1-based
    pub line: usize,
    pub before: String,
    pub after: String,
}

/// Line-by-line comparison: the first `limit` changes, and the total number
/// of differing lines.
pub fn diff_preview(original: &str, formatted: &str, limit: usize) -> (Vec<LineChange>, usize) {
    let before: Vec<&str> = original.split('\n').collect();
    let after: Vec<&str> = formatted.split('\n').collect();
    let mut changes = Vec::new();
    let mut total = 0;

    for i in 0..before.len().max(after.len()) {
        let old = before.get(i).copied().unwrap_or_default();
        let new = after.get(i).copied().unwrap_or_default();
        if old != new {
            total += 1;
            if changes.len() < limit {
                changes.push(LineChange {
                    line: i + 1,
                    before: old.to_string(),
                    after: new.to_string(),
                });
            }
        }
    }
    (changes, total)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    Unchanged,
    Formatted,
    /// Dry run: nothing written
    WouldChange { preview: Vec<LineChange>, total: usize },
}

/// Number of changed lines shown for a dry run.
pub const PREVIEW_LINES: usize = 5;

pub fn reformat_file(path: &Path, options: &FormatOptions, dry_run: bool) -> Result<FileOutcome, ReformatError> {
    let original = fs::read_to_string(path).map_err(|source| ReformatError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    let formatted = format_markdown(&original, options);

    if formatted == original {
        return Ok(FileOutcome::Unchanged);
    }
    if dry_run {
        let (preview, total) = diff_preview(&original, &formatted, PREVIEW_LINES);
        return Ok(FileOutcome::WouldChange { preview, total });
    }

    fs::write(path, formatted).map_err(|source| ReformatError::Write {
        source,
        path: path.to_path_buf(),
    })?;
    Ok(FileOutcome::Formatted)
}

/// Every `.md` file directly inside `dir`, sorted.
pub fn markdown_files(dir: &Path) -> Result<Vec<PathBuf>, ReformatError> {
    let entries = fs::read_dir(dir).map_err(|source| ReformatError::Read {
        source,
        path: dir.to_path_buf(),
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "md"))
        .collect();
    files.sort();
    Ok(files)
}
