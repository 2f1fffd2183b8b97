//! Frontmatter handling for both conversion directions.
//!
//! Export reads a `---` delimited YAML block into [`Frontmatter`]; import
//! writes one field at a time through [`FrontmatterWriter`], which quotes
//! every string with single quotes so no YAML escaping rules beyond `''`
//! apply.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontmatterError {
    #[error("unterminated frontmatter block")]
    Unterminated,
    #[error("invalid frontmatter: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Blog post metadata as written by authors.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Frontmatter {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, rename = "pubDate")]
    pub pub_date: Option<String>,
    #[serde(default, rename = "updatedDate")]
    pub updated_date: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub draft: Option<bool>,
    #[serde(default)]
    pub visibility: Option<String>,
    #[serde(default)]
    pub image: Option<ImageField>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}

impl Frontmatter {
    pub fn is_draft(&self) -> bool {
        self.draft == Some(true)
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }
}

/// `image:` is either a bare path or an `{ src, alt }` object.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ImageField {
    Path(String),
    Object {
        src: String,
        #[serde(default)]
        alt: Option<String>,
    },
}

impl ImageField {
    pub fn src(&self) -> &str {
        match self {
            Self::Path(src) => src,
            Self::Object { src, .. } => src,
        }
    }

    pub fn alt(&self) -> Option<&str> {
        match self {
            Self::Path(_) => None,
            Self::Object { alt, .. } => alt.as_deref(),
        }
    }
}

/// A content file split into its metadata and markdown body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub frontmatter: Frontmatter,
    pub body: String,
}

/// Split `content` into the raw YAML block and the body.
///
/// Returns `Ok(None)` when the content does not open with a `---` line.
pub fn split_frontmatter(content: &str) -> Result<Option<(&str, &str)>, FrontmatterError> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let Some(rest) = strip_delimiter_line(content) else {
        return Ok(None);
    };

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            let yaml = &rest[..offset];
            let body = &rest[offset + line.len()..];
            return Ok(Some((yaml, body)));
        }
        offset += line.len();
    }
    Err(FrontmatterError::Unterminated)
}

fn strip_delimiter_line(content: &str) -> Option<&str> {
    let rest = content.strip_prefix("---")?;
    rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))
}

/// Parse a content file. Files without frontmatter get default metadata and
/// keep their full text as the body.
pub fn parse_document(content: &str) -> Result<Document, FrontmatterError> {
    let Some((yaml, body)) = split_frontmatter(content)? else {
        return Ok(Document {
            frontmatter: Frontmatter::default(),
            body: content.to_string(),
        });
    };

    let frontmatter = if yaml.trim().is_empty() {
        Frontmatter::default()
    } else {
        serde_yaml::from_str(yaml)?
    };

    Ok(Document {
        frontmatter,
        body: body.to_string(),
    })
}

/// Parse a frontmatter date. Accepts RFC 3339, `YYYY-MM-DD HH:MM:SS`,
/// `YYYY-MM-DDTHH:MM:SS` and bare `YYYY-MM-DD`; values without an offset are
/// taken as UTC.
pub fn parse_date(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(naive.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// A value in a synthesized frontmatter block.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
    /// Nested block, e.g. `image: { src, alt }`
    Map(Vec<(String, String)>),
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

/// Builds a frontmatter block field by field, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct FrontmatterWriter {
    fields: Vec<(String, FieldValue)>,
}

impl FrontmatterWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, key: &str, value: impl Into<FieldValue>) -> Self {
        self.fields.push((key.to_string(), value.into()));
        self
    }

    /// Add `key` only when `value` is present.
    pub fn optional<V: Into<FieldValue>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.field(key, value),
            None => self,
        }
    }

    /// The block including both `---` delimiters and a trailing newline.
    pub fn render(&self) -> String {
        let mut out = String::from("---\n");
        for (key, value) in &self.fields {
            match value {
                FieldValue::Text(text) => {
                    out.push_str(&format!("{}: {}\n", key, quote(text)));
                }
                FieldValue::Bool(flag) => {
                    out.push_str(&format!("{}: {}\n", key, flag));
                }
                FieldValue::List(items) => {
                    let quoted: Vec<String> = items.iter().map(|item| quote(item)).collect();
                    out.push_str(&format!("{}: [{}]\n", key, quoted.join(", ")));
                }
                FieldValue::Map(entries) => {
                    out.push_str(&format!("{}:\n", key));
                    for (sub_key, sub_value) in entries {
                        out.push_str(&format!("  {}: {}\n", sub_key, quote(sub_value)));
                    }
                }
            }
        }
        out.push_str("---\n");
        out
    }

    /// The frontmatter block, a blank line, then `body`.
    pub fn into_document(self, body: &str) -> String {
        format!("{}\n{}", self.render(), body)
    }
}

/// Single-quoted YAML scalar.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_document() {
        let content = "---\ntitle: Hello\ndraft: false\npubDate: 2024-01-01\ntags:\n  - Rust\n  - Web\n---\n# Hi\n\nworld\n";
        let doc = parse_document(content).unwrap();
        assert_eq!(doc.frontmatter.title.as_deref(), Some("Hello"));
        assert_eq!(doc.frontmatter.pub_date.as_deref(), Some("2024-01-01"));
        assert!(!doc.frontmatter.is_draft());
        assert_eq!(doc.frontmatter.tags(), ["Rust".to_string(), "Web".to_string()]);
        assert_eq!(doc.body, "# Hi\n\nworld\n");
    }

    #[test]
    fn test_image_field_shapes() {
        let doc = parse_document("---\nimage:\n  src: ../../assets/a.webp\n  alt: An image\n---\n").unwrap();
        let image = doc.frontmatter.image.unwrap();
        assert_eq!(image.src(), "../../assets/a.webp");
        assert_eq!(image.alt(), Some("An image"));

        let doc = parse_document("---\nimage: /cover.png\n---\n").unwrap();
        let image = doc.frontmatter.image.unwrap();
        assert_eq!(image.src(), "/cover.png");
        assert_eq!(image.alt(), None);
    }

    #[test]
    fn test_no_frontmatter_keeps_body() {
        let doc = parse_document("just text\n").unwrap();
        assert_eq!(doc.frontmatter, Frontmatter::default());
        assert_eq!(doc.body, "just text\n");
    }

    #[test]
    fn test_empty_frontmatter() {
        let doc = parse_document("---\n---\nbody").unwrap();
        assert_eq!(doc.frontmatter, Frontmatter::default());
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_unterminated_frontmatter() {
        assert!(matches!(
            parse_document("---\ntitle: x\n"),
            Err(FrontmatterError::Unterminated)
        ));
    }

    #[test]
    fn test_crlf_delimiters() {
        let doc = parse_document("---\r\ntitle: Win\r\n---\r\nbody").unwrap();
        assert_eq!(doc.frontmatter.title.as_deref(), Some("Win"));
        assert_eq!(doc.body, "body");
    }

    #[test]
    fn test_parse_date_formats() {
        let expected = "2024-01-01 00:00:00";
        for input in ["2024-01-01", "2024-01-01 00:00:00", "2024-01-01T00:00:00", "2024-01-01T00:00:00.000Z"] {
            let dt = parse_date(input).unwrap();
            assert_eq!(dt.format("%Y-%m-%d %H:%M:%S").to_string(), expected, "{}", input);
        }
        let shifted = parse_date("2024-01-01T02:00:00+02:00").unwrap();
        assert_eq!(shifted.format("%Y-%m-%d %H:%M:%S").to_string(), expected);
        assert!(parse_date("not a date").is_none());
    }

    #[test]
    fn test_writer_renders_fields_in_order() {
        let block = FrontmatterWriter::new()
            .field("title", "It's here")
            .field("draft", false)
            .optional::<String>("updatedDate", None)
            .field("tags", vec!["a".to_string(), "b'c".to_string()])
            .field(
                "image",
                FieldValue::Map(vec![
                    ("src".to_string(), "/x.png".to_string()),
                    ("alt".to_string(), "X".to_string()),
                ]),
            )
            .render();
        assert_eq!(
            block,
            "---\ntitle: 'It''s here'\ndraft: false\ntags: ['a', 'b''c']\nimage:\n  src: '/x.png'\n  alt: 'X'\n---\n"
        );
    }

    #[test]
    fn test_written_block_parses_back() {
        let text = FrontmatterWriter::new()
            .field("title", "L'été")
            .field("draft", true)
            .into_document("body");
        let doc = parse_document(&text).unwrap();
        assert_eq!(doc.frontmatter.title.as_deref(), Some("L'été"));
        assert!(doc.frontmatter.is_draft());
        assert_eq!(doc.body, "\nbody");
    }
}
