//! Converts a single Ghost post into a markdown document.

use super::html::html_to_markdown;
use super::mobiledoc::mobiledoc_to_markdown;
use super::options::{ImageMode, ImportOptions, GHOST_URL_PLACEHOLDER};
use super::report::{ContentSource, ImportWarning, WarningKind};
use super::ImportError;
use crate::frontmatter::{FieldValue, FrontmatterWriter};
use crate::ghost::{GhostData, GhostPost};
use crate::slug::{normalize_ghost_slug, tag_slug};
use crate::utils::{basename, join_url};

/// Result of converting one post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedPost {
    pub slug: String,
    /// Complete file content, frontmatter included
    pub markdown: String,
    pub source: ContentSource,
    pub warnings: Vec<ImportWarning>,
}

impl ConvertedPost {
    pub fn file_name(&self) -> String {
        format!("{}.md", self.slug)
    }
}

/// Converts Ghost posts, resolving tags and authors against the rest of the
/// export.
pub struct PostConverter<'a> {
    options: &'a ImportOptions,
    data: &'a GhostData,
}

impl<'a> PostConverter<'a> {
    pub fn new(options: &'a ImportOptions, data: &'a GhostData) -> Self {
        Self { options, data }
    }

    pub fn convert(&self, post: &GhostPost) -> Result<ConvertedPost, ImportError> {
        let mut warnings = Vec::new();
        let title = if post.title.trim().is_empty() {
            "Untitled"
        } else {
            post.title.as_str()
        };

        let slug = post_slug(post);
        if slug.is_empty() {
            return Err(ImportError::EmptySlug {
                title: title.to_string(),
            });
        }

        let mut placeholder_seen = false;
        let mut resolve = |text: &str| -> String {
            if !text.contains(GHOST_URL_PLACEHOLDER) {
                return text.to_string();
            }
            match &self.options.ghost_url {
                Some(url) => text.replace(GHOST_URL_PLACEHOLDER, url.trim_end_matches('/')),
                None => {
                    placeholder_seen = true;
                    text.to_string()
                }
            }
        };

        let mobiledoc = post.mobiledoc.as_deref().map(&mut resolve);
        let html = post.html.as_deref().map(&mut resolve);
        let plaintext = post.plaintext.as_deref().map(&mut resolve);
        let feature_image = post
            .feature_image
            .as_deref()
            .filter(|src| !src.is_empty())
            .map(&mut resolve);

        if placeholder_seen {
            let message = format!(
                "content contains {} but no ghost_url is configured; links will be broken",
                GHOST_URL_PLACEHOLDER
            );
            log::warn!("{:?}: {}", title, message);
            warnings.push(ImportWarning {
                post: title.to_string(),
                kind: WarningKind::UnresolvedPlaceholder,
                message,
            });
        }

        let (body, source) = content_to_markdown(
            title,
            mobiledoc.as_deref(),
            html.as_deref(),
            plaintext.as_deref(),
            &mut warnings,
        );

        let image = feature_image.map(|src| {
            let src = self.image_src(title, &src, &mut warnings);
            let alt = post
                .feature_image_alt
                .as_deref()
                .or_else(|| self.meta_alt(&post.id))
                .filter(|alt| !alt.is_empty())
                .unwrap_or(title);
            FieldValue::Map(vec![
                ("src".to_string(), src),
                ("alt".to_string(), alt.to_string()),
            ])
        });

        let tags: Vec<String> = self
            .data
            .tag_names_for(&post.id)
            .into_iter()
            .filter(|name| !name.trim().is_empty() && *name != "#")
            .map(str::to_string)
            .collect();

        let author = self
            .data
            .author_for(post)
            .map(|user| user.name.as_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.options.default_author);

        let pub_date = first_present([post.published_at.as_deref(), post.created_at.as_deref()]).unwrap_or_default();

        let frontmatter = FrontmatterWriter::new()
            .field("title", title)
            .field("description", description(post))
            .field("pubDate", pub_date)
            .optional("updatedDate", first_present([post.updated_at.as_deref()]))
            .field("author", author)
            .field("draft", !post.is_published())
            .optional("tags", Some(tags).filter(|tags| !tags.is_empty()))
            .optional("image", image);

        let mut markdown = frontmatter.into_document(&body);
        if !markdown.ends_with('\n') {
            markdown.push('\n');
        }

        Ok(ConvertedPost {
            slug,
            markdown,
            source,
            warnings,
        })
    }

    fn meta_alt(&self, post_id: &str) -> Option<&'a str> {
        self.data
            .posts_meta
            .iter()
            .find(|meta| meta.post_id == post_id)
            .and_then(|meta| meta.feature_image_alt.as_deref())
    }

    fn image_src(&self, title: &str, src: &str, warnings: &mut Vec<ImportWarning>) -> String {
        match self.options.image_mode {
            ImageMode::Remote => src.to_string(),
            ImageMode::Local => join_url(&self.options.local_image_dir, basename(src)),
            ImageMode::Hybrid => {
                let message = "hybrid image mode is not implemented, keeping the remote URL".to_string();
                log::warn!("{:?}: {}", title, message);
                warnings.push(ImportWarning {
                    post: title.to_string(),
                    kind: WarningKind::UnimplementedImageMode,
                    message,
                });
                src.to_string()
            }
        }
    }
}

/// Ghost's own slug when present, otherwise one derived from the title.
pub fn post_slug(post: &GhostPost) -> String {
    if !post.slug.is_empty() {
        normalize_ghost_slug(&post.slug)
    } else {
        tag_slug(&post.title)
    }
}

fn description(post: &GhostPost) -> &str {
    first_present([
        post.custom_excerpt.as_deref(),
        post.meta_description.as_deref(),
        post.excerpt.as_deref(),
    ])
    .unwrap_or_default()
}

fn first_present<'a, const N: usize>(candidates: [Option<&'a str>; N]) -> Option<&'a str> {
    candidates.into_iter().flatten().find(|value| !value.is_empty())
}

/// Markdown body from the richest representation that works:
/// mobiledoc, then HTML, then plain text.
fn content_to_markdown(
    title: &str,
    mobiledoc: Option<&str>,
    html: Option<&str>,
    plaintext: Option<&str>,
    warnings: &mut Vec<ImportWarning>,
) -> (String, ContentSource) {
    let mut fallback = |message: String| {
        log::warn!("{:?}: {}", title, message);
        warnings.push(ImportWarning {
            post: title.to_string(),
            kind: WarningKind::ContentFallback,
            message,
        });
    };

    if let Some(doc) = mobiledoc.filter(|doc| !doc.trim().is_empty()) {
        match mobiledoc_to_markdown(doc) {
            Ok(markdown) => return (markdown, ContentSource::Mobiledoc),
            Err(e) => fallback(format!("cannot use mobiledoc ({}), falling back to HTML", e)),
        }
    }

    if let Some(html) = html.filter(|html| !html.trim().is_empty()) {
        return (html_to_markdown(html), ContentSource::Html);
    }

    match plaintext.filter(|text| !text.trim().is_empty()) {
        Some(text) => {
            if mobiledoc.is_some() {
                fallback("no HTML either, using plain text".to_string());
            }
            (text.trim().to_string(), ContentSource::Plaintext)
        }
        None => (String::new(), ContentSource::Empty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghost::{GhostTag, GhostUser, PostTag};

    fn post(html: &str) -> GhostPost {
        GhostPost {
            id: "p1".to_string(),
            title: "Hello".to_string(),
            slug: "hello".to_string(),
            html: Some(html.to_string()),
            status: "published".to_string(),
            published_at: Some("2024-01-01T00:00:00.000Z".to_string()),
            ..GhostPost::default()
        }
    }

    fn options() -> ImportOptions {
        ImportOptions::new("out").with_default_author("Default Author")
    }

    #[test]
    fn test_convert_html_post() {
        let data = GhostData::default();
        let options = options();
        let converted = PostConverter::new(&options, &data)
            .convert(&post("<h1>Hi</h1><p>world</p>"))
            .unwrap();

        assert_eq!(converted.slug, "hello");
        assert_eq!(converted.source, ContentSource::Html);
        assert_eq!(
            converted.markdown,
            "---\ntitle: 'Hello'\ndescription: ''\npubDate: '2024-01-01T00:00:00.000Z'\n\
             author: 'Default Author'\ndraft: false\n---\n\n# Hi\n\nworld\n"
        );
    }

    #[test]
    fn test_tags_author_and_image() {
        let mut data = GhostData::default();
        data.tags = vec![
            GhostTag {
                id: "t1".to_string(),
                name: "Rust".to_string(),
                slug: "rust".to_string(),
            },
            GhostTag {
                id: "t2".to_string(),
                name: "#".to_string(),
                slug: "hash".to_string(),
            },
        ];
        data.posts_tags = vec![
            PostTag {
                post_id: "p1".to_string(),
                tag_id: "t2".to_string(),
            },
            PostTag {
                post_id: "p1".to_string(),
                tag_id: "t1".to_string(),
            },
        ];
        data.users = vec![GhostUser {
            id: "u1".to_string(),
            name: "Ada".to_string(),
            slug: "ada".to_string(),
            email: "ada@example.com".to_string(),
            roles: Vec::new(),
        }];

        let mut post = post("<p>x</p>");
        post.author_id = Some("u1".to_string());
        post.custom_excerpt = Some("It's short".to_string());
        post.feature_image = Some("__GHOST_URL__/content/images/2024/01/cover.jpg".to_string());

        let options = options()
            .with_ghost_url("https://blog.example.com/")
            .with_image_mode(ImageMode::Local);
        let converted = PostConverter::new(&options, &data).convert(&post).unwrap();

        assert!(converted.markdown.contains("description: 'It''s short'\n"));
        assert!(converted.markdown.contains("author: 'Ada'\n"));
        assert!(converted.markdown.contains("tags: ['Rust']\n"));
        assert!(converted
            .markdown
            .contains("image:\n  src: '../../assets/ghost-images/cover.jpg'\n  alt: 'Hello'\n"));
        assert!(converted.warnings.is_empty());
    }

    #[test]
    fn test_placeholder_without_ghost_url() {
        let data = GhostData::default();
        let options = options();
        let converted = PostConverter::new(&options, &data)
            .convert(&post("<p><a href=\"__GHOST_URL__/about/\">about</a></p>"))
            .unwrap();

        assert!(converted.markdown.contains("[about](__GHOST_URL__/about/)"));
        assert_eq!(converted.warnings.len(), 1);
        assert_eq!(converted.warnings[0].kind, WarningKind::UnresolvedPlaceholder);
    }

    #[test]
    fn test_placeholder_is_substituted() {
        let data = GhostData::default();
        let options = options().with_ghost_url("https://blog.example.com");
        let converted = PostConverter::new(&options, &data)
            .convert(&post("<p><a href=\"__GHOST_URL__/about/\">about</a></p>"))
            .unwrap();
        assert!(converted.markdown.contains("[about](https://blog.example.com/about/)"));
    }

    #[test]
    fn test_mobiledoc_falls_back_to_html() {
        let data = GhostData::default();
        let options = options();
        let mut post = post("<p>from html</p>");
        post.mobiledoc = Some("{broken".to_string());

        let converted = PostConverter::new(&options, &data).convert(&post).unwrap();
        assert_eq!(converted.source, ContentSource::Html);
        assert!(converted.markdown.ends_with("from html\n"));
        assert_eq!(converted.warnings[0].kind, WarningKind::ContentFallback);
    }

    #[test]
    fn test_mobiledoc_preferred() {
        let data = GhostData::default();
        let options = options();
        let mut post = post("<p>from html</p>");
        post.mobiledoc = Some(r#"{"version":"0.3.1","sections":[[1,"p",[[0,[],0,"from mobiledoc"]]]]}"#.to_string());

        let converted = PostConverter::new(&options, &data).convert(&post).unwrap();
        assert_eq!(converted.source, ContentSource::Mobiledoc);
        assert!(converted.markdown.ends_with("from mobiledoc\n"));
    }

    #[test]
    fn test_plaintext_fallback() {
        let data = GhostData::default();
        let options = options();
        let mut post = post("");
        post.html = None;
        post.plaintext = Some("just text".to_string());

        let converted = PostConverter::new(&options, &data).convert(&post).unwrap();
        assert_eq!(converted.source, ContentSource::Plaintext);
        assert!(converted.markdown.ends_with("just text\n"));
    }

    #[test]
    fn test_broken_mobiledoc_without_html_uses_plaintext() {
        let data = GhostData::default();
        let options = options();
        let mut post = post("");
        post.html = None;
        post.mobiledoc = Some(r#"{"version":"0.3.1","sections":[[10,0]]}"#.to_string());
        post.plaintext = Some("plain body".to_string());

        let converted = PostConverter::new(&options, &data).convert(&post).unwrap();
        assert_eq!(converted.source, ContentSource::Plaintext);
        assert!(converted.markdown.ends_with("\nplain body\n"));
        assert_eq!(converted.warnings.len(), 2);
        assert!(converted
            .warnings
            .iter()
            .all(|warning| warning.kind == WarningKind::ContentFallback));
    }

    #[test]
    fn test_hybrid_mode_warns() {
        let data = GhostData::default();
        let options = options().with_image_mode(ImageMode::Hybrid);
        let mut post = post("<p>x</p>");
        post.feature_image = Some("https://cdn.example.com/a.png".to_string());

        let converted = PostConverter::new(&options, &data).convert(&post).unwrap();
        assert!(converted.markdown.contains("src: 'https://cdn.example.com/a.png'"));
        assert_eq!(converted.warnings[0].kind, WarningKind::UnimplementedImageMode);
    }

    #[test]
    fn test_slug_derivation() {
        let mut p = post("");
        p.slug = "Été_2024".to_string();
        assert_eq!(post_slug(&p), "-t--2024");

        p.slug = String::new();
        p.title = "Hello,  World!".to_string();
        assert_eq!(post_slug(&p), "hello-world");
    }

    #[test]
    fn test_empty_slug_is_an_error() {
        let data = GhostData::default();
        let options = options();
        let mut p = post("");
        p.slug = String::new();
        p.title = "!!!".to_string();
        assert!(matches!(
            PostConverter::new(&options, &data).convert(&p),
            Err(ImportError::EmptySlug { .. })
        ));
    }
}
