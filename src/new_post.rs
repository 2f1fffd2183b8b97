//! Scaffold a new draft post.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use thiserror::Error;

use crate::slug::title_slug;

#[derive(Debug, Error)]
pub enum NewPostError {
    #[error("a post title is required")]
    MissingTitle,
    #[error("cannot derive a file name from {0:?}")]
    EmptySlug(String),
    #[error("{path:?} already exists")]
    AlreadyExists { path: PathBuf },
    #[error("failed to write {path:?}: {source}")]
    Write {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
}

/// The post that was created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub slug: String,
    pub path: PathBuf,
}

/// Double-quoted YAML scalar.
fn yaml_string(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Draft template with the component imports commented out.
pub fn render_template(title: &str, date: NaiveDate, author: &str) -> String {
    format!(
        r#"---
title: {title}
description: ""
pubDate: {date}
author: {author}
draft: true
# image:
#   src: ../../assets/
#   alt:
# tags:
#   - Tag1
#   - Tag2
---

// import YoutubeEmbed from '../../components/YoutubeEmbed.astro';
// import Figure from '../../components/Figure.astro';
import {{ Image }} from "astro:assets";
// import myImage from "../../assets/my-image.webp";

Write the introduction here...

## Section 1

Content of the first section...

### Subsection

More details...

## Section 2

<!-- Local image: -->
<!-- <Image
  src={{myImage}}
  alt="Image description"
  class="rounded-xl shadow-lg my-8 mx-auto"
/> -->

<!-- YouTube video: -->
<!-- <YoutubeEmbed
  url="https://youtu.be/..."
  title="Video title"
/> -->

<!-- Image with a caption: -->
<!-- <Figure
  src={{myImage}}
  alt="Image description"
  caption="Caption. Source: Insee."
/> -->

## Conclusion

Conclusion of the post...

"#,
        title = yaml_string(title),
        date = date.format("%Y-%m-%d"),
        author = yaml_string(author),
    )
}

/// Write `<slug>.mdx` for `title` into `blog_dir`. Existing files are never
/// overwritten.
pub fn create_post(blog_dir: &Path, title: &str, author: &str, date: NaiveDate) -> Result<NewPost, NewPostError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(NewPostError::MissingTitle);
    }

    let slug = title_slug(title);
    if slug.is_empty() {
        return Err(NewPostError::EmptySlug(title.to_string()));
    }

    let path = blog_dir.join(format!("{}.mdx", slug));
    if path.exists() {
        return Err(NewPostError::AlreadyExists { path });
    }

    fs::create_dir_all(blog_dir).map_err(|source| NewPostError::Write {
        source,
        path: blog_dir.to_path_buf(),
    })?;
    fs::write(&path, render_template(title, date, author)).map_err(|source| NewPostError::Write {
        source,
        path: path.clone(),
    })?;

    log::debug!("created {}", path.display());
    Ok(NewPost { slug, path })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::parse_document;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_template_frontmatter_parses() {
        let text = render_template("L'été \"chaud\"", date(), "Benoît Huron");
        let doc = parse_document(&text).unwrap();
        assert_eq!(doc.frontmatter.title.as_deref(), Some("L'été \"chaud\""));
        assert_eq!(doc.frontmatter.pub_date.as_deref(), Some("2025-06-01"));
        assert_eq!(doc.frontmatter.description.as_deref(), Some(""));
        assert!(doc.frontmatter.is_draft());
        assert!(doc.body.contains("import { Image } from \"astro:assets\";"));
        assert!(doc.body.contains("src={myImage}"));
    }

    #[test]
    fn test_create_post() {
        let dir = tempfile::tempdir().unwrap();
        let post = create_post(dir.path(), "Café à Paris", "Ada", date()).unwrap();
        assert_eq!(post.slug, "cafe-a-paris");
        assert_eq!(post.path, dir.path().join("cafe-a-paris.mdx"));
        assert!(fs::read_to_string(&post.path).unwrap().contains("title: \"Café à Paris\""));
    }

    #[test]
    fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("hello.mdx"), "mine").unwrap();
        let err = create_post(dir.path(), "Hello", "Ada", date()).unwrap_err();
        assert!(matches!(err, NewPostError::AlreadyExists { .. }));
        assert_eq!(fs::read_to_string(dir.path().join("hello.mdx")).unwrap(), "mine");
    }

    #[test]
    fn test_missing_title() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            create_post(dir.path(), "   ", "Ada", date()),
            Err(NewPostError::MissingTitle)
        ));
        assert!(matches!(
            create_post(dir.path(), "???", "Ada", date()),
            Err(NewPostError::EmptySlug(_))
        ));
    }
}
