use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::ExportError;
use crate::config::AuthorSection;
use crate::frontmatter::{parse_date, Frontmatter, ImageField};
use crate::ghost::{
    GhostData, GhostDatabase, GhostExport, GhostMeta, GhostPost, GhostTag, GhostUser, IdGenerator, PostAuthor,
    PostMeta, PostTag, STATUS_DRAFT, STATUS_PUBLISHED,
};
use crate::slug::tag_slug;
use crate::utils::rewrite_asset_url;

/// Timestamp format Ghost accepts in bulk imports.
pub const GHOST_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn format_ghost_date(date: &DateTime<Utc>) -> String {
    date.format(GHOST_DATE_FORMAT).to_string()
}

/// Accumulates posts, tags and join records for one export run.
///
/// All posts are attributed to a single synthetic administrator created up
/// front. Tags are deduplicated by slug; the first spelling seen wins.
pub struct GhostAssembler<G: IdGenerator> {
    ids: G,
    now: DateTime<Utc>,
    version: String,
    asset_base_url: String,
    author_id: String,
    data: GhostData,
    tag_ids: HashMap<String, String>,
}

impl<G: IdGenerator> GhostAssembler<G> {
    pub fn new(mut ids: G, author: &AuthorSection, version: &str, asset_base_url: &str) -> Self {
        let author_id = ids.next_id();
        let data = GhostData {
            users: vec![GhostUser {
                id: author_id.clone(),
                name: author.name.clone(),
                slug: author.slug.clone(),
                email: author.email.clone(),
                roles: vec!["Administrator".to_string()],
            }],
            ..GhostData::default()
        };

        Self {
            ids,
            now: Utc::now(),
            version: version.to_string(),
            asset_base_url: asset_base_url.to_string(),
            author_id,
            data,
            tag_ids: HashMap::new(),
        }
    }

    /// Fix the clock used for missing dates and `exported_on`.
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn post_count(&self) -> usize {
        self.data.posts.len()
    }

    pub fn tag_count(&self) -> usize {
        self.data.tags.len()
    }

    pub fn user_count(&self) -> usize {
        self.data.users.len()
    }

    /// Add one post. Nothing is recorded if the frontmatter is rejected.
    pub fn add_post(&mut self, slug: &str, frontmatter: &Frontmatter, html: String) -> Result<&GhostPost, ExportError> {
        let now = format_ghost_date(&self.now);
        let pub_date = date_field("pubDate", frontmatter.pub_date.as_deref())?;
        let updated_date = date_field("updatedDate", frontmatter.updated_date.as_deref())?;

        let draft = frontmatter.is_draft();
        let title = frontmatter
            .title
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| "Untitled".to_string());

        let (feature_image, feature_image_alt) = match &frontmatter.image {
            Some(image) => {
                let alt = match image {
                    ImageField::Path(_) => None,
                    ImageField::Object { .. } => {
                        Some(image.alt().filter(|a| !a.is_empty()).unwrap_or(title.as_str()).to_string())
                    }
                };
                (Some(rewrite_asset_url(image.src(), &self.asset_base_url)), alt)
            }
            None => (None, None),
        };

        let post_id = self.ids.next_id();
        let post = GhostPost {
            id: post_id.clone(),
            title,
            slug: slug.to_string(),
            html: Some(html),
            post_type: "post".to_string(),
            status: if draft { STATUS_DRAFT } else { STATUS_PUBLISHED }.to_string(),
            visibility: frontmatter.visibility.clone().unwrap_or_else(|| "public".to_string()),
            created_at: Some(pub_date.clone().unwrap_or_else(|| now.clone())),
            updated_at: Some(updated_date.unwrap_or_else(|| now.clone())),
            published_at: if draft { None } else { Some(pub_date.unwrap_or(now)) },
            custom_excerpt: Some(frontmatter.description.clone().unwrap_or_default()),
            feature_image,
            ..GhostPost::default()
        };

        if let Some(alt) = feature_image_alt {
            let meta_id = self.ids.next_id();
            self.data.posts_meta.push(PostMeta {
                id: meta_id,
                post_id: post_id.clone(),
                feature_image_alt: Some(alt),
            });
        }

        self.data.posts_authors.push(PostAuthor {
            post_id: post_id.clone(),
            author_id: self.author_id.clone(),
            sort_order: None,
        });

        for name in frontmatter.tags() {
            let tag_id = self.tag_id(name);
            self.data.posts_tags.push(PostTag {
                post_id: post_id.clone(),
                tag_id,
            });
        }

        self.data.posts.push(post);
        let index = self.data.posts.len() - 1;
        Ok(&self.data.posts[index])
    }

    /// Id of the tag with `name`'s slug, creating the tag on first use.
    fn tag_id(&mut self, name: &str) -> String {
        let slug = tag_slug(name);
        if let Some(id) = self.tag_ids.get(&slug) {
            return id.clone();
        }

        let id = self.ids.next_id();
        log::debug!("new tag {:?} ({})", name, slug);
        self.data.tags.push(GhostTag {
            id: id.clone(),
            name: name.to_string(),
            slug: slug.clone(),
        });
        self.tag_ids.insert(slug, id.clone());
        id
    }

    /// Wrap everything collected so far into an importable document.
    pub fn finish(self) -> GhostExport {
        GhostExport {
            db: vec![GhostDatabase {
                meta: GhostMeta {
                    exported_on: self.now.timestamp_millis(),
                    version: self.version,
                },
                data: self.data,
            }],
        }
    }
}

fn date_field(field: &'static str, value: Option<&str>) -> Result<Option<String>, ExportError> {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    let date = parse_date(value).ok_or_else(|| ExportError::InvalidDate {
        field,
        value: value.to_string(),
    })?;
    Ok(Some(format_ghost_date(&date)))
}
