//! The Ghost bulk import/export data model.
//!
//! One set of records serves both directions. Fields that only appear in
//! exports produced by Ghost itself (`mobiledoc`, `plaintext`, ...) are
//! optional and skipped when serializing, so an exported bundle contains
//! exactly the fields Ghost's importer expects.
//!
//! <https://ghost.org/docs/migration/custom/>

use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Top-level document: either the `{ "db": [...] }` wrapper or a bare
/// database object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GhostDocument {
    Wrapper(GhostExport),
    Database(GhostDatabase),
}

impl GhostDocument {
    /// The first database in the document, which is the only one Ghost ever
    /// writes.
    pub fn into_database(self) -> Option<GhostDatabase> {
        match self {
            Self::Wrapper(export) => export.db.into_iter().next(),
            Self::Database(db) => Some(db),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostExport {
    pub db: Vec<GhostDatabase>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostDatabase {
    #[serde(default)]
    pub meta: GhostMeta,
    pub data: GhostData,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhostMeta {
    /// Milliseconds since the Unix epoch
    #[serde(default)]
    pub exported_on: i64,
    #[serde(default)]
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhostData {
    #[serde(default)]
    pub posts: Vec<GhostPost>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub posts_meta: Vec<PostMeta>,
    #[serde(default)]
    pub tags: Vec<GhostTag>,
    #[serde(default)]
    pub posts_tags: Vec<PostTag>,
    #[serde(default)]
    pub users: Vec<GhostUser>,
    #[serde(default)]
    pub posts_authors: Vec<PostAuthor>,
}

impl GhostData {
    /// Tag names attached to a post, in join-table order.
    pub fn tag_names_for(&self, post_id: &str) -> Vec<&str> {
        self.posts_tags
            .iter()
            .filter(|pt| pt.post_id == post_id)
            .filter_map(|pt| self.tags.iter().find(|tag| tag.id == pt.tag_id))
            .map(|tag| tag.name.as_str())
            .collect()
    }

    /// The primary author of a post: the legacy `author_id` column first,
    /// then the lowest `sort_order` entry of the `posts_authors` table.
    pub fn author_for(&self, post: &GhostPost) -> Option<&GhostUser> {
        let find_user = |id: &str| self.users.iter().find(|user| user.id == id);

        if let Some(user) = post.author_id.as_deref().and_then(find_user) {
            return Some(user);
        }

        self.posts_authors
            .iter()
            .filter(|pa| pa.post_id == post.id)
            .min_by_key(|pa| pa.sort_order.unwrap_or(0))
            .and_then(|pa| find_user(&pa.author_id))
    }
}

/// Post status as stored by Ghost.
pub const STATUS_PUBLISHED: &str = "published";
pub const STATUS_DRAFT: &str = "draft";

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GhostPost {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobiledoc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plaintext: Option<String>,
    #[serde(rename = "type", default = "default_post_type")]
    pub post_type: String,
    #[serde(default)]
    pub status: String,
    #[serde(default = "default_visibility")]
    pub visibility: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub published_at: Option<String>,
    #[serde(default)]
    pub custom_excerpt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    #[serde(default)]
    pub feature_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_image_alt: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub author_id: Option<String>,
}

impl GhostPost {
    pub fn is_published(&self) -> bool {
        self.status == STATUS_PUBLISHED
    }
}

fn default_post_type() -> String {
    "post".to_string()
}

fn default_visibility() -> String {
    "public".to_string()
}

/// Sidecar record holding the feature image alt text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMeta {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub post_id: String,
    #[serde(default)]
    pub feature_image_alt: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostTag {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostTag {
    #[serde(deserialize_with = "deserialize_id")]
    pub post_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub tag_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GhostUser {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostAuthor {
    #[serde(deserialize_with = "deserialize_id")]
    pub post_id: String,
    #[serde(deserialize_with = "deserialize_id")]
    pub author_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i64>,
}

/// Older Ghost versions used integer primary keys, newer ones 24 character
/// object ids. Both are read as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Text(String),
    Number(i64),
}

impl From<RawId> for String {
    fn from(raw: RawId) -> Self {
        match raw {
            RawId::Text(s) => s,
            RawId::Number(n) => n.to_string(),
        }
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    RawId::deserialize(deserializer).map(String::from)
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<RawId>::deserialize(deserializer)?.map(String::from))
}

/// Source of record identifiers for a generated bundle.
pub trait IdGenerator {
    fn next_id(&mut self) -> String;
}

/// Random version 4 UUIDs, rendered as 32 lowercase hex digits.
///
/// Each id carries 122 random bits; the chance of any collision among the
/// few thousand records of one export is below 2^-100.
#[derive(Debug, Default, Clone, Copy)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&mut self) -> String {
        Uuid::new_v4().simple().to_string()
    }
}

/// Deterministic ids (`<prefix>1`, `<prefix>2`, ...) for reproducible bundles.
#[derive(Debug, Clone)]
pub struct SequentialIdGenerator {
    prefix: String,
    next: u64,
}

impl SequentialIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: 1,
        }
    }
}

impl IdGenerator for SequentialIdGenerator {
    fn next_id(&mut self) -> String {
        let id = format!("{}{}", self.prefix, self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wrapped_export() {
        let json = r#"{"db":[{"meta":{"exported_on":1,"version":"5.0.0"},"data":{
            "posts":[{"id":"p1","title":"Hello","slug":"hello","status":"published","html":"<p>x</p>"}],
            "tags":[{"id":"t1","name":"Rust","slug":"rust"}],
            "posts_tags":[{"post_id":"p1","tag_id":"t1"}],
            "users":[{"id":1,"name":"Ada","slug":"ada","email":"ada@example.com"}]
        }}]}"#;
        let doc: GhostDocument = serde_json::from_str(json).unwrap();
        let db = doc.into_database().unwrap();
        assert_eq!(db.meta.version, "5.0.0");
        assert_eq!(db.data.posts[0].title, "Hello");
        assert!(db.data.posts[0].is_published());
        assert_eq!(db.data.users[0].id, "1");
        assert_eq!(db.data.tag_names_for("p1"), vec!["Rust"]);
    }

    #[test]
    fn test_parse_bare_database() {
        let json = r#"{"data":{"posts":[]}}"#;
        let doc: GhostDocument = serde_json::from_str(json).unwrap();
        let db = doc.into_database().unwrap();
        assert!(db.data.posts.is_empty());
        assert!(db.data.tags.is_empty());
    }

    #[test]
    fn test_author_resolution_prefers_author_id() {
        let data = GhostData {
            users: vec![
                GhostUser {
                    id: "u1".into(),
                    name: "First".into(),
                    slug: "first".into(),
                    email: String::new(),
                    roles: vec![],
                },
                GhostUser {
                    id: "u2".into(),
                    name: "Second".into(),
                    slug: "second".into(),
                    email: String::new(),
                    roles: vec![],
                },
            ],
            posts_authors: vec![PostAuthor {
                post_id: "p1".into(),
                author_id: "u2".into(),
                sort_order: Some(0),
            }],
            ..Default::default()
        };
        let mut post = GhostPost {
            id: "p1".into(),
            ..Default::default()
        };
        assert_eq!(data.author_for(&post).map(|u| u.name.as_str()), Some("Second"));

        post.author_id = Some("u1".into());
        assert_eq!(data.author_for(&post).map(|u| u.name.as_str()), Some("First"));
    }

    #[test]
    fn test_published_at_serializes_as_null() {
        let post = GhostPost {
            id: "p1".into(),
            post_type: "post".into(),
            status: STATUS_DRAFT.into(),
            ..Default::default()
        };
        let json = serde_json::to_value(&post).unwrap();
        assert!(json.get("published_at").unwrap().is_null());
        assert!(json.get("mobiledoc").is_none());
        assert_eq!(json["type"], "post");
    }

    #[test]
    fn test_uuid_generator_is_unique() {
        let mut ids = UuidGenerator;
        let a = ids.next_id();
        let b = ids.next_id();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
    }

    #[test]
    fn test_sequential_generator() {
        let mut ids = SequentialIdGenerator::new("id-");
        assert_eq!(ids.next_id(), "id-1");
        assert_eq!(ids.next_id(), "id-2");
    }
}
