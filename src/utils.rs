use std::collections::HashMap;
use url::Url;

/// Prefix of images that live in the site's `src/assets` directory, as seen
/// from a post in `src/content/blog`.
pub const LOCAL_ASSET_PREFIX: &str = "../../assets/";

/// Video id from a `youtu.be/<id>`, `youtube.com/watch?v=<id>` or
/// `youtube.com/embed/<id>` URL.
pub fn get_youtube_id(value: &str) -> Option<String> {
    let parsed_url = Url::parse(value.trim()).ok()?;

    let id = match parsed_url.host_str()? {
        "youtu.be" => parsed_url.path().trim_start_matches('/').split('/').next()?.to_string(),

        "www.youtube.com" | "youtube.com" | "m.youtube.com" => {
            let path = parsed_url.path();

            if path == "/watch" {
                let query_pairs: HashMap<_, _> = parsed_url.query_pairs().into_owned().collect();
                query_pairs.get("v")?.to_string()
            } else if path.starts_with("/embed/") {
                let segments: Vec<&str> = path.split('/').collect();
                segments.get(2)?.to_string()
            } else {
                return None;
            }
        }

        _ => return None,
    };

    if id.is_empty() {
        None
    } else {
        Some(id)
    }
}

/// Last path segment of a path or URL, without query string or fragment.
pub fn basename(path: &str) -> &str {
    let path = path.split(['?', '#']).next().unwrap_or(path);
    path.rsplit('/').next().unwrap_or(path)
}

/// Join `base` and `name` with exactly one slash.
pub fn join_url(base: &str, name: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), name.trim_start_matches('/'))
}

/// Rebase a local asset path onto `base_url`; anything else is returned as is.
pub fn rewrite_asset_url(src: &str, base_url: &str) -> String {
    if src.starts_with(LOCAL_ASSET_PREFIX) {
        join_url(base_url, basename(src))
    } else {
        src.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_youtube_short_url() {
        assert_eq!(get_youtube_id("https://youtu.be/dQw4w9WgXcQ"), Some("dQw4w9WgXcQ".to_string()));
        assert_eq!(
            get_youtube_id("https://youtu.be/dQw4w9WgXcQ?t=42"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_youtube_watch_url() {
        assert_eq!(
            get_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ&list=x"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_youtube_embed_url() {
        assert_eq!(
            get_youtube_id("https://youtube.com/embed/dQw4w9WgXcQ"),
            Some("dQw4w9WgXcQ".to_string())
        );
    }

    #[test]
    fn test_youtube_unknown_shapes() {
        assert_eq!(get_youtube_id("https://vimeo.com/123"), None);
        assert_eq!(get_youtube_id("https://www.youtube.com/channel/abc"), None);
        assert_eq!(get_youtube_id("https://youtu.be/"), None);
        assert_eq!(get_youtube_id("not a url"), None);
    }

    #[test]
    fn test_basename() {
        assert_eq!(basename("../../assets/blog/cover.webp"), "cover.webp");
        assert_eq!(basename("https://x.io/a/b.png?w=100"), "b.png");
        assert_eq!(basename("plain.png"), "plain.png");
    }

    #[test]
    fn test_rewrite_asset_url() {
        assert_eq!(
            rewrite_asset_url("../../assets/posts/cover.webp", "https://example.com/images/"),
            "https://example.com/images/cover.webp"
        );
        assert_eq!(
            rewrite_asset_url("https://cdn.example.com/a.png", "https://example.com/images"),
            "https://cdn.example.com/a.png"
        );
    }
}
