//! Integration tests for exporting a markdown blog to a Ghost bundle

mod common;

use chrono::{TimeZone, Utc};
use common::TestWorkspace;
use ghostmark::exporter::{ExportOptions, Exporter};
use ghostmark::ghost::{GhostExport, SequentialIdGenerator};

fn exporter(ws: &TestWorkspace) -> Exporter<SequentialIdGenerator> {
    let options = ExportOptions::default()
        .with_blog_dir(ws.path("blog"))
        .with_output(ws.path("out/ghost-import.json"))
        .with_slugs_file(Some(ws.path("slugs.txt")));
    Exporter::new(options)
        .with_id_generator(SequentialIdGenerator::new("id"))
        .with_now(Utc.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap())
}

fn read_bundle(ws: &TestWorkspace) -> GhostExport {
    serde_json::from_str(&ws.read("out/ghost-import.json")).expect("bundle is valid JSON")
}

#[test]
fn test_export_single_post() {
    let ws = TestWorkspace::new();
    ws.create_file(
        "blog/hello.md",
        "---\ntitle: Hello\npubDate: 2024-01-01\ndraft: false\n---\n# Hi\n\nworld\n",
    );

    let report = exporter(&ws).run().unwrap();
    assert_eq!(report.posts, 1);
    assert_eq!(report.drafts, 0);
    assert!(report.failed.is_empty());
    assert_eq!(report.output, Some(ws.path("out/ghost-import.json")));

    let bundle = read_bundle(&ws);
    assert_eq!(bundle.db.len(), 1);
    let db = &bundle.db[0];
    assert_eq!(db.meta.exported_on, 1741064767000);

    let post = &db.data.posts[0];
    assert_eq!(post.title, "Hello");
    assert_eq!(post.slug, "hello");
    assert_eq!(post.status, "published");
    assert_eq!(post.published_at.as_deref(), Some("2024-01-01 00:00:00"));
    assert_eq!(post.updated_at.as_deref(), Some("2025-03-04 05:06:07"));
    let html = post.html.as_deref().unwrap();
    assert!(html.contains("<h1>Hi</h1>"), "html was {:?}", html);
    assert!(html.contains("<p>world</p>"), "html was {:?}", html);

    assert_eq!(db.data.users.len(), 1);
    assert_eq!(db.data.posts_authors.len(), 1);
    assert_eq!(db.data.posts_authors[0].post_id, post.id);
    assert_eq!(db.data.posts_authors[0].author_id, db.data.users[0].id);
}

#[test]
fn test_draft_has_no_published_date() {
    let ws = TestWorkspace::new();
    ws.create_file("blog/wip.mdx", "---\ntitle: Work in progress\ndraft: true\n---\nSoon.\n");

    let report = exporter(&ws).run().unwrap();
    assert_eq!(report.posts, 1);
    assert_eq!(report.drafts, 1);

    let post = &read_bundle(&ws).db[0].data.posts[0];
    assert_eq!(post.slug, "wip");
    assert_eq!(post.status, "draft");
    assert_eq!(post.published_at, None);
}

#[test]
fn test_slugs_file_filters_posts() {
    let ws = TestWorkspace::new();
    ws.create_file("blog/one.md", "---\ntitle: One\n---\nfirst\n");
    ws.create_file("blog/two.md", "---\ntitle: Two\n---\nsecond\n");
    ws.create_file("blog/three.mdx", "---\ntitle: Three\n---\nthird\n");
    ws.create_file("slugs.txt", "# posts to export\n\nthree\nmissing\n");

    let report = exporter(&ws).run().unwrap();
    assert_eq!(report.posts, 1);

    let posts = &read_bundle(&ws).db[0].data.posts;
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "Three");
}

#[test]
fn test_empty_slugs_file_exports_everything() {
    let ws = TestWorkspace::new();
    ws.create_file("blog/one.md", "---\ntitle: One\n---\nfirst\n");
    ws.create_file("blog/two.md", "---\ntitle: Two\n---\nsecond\n");
    ws.create_file("slugs.txt", "# nothing selected\n");

    let report = exporter(&ws).run().unwrap();
    assert_eq!(report.posts, 2);
}

#[test]
fn test_bad_file_is_reported_and_skipped() {
    let ws = TestWorkspace::new();
    ws.create_file("blog/good.md", "---\ntitle: Good\n---\nok\n");
    ws.create_file("blog/bad-date.md", "---\ntitle: Bad\npubDate: someday\n---\nnope\n");
    ws.create_file("blog/unterminated.md", "---\ntitle: Broken\n\nno closing delimiter\n");

    let report = exporter(&ws).run().unwrap();
    assert_eq!(report.posts, 1);
    assert_eq!(report.failed.len(), 2);
    assert!(report.failed.iter().any(|(path, _)| path.ends_with("bad-date.md")));

    let data = &read_bundle(&ws).db[0].data;
    assert_eq!(data.posts.len(), 1);
    assert_eq!(data.posts[0].title, "Good");
    assert_eq!(data.posts_authors.len(), 1);
}

#[test]
fn test_colliding_slugs_are_rejected() {
    let ws = TestWorkspace::new();
    ws.create_file("blog/My Post.md", "---\ntitle: First\n---\none\n");
    ws.create_file("blog/my-post.mdx", "---\ntitle: Second\n---\ntwo\n");
    ws.create_file("blog/other.md", "---\ntitle: Other\n---\nthree\n");

    let report = exporter(&ws).run().unwrap();
    assert_eq!(report.posts, 2);
    assert_eq!(report.failed.len(), 1);
    let (path, reason) = &report.failed[0];
    assert!(path.ends_with("my-post.mdx"));
    assert!(reason.contains("My Post.md"), "reason was {:?}", reason);

    let data = &read_bundle(&ws).db[0].data;
    let slugs: Vec<&str> = data.posts.iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, ["my-post", "other"]);
    assert_eq!(data.posts[0].title, "First");
}

#[test]
fn test_tags_are_shared_between_posts() {
    let ws = TestWorkspace::new();
    ws.create_file("blog/a.md", "---\ntitle: A\ntags: [Rust, Web]\n---\na\n");
    ws.create_file("blog/b.md", "---\ntitle: B\ntags:\n  - rust\n  - CLI\n---\nb\n");

    let report = exporter(&ws).run().unwrap();
    assert_eq!(report.tags, 3);

    let data = &read_bundle(&ws).db[0].data;
    assert_eq!(data.tags.len(), 3);
    assert_eq!(data.posts_tags.len(), 4);

    let rust = data.tags.iter().find(|tag| tag.slug == "rust").unwrap();
    let rust_links = data.posts_tags.iter().filter(|link| link.tag_id == rust.id).count();
    assert_eq!(rust_links, 2);
}

#[test]
fn test_code_fence_content_is_escaped() {
    let ws = TestWorkspace::new();
    ws.create_file(
        "blog/code.md",
        "---\ntitle: Code\n---\n```rust\nlet ok = a < b && c;\n# not a heading\n```\n",
    );

    exporter(&ws).run().unwrap();
    let post = &read_bundle(&ws).db[0].data.posts[0];
    let html = post.html.as_deref().unwrap();
    assert!(html.contains("<pre><code class=\"rust\">"), "html was {:?}", html);
    assert!(html.contains("a &lt; b &amp;&amp; c"));
    assert!(!html.contains("<h1>"));
}

#[test]
fn test_unrecognized_youtube_url_becomes_comment() {
    let ws = TestWorkspace::new();
    ws.create_file(
        "blog/video.mdx",
        "---\ntitle: Video\n---\n<YoutubeEmbed url=\"https://vimeo.com/42\" />\n",
    );

    exporter(&ws).run().unwrap();
    let html = read_bundle(&ws).db[0].data.posts[0].html.clone().unwrap();
    assert!(html.contains("<!-- YouTube embed: could not extract a video id"), "html was {:?}", html);
    assert!(!html.contains("<iframe"));
}

#[test]
fn test_feature_image_alt_goes_to_posts_meta() {
    let ws = TestWorkspace::new();
    ws.create_file(
        "blog/cover.md",
        "---\ntitle: Cover\nimage:\n  src: ../../assets/cover.webp\n  alt: A cover\n---\nbody\n",
    );
    ws.create_file("blog/plain.md", "---\ntitle: Plain\nimage: ../../assets/plain.webp\n---\nbody\n");

    exporter(&ws).run().unwrap();
    let data = &read_bundle(&ws).db[0].data;
    assert_eq!(data.posts_meta.len(), 1);
    assert_eq!(data.posts_meta[0].feature_image_alt.as_deref(), Some("A cover"));

    let cover = data.posts.iter().find(|p| p.slug == "cover").unwrap();
    assert_eq!(data.posts_meta[0].post_id, cover.id);
    assert_eq!(
        cover.feature_image.as_deref(),
        Some("https://example.com/images/cover.webp")
    );
}

#[test]
fn test_posts_meta_omitted_without_alt_text() {
    let ws = TestWorkspace::new();
    ws.create_file("blog/plain.md", "---\ntitle: Plain\n---\nbody\n");

    exporter(&ws).run().unwrap();
    let json = ws.read("out/ghost-import.json");
    assert!(!json.contains("posts_meta"));
}

#[test]
fn test_no_posts_writes_nothing() {
    let ws = TestWorkspace::new();
    std::fs::create_dir_all(ws.path("blog")).unwrap();
    ws.create_file("blog/notes.txt", "not a post");

    let report = exporter(&ws).run().unwrap();
    assert!(report.is_empty());
    assert_eq!(report.posts, 0);
    assert!(!ws.path("out/ghost-import.json").exists());
}
