//! MDX specific markup: ES module imports and the Astro components the blog
//! uses inside posts.
//!
//! Components are turned into final HTML here and parked in the [`Stash`] so
//! the markdown passes that follow never see their attributes.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::html::{HtmlOptions, Stash};
use crate::utils::{get_youtube_id, rewrite_asset_url};

/// Default import bindings: local name → module path.
pub type ImportMap = HashMap<String, String>;

static DEFAULT_IMPORT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*import\s+([A-Za-z_$][\w$]*)\s+from\s+["']([^"']+)["']\s*;?\s*$"#).unwrap()
});
// `import x from "m"`, `import { a } from 'm'`, `import * as m from "m"`, `import "m"`
static IMPORT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*import\s*(?:[\w$*{][^"']*?\s+from\s*)?["'][^"']+["']\s*;?\s*$"#).unwrap()
});
static FENCE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*```").unwrap());

static IMAGE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<Image\s([^>]*?)/>").unwrap());
static FIGURE_TAG: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<Figure\s([^>]*?)/>").unwrap());
static YOUTUBE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<(?:YoutubeEmbed|YouTubeEmbed|YouTube)\s([^>]*?)/>").unwrap());
static ATTRIBUTE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z_][\w-]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|\{([^}]*)\})"#).unwrap()
});

/// Collect default imports (`import cover from "../../assets/cover.webp"`)
/// and remove every import statement. Named imports such as
/// `import { Image } from "astro:assets"` are dropped without a binding.
/// Lines inside code fences are left alone.
pub fn strip_imports(text: &str) -> (ImportMap, String) {
    let mut imports = ImportMap::new();
    let mut out = String::with_capacity(text.len());
    let mut in_fence = false;

    for line in text.split_inclusive('\n') {
        if FENCE.is_match(line) {
            in_fence = !in_fence;
        }
        if !in_fence && IMPORT_LINE.is_match(line.trim_end()) {
            if let Some(caps) = DEFAULT_IMPORT.captures(line.trim_end()) {
                imports.insert(caps[1].to_string(), caps[2].to_string());
            }
            continue;
        }
        out.push_str(line);
    }

    (imports, out)
}

/// Value of a component attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
enum AttrValue {
    Literal(String),
    /// JSX expression between braces, e.g. `{cover}`
    Expression(String),
}

fn parse_attributes(source: &str) -> HashMap<String, AttrValue> {
    ATTRIBUTE
        .captures_iter(source)
        .map(|caps| {
            let value = if let Some(expr) = caps.get(4) {
                AttrValue::Expression(expr.as_str().trim().to_string())
            } else {
                let literal = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
                AttrValue::Literal(literal.to_string())
            };
            (caps[1].to_string(), value)
        })
        .collect()
}

fn literal<'a>(attrs: &'a HashMap<String, AttrValue>, name: &str) -> Option<&'a str> {
    match attrs.get(name)? {
        AttrValue::Literal(value) => Some(value),
        AttrValue::Expression(expr) => Some(unquote(expr).unwrap_or(expr)),
    }
}

fn unquote(expr: &str) -> Option<&str> {
    ['"', '\'', '`']
        .iter()
        .find_map(|q| expr.strip_prefix(*q).and_then(|rest| rest.strip_suffix(*q)))
}

/// Resolve an image source: literal paths are used as they are, bare
/// identifiers through the import map.
fn resolve_src(value: &AttrValue, imports: &ImportMap) -> Result<String, String> {
    match value {
        AttrValue::Literal(path) => Ok(path.clone()),
        AttrValue::Expression(expr) => {
            if let Some(path) = unquote(expr) {
                Ok(path.to_string())
            } else {
                imports.get(expr).cloned().ok_or_else(|| expr.clone())
            }
        }
    }
}

fn attr(value: &str) -> String {
    html_escape::encode_double_quoted_attribute(value).into_owned()
}

fn img_tag(src: &str, attrs: &HashMap<String, AttrValue>) -> String {
    let mut tag = format!("<img src=\"{}\"", attr(src));
    for name in ["alt", "width", "height", "class"] {
        if let Some(value) = literal(attrs, name) {
            tag.push_str(&format!(" {}=\"{}\"", name, attr(value)));
        }
    }
    tag.push_str(" />");
    tag
}

/// Rewrite `<Image>`, `<Figure>` and YouTube embed components into Ghost
/// compatible HTML.
pub fn rewrite_components(text: &str, imports: &ImportMap, options: &HtmlOptions, stash: &mut Stash) -> String {
    let text = IMAGE_TAG.replace_all(text, |caps: &Captures| {
        let attrs = parse_attributes(&caps[1]);
        match image_src(&attrs, imports, options) {
            Ok(src) => stash.inline(img_tag(&src, &attrs)),
            Err(message) => stash.block(comment(&message)),
        }
    });

    let text = FIGURE_TAG.replace_all(&text, |caps: &Captures| {
        let attrs = parse_attributes(&caps[1]);
        match image_src(&attrs, imports, options) {
            Ok(src) => {
                let mut html = String::from("<figure class=\"kg-card kg-image-card");
                let caption = literal(&attrs, "caption").filter(|c| !c.is_empty());
                if caption.is_some() {
                    html.push_str(" kg-card-hascaption");
                }
                html.push_str("\">");
                html.push_str(&img_tag(&src, &attrs));
                if let Some(caption) = caption {
                    html.push_str(&format!("<figcaption>{}</figcaption>", html_escape::encode_text(caption)));
                }
                html.push_str("</figure>");
                stash.block(html)
            }
            Err(message) => stash.block(comment(&message)),
        }
    });

    let text = YOUTUBE_TAG.replace_all(&text, |caps: &Captures| {
        let attrs = parse_attributes(&caps[1]);
        let url = literal(&attrs, "url").unwrap_or_default();
        let Some(video_id) = get_youtube_id(url) else {
            log::warn!("could not extract a YouTube video id from {:?}", url);
            return stash.block(comment(&format!(
                "YouTube embed: could not extract a video id from \"{}\"",
                url
            )));
        };
        let title = literal(&attrs, "title").unwrap_or("YouTube video");
        stash.block(format!(
            "<figure class=\"kg-card kg-embed-card\"><iframe width=\"560\" height=\"315\" \
             src=\"https://www.youtube.com/embed/{}\" title=\"{}\" frameborder=\"0\" \
             allow=\"accelerometer; autoplay; clipboard-write; encrypted-media; gyroscope; picture-in-picture\" \
             allowfullscreen></iframe></figure>",
            attr(&video_id),
            attr(title)
        ))
    });

    text.into_owned()
}

fn image_src(
    attrs: &HashMap<String, AttrValue>,
    imports: &ImportMap,
    options: &HtmlOptions,
) -> Result<String, String> {
    let Some(value) = attrs.get("src") else {
        log::warn!("image component without a src attribute");
        return Err("Image: missing src attribute".to_string());
    };
    match resolve_src(value, imports) {
        Ok(src) => Ok(rewrite_asset_url(&src, &options.asset_base_url)),
        Err(name) => {
            log::warn!("image source {{{}}} is not bound by any import", name);
            Err(format!("Image: could not resolve source {{{}}}", name))
        }
    }
}

/// HTML comment; `--` is not allowed inside one.
fn comment(message: &str) -> String {
    format!("<!-- {} -->", message.replace("--", "- -"))
}
