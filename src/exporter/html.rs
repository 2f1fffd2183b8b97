//! Markdown to HTML conversion for Ghost's `html` field.
//!
//! This is a sequence of line oriented regex passes, not a CommonMark
//! parser. Pass order matters:
//!
//! 1. imports are collected and removed
//! 2. components become HTML
//! 3. fenced code blocks, then inline code, are escaped and stashed
//! 4. headers, emphasis, images, links, blockquotes, lists
//! 5. remaining non-block lines are wrapped in `<p>`
//! 6. stashed fragments are restored
//!
//! Anything stashed is invisible to the later passes, so code and generated
//! markup come out exactly as produced.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::markup;
use crate::utils::rewrite_asset_url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlOptions {
    /// Base URL local `../../assets/` images are rebased onto
    pub asset_base_url: String,
}

impl Default for HtmlOptions {
    fn default() -> Self {
        Self {
            asset_base_url: "https://example.com/images".to_string(),
        }
    }
}

const STASH_MARK: char = '\u{1A}';

static STASH_TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\x1A(\d+)\x1A").unwrap());

/// Finished HTML fragments kept out of reach of the markdown passes.
#[derive(Debug, Default)]
pub struct Stash {
    entries: Vec<(String, bool)>,
}

impl Stash {
    /// Stash a fragment that may sit inside a paragraph.
    pub fn inline(&mut self, html: String) -> String {
        self.push(html, false)
    }

    /// Stash a fragment that must never be wrapped in `<p>`.
    pub fn block(&mut self, html: String) -> String {
        self.push(html, true)
    }

    fn push(&mut self, html: String, block: bool) -> String {
        self.entries.push((html, block));
        format!("{STASH_MARK}{}{STASH_MARK}", self.entries.len() - 1)
    }

    /// Whether `line` is nothing but a block-level token.
    fn is_block_line(&self, line: &str) -> bool {
        let line = line.trim();
        STASH_TOKEN
            .captures(line)
            .filter(|caps| caps.get(0).is_some_and(|m| m.as_str() == line))
            .and_then(|caps| caps[1].parse::<usize>().ok())
            .and_then(|index| self.entries.get(index))
            .is_some_and(|(_, block)| *block)
    }

    pub fn restore(&self, text: &str) -> String {
        STASH_TOKEN
            .replace_all(text, |caps: &Captures| {
                caps[1]
                    .parse::<usize>()
                    .ok()
                    .and_then(|index| self.entries.get(index))
                    .map_or_else(|| caps[0].to_string(), |(html, _)| html.clone())
            })
            .into_owned()
    }
}

static CODE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```([\w+#.-]+)?[ \t]*\r?\n([\s\S]*?)```").unwrap());
static INLINE_CODE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"`([^`\n]+)`").unwrap());

static H3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^### (.+)$").unwrap());
static H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^## (.+)$").unwrap());
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").unwrap());

static BOLD_ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*\*(.+?)\*\*\*").unwrap());
static BOLD_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").unwrap());
static ITALIC_STAR: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*(.+?)\*").unwrap());
// Underscores only delimit emphasis at word boundaries, so `snake_case`
// names and file names survive.
static BOLD_ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b___(.+?)___\b").unwrap());
static BOLD_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b__(.+?)__\b").unwrap());
static ITALIC_UNDERSCORE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b_(.+?)_\b").unwrap());

static IMAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"!\[([^\]]*)\]\(([^)\s]+)\)").unwrap());
static LINK: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)\s]+)\)").unwrap());

static BLOCKQUOTE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^(?:&gt;|>) (.+)$").unwrap());

static UNORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*- (.+)$").unwrap());
static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\s*\d+\. (.+)$").unwrap());

static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:</?(?:h[1-6]|p|ul|ol|li|blockquote|pre|code|figure|iframe|div|hr|table)|<!--)").unwrap()
});

fn escape(code: &str) -> String {
    html_escape::encode_quoted_attribute(code).into_owned()
}

/// Convert an MDX body into Ghost HTML.
pub fn markdown_to_html(markdown: &str, options: &HtmlOptions) -> String {
    let mut stash = Stash::default();

    let (imports, text) = markup::strip_imports(markdown);
    let text = markup::rewrite_components(&text, &imports, options, &mut stash);
    let text = stash_code_blocks(&text, &mut stash);
    let text = stash_inline_code(&text, &mut stash);
    let text = headers(&text);
    let text = emphasis(&text);
    let text = images(&text, options);
    let text = links(&text);
    let text = blockquotes(&text);
    let text = lists(&text);
    let text = paragraphs(&text, &stash);
    let text = text.replace("<p></p>", "");

    stash.restore(&text)
}

fn stash_code_blocks(text: &str, stash: &mut Stash) -> String {
    CODE_BLOCK
        .replace_all(text, |caps: &Captures| {
            let lang = caps.get(1).map_or("", |m| m.as_str());
            let code = escape(caps[2].trim());
            stash.block(format!("<pre><code class=\"{}\">{}</code></pre>", lang, code))
        })
        .into_owned()
}

fn stash_inline_code(text: &str, stash: &mut Stash) -> String {
    INLINE_CODE
        .replace_all(text, |caps: &Captures| stash.inline(format!("<code>{}</code>", escape(&caps[1]))))
        .into_owned()
}

fn headers(text: &str) -> String {
    let text = H3.replace_all(text, "<h3>$1</h3>");
    let text = H2.replace_all(&text, "<h2>$1</h2>");
    H1.replace_all(&text, "<h1>$1</h1>").into_owned()
}

fn emphasis(text: &str) -> String {
    let text = BOLD_ITALIC_STAR.replace_all(text, "<strong><em>$1</em></strong>");
    let text = BOLD_STAR.replace_all(&text, "<strong>$1</strong>");
    let text = ITALIC_STAR.replace_all(&text, "<em>$1</em>");
    let text = BOLD_ITALIC_UNDERSCORE.replace_all(&text, "<strong><em>$1</em></strong>");
    let text = BOLD_UNDERSCORE.replace_all(&text, "<strong>$1</strong>");
    ITALIC_UNDERSCORE.replace_all(&text, "<em>$1</em>").into_owned()
}

fn images(text: &str, options: &HtmlOptions) -> String {
    IMAGE
        .replace_all(text, |caps: &Captures| {
            format!(
                "<img src=\"{}\" alt=\"{}\" />",
                rewrite_asset_url(&caps[2], &options.asset_base_url),
                &caps[1]
            )
        })
        .into_owned()
}

fn links(text: &str) -> String {
    LINK.replace_all(text, "<a href=\"${2}\">${1}</a>").into_owned()
}

fn blockquotes(text: &str) -> String {
    BLOCKQUOTE
        .replace_all(text, "<blockquote>$1</blockquote>")
        .into_owned()
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Unordered,
    Ordered,
}

impl ListKind {
    fn tag(self) -> &'static str {
        match self {
            Self::Unordered => "ul",
            Self::Ordered => "ol",
        }
    }
}

/// Group runs of consecutive `- item` / `1. item` lines into lists.
fn lists(text: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    let mut open: Option<ListKind> = None;

    for line in text.split('\n') {
        let item = UNORDERED_ITEM
            .captures(line)
            .map(|caps| (ListKind::Unordered, caps[1].to_string()))
            .or_else(|| ORDERED_ITEM.captures(line).map(|caps| (ListKind::Ordered, caps[1].to_string())));

        match item {
            Some((kind, content)) => {
                if open != Some(kind) {
                    if let Some(previous) = open {
                        out.push(format!("</{}>", previous.tag()));
                    }
                    out.push(format!("<{}>", kind.tag()));
                    open = Some(kind);
                }
                out.push(format!("<li>{}</li>", content));
            }
            None => {
                if let Some(previous) = open.take() {
                    out.push(format!("</{}>", previous.tag()));
                }
                out.push(line.to_string());
            }
        }
    }
    if let Some(previous) = open {
        out.push(format!("</{}>", previous.tag()));
    }

    out.join("\n")
}

/// Wrap every non-empty line that does not start a block element.
fn paragraphs(text: &str, stash: &Stash) -> String {
    text.split('\n')
        .map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() || BLOCK_START.is_match(trimmed) || stash.is_block_line(trimmed) {
                line.to_string()
            } else {
                format!("<p>{}</p>", trimmed)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}
