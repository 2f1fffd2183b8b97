//! HTML to markdown, as a fixed sequence of regex passes.
//!
//! Tag patterns match the exact tag name (`<b>` but not `<br>` or
//! `<blockquote>`), and anything that survives the passes is stripped.
//! Nested lists and other nested constructs are flattened.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::mobiledoc::quote_lines;

macro_rules! tag_regex {
    ($name:ident, $pattern:expr) => {
        static $name: LazyLock<Regex> = LazyLock::new(|| Regex::new($pattern).unwrap());
    };
}

tag_regex!(PRE_CODE, r"(?is)<pre(?:\s[^>]*)?>\s*<code(\s[^>]*)?>(.*?)</code>\s*</pre>");
tag_regex!(PRE, r"(?is)<pre(?:\s[^>]*)?>(.*?)</pre>");
tag_regex!(LANGUAGE_CLASS, r#"(?i)class="[^"]*\blanguage-([\w+#-]+)"#);
tag_regex!(HEADING, r"(?is)<h([1-6])(?:\s[^>]*)?>(.*?)</h[1-6]>");
tag_regex!(STRONG, r"(?is)<(?:strong|b)(?:\s[^>]*)?>(.*?)</(?:strong|b)>");
tag_regex!(EM, r"(?is)<(?:em|i)(?:\s[^>]*)?>(.*?)</(?:em|i)>");
tag_regex!(IMG, r"(?is)<img(\s[^>]*)?/?>");
tag_regex!(SRC_ATTR, r#"(?is)\bsrc\s*=\s*"([^"]*)""#);
tag_regex!(ALT_ATTR, r#"(?is)\balt\s*=\s*"([^"]*)""#);
tag_regex!(LINK, r#"(?is)<a\s[^>]*?href\s*=\s*"([^"]*)"[^>]*>(.*?)</a>"#);
tag_regex!(CODE, r"(?is)<code(?:\s[^>]*)?>(.*?)</code>");
tag_regex!(UL, r"(?is)<ul(?:\s[^>]*)?>(.*?)</ul>");
tag_regex!(OL, r"(?is)<ol(?:\s[^>]*)?>(.*?)</ol>");
tag_regex!(LI, r"(?is)<li(?:\s[^>]*)?>(.*?)</li>");
tag_regex!(HR, r"(?i)<hr(?:\s[^>]*)?/?>");
tag_regex!(PARAGRAPH, r"(?is)<p(?:\s[^>]*)?>(.*?)</p>");
tag_regex!(BR, r"(?i)<br(?:\s[^>]*)?/?>");
tag_regex!(BLOCKQUOTE, r"(?is)<blockquote(?:\s[^>]*)?>(.*?)</blockquote>");
tag_regex!(ANY_TAG, r"(?s)<[^>]*>");
tag_regex!(BLANK_LINES, r"\n{3,}");

/// Convert Ghost post HTML into markdown.
pub fn html_to_markdown(html: &str) -> String {
    let text = code_blocks(html);
    let text = headings(&text);
    let text = STRONG.replace_all(&text, "**$1**");
    let text = EM.replace_all(&text, "*$1*");
    let text = images(&text);
    let text = LINK.replace_all(&text, "[$2]($1)");
    let text = CODE.replace_all(&text, "`$1`");
    let text = lists(&text);
    let text = HR.replace_all(&text, "\n---\n\n");
    let text = PARAGRAPH.replace_all(&text, "$1\n\n");
    let text = BR.replace_all(&text, "\n");
    let text = blockquotes(&text);
    let text = ANY_TAG.replace_all(&text, "");
    let text = decode_entities(&text);
    BLANK_LINES.replace_all(&text, "\n\n").trim().to_string()
}

fn code_blocks(html: &str) -> String {
    let text = PRE_CODE.replace_all(html, |caps: &Captures| {
        let language = caps
            .get(1)
            .and_then(|attrs| LANGUAGE_CLASS.captures(attrs.as_str()))
            .map(|c| c[1].to_string())
            .unwrap_or_default();
        format!("\n```{}\n{}\n```\n\n", language, caps[2].trim_end())
    });
    PRE.replace_all(&text, |caps: &Captures| format!("\n```\n{}\n```\n\n", caps[1].trim_end()))
        .into_owned()
}

fn headings(text: &str) -> String {
    HEADING
        .replace_all(text, |caps: &Captures| {
            let level = caps[1].parse::<usize>().unwrap_or(1);
            format!("{} {}\n\n", "#".repeat(level), caps[2].trim())
        })
        .into_owned()
}

fn images(text: &str) -> String {
    IMG.replace_all(text, |caps: &Captures| {
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let src = SRC_ATTR.captures(attrs).map(|c| c[1].to_string()).unwrap_or_default();
        let alt = ALT_ATTR.captures(attrs).map(|c| c[1].to_string()).unwrap_or_default();
        if src.is_empty() {
            String::new()
        } else {
            format!("![{}]({})", alt, src)
        }
    })
    .into_owned()
}

fn lists(text: &str) -> String {
    let text = UL.replace_all(text, |caps: &Captures| {
        let items: Vec<String> = LI
            .captures_iter(&caps[1])
            .map(|item| format!("- {}", item[1].trim()))
            .collect();
        format!("\n{}\n\n", items.join("\n"))
    });
    OL.replace_all(&text, |caps: &Captures| {
        let items: Vec<String> = LI
            .captures_iter(&caps[1])
            .enumerate()
            .map(|(index, item)| format!("{}. {}", index + 1, item[1].trim()))
            .collect();
        format!("\n{}\n\n", items.join("\n"))
    })
    .into_owned()
}

fn blockquotes(text: &str) -> String {
    BLOCKQUOTE
        .replace_all(text, |caps: &Captures| format!("\n{}\n\n", quote_lines(&caps[1])))
        .into_owned()
}

/// Decode the handful of entities Ghost emits. `&amp;` goes last so
/// `&amp;lt;` stays a literal `&lt;`.
pub fn decode_entities(text: &str) -> String {
    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&amp;", "&")
}
