//! Mobiledoc (Ghost's pre-Lexical editor format) to markdown.
//!
//! Only version 0.3 documents are understood. A document is a list of
//! sections; text lives in markers that open and close markups by index:
//!
//! ```json
//! {"version":"0.3.1","atoms":[],"cards":[["hr",{}]],"markups":[["strong"]],
//!  "sections":[[1,"h2",[[0,[],0,"Title"]]],[1,"p",[[0,[0],1,"bold"]]],[10,0]]}
//! ```

use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MobiledocError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed mobiledoc: {0}")]
    Malformed(String),
}

const MARKUP_SECTION: u64 = 1;
const IMAGE_SECTION: u64 = 2;
const LIST_SECTION: u64 = 3;
const CARD_SECTION: u64 = 10;

const TEXT_MARKER: u64 = 0;
const ATOM_MARKER: u64 = 1;

fn malformed(what: impl Into<String>) -> MobiledocError {
    MobiledocError::Malformed(what.into())
}

/// An inline markup definition, e.g. `["a", ["href", "https://..."]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Markup {
    tag: String,
    href: Option<String>,
}

impl Markup {
    fn parse(value: &Value) -> Result<Self, MobiledocError> {
        let parts = value.as_array().ok_or_else(|| malformed("markup is not an array"))?;
        let tag = parts
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| malformed("markup without a tag name"))?
            .to_ascii_lowercase();

        let href = parts
            .get(1)
            .and_then(Value::as_array)
            .and_then(|attrs| {
                attrs
                    .chunks(2)
                    .find(|pair| pair.first().and_then(Value::as_str) == Some("href"))
                    .and_then(|pair| pair.get(1))
                    .and_then(Value::as_str)
            })
            .map(str::to_string);

        Ok(Self { tag, href })
    }

    fn open(&self) -> &'static str {
        match self.tag.as_str() {
            "strong" | "b" => "**",
            "em" | "i" => "*",
            "code" => "`",
            "s" | "strike" | "del" => "~~",
            "a" => "[",
            _ => "",
        }
    }

    fn close(&self) -> String {
        match self.tag.as_str() {
            "a" => format!("]({})", self.href.as_deref().unwrap_or_default()),
            _ => self.open().to_string(),
        }
    }
}

struct Document<'a> {
    markups: Vec<Markup>,
    atoms: &'a [Value],
    cards: &'a [Value],
}

/// Convert a serialized mobiledoc document into markdown.
pub fn mobiledoc_to_markdown(source: &str) -> Result<String, MobiledocError> {
    let root: Value = serde_json::from_str(source)?;

    if let Some(version) = root.get("version").and_then(Value::as_str) {
        if !version.starts_with("0.3") {
            return Err(malformed(format!("unsupported version {}", version)));
        }
    }

    let empty = Vec::new();
    let list = |key: &str| root.get(key).and_then(Value::as_array).unwrap_or(&empty);

    let doc = Document {
        markups: list("markups").iter().map(Markup::parse).collect::<Result<_, _>>()?,
        atoms: list("atoms"),
        cards: list("cards"),
    };
    let sections = root
        .get("sections")
        .and_then(Value::as_array)
        .ok_or_else(|| malformed("missing sections"))?;

    let mut blocks = Vec::new();
    for section in sections {
        if let Some(block) = doc.section(section)? {
            if !block.trim().is_empty() {
                blocks.push(block);
            }
        }
    }

    Ok(blocks.join("\n\n").trim().to_string())
}

impl Document<'_> {
    fn section(&self, section: &Value) -> Result<Option<String>, MobiledocError> {
        let parts = section.as_array().ok_or_else(|| malformed("section is not an array"))?;
        let kind = parts
            .first()
            .and_then(Value::as_u64)
            .ok_or_else(|| malformed("section without a type"))?;

        match kind {
            MARKUP_SECTION => {
                let tag = parts.get(1).and_then(Value::as_str).unwrap_or("p");
                let text = self.markers(parts.get(2))?;
                Ok(Some(block_for_tag(tag, &text)))
            }
            IMAGE_SECTION => {
                let src = parts.get(1).and_then(Value::as_str).unwrap_or_default();
                Ok(Some(format!("![]({})", src)))
            }
            LIST_SECTION => {
                let ordered = parts.get(1).and_then(Value::as_str) == Some("ol");
                let items = parts
                    .get(2)
                    .and_then(Value::as_array)
                    .ok_or_else(|| malformed("list section without items"))?;
                let mut lines = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    let text = self.markers(Some(item))?;
                    if ordered {
                        lines.push(format!("{}. {}", index + 1, text));
                    } else {
                        lines.push(format!("- {}", text));
                    }
                }
                Ok(Some(lines.join("\n")))
            }
            CARD_SECTION => {
                let index = parts
                    .get(1)
                    .and_then(Value::as_u64)
                    .ok_or_else(|| malformed("card section without an index"))?;
                let card = self
                    .cards
                    .get(index as usize)
                    .ok_or_else(|| malformed(format!("card {} does not exist", index)))?;
                Ok(render_card(card))
            }
            other => {
                log::debug!("ignoring unknown mobiledoc section type {}", other);
                Ok(None)
            }
        }
    }

    /// Concatenate markers, opening and closing markups as they go.
    fn markers(&self, markers: Option<&Value>) -> Result<String, MobiledocError> {
        let Some(markers) = markers.and_then(Value::as_array) else {
            return Ok(String::new());
        };

        let mut out = String::new();
        let mut open: Vec<&Markup> = Vec::new();

        for marker in markers {
            let parts = marker.as_array().ok_or_else(|| malformed("marker is not an array"))?;
            let kind = parts.first().and_then(Value::as_u64).unwrap_or(TEXT_MARKER);

            for index in parts.get(1).and_then(Value::as_array).into_iter().flatten() {
                let markup = index
                    .as_u64()
                    .and_then(|i| self.markups.get(i as usize))
                    .ok_or_else(|| malformed(format!("markup {} does not exist", index)))?;
                out.push_str(markup.open());
                open.push(markup);
            }

            match kind {
                ATOM_MARKER => {
                    let atom = parts
                        .get(3)
                        .and_then(Value::as_u64)
                        .and_then(|i| self.atoms.get(i as usize))
                        .ok_or_else(|| malformed("atom marker without a valid atom"))?;
                    out.push_str(&render_atom(atom));
                }
                _ => out.push_str(parts.get(3).and_then(Value::as_str).unwrap_or_default()),
            }

            let closed = parts.get(2).and_then(Value::as_u64).unwrap_or(0);
            for _ in 0..closed {
                if let Some(markup) = open.pop() {
                    out.push_str(&markup.close());
                }
            }
        }

        while let Some(markup) = open.pop() {
            out.push_str(&markup.close());
        }
        Ok(out)
    }
}

fn block_for_tag(tag: &str, text: &str) -> String {
    match tag.to_ascii_lowercase().as_str() {
        "h1" => format!("# {}", text),
        "h2" => format!("## {}", text),
        "h3" => format!("### {}", text),
        "h4" => format!("#### {}", text),
        "h5" => format!("##### {}", text),
        "h6" => format!("###### {}", text),
        "blockquote" | "aside" => quote_lines(text),
        _ => text.to_string(),
    }
}

pub(crate) fn quote_lines(text: &str) -> String {
    text.trim()
        .lines()
        .map(|line| if line.is_empty() { ">".to_string() } else { format!("> {}", line) })
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_atom(atom: &Value) -> String {
    let parts = atom.as_array().map(Vec::as_slice).unwrap_or_default();
    match parts.first().and_then(Value::as_str) {
        Some("soft-return") => "\n".to_string(),
        _ => parts.get(1).and_then(Value::as_str).unwrap_or_default().to_string(),
    }
}

fn payload_str<'a>(payload: Option<&'a Value>, key: &str) -> Option<&'a str> {
    payload?.get(key)?.as_str().filter(|s| !s.is_empty())
}

fn render_card(card: &Value) -> Option<String> {
    let name = card.get(0).and_then(Value::as_str)?;
    let payload = card.get(1);

    match name {
        "markdown" | "card-markdown" => payload_str(payload, "markdown").map(str::to_string),
        "html" => payload_str(payload, "html").map(str::to_string),
        "image" => {
            let src = payload_str(payload, "src")?;
            let alt = payload_str(payload, "alt").unwrap_or_default();
            let mut block = format!("![{}]({})", alt, src);
            if let Some(caption) = payload_str(payload, "caption") {
                block.push_str(&format!("\n*{}*", caption));
            }
            Some(block)
        }
        "code" => {
            let code = payload_str(payload, "code").unwrap_or_default();
            let language = payload_str(payload, "language").unwrap_or_default();
            Some(format!("```{}\n{}\n```", language, code.trim_end()))
        }
        "hr" => Some("---".to_string()),
        "embed" => payload_str(payload, "html")
            .or_else(|| payload_str(payload, "url"))
            .map(str::to_string),
        "bookmark" => {
            let url = payload_str(payload, "url")?;
            let title = payload
                .and_then(|p| p.get("metadata"))
                .and_then(|m| m.get("title"))
                .and_then(Value::as_str)
                .unwrap_or(url);
            Some(format!("[{}]({})", title, url))
        }
        other => {
            log::debug!("ignoring unsupported mobiledoc card {:?}", other);
            None
        }
    }
}
