//! Slug derivation.
//!
//! Every identifier that ends up in a URL goes through one of these
//! functions. Each direction of the conversion derives slugs from a
//! different source:
//!
//! - [`slugify`]: post slugs from file names (export)
//! - [`tag_slug`]: tag slugs and title fallbacks (export tags, import titles)
//! - [`normalize_ghost_slug`]: slugs that Ghost already provided (import)
//! - [`title_slug`]: new post file names, with transliteration

use std::path::Path;

/// Lowercase ASCII slug with every run of non-alphanumerics collapsed to a
/// single hyphen and no leading or trailing hyphen.
///
/// Applying it to its own output is a no-op.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for c in text.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Post slug for a content file: the file stem, slugified.
pub fn slug_from_path(path: &Path) -> String {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy())
        .unwrap_or_default();
    slugify(&stem)
}

/// Tag slug: lowercase, drop everything that is not a word character,
/// whitespace or hyphen, turn whitespace runs into hyphens and collapse
/// repeated hyphens.
///
/// Word characters are ASCII only, so accented letters are dropped rather
/// than transliterated.
pub fn tag_slug(name: &str) -> String {
    let lowered = name.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || c.is_whitespace() || *c == '-')
        .collect();

    let mut slug = String::with_capacity(kept.len());
    let mut in_whitespace = false;
    for c in kept.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                push_hyphen(&mut slug);
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        if c == '-' {
            push_hyphen(&mut slug);
        } else {
            slug.push(c);
        }
    }
    slug.trim().to_string()
}

fn push_hyphen(slug: &mut String) {
    if !slug.ends_with('-') {
        slug.push('-');
    }
}

/// Normalize a slug supplied by Ghost: lowercase and replace every character
/// outside `[a-z0-9-]` with a hyphen, one for one.
pub fn normalize_ghost_slug(slug: &str) -> String {
    slug.to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Slug for a brand new post title. Accents and other non-ASCII letters are
/// transliterated first, so `"Café à Paris"` becomes `"cafe-a-paris"`.
pub fn title_slug(title: &str) -> String {
    let ascii = deunicode::deunicode(title.trim()).to_lowercase();

    let mut slug = String::with_capacity(ascii.len());
    for c in ascii.chars() {
        if c.is_whitespace() || c == '_' || c == '-' {
            push_hyphen(&mut slug);
        } else if c.is_ascii_alphanumeric() {
            slug.push(c);
        }
    }
    slug.trim_matches('-').to_string()
}
