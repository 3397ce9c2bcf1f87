//! Slugs and titles.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

/// Strip a trailing `.md` and a leading `YYYY-MM-DD-` date prefix.
pub fn sanitize_slug(slug: &str) -> String {
    static DATE_PREFIX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}-").expect("Invalid date prefix regex"));

    let trimmed = slug.trim();
    let at = trimmed.len().saturating_sub(3);
    let s = match trimmed.get(at..) {
        Some(ext) if ext.eq_ignore_ascii_case(".md") => &trimmed[..at],
        _ => trimmed,
    };
    DATE_PREFIX.replace(s, "").into_owned()
}

/// Build a display title from a slug.
///
/// Words split on `-` and `_` are capitalized, except words found in
/// `acronym_map` (replaced verbatim) and `lil_words` (kept lowercase unless
/// first). Lookups ignore case.
pub fn title_from_slug(
    slug: &str,
    acronym_map: &BTreeMap<String, String>,
    lil_words: &[String],
) -> String {
    slug.trim()
        .split(['-', '_'])
        .filter(|word| !word.is_empty())
        .enumerate()
        .map(|(i, word)| {
            let low = word.to_lowercase();
            if let Some(acronym) = acronym_map
                .iter()
                .find(|(k, _)| k.to_lowercase() == low)
                .map(|(_, v)| v)
            {
                acronym.clone()
            } else if i != 0 && lil_words.iter().any(|w| w.to_lowercase() == low) {
                low
            } else {
                capitalize(&low)
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Anchor id for a heading: lowercase letters and digits joined by single
/// hyphens. Emoji and punctuation are dropped.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_dash = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else if c.is_whitespace() || c == '-' || c == '_' {
            pending_dash = true;
        }
    }

    slug
}
