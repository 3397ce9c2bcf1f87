//! Heading outline of a Markdown body.

use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};

use crate::title::slugify;

/// A heading found in a document body.
#[derive(Debug, Clone, PartialEq)]
pub struct Heading {
    /// Heading text
    pub title: String,
    /// Anchor ID
    pub id: String,
    /// Heading level (1-6)
    pub level: u8,
}

/// Collect the headings of a Markdown body in document order.
pub fn outline(body: &str) -> Vec<Heading> {
    let options = Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS;

    let mut headings = Vec::new();
    let mut current: Option<(u8, String)> = None;

    for event in Parser::new_ext(body, options) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((level as u8, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut title)) = current {
                    title.push_str(&text);
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, title)) = current.take() {
                    let id = slugify(&title);
                    headings.push(Heading { title, id, level });
                }
            }
            _ => {}
        }
    }

    headings
}
