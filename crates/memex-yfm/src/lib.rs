//! YAML front matter engine for memex Markdown documents.
//!
//! This crate splits documents into front matter and body, renders them
//! back, updates single fields in place, and assembles front matter for new
//! documents from the knowledge base settings and taxonomy.

pub mod builder;
pub mod clock;
pub mod frontmatter;
pub mod outline;
pub mod title;

pub use builder::{validate, Built, FrontMatterBuilder, UnknownEntry, ValidationError};
pub use clock::Clock;
pub use frontmatter::{parse, serialize, touch, FrontmatterError};
pub use outline::{outline, Heading};
pub use title::{sanitize_slug, slugify, title_from_slug};
