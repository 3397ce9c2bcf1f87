//! Text transformations over Markdown documents.
//!
//! Punctuation cleanup and extraction of inline base64 images. Both work on
//! in-memory text; callers decide where the result is written.

pub mod clean;
pub mod images;

pub use clean::{clean, needs_cleaning};
pub use images::{extract_images, find_embedded, DecodeError, EmbeddedImage, ImageError, Rewrite, SavedImage};
