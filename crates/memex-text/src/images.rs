//! Inline base64 image extraction.
//!
//! Markdown pasted from other tools often embeds screenshots as
//! `![alt](data:image/png;base64,...)`. These are decoded into an assets
//! directory beside the document (`<stem>.assets/`) and the references are
//! rewritten to relative links.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use pulldown_cmark::{Event, Options, Parser, Tag};
use regex::Regex;

/// File name prefix of extracted images.
pub const IMAGE_PREFIX: &str = "image_";

const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

const LENIENT_URL_SAFE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// A data-URI image reference found in a document.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddedImage {
    /// Byte range of the whole `![..](..)` reference
    pub range: Range<usize>,
    pub alt: String,
    pub mime: String,
    pub payload: String,
    pub title: Option<String>,
}

/// An image written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct SavedImage {
    pub path: PathBuf,

    /// Link written into the document, relative to it
    pub link: String,

    pub bytes: usize,
}

/// A payload that could not be decoded. The reference is left untouched.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("image {index} (alt `{alt}`): {message}")]
pub struct DecodeError {
    /// 1-based position among the document's embedded images
    pub index: usize,
    pub alt: String,
    pub message: String,
}

/// Errors that stop processing of a document.
#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Document path has no file name: {0}")]
    InvalidPath(String),

    #[error("Failed to write {path}: {message}")]
    Write { path: String, message: String },
}

/// Result of extracting a document's images.
#[derive(Debug, Clone, Default)]
pub struct Rewrite {
    /// Document text with saved images relinked
    pub text: String,
    pub saved: Vec<SavedImage>,
    pub errors: Vec<DecodeError>,
}

impl Rewrite {
    pub fn changed(&self) -> bool {
        !self.saved.is_empty()
    }
}

/// Find data-URI images outside code spans and code blocks.
pub fn find_embedded(text: &str) -> Vec<EmbeddedImage> {
    static RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(
            r#"!\[(?P<alt>[^\]]*)\]\(\s*data:(?P<mime>[^;,)\s]*);base64,(?P<blob>[^)"]*)(?:"(?P<title>[^"]*)"\s*)?\)"#,
        )
        .expect("Invalid data URI regex")
    });

    let code = code_ranges(text);
    RE.captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            if code.iter().any(|r| r.start <= whole.start() && whole.start() < r.end) {
                return None;
            }
            Some(EmbeddedImage {
                range: whole.range(),
                alt: caps.name("alt").map_or("", |m| m.as_str()).to_string(),
                mime: caps.name("mime").map_or("", |m| m.as_str()).to_string(),
                payload: caps.name("blob").map_or("", |m| m.as_str()).to_string(),
                title: caps.name("title").map(|m| m.as_str().to_string()),
            })
        })
        .collect()
}

fn code_ranges(text: &str) -> Vec<Range<usize>> {
    Parser::new_ext(text, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) | Event::Code(_) => Some(range),
            _ => None,
        })
        .collect()
}

/// Decode a base64 payload, ignoring whitespace and missing padding.
pub fn decode_payload(payload: &str) -> Result<Vec<u8>, String> {
    let compact: String = payload.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    if compact.is_empty() {
        return Err("empty base64 payload".to_string());
    }

    STANDARD
        .decode(&compact)
        .or_else(|_| LENIENT.decode(&compact))
        .or_else(|e| LENIENT_URL_SAFE.decode(&compact).map_err(|_| e))
        .map_err(|e| format!("invalid base64: {}", e))
}

/// File extension for decoded image bytes, from magic numbers or the MIME type.
pub fn sniff_extension(raw: &[u8], mime: &str) -> String {
    if raw.starts_with(&[0xFF, 0xD8, 0xFF]) {
        return ".jpg".to_string();
    }
    if raw.starts_with(b"\x89PNG\r\n\x1a\n") {
        return ".png".to_string();
    }
    if raw.starts_with(b"GIF8") {
        return ".gif".to_string();
    }
    if raw.len() >= 12 && &raw[..4] == b"RIFF" && &raw[8..12] == b"WEBP" {
        return ".webp".to_string();
    }

    let subtype = mime
        .split('/')
        .nth(1)
        .and_then(|s| s.split('+').next())
        .unwrap_or("")
        .to_ascii_lowercase();
    match subtype.as_str() {
        "" => ".bin".to_string(),
        "jpeg" => ".jpg".to_string(),
        s if s.chars().all(|c| c.is_ascii_alphanumeric()) => format!(".{}", s),
        _ => ".bin".to_string(),
    }
}

/// Assets directory for a document: `<stem>.assets` beside it.
pub fn assets_dir(doc_path: &Path) -> Result<PathBuf, ImageError> {
    let stem = doc_path
        .file_stem()
        .and_then(|s| s.to_str())
        .ok_or_else(|| ImageError::InvalidPath(doc_path.display().to_string()))?;
    let parent = doc_path.parent().unwrap_or(Path::new(""));
    Ok(parent.join(format!("{}.assets", stem)))
}

/// Highest `image_<n>` already in `dir`, or 0.
fn highest_index(dir: &Path) -> usize {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let name = e.file_name().to_string_lossy().into_owned();
            let rest = name.strip_prefix(IMAGE_PREFIX)?;
            let digits = rest.split('.').next()?;
            digits.parse::<usize>().ok()
        })
        .max()
        .unwrap_or(0)
}

/// Link destination as written between the parentheses. Paths with
/// whitespace or brackets go inside `<...>`.
fn link_destination(link: &str) -> String {
    if !link.contains(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>')) {
        return link.to_string();
    }
    let escaped = link.replace('<', "\\<").replace('>', "\\>");
    format!("<{}>", escaped)
}

/// Decode every embedded image of a document and relink the saved ones.
///
/// Malformed payloads are collected in [`Rewrite::errors`] while the
/// remaining images are still processed. Nothing is written to the
/// document itself; the caller decides whether to save [`Rewrite::text`].
pub fn extract_images(doc_path: &Path, text: &str) -> Result<Rewrite, ImageError> {
    let embedded = find_embedded(text);
    let mut rewrite = Rewrite::default();
    if embedded.is_empty() {
        rewrite.text = text.to_string();
        return Ok(rewrite);
    }

    let dir = assets_dir(doc_path)?;
    let dir_name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut next_index = highest_index(&dir) + 1;
    let mut out = String::with_capacity(text.len());
    let mut last = 0;

    for (i, image) in embedded.iter().enumerate() {
        let raw = match decode_payload(&image.payload) {
            Ok(raw) => raw,
            Err(message) => {
                tracing::warn!("{}: image {} not decoded: {}", doc_path.display(), i + 1, message);
                rewrite.errors.push(DecodeError {
                    index: i + 1,
                    alt: image.alt.clone(),
                    message,
                });
                continue;
            }
        };

        let write_err = |path: &Path, e: std::io::Error| ImageError::Write {
            path: path.display().to_string(),
            message: e.to_string(),
        };
        fs::create_dir_all(&dir).map_err(|e| write_err(&dir, e))?;

        let file_name = format!("{}{}{}", IMAGE_PREFIX, next_index, sniff_extension(&raw, &image.mime));
        next_index += 1;
        let path = dir.join(&file_name);
        fs::write(&path, &raw).map_err(|e| write_err(&path, e))?;
        tracing::debug!("Saved {} ({} bytes)", path.display(), raw.len());

        let link = format!("{}/{}", dir_name, file_name);
        let destination = link_destination(&link);
        out.push_str(&text[last..image.range.start]);
        match &image.title {
            Some(title) => out.push_str(&format!("![{}]({} \"{}\")", image.alt, destination, title)),
            None => out.push_str(&format!("![{}]({})", image.alt, destination)),
        }
        last = image.range.end;

        rewrite.saved.push(SavedImage {
            path,
            link,
            bytes: raw.len(),
        });
    }

    out.push_str(&text[last..]);
    rewrite.text = out;
    Ok(rewrite)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PNG: &str = "iVBORw0KGgoAAAAA";
    const GIF: &str = "R0lGODlhAQA=";

    #[test]
    fn finds_embedded_images() {
        let text = format!("Intro ![shot](data:image/png;base64,{PNG}) and ![x](https://e.com/a.png)");

        let found = find_embedded(&text);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].alt, "shot");
        assert_eq!(found[0].mime, "image/png");
        assert_eq!(found[0].payload, PNG);
        assert_eq!(&text[found[0].range.clone()], format!("![shot](data:image/png;base64,{PNG})"));
    }

    #[test]
    fn skips_images_inside_code() {
        let text = format!(
            "`![a](data:image/png;base64,{PNG})`\n\n```md\n![b](data:image/png;base64,{PNG})\n```\n\n![c](data:image/png;base64,{PNG})\n"
        );

        let found = find_embedded(&text);

        assert_eq!(found.len(), 1);
        assert_eq!(found[0].alt, "c");
    }

    #[test]
    fn decodes_wrapped_and_unpadded_payloads() {
        assert_eq!(decode_payload("aGVs\nbG8=").unwrap(), b"hello");
        assert_eq!(decode_payload("aGVsbG8").unwrap(), b"hello");
        assert!(decode_payload("@@@@").is_err());
        assert!(decode_payload("  ").is_err());
    }

    #[test]
    fn sniffs_extensions() {
        assert_eq!(sniff_extension(&decode_payload(PNG).unwrap(), "image/jpeg"), ".png");
        assert_eq!(sniff_extension(&decode_payload(GIF).unwrap(), ""), ".gif");
        assert_eq!(sniff_extension(&[0xFF, 0xD8, 0xFF, 0xE0], ""), ".jpg");
        assert_eq!(sniff_extension(b"RIFF\0\0\0\0WEBPVP8 ", ""), ".webp");
        assert_eq!(sniff_extension(b"<svg/>", "image/svg+xml"), ".svg");
        assert_eq!(sniff_extension(b"????", "image/jpeg"), ".jpg");
        assert_eq!(sniff_extension(b"????", ""), ".bin");
    }

    #[test]
    fn partial_success_on_malformed_payload() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("2025-08-10-netmap.md");
        let text = format!(
            "# Netmap\n\n![good](data:image/png;base64,{PNG})\n\n![bad](data:image/png;base64,@@@@)\n"
        );

        let rewrite = extract_images(&doc, &text).unwrap();

        assert_eq!(rewrite.saved.len(), 1);
        assert_eq!(rewrite.errors.len(), 1);
        assert_eq!(rewrite.errors[0].index, 2);
        assert_eq!(rewrite.errors[0].alt, "bad");
        assert_eq!(
            rewrite.text,
            "# Netmap\n\n![good](2025-08-10-netmap.assets/image_1.png)\n\n![bad](data:image/png;base64,@@@@)\n"
        );

        let saved = dir.path().join("2025-08-10-netmap.assets/image_1.png");
        assert_eq!(fs::read(saved).unwrap(), decode_payload(PNG).unwrap());
    }

    #[test]
    fn continues_numbering_after_existing_assets() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("note.md");
        fs::create_dir_all(dir.path().join("note.assets")).unwrap();
        fs::write(dir.path().join("note.assets/image_3.png"), b"old").unwrap();
        let text = format!("![a](data:image/gif;base64,{GIF} \"Caption\")");

        let rewrite = extract_images(&doc, &text).unwrap();

        assert_eq!(rewrite.text, "![a](note.assets/image_4.gif \"Caption\")");
        assert_eq!(fs::read(dir.path().join("note.assets/image_3.png")).unwrap(), b"old");
    }

    #[test]
    fn wraps_links_with_spaces() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("my note (draft).md");
        let text = format!("![shot](data:image/png;base64,{PNG} \"Title\")");

        let rewrite = extract_images(&doc, &text).unwrap();

        assert_eq!(rewrite.text, "![shot](<my note (draft).assets/image_1.png> \"Title\")");
        assert_eq!(rewrite.saved[0].link, "my note (draft).assets/image_1.png");
        assert_eq!(link_destination("note.assets/image_2.gif"), "note.assets/image_2.gif");
        assert_eq!(link_destination("a<b>.assets/x.png"), "<a\\<b\\>.assets/x.png>");
    }

    #[test]
    fn no_assets_dir_without_saved_images() {
        let dir = tempfile::tempdir().unwrap();
        let doc = dir.path().join("note.md");

        let rewrite = extract_images(&doc, "![bad](data:image/png;base64,!!)").unwrap();

        assert!(!rewrite.changed());
        assert_eq!(rewrite.errors.len(), 1);
        assert!(!dir.path().join("note.assets").exists());
    }
}
