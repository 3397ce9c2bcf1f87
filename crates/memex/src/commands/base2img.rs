//! Decode inline base64 images into files next to each document.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memex_text::extract_images;
use memex_vault::write_atomic;

use super::finish;
use crate::files;

/// Run the base2img command.
pub fn run(paths: &[PathBuf]) -> Result<()> {
    let files = files::collect(paths)?;

    let mut failed = 0;
    for path in &files {
        match process(path) {
            Ok(true) => {}
            Ok(false) => failed += 1,
            Err(e) => {
                tracing::error!("{}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    finish(failed, files.len(), "files")
}

/// Extract one document's images. Returns `false` when some image could
/// not be decoded; the others are still saved.
fn process(path: &Path) -> Result<bool> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let rewrite = extract_images(path, &text)?;

    for error in &rewrite.errors {
        tracing::warn!("{}: {}", path.display(), error);
    }

    if rewrite.changed() {
        write_atomic(path, &rewrite.text).with_context(|| format!("Failed to write {}", path.display()))?;
        let bytes: usize = rewrite.saved.iter().map(|s| s.bytes).sum();
        tracing::info!(
            "{}: saved {} image(s), {} bytes",
            path.display(),
            rewrite.saved.len(),
            bytes
        );
    } else if rewrite.errors.is_empty() {
        tracing::debug!("{}: no embedded images", path.display());
    }

    Ok(rewrite.errors.is_empty())
}
