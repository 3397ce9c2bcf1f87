//! Configuration and taxonomy storage for memex knowledge bases.
//!
//! A knowledge base root holds a `.memex.yml` settings file and a taxonomy
//! document listing the known categories and tags. Both are plain YAML,
//! read once per invocation and rewritten whole on mutation.

pub mod config;
pub mod taxonomy;

use std::fs;
use std::io;
use std::path::Path;

pub use config::{
    Config, ConfigError, DirRule, FrontmatterDefaults, TitleCase, YfmSettings, CONFIG_FILE,
    DEFAULT_CONFIG,
};
pub use taxonomy::{Change, TaxonomyError, TaxonomyKind, TaxonomyStore, DEFAULT_TAXONOMY};

/// Write `contents` to `path` through a sibling temp file and a rename.
///
/// Parent directories are created as needed.
pub fn write_atomic(path: &Path, contents: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    fs::write(&tmp_path, contents)?;
    fs::rename(&tmp_path, path).inspect_err(|_| {
        let _ = fs::remove_file(&tmp_path);
    })
}
