//! Known categories and tags.
//!
//! The taxonomy document is a YAML file with a `categories` and a `tags`
//! section, each a mapping of `label: label` so static site generators can
//! read it as a data file. Labels are unique per section, compared without
//! regard to case.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_yaml::{Mapping, Value};

use crate::write_atomic;

/// One of the two label sets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaxonomyKind {
    Categories,
    Tags,
}

impl TaxonomyKind {
    /// Section name in the taxonomy document and in front matter.
    pub fn key(&self) -> &'static str {
        match self {
            TaxonomyKind::Categories => "categories",
            TaxonomyKind::Tags => "tags",
        }
    }
}

impl fmt::Display for TaxonomyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for TaxonomyKind {
    type Err = TaxonomyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cats" | "categories" => Ok(TaxonomyKind::Categories),
            "tags" => Ok(TaxonomyKind::Tags),
            other => Err(TaxonomyError::UnknownKind(other.to_string())),
        }
    }
}

/// Outcome of a mutating call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Change {
    /// Labels added or removed
    pub changed: Vec<String>,

    /// Labels already present (add) or not found (remove)
    pub skipped: Vec<String>,
}

/// Persisted set of categories and tags.
///
/// The parsed document is kept whole, so entry values and any other
/// top-level sections survive a rewrite.
#[derive(Debug, Clone)]
pub struct TaxonomyStore {
    path: PathBuf,
    doc: Mapping,
    categories: Vec<String>,
    tags: Vec<String>,
}

impl TaxonomyStore {
    /// Create an empty store backed by `path`. Nothing is written.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        let mut doc = Mapping::new();
        for kind in [TaxonomyKind::Categories, TaxonomyKind::Tags] {
            doc.insert(section_key(kind), Value::Mapping(Mapping::new()));
        }
        Self {
            path: path.into(),
            doc,
            categories: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Load the store from disk. A missing file yields an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, TaxonomyError> {
        let path = path.into();
        if !path.exists() {
            tracing::debug!("No taxonomy at {}, starting empty", path.display());
            return Ok(Self::empty(path));
        }

        let content = fs::read_to_string(&path).map_err(|e| TaxonomyError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let mut store = Self::parse(&content).map_err(|message| TaxonomyError::Invalid {
            path: path.display().to_string(),
            message,
        })?;
        store.path = path;
        Ok(store)
    }

    /// Parse taxonomy YAML text into a store with no backing path.
    ///
    /// Each section may be a mapping (keys are the labels) or a list.
    pub fn parse(content: &str) -> Result<Self, String> {
        if content.trim().is_empty() {
            return Ok(Self::empty(PathBuf::new()));
        }

        let doc: Value = serde_yaml::from_str(content).map_err(|e| e.to_string())?;
        let doc = match doc {
            Value::Mapping(map) => map,
            Value::Null => Mapping::new(),
            _ => return Err("taxonomy document must be a mapping".to_string()),
        };

        let mut store = Self {
            path: PathBuf::new(),
            doc,
            categories: Vec::new(),
            tags: Vec::new(),
        };
        for kind in [TaxonomyKind::Categories, TaxonomyKind::Tags] {
            let labels = match store.doc.get(kind.key()) {
                None | Some(Value::Null) => Vec::new(),
                Some(Value::Mapping(section)) => section.keys().filter_map(label_of).collect(),
                Some(Value::Sequence(section)) => section.iter().filter_map(label_of).collect(),
                Some(_) => return Err(format!("`{}` must be a mapping or a list", kind)),
            };
            for label in labels {
                let set = store.set_mut(kind);
                if !contains_label(set, &label) {
                    set.push(label);
                }
            }
        }

        Ok(store)
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All labels of a kind, in stored order.
    pub fn list(&self, kind: TaxonomyKind) -> &[String] {
        match kind {
            TaxonomyKind::Categories => &self.categories,
            TaxonomyKind::Tags => &self.tags,
        }
    }

    /// Case-insensitive membership test.
    pub fn contains(&self, kind: TaxonomyKind, label: &str) -> bool {
        contains_label(self.list(kind), label.trim())
    }

    /// Add labels and persist. Labels already present are skipped.
    ///
    /// The file is only rewritten when a label was added.
    pub fn add<S: AsRef<str>>(
        &mut self,
        kind: TaxonomyKind,
        entries: &[S],
    ) -> Result<Change, TaxonomyError> {
        let mut change = Change::default();

        for entry in entries {
            let label = entry.as_ref().trim();
            if label.is_empty() {
                continue;
            }
            if self.contains(kind, label) {
                change.skipped.push(label.to_string());
                continue;
            }

            let entry = Value::String(label.to_string());
            match self.section_mut(kind) {
                Value::Sequence(items) => items.push(entry),
                Value::Mapping(section) => {
                    section.insert(entry.clone(), entry);
                }
                other => {
                    let mut section = Mapping::new();
                    section.insert(entry.clone(), entry);
                    *other = Value::Mapping(section);
                }
            }
            self.set_mut(kind).push(label.to_string());
            change.changed.push(label.to_string());
        }

        if !change.changed.is_empty() {
            self.save()?;
        }
        tracing::debug!(
            "Added {} / skipped {} in {}",
            change.changed.len(),
            change.skipped.len(),
            kind
        );
        Ok(change)
    }

    /// Remove labels and persist. Labels not present are skipped.
    ///
    /// The file is only rewritten when a label was removed.
    pub fn remove<S: AsRef<str>>(
        &mut self,
        kind: TaxonomyKind,
        entries: &[S],
    ) -> Result<Change, TaxonomyError> {
        let mut change = Change::default();

        for entry in entries {
            let label = entry.as_ref().trim();
            let set = self.set_mut(kind);
            let Some(index) = set.iter().position(|l| same_label(l, label)) else {
                change.skipped.push(label.to_string());
                continue;
            };
            let removed = set.remove(index);

            let matches = |v: &Value| label_of(v).is_some_and(|l| same_label(&l, &removed));
            match self.section_mut(kind) {
                Value::Sequence(items) => items.retain(|v| !matches(v)),
                Value::Mapping(section) => section.retain(|k, _| !matches(k)),
                _ => {}
            }
            change.changed.push(removed);
        }

        if !change.changed.is_empty() {
            self.save()?;
        }
        Ok(change)
    }

    /// Write the whole document back to its file.
    pub fn save(&self) -> Result<(), TaxonomyError> {
        write_atomic(&self.path, &self.to_yaml()).map_err(|e| TaxonomyError::Io {
            path: self.path.display().to_string(),
            message: e.to_string(),
        })?;
        tracing::debug!("Saved taxonomy to {}", self.path.display());
        Ok(())
    }

    /// Render the store as a taxonomy document.
    pub fn to_yaml(&self) -> String {
        // Parsed YAML always serializes back.
        serde_yaml::to_string(&self.doc).unwrap_or_default()
    }

    fn section_mut(&mut self, kind: TaxonomyKind) -> &mut Value {
        self.doc.entry(section_key(kind)).or_insert(Value::Null)
    }

    fn set_mut(&mut self, kind: TaxonomyKind) -> &mut Vec<String> {
        match kind {
            TaxonomyKind::Categories => &mut self.categories,
            TaxonomyKind::Tags => &mut self.tags,
        }
    }
}

fn section_key(kind: TaxonomyKind) -> Value {
    Value::String(kind.key().to_string())
}

fn label_of(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn same_label(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn contains_label(set: &[String], label: &str) -> bool {
    set.iter().any(|l| same_label(l, label))
}

/// Errors that can occur when working with the taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum TaxonomyError {
    #[error("Unknown taxonomy kind `{0}` (expected `cats` or `tags`)")]
    UnknownKind(String),

    #[error("Failed to access {path}: {message}")]
    Io { path: String, message: String },

    #[error("Invalid taxonomy in {path}: {message}")]
    Invalid { path: String, message: String },
}

/// Taxonomy written by `memex init`.
pub const DEFAULT_TAXONOMY: &str = r#"categories:
  "🤖 tech": "🤖 tech"
  "✈️ aws": "✈️ aws"
  "📖 cheatsheet": "📖 cheatsheet"
  "📝 drafts": "📝 drafts"
  "🧙 git": "🧙 git"
  "🏠 homenet": "🏠 homenet"
  "🐧 linux": "🐧 linux"
  "💳 opsec": "💳 opsec"

tags:
  "🐧 Linux": "🐧 Linux"
  "🖥️ CLI": "🖥️ CLI"
  "🛜 IoT": "🛜 IoT"
  "🔀 LAN": "🔀 LAN"
  "🧙🏻 Git": "🧙🏻 Git"
  "🔒 Privacy": "🔒 Privacy"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn store_in(dir: &tempfile::TempDir) -> TaxonomyStore {
        TaxonomyStore::open(dir.path().join("_data/taxonomy.yml")).unwrap()
    }

    #[test]
    fn parses_kind_names() {
        assert_eq!("cats".parse::<TaxonomyKind>().unwrap(), TaxonomyKind::Categories);
        assert_eq!("categories".parse::<TaxonomyKind>().unwrap(), TaxonomyKind::Categories);
        assert_eq!("tags".parse::<TaxonomyKind>().unwrap(), TaxonomyKind::Tags);
        assert!(matches!(
            "labels".parse::<TaxonomyKind>(),
            Err(TaxonomyError::UnknownKind(_))
        ));
    }

    #[test]
    fn default_taxonomy_parses() {
        let store = TaxonomyStore::parse(DEFAULT_TAXONOMY).unwrap();

        assert_eq!(store.list(TaxonomyKind::Categories).len(), 8);
        assert!(store.contains(TaxonomyKind::Tags, "🖥️ cli"));
        assert!(!store.contains(TaxonomyKind::Categories, "🖥️ CLI"));
    }

    #[test]
    fn accepts_list_sections() {
        let store = TaxonomyStore::parse("categories:\n  - proj\n  - life\ntags:\n").unwrap();

        assert_eq!(store.list(TaxonomyKind::Categories), ["proj", "life"]);
        assert!(store.list(TaxonomyKind::Tags).is_empty());
    }

    #[test]
    fn rejects_non_mapping_document() {
        assert!(TaxonomyStore::parse("- a\n- b\n").is_err());
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();

        let store = store_in(&dir);

        assert!(store.list(TaxonomyKind::Categories).is_empty());
        assert!(!store.path().exists());
    }

    #[test]
    fn add_twice_keeps_one_entry() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let first = store.add(TaxonomyKind::Categories, &["proj"]).unwrap();
        let second = store.add(TaxonomyKind::Categories, &["proj", "PROJ"]).unwrap();

        assert_eq!(first.changed, vec!["proj"]);
        assert_eq!(second.skipped, vec!["proj", "PROJ"]);

        let reloaded = store_in(&dir);
        assert_eq!(reloaded.list(TaxonomyKind::Categories), ["proj"]);
    }

    #[test]
    fn remove_missing_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add(TaxonomyKind::Tags, &["idea", "hack"]).unwrap();

        let change = store.remove(TaxonomyKind::Tags, &["nonexistent"]).unwrap();

        assert!(change.changed.is_empty());
        assert_eq!(change.skipped, vec!["nonexistent"]);
        assert_eq!(store_in(&dir).list(TaxonomyKind::Tags), ["idea", "hack"]);
    }

    #[test]
    fn remove_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add(TaxonomyKind::Tags, &["Idea"]).unwrap();

        let change = store.remove(TaxonomyKind::Tags, &["idea"]).unwrap();

        assert_eq!(change.changed, vec!["Idea"]);
        assert!(store_in(&dir).list(TaxonomyKind::Tags).is_empty());
    }

    #[test]
    fn persisted_document_keeps_both_sections() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        store.add(TaxonomyKind::Categories, &["life"]).unwrap();

        let saved = fs::read_to_string(store.path()).unwrap();

        assert!(saved.contains("categories:"));
        assert!(saved.contains("life: life"));
        assert!(saved.contains("tags: {}"));
    }

    const CUSTOM: &str = "categories:\n  tech: \"🤖 Tech\"\ntags:\n  cli: cli\nauthors:\n  me: Me\n";

    fn custom_store(dir: &tempfile::TempDir) -> TaxonomyStore {
        let path = dir.path().join("taxonomy.yml");
        fs::write(&path, CUSTOM).unwrap();
        TaxonomyStore::open(path).unwrap()
    }

    #[test]
    fn noop_changes_leave_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = custom_store(&dir);

        store.remove(TaxonomyKind::Tags, &["nonexistent"]).unwrap();
        store.add(TaxonomyKind::Categories, &["TECH"]).unwrap();

        assert_eq!(fs::read_to_string(store.path()).unwrap(), CUSTOM);
    }

    #[test]
    fn edits_keep_values_and_other_sections() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = custom_store(&dir);

        store.add(TaxonomyKind::Categories, &["life"]).unwrap();
        store.remove(TaxonomyKind::Tags, &["CLI"]).unwrap();

        let saved: Value = serde_yaml::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        let expected: Value = serde_yaml::from_str(
            "categories:\n  tech: \"🤖 Tech\"\n  life: life\ntags: {}\nauthors:\n  me: Me\n",
        )
        .unwrap();
        assert_eq!(saved, expected);
        assert_eq!(store.list(TaxonomyKind::Categories), ["tech", "life"]);
    }

    #[test]
    fn list_sections_stay_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taxonomy.yml");
        fs::write(&path, "categories:\n  - proj\ntags:\n").unwrap();
        let mut store = TaxonomyStore::open(&path).unwrap();

        store.add(TaxonomyKind::Categories, &["life"]).unwrap();
        store.add(TaxonomyKind::Tags, &["idea"]).unwrap();

        let reloaded = TaxonomyStore::open(&path).unwrap();
        assert_eq!(reloaded.list(TaxonomyKind::Categories), ["proj", "life"]);
        assert_eq!(reloaded.list(TaxonomyKind::Tags), ["idea"]);
        assert!(fs::read_to_string(&path).unwrap().contains("- life"));
    }
}
