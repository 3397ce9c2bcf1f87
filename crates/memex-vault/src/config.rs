//! `.memex.yml` settings.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// File name of the settings file at the knowledge base root.
pub const CONFIG_FILE: &str = ".memex.yml";

/// Settings for one knowledge base.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Config {
    /// Document root, relative to the knowledge base root
    #[serde(default = "default_docs_dir")]
    pub docs_dir: String,

    /// Folder used by `new` when none is given
    #[serde(default)]
    pub default_folder: Option<String>,

    /// Taxonomy document, relative to the knowledge base root
    #[serde(default = "default_taxonomy_path")]
    pub taxonomy_path: String,

    /// `UTC`, `Z`, or a fixed offset such as `+08:00`
    #[serde(default)]
    pub timezone: Option<String>,

    /// strftime format used for `last_update`
    #[serde(default = "default_timestamp_format")]
    pub timestamp_format: String,

    #[serde(default)]
    pub frontmatter_defaults: FrontmatterDefaults,

    #[serde(default)]
    pub titlecase: TitleCase,

    #[serde(default)]
    pub yfm: YfmSettings,

    /// `docs/<folder>/**` patterns mapped to inferred fields, in file order
    #[serde(default)]
    pub dir_rules: IndexMap<String, DirRule>,
}

/// Values copied into the front matter of every new document.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct FrontmatterDefaults {
    #[serde(default = "default_layout")]
    pub layout: String,

    #[serde(default = "default_img_path")]
    pub img_path: String,

    #[serde(default = "default_true")]
    pub math: bool,

    #[serde(default = "default_true")]
    pub toc: bool,

    #[serde(default = "default_true")]
    pub comments: bool,

    /// Cover image, blank by default
    #[serde(default)]
    pub image: String,

    /// Any other keys, copied verbatim
    #[serde(flatten)]
    pub extra: IndexMap<String, serde_yaml::Value>,
}

/// Title casing overrides applied when deriving a title from a slug.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct TitleCase {
    /// Lowercase word -> replacement (e.g. `cli` -> `CLI`)
    #[serde(default)]
    pub acronym_map: BTreeMap<String, String>,

    /// Words kept lowercase unless they open the title
    #[serde(default)]
    pub lil_words: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct YfmSettings {
    /// Preferred key order when a front matter block is rebuilt
    #[serde(default)]
    pub enforce_key_order: Vec<String>,

    /// Reject categories/tags unknown to the taxonomy instead of warning
    #[serde(default)]
    pub strict_taxonomy: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct DirRule {
    #[serde(default)]
    pub categories: Vec<String>,
}

fn default_docs_dir() -> String {
    "docs".to_string()
}
fn default_taxonomy_path() -> String {
    "docs/_data/taxonomy.yml".to_string()
}
fn default_timestamp_format() -> String {
    "%Y-%m-%d %H:%M:%S %z".to_string()
}
fn default_layout() -> String {
    "post".to_string()
}
fn default_img_path() -> String {
    "/assets/img/posts/".to_string()
}
fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            docs_dir: default_docs_dir(),
            default_folder: None,
            taxonomy_path: default_taxonomy_path(),
            timezone: None,
            timestamp_format: default_timestamp_format(),
            frontmatter_defaults: FrontmatterDefaults::default(),
            titlecase: TitleCase::default(),
            yfm: YfmSettings::default(),
            dir_rules: IndexMap::new(),
        }
    }
}

impl Default for FrontmatterDefaults {
    fn default() -> Self {
        Self {
            layout: default_layout(),
            img_path: default_img_path(),
            math: true,
            toc: true,
            comments: true,
            image: String::new(),
            extra: IndexMap::new(),
        }
    }
}

impl Config {
    /// Load `.memex.yml` from the knowledge base root.
    ///
    /// A missing file is an error: every command except `init` needs one.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILE);
        if !path.exists() {
            return Err(ConfigError::Missing(path));
        }

        let content = fs::read_to_string(&path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        let config = Self::parse(&content).map_err(|e| ConfigError::InvalidYaml {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;

        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Parse settings from YAML text. Blank text yields the defaults.
    pub fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
    }

    /// Absolute document root.
    pub fn docs_path(&self, root: &Path) -> PathBuf {
        root.join(&self.docs_dir)
    }

    /// Absolute taxonomy document path.
    pub fn taxonomy_file(&self, root: &Path) -> PathBuf {
        root.join(&self.taxonomy_path)
    }

    /// Categories inferred from `dir_rules` for a folder under the document root.
    ///
    /// A rule applies when its pattern starts with `<docs_dir>/<folder>/`.
    /// Order follows the rules, duplicates dropped.
    pub fn categories_for_folder(&self, folder: &str) -> Vec<String> {
        let prefix = format!("{}/{}/", self.docs_dir.trim_end_matches('/'), folder);
        let mut inferred: Vec<String> = Vec::new();

        for (pattern, rule) in &self.dir_rules {
            if !pattern.starts_with(&prefix) {
                continue;
            }
            for category in &rule.categories {
                if !inferred.contains(category) {
                    inferred.push(category.clone());
                }
            }
        }

        inferred
    }
}

/// Errors that can occur when loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {} (run `memex init` first)", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read {path}: {message}")]
    Read { path: String, message: String },

    #[error("Invalid YAML in {path}: {message}")]
    InvalidYaml { path: String, message: String },
}

/// Settings written by `memex init`.
pub const DEFAULT_CONFIG: &str = r#"# memex configuration
docs_dir: "docs"
taxonomy_path: "docs/_data/taxonomy.yml"
timezone: "UTC"
timestamp_format: "%Y-%m-%d %H:%M:%S %z"
frontmatter_defaults:
  layout: "post"
  img_path: "/assets/img/posts/"
  math: true
  toc: true
  comments: true
  image: ""
titlecase:
  acronym_map:
    nmap: "Nmap"
    cli: "CLI"
    lan: "LAN"
    llm: "LLM"
    iot: "IoT"
    wifi: "Wi-Fi"
  lil_words: ["a", "an", "and", "in", "of", "on", "the", "to"]
yfm:
  strict_taxonomy: false
  enforce_key_order:
    - layout
    - title
    - description
    - date
    - last_update
    - categories
    - tags
    - img_path
    - math
    - toc
    - comments
    - image
dir_rules:
  "docs/aws/**":
    categories: ["🤖 tech", "✈️ aws"]
  "docs/cheatsheets/**":
    categories: ["🤖 tech", "📖 cheatsheet"]
  "docs/drafts/**":
    categories: ["📝 drafts"]
  "docs/git/**":
    categories: ["🤖 tech", "🧙 git"]
  "docs/homenet/**":
    categories: ["🤖 tech", "🏠 homenet"]
  "docs/linux/**":
    categories: ["🤖 tech", "🐧 linux"]
  "docs/opsec/**":
    categories: ["🤖 tech", "💳 opsec"]
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config_parses() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();

        assert_eq!(config.docs_dir, "docs");
        assert_eq!(config.timezone.as_deref(), Some("UTC"));
        assert_eq!(config.frontmatter_defaults.layout, "post");
        assert_eq!(config.titlecase.acronym_map["cli"], "CLI");
        assert_eq!(config.yfm.enforce_key_order[1], "title");
        assert!(!config.yfm.strict_taxonomy);
    }

    #[test]
    fn blank_config_uses_defaults() {
        assert_eq!(Config::parse("  \n").unwrap(), Config::default());
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config = Config::parse("default_folder: notes\nfrontmatter_defaults:\n  math: false\n  author: me\n").unwrap();

        assert_eq!(config.default_folder.as_deref(), Some("notes"));
        assert_eq!(config.taxonomy_path, "docs/_data/taxonomy.yml");
        assert!(!config.frontmatter_defaults.math);
        assert!(config.frontmatter_defaults.toc);
        assert_eq!(
            config.frontmatter_defaults.extra.get("author"),
            Some(&serde_yaml::Value::String("me".to_string()))
        );
    }

    #[test]
    fn infers_categories_for_folder() {
        let config = Config::parse(DEFAULT_CONFIG).unwrap();

        assert_eq!(
            config.categories_for_folder("git"),
            vec!["🤖 tech".to_string(), "🧙 git".to_string()]
        );
        assert!(config.categories_for_folder("gi").is_empty());
        assert!(config.categories_for_folder("unknown").is_empty());
    }

    #[test]
    fn overlapping_rules_apply_in_file_order() {
        let config = Config::parse(
            "dir_rules:\n  \"docs/net/**\":\n    categories: [zeta, alpha]\n  \"docs/net/lan/**\":\n    categories: [mid, zeta]\nfrontmatter_defaults:\n  zz: 1\n  aa: 2\n",
        )
        .unwrap();

        assert_eq!(config.categories_for_folder("net"), ["zeta", "alpha", "mid"]);
        assert_eq!(config.frontmatter_defaults.extra.keys().collect::<Vec<_>>(), ["zz", "aa"]);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();

        let result = Config::load(dir.path());

        assert!(matches!(result, Err(ConfigError::Missing(_))));
    }

    #[test]
    fn load_reports_invalid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE), "docs_dir: [unclosed\n").unwrap();

        let result = Config::load(dir.path());

        assert!(matches!(result, Err(ConfigError::InvalidYaml { .. })));
    }
}
