//! Knowledge base root discovery and per-invocation state.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use memex_vault::{Config, TaxonomyStore, CONFIG_FILE};
use memex_yfm::Clock;

/// Environment variable naming the knowledge base root.
pub const ROOT_ENV: &str = "MEMEX_ROOT";

/// A knowledge base root with its loaded settings.
#[derive(Debug)]
pub struct Workspace {
    pub root: PathBuf,
    pub config: Config,
}

impl Workspace {
    /// Pick the root: `--root`, then `$MEMEX_ROOT`, then the nearest
    /// ancestor of the working directory holding `.memex.yml`, then the
    /// working directory itself.
    pub fn discover(explicit: Option<PathBuf>) -> PathBuf {
        if let Some(root) = explicit {
            return root;
        }
        if let Some(root) = env::var_os(ROOT_ENV).filter(|v| !v.is_empty()) {
            return PathBuf::from(root);
        }

        let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
        find_config_root(&cwd).unwrap_or(cwd)
    }

    /// Load `.memex.yml` under `root`. Fails when it is missing or invalid.
    pub fn open(root: PathBuf) -> Result<Self> {
        let config = Config::load(&root)?;
        Ok(Self { root, config })
    }

    pub fn docs_dir(&self) -> PathBuf {
        self.config.docs_path(&self.root)
    }

    pub fn taxonomy(&self) -> Result<TaxonomyStore> {
        let path = self.config.taxonomy_file(&self.root);
        TaxonomyStore::open(&path)
            .with_context(|| format!("Failed to load taxonomy from {}", path.display()))
    }

    pub fn clock(&self) -> Clock {
        Clock::resolve(
            None,
            self.config.timezone.as_deref(),
            &self.config.timestamp_format,
        )
    }

    /// `path` relative to the root, for messages.
    pub fn display<'a>(&self, path: &'a Path) -> std::path::Display<'a> {
        path.strip_prefix(&self.root).unwrap_or(path).display()
    }
}

fn find_config_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE).is_file())
        .map(Path::to_path_buf)
}
