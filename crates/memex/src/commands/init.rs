//! Initialize a knowledge base.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use memex_vault::{Config, CONFIG_FILE, DEFAULT_CONFIG, DEFAULT_TAXONOMY};

/// Run the init command.
pub fn run(root: &Path, force: bool) -> Result<()> {
    tracing::info!("Initializing memex in {}", root.display());

    let config_path = root.join(CONFIG_FILE);
    write_default(&config_path, DEFAULT_CONFIG, force)?;

    // Paths come from the file just written, or the one kept
    let config = Config::load(root)?;

    let docs_dir = config.docs_path(root);
    fs::create_dir_all(&docs_dir)
        .with_context(|| format!("Failed to create {}", docs_dir.display()))?;

    let taxonomy_path = config.taxonomy_file(root);
    if let Some(parent) = taxonomy_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    write_default(&taxonomy_path, DEFAULT_TAXONOMY, force)?;

    tracing::info!("Initialization complete!");
    tracing::info!("Run 'memex new <slug> --interactive' to create a note.");

    Ok(())
}

fn write_default(path: &Path, contents: &str, force: bool) -> Result<()> {
    if path.exists() && !force {
        tracing::warn!("Skipped {}, already exists. Use --force to overwrite.", path.display());
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Wrote {}", path.display());
    Ok(())
}
