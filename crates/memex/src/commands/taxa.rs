//! Manage the category and tag taxonomy.

use std::io::{self, Write};

use anyhow::{bail, Result};
use memex_vault::{TaxonomyKind, TaxonomyStore};

use crate::workspace::Workspace;

/// Print every label of `kind`, one per line.
pub fn list(ws: &Workspace, kind: TaxonomyKind) -> Result<()> {
    let taxonomy = ws.taxonomy()?;
    let stdout = io::stdout();
    write_list(&taxonomy, kind, &mut stdout.lock())
}

fn write_list<W: Write>(taxonomy: &TaxonomyStore, kind: TaxonomyKind, out: &mut W) -> Result<()> {
    let labels = taxonomy.list(kind);
    if labels.is_empty() {
        tracing::info!("No {} defined in {}", kind, taxonomy.path().display());
        return Ok(());
    }
    for label in labels {
        writeln!(out, "{}", label)?;
    }
    Ok(())
}

pub fn add(ws: &Workspace, kind: TaxonomyKind, values: &[String]) -> Result<()> {
    if values.iter().all(|v| v.trim().is_empty()) {
        bail!("Nothing to add: give at least one {} entry", kind);
    }

    let mut taxonomy = ws.taxonomy()?;
    let change = taxonomy.add(kind, values)?;

    for label in &change.changed {
        tracing::info!("Added {}: {}", kind, label);
    }
    for label in &change.skipped {
        tracing::info!("Already present: {}", label);
    }
    Ok(())
}

pub fn remove(ws: &Workspace, kind: TaxonomyKind, values: &[String]) -> Result<()> {
    if values.iter().all(|v| v.trim().is_empty()) {
        bail!("Nothing to remove: give at least one {} entry", kind);
    }

    let mut taxonomy = ws.taxonomy()?;
    let change = taxonomy.remove(kind, values)?;

    for label in &change.changed {
        tracing::info!("Removed {}: {}", kind, label);
    }
    for label in &change.skipped {
        tracing::info!("Not found: {}", label);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use memex_vault::Config;
    use pretty_assertions::assert_eq;
    use std::fs;

    fn workspace() -> (tempfile::TempDir, Workspace) {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("docs/_data")).unwrap();
        fs::write(
            dir.path().join("docs/_data/taxonomy.yml"),
            "categories:\n  tech: tech\ntags:\n  cli: cli\n",
        )
        .unwrap();
        let ws = Workspace {
            root: dir.path().to_path_buf(),
            config: Config::parse("").unwrap(),
        };
        (dir, ws)
    }

    fn labels(ws: &Workspace, kind: TaxonomyKind) -> Vec<String> {
        ws.taxonomy().unwrap().list(kind).to_vec()
    }

    #[test]
    fn add_is_case_insensitive_set_union() {
        let (_dir, ws) = workspace();

        add(&ws, TaxonomyKind::Categories, &["proj".to_string()]).unwrap();
        add(&ws, TaxonomyKind::Categories, &["proj".to_string(), "PROJ".to_string()]).unwrap();

        assert_eq!(labels(&ws, TaxonomyKind::Categories), vec!["tech", "proj"]);
    }

    #[test]
    fn remove_missing_entry_is_noop() {
        let (_dir, ws) = workspace();

        remove(&ws, TaxonomyKind::Tags, &["nonexistent".to_string()]).unwrap();
        remove(&ws, TaxonomyKind::Tags, &["CLI".to_string()]).unwrap();

        assert!(labels(&ws, TaxonomyKind::Tags).is_empty());
        assert_eq!(labels(&ws, TaxonomyKind::Categories), vec!["tech"]);
    }

    #[test]
    fn empty_values_are_rejected() {
        let (_dir, ws) = workspace();

        assert!(add(&ws, TaxonomyKind::Tags, &[]).is_err());
        assert!(remove(&ws, TaxonomyKind::Tags, &[" ".to_string()]).is_err());
    }

    #[test]
    fn lists_one_label_per_line() {
        let (_dir, ws) = workspace();
        let mut out = Vec::new();

        write_list(&ws.taxonomy().unwrap(), TaxonomyKind::Categories, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "tech\n");
    }
}
