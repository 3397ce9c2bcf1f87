//! Expanding command-line paths into document lists.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use walkdir::WalkDir;

fn is_markdown(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("md" | "markdown")
    )
}

/// Files named directly are kept as given; directories expand to the
/// Markdown files beneath them, sorted. Every path must exist, checked
/// before anything is returned.
pub fn collect(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let missing: Vec<String> = paths
        .iter()
        .filter(|p| !p.exists())
        .map(|p| p.display().to_string())
        .collect();
    if !missing.is_empty() {
        bail!("No such file or directory: {}", missing.join(", "));
    }

    let mut files = Vec::new();
    for path in paths {
        if !path.is_dir() {
            files.push(path.clone());
            continue;
        }

        let mut found: Vec<PathBuf> = WalkDir::new(path)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && is_markdown(e.path()))
            .map(|e| e.into_path())
            .collect();
        found.sort();
        tracing::debug!("{}: {} Markdown files", path.display(), found.len());
        files.extend(found);
    }

    files.dedup();
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn expands_directories_to_markdown() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("git/sub")).unwrap();
        fs::write(dir.path().join("git/b.md"), "").unwrap();
        fs::write(dir.path().join("git/sub/a.markdown"), "").unwrap();
        fs::write(dir.path().join("git/image.png"), "").unwrap();
        let plain = dir.path().join("notes.txt");
        fs::write(&plain, "").unwrap();

        let files = collect(&[dir.path().join("git"), plain.clone()]).unwrap();

        assert_eq!(
            files,
            vec![
                dir.path().join("git/b.md"),
                dir.path().join("git/sub/a.markdown"),
                plain
            ]
        );
    }

    #[test]
    fn rejects_missing_paths_up_front() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("a.md");
        fs::write(&existing, "").unwrap();

        let err = collect(&[existing, dir.path().join("missing.md")]).unwrap_err();

        assert!(err.to_string().contains("missing.md"));
    }
}
