//! Normalize Unicode punctuation in Markdown files.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use memex_text::{clean, needs_cleaning};
use memex_vault::write_atomic;

use super::finish;
use crate::files;

/// What to do with the cleaned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Print,
    Write,
    Check,
}

/// Run the clean command.
pub fn run(paths: &[PathBuf], write: bool, check: bool) -> Result<()> {
    let mode = match (write, check) {
        (_, true) => Mode::Check,
        (true, false) => Mode::Write,
        (false, false) => Mode::Print,
    };
    let files = files::collect(paths)?;
    let stdout = io::stdout();
    clean_files(&files, mode, &mut stdout.lock())
}

pub fn clean_files<W: Write>(files: &[PathBuf], mode: Mode, out: &mut W) -> Result<()> {
    let mut failed = 0;
    let mut dirty = Vec::new();

    for path in files {
        match clean_file(path, mode, out) {
            Ok(true) => dirty.push(path),
            Ok(false) => {}
            Err(e) => {
                tracing::error!("{}: {:#}", path.display(), e);
                failed += 1;
            }
        }
    }

    finish(failed, files.len(), "files")?;

    match mode {
        Mode::Check if !dirty.is_empty() => {
            for path in &dirty {
                tracing::warn!("Would clean {}", path.display());
            }
            bail!("{} of {} files need cleaning", dirty.len(), files.len());
        }
        Mode::Write => tracing::info!("Cleaned {} of {} files", dirty.len(), files.len()),
        _ => {}
    }
    Ok(())
}

/// Clean one file. Returns whether its text changes.
fn clean_file<W: Write>(path: &Path, mode: Mode, out: &mut W) -> Result<bool> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;

    match mode {
        Mode::Check => Ok(needs_cleaning(&text)),
        Mode::Print => {
            out.write_all(clean(&text).as_bytes())?;
            Ok(needs_cleaning(&text))
        }
        Mode::Write => {
            if !needs_cleaning(&text) {
                tracing::debug!("{}: already clean", path.display());
                return Ok(false);
            }
            write_atomic(path, &clean(&text))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            tracing::debug!("Cleaned {}", path.display());
            Ok(true)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn setup() -> (tempfile::TempDir, PathBuf, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let dirty = dir.path().join("dirty.md");
        let tidy = dir.path().join("tidy.md");
        fs::write(&dirty, "\u{201C}Hi\u{201D} \u{2014} ok\u{2026}\n").unwrap();
        fs::write(&tidy, "plain\n").unwrap();
        (dir, dirty, tidy)
    }

    #[test]
    fn prints_without_touching_files() {
        let (_dir, dirty, tidy) = setup();
        let mut out = Vec::new();

        clean_files(&[dirty.clone(), tidy], Mode::Print, &mut out).unwrap();

        assert_eq!(String::from_utf8(out).unwrap(), "\"Hi\" - ok...\nplain\n");
        assert_eq!(
            fs::read_to_string(dirty).unwrap(),
            "\u{201C}Hi\u{201D} \u{2014} ok\u{2026}\n"
        );
    }

    #[test]
    fn writes_in_place_without_printing() {
        let (_dir, dirty, tidy) = setup();
        let mut out = Vec::new();

        clean_files(&[dirty.clone(), tidy.clone()], Mode::Write, &mut out).unwrap();

        assert!(out.is_empty());
        assert_eq!(fs::read_to_string(dirty).unwrap(), "\"Hi\" - ok...\n");
        assert_eq!(fs::read_to_string(tidy).unwrap(), "plain\n");
    }

    #[test]
    fn check_fails_when_files_would_change() {
        let (_dir, dirty, tidy) = setup();

        let err = clean_files(&[dirty.clone(), tidy.clone()], Mode::Check, &mut Vec::new()).unwrap_err();

        assert_eq!(err.to_string(), "1 of 2 files need cleaning");
        assert!(clean_files(&[tidy], Mode::Check, &mut Vec::new()).is_ok());
        assert!(fs::read_to_string(dirty).unwrap().contains('\u{2014}'));
    }

    #[test]
    fn unreadable_file_fails_batch_but_others_are_cleaned() {
        let (dir, dirty, _tidy) = setup();
        let binary = dir.path().join("binary.md");
        fs::write(&binary, [0xff, 0xfe, 0x00]).unwrap();

        let err = clean_files(&[binary, dirty.clone()], Mode::Write, &mut Vec::new()).unwrap_err();

        assert_eq!(err.to_string(), "1 of 2 files failed");
        assert_eq!(fs::read_to_string(dirty).unwrap(), "\"Hi\" - ok...\n");
    }
}
