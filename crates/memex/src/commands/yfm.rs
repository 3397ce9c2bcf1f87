//! Front matter commands: touch, edit and inspect.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use memex_vault::{write_atomic, TaxonomyKind, TaxonomyStore};
use memex_yfm::frontmatter::{string_list, string_seq, to_yaml};
use memex_yfm::{outline, parse, serialize, validate, Clock, FrontMatterBuilder};
use serde_yaml::{Mapping, Value};

use super::{finish, parse_json_list};
use crate::files;
use crate::prompt;
use crate::workspace::Workspace;

/// Set `field` to the current timestamp in each file.
pub fn touch(ws: &Workspace, paths: &[PathBuf], field: &str) -> Result<()> {
    let files = files::collect(paths)?;
    let stamp = ws.clock().timestamp();

    let mut failed = 0;
    for path in &files {
        if let Err(e) = touch_file(path, field, &stamp) {
            tracing::error!("{}: {:#}", path.display(), e);
            failed += 1;
            continue;
        }
        tracing::info!("{}: {} = {}", ws.display(path), field, stamp);
    }

    finish(failed, files.len(), "files")
}

fn touch_file(path: &Path, field: &str, stamp: &str) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let touched = memex_yfm::touch(&text, field, stamp)?;
    write_atomic(path, &touched).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Options of `yfm edit`.
#[derive(Debug, Default)]
pub struct EditArgs {
    /// `KEY=VALUE` assignments
    pub sets: Vec<String>,
    pub unsets: Vec<String>,
    pub cats: Option<String>,
    pub tags: Option<String>,
    pub interactive: bool,
}

/// Edit one document's front matter in place.
pub fn edit(ws: &Workspace, path: &Path, args: EditArgs) -> Result<()> {
    let clock = ws.clock();
    let stdin = io::stdin();
    edit_with(ws, path, args, &clock, &mut stdin.lock(), &mut io::stdout())
}

pub fn edit_with<R: BufRead, W: Write>(
    ws: &Workspace,
    path: &Path,
    args: EditArgs,
    clock: &Clock,
    input: &mut R,
    output: &mut W,
) -> Result<()> {
    let text = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let (fm, body) = parse(&text).with_context(|| format!("Failed to parse {}", path.display()))?;
    let taxonomy = ws.taxonomy()?;

    let mut updates = Mapping::new();
    for assignment in &args.sets {
        let (key, value) = parse_assignment(assignment)?;
        updates.insert(Value::String(key), value);
    }

    let lists = [
        (TaxonomyKind::Categories, args.cats.as_deref(), "Select categories"),
        (TaxonomyKind::Tags, args.tags.as_deref(), "Select tags"),
    ];
    for (kind, raw, title) in lists {
        let picked = match parse_json_list(raw)? {
            Some(labels) => Some(labels),
            None if args.interactive => {
                let current = string_list(&fm, kind.key()).unwrap_or_default();
                Some(prompt::multi_select(input, output, title, taxonomy.list(kind), &current)?)
            }
            None => None,
        };
        if let Some(labels) = picked {
            updates.insert(Value::String(kind.key().to_string()), string_seq(&labels));
        }
    }

    let built = FrontMatterBuilder::new(&ws.config, &taxonomy, clock).edit(&fm, updates, &args.unsets)?;
    for warning in &built.warnings {
        tracing::warn!("Not in taxonomy: {}", warning);
    }

    write_atomic(path, &serialize(&built.front_matter, body))
        .with_context(|| format!("Failed to write {}", path.display()))?;
    tracing::info!("Updated {}", ws.display(path));
    Ok(())
}

/// Split `KEY=VALUE`. The value is read as a YAML scalar or flow list;
/// anything else (`Git: Privacy`, broken YAML) stays a plain string.
fn parse_assignment(assignment: &str) -> Result<(String, Value)> {
    let Some((key, raw)) = assignment.split_once('=') else {
        bail!("Expected KEY=VALUE, got: {}", assignment);
    };
    let key = key.trim();
    if key.is_empty() {
        bail!("Empty key in: {}", assignment);
    }

    let raw = raw.trim();
    let value = match serde_yaml::from_str::<Value>(raw) {
        _ if raw.is_empty() => Value::String(String::new()),
        Ok(Value::Mapping(_) | Value::Tagged(_)) | Err(_) => Value::String(raw.to_string()),
        Ok(value) => value,
    };
    Ok((key.to_string(), value))
}

/// Print front matter, taxonomy problems and the outline of each file.
pub fn inspect(ws: &Workspace, paths: &[PathBuf]) -> Result<()> {
    let files = files::collect(paths)?;
    let taxonomy = ws.taxonomy()?;
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let mut failed = 0;
    for path in &files {
        let result = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))
            .and_then(|text| render(&ws.display(path).to_string(), &text, &taxonomy, &mut out));
        if let Err(e) = result {
            tracing::error!("{}: {:#}", path.display(), e);
            failed += 1;
        }
    }

    finish(failed, files.len(), "files")
}

fn render<W: Write>(name: &str, text: &str, taxonomy: &TaxonomyStore, out: &mut W) -> Result<()> {
    let (fm, body) = parse(text)?;

    writeln!(out, "== {} ==", name)?;
    if fm.is_empty() {
        writeln!(out, "(no front matter)")?;
    } else {
        out.write_all(to_yaml(&fm).as_bytes())?;
    }

    match validate(&fm, taxonomy, false) {
        Ok(unknown) => {
            for entry in unknown {
                writeln!(out, "⚠ not in taxonomy: {}", entry)?;
            }
        }
        Err(e) => writeln!(out, "⚠ {}", e)?,
    }

    let headings = outline(body);
    if !headings.is_empty() {
        writeln!(out, "outline:")?;
        for heading in headings {
            let indent = "  ".repeat(usize::from(heading.level));
            writeln!(out, "{}{} (#{})", indent, heading.title, heading.id)?;
        }
    }
    writeln!(out)?;
    Ok(())
}
