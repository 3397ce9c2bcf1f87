//! Scaffold a new Markdown document.

use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use memex_vault::{write_atomic, TaxonomyKind};
use memex_yfm::frontmatter::string_seq;
use memex_yfm::{sanitize_slug, serialize, title_from_slug, Clock, FrontMatterBuilder};
use serde_yaml::{Mapping, Value};

use super::parse_json_list;
use crate::prompt;
use crate::workspace::Workspace;

/// Folders under the docs directory that never hold notes.
const EXCLUDED_FOLDERS: [&str; 2] = ["_data", "assets"];

/// Options of the new command.
#[derive(Debug, Default)]
pub struct NewArgs {
    pub slug: String,
    pub interactive: bool,
    pub folder: Option<String>,
    pub cats: Option<String>,
    pub tags: Option<String>,
    pub force: bool,
    pub no_backup: bool,
}

/// Run the new command against the terminal.
pub fn run(ws: &Workspace, args: NewArgs) -> Result<()> {
    let clock = ws.clock();
    let stdin = io::stdin();
    create(ws, args, &clock, &mut stdin.lock(), &mut io::stdout())?;
    Ok(())
}

/// Create the document and return its path.
pub fn create<R: BufRead, W: Write>(
    ws: &Workspace,
    args: NewArgs,
    clock: &Clock,
    input: &mut R,
    output: &mut W,
) -> Result<PathBuf> {
    let docs_dir = ws.docs_dir();
    let taxonomy = ws.taxonomy()?;

    // 1. Folder
    let folders = list_folders(&docs_dir)?;
    let mut folder = args.folder.clone();
    if folder.is_none() && args.interactive {
        let preselect = ws
            .config
            .default_folder
            .as_deref()
            .or(folders.first().map(String::as_str));
        folder = prompt::single_select(input, output, "Select folder", &folders, preselect)?;
    }
    let Some(folder) = folder.or_else(|| ws.config.default_folder.clone()) else {
        bail!("Missing folder. Use --interactive or specify --folder NAME.");
    };
    if !folders.contains(&folder) {
        let existing = if folders.is_empty() {
            "(none)".to_string()
        } else {
            folders.join(", ")
        };
        bail!(
            "Folder '{}' not found under {}. Existing: {}",
            folder,
            ws.config.docs_dir,
            existing
        );
    }

    // 2. Path and title
    let slug = sanitize_slug(&args.slug);
    if slug.is_empty() {
        bail!("Slug is empty after removing the date prefix and extension: {}", args.slug);
    }
    let out_path = docs_dir
        .join(&folder)
        .join(format!("{}-{}.md", clock.today(), slug));
    let title = title_from_slug(
        &slug,
        &ws.config.titlecase.acronym_map,
        &ws.config.titlecase.lil_words,
    );

    // 3. Categories and tags
    let explicit_cats = parse_json_list(args.cats.as_deref())?;
    let explicit_tags = parse_json_list(args.tags.as_deref())?;
    let inferred = ws.config.categories_for_folder(&folder);

    let (picked_cats, picked_tags) = if args.interactive {
        let cats = match explicit_cats {
            Some(_) => Vec::new(),
            None => prompt::multi_select(
                input,
                output,
                "Select categories",
                taxonomy.list(TaxonomyKind::Categories),
                &inferred,
            )?,
        };
        let tags = match explicit_tags {
            Some(_) => Vec::new(),
            None => prompt::multi_select(
                input,
                output,
                "Select tags",
                taxonomy.list(TaxonomyKind::Tags),
                &[],
            )?,
        };
        (cats, tags)
    } else {
        (inferred, Vec::new())
    };
    let categories = explicit_cats.unwrap_or(picked_cats);
    let tags = explicit_tags.unwrap_or(picked_tags);

    let mut fields = Mapping::new();
    fields.insert(Value::String("categories".to_string()), string_seq(&categories));
    fields.insert(Value::String("tags".to_string()), string_seq(&tags));

    // 4. Front matter
    let built = FrontMatterBuilder::new(&ws.config, &taxonomy, clock).build(&title, &folder, fields)?;
    for warning in &built.warnings {
        tracing::warn!("Not in taxonomy: {}", warning);
    }

    // 5. Write, keeping a backup of anything overwritten
    if out_path.exists() {
        if !args.force {
            bail!(
                "File already exists: {}. Use --force to overwrite.",
                ws.display(&out_path)
            );
        }
        if !args.no_backup {
            let backup = backup_path(&out_path, &clock.backup_stamp());
            fs::copy(&out_path, &backup)
                .with_context(|| format!("Failed to back up {}", out_path.display()))?;
            tracing::warn!("Backup written: {}", ws.display(&backup));
        }
    }

    let content = serialize(&built.front_matter, "\n");
    write_atomic(&out_path, &content)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    tracing::info!("Created {}", ws.display(&out_path));
    tracing::info!("title: {}", title);
    tracing::info!("categories: {:?}", categories);
    tracing::info!("tags: {:?}", tags);

    Ok(out_path)
}

/// Sub-directories of the docs directory that can hold notes, sorted.
fn list_folders(docs_dir: &Path) -> Result<Vec<String>> {
    if !docs_dir.exists() {
        return Ok(Vec::new());
    }

    let mut folders = Vec::new();
    for entry in fs::read_dir(docs_dir)
        .with_context(|| format!("Failed to read {}", docs_dir.display()))?
    {
        let entry = entry?;
        if !entry.file_type()?.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !EXCLUDED_FOLDERS.contains(&name.as_str()) {
            folders.push(name);
        }
    }
    folders.sort();
    Ok(folders)
}

fn backup_path(path: &Path, stamp: &str) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".bak.{}", stamp));
    path.with_file_name(name)
}
