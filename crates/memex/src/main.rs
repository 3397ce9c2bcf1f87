//! memex CLI - personal knowledge base helper for Markdown notes.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use memex_vault::TaxonomyKind;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;
mod files;
mod prompt;
mod workspace;

use workspace::Workspace;

#[derive(Parser)]
#[command(name = "memex")]
#[command(about = "Scaffold, clean and tag Markdown notes with YAML front matter")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Knowledge base root (defaults to $MEMEX_ROOT, then the nearest
    /// directory containing .memex.yml)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default .memex.yml and taxonomy
    Init {
        /// Overwrite existing files
        #[arg(long)]
        force: bool,
    },

    /// Create docs/<folder>/YYYY-MM-DD-<slug>.md with front matter
    New {
        /// File slug, e.g. git-privacy
        slug: String,

        /// Prompt for folder, categories and tags
        #[arg(long)]
        interactive: bool,

        /// Target folder under the docs directory
        #[arg(long)]
        folder: Option<String>,

        /// Categories as a JSON array, overrides rules and prompts
        #[arg(long)]
        cats: Option<String>,

        /// Tags as a JSON array, overrides prompts
        #[arg(long)]
        tags: Option<String>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,

        /// With --force, skip the backup copy
        #[arg(long)]
        no_backup: bool,
    },

    /// Normalize Unicode punctuation in files
    Clean {
        /// Files or directories of Markdown files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Overwrite files in place instead of printing
        #[arg(short, long)]
        write: bool,

        /// Only report files that would change
        #[arg(long, conflicts_with = "write")]
        check: bool,
    },

    /// Decode inline base64 images into files and relink them
    #[command(name = "base2img")]
    Base2Img {
        /// Markdown files or directories
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Manage categories and tags
    Taxa {
        #[command(subcommand)]
        action: TaxaAction,
    },

    /// YAML front matter helpers
    Yfm {
        #[command(subcommand)]
        action: YfmAction,
    },
}

#[derive(Subcommand)]
enum TaxaAction {
    /// Show all categories or tags
    List {
        /// `cats` or `tags`
        kind: TaxonomyKind,
    },

    /// Add categories or tags
    Add {
        /// `cats` or `tags`
        kind: TaxonomyKind,

        #[arg(required = true)]
        values: Vec<String>,
    },

    /// Remove categories or tags
    Rm {
        /// `cats` or `tags`
        kind: TaxonomyKind,

        #[arg(required = true)]
        values: Vec<String>,
    },
}

#[derive(Subcommand)]
enum YfmAction {
    /// Refresh a timestamp field, leaving everything else untouched
    Touch {
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Field to update
        #[arg(long, default_value = "last_update")]
        field: String,
    },

    /// Set or remove front matter fields
    Edit {
        path: PathBuf,

        /// KEY=VALUE, value read as YAML
        #[arg(long = "set", value_name = "KEY=VALUE")]
        sets: Vec<String>,

        /// Remove a key
        #[arg(long = "unset", value_name = "KEY")]
        unsets: Vec<String>,

        /// Categories as a JSON array
        #[arg(long)]
        cats: Option<String>,

        /// Tags as a JSON array
        #[arg(long)]
        tags: Option<String>,

        /// Prompt for categories and tags
        #[arg(long)]
        interactive: bool,
    },

    /// Show front matter, taxonomy problems and the heading outline
    Inspect {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = Workspace::discover(cli.root);

    // Execute command
    match cli.command {
        Commands::Init { force } => {
            commands::init::run(&root, force)?;
        }
        Commands::New {
            slug,
            interactive,
            folder,
            cats,
            tags,
            force,
            no_backup,
        } => {
            let ws = Workspace::open(root)?;
            let args = commands::new::NewArgs {
                slug,
                interactive,
                folder,
                cats,
                tags,
                force,
                no_backup,
            };
            commands::new::run(&ws, args)?;
        }
        Commands::Clean {
            files,
            write,
            check,
        } => {
            commands::clean::run(&files, write, check)?;
        }
        Commands::Base2Img { files } => {
            commands::base2img::run(&files)?;
        }
        Commands::Taxa { action } => {
            let ws = Workspace::open(root)?;
            match action {
                TaxaAction::List { kind } => commands::taxa::list(&ws, kind)?,
                TaxaAction::Add { kind, values } => commands::taxa::add(&ws, kind, &values)?,
                TaxaAction::Rm { kind, values } => commands::taxa::remove(&ws, kind, &values)?,
            }
        }
        Commands::Yfm { action } => {
            let ws = Workspace::open(root)?;
            match action {
                YfmAction::Touch { paths, field } => commands::yfm::touch(&ws, &paths, &field)?,
                YfmAction::Edit {
                    path,
                    sets,
                    unsets,
                    cats,
                    tags,
                    interactive,
                } => {
                    let args = commands::yfm::EditArgs {
                        sets,
                        unsets,
                        cats,
                        tags,
                        interactive,
                    };
                    commands::yfm::edit(&ws, &path, args)?;
                }
                YfmAction::Inspect { paths } => commands::yfm::inspect(&ws, &paths)?,
            }
        }
    }

    Ok(())
}
