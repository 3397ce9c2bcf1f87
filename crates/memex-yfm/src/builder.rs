//! Front matter for new and edited documents.

use std::fmt;

use memex_vault::{Config, TaxonomyKind, TaxonomyStore};
use serde_yaml::{Mapping, Value};

use crate::clock::Clock;
use crate::frontmatter::{merge, order_keys, string_list, string_seq};

/// A category or tag missing from the taxonomy.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownEntry {
    pub kind: TaxonomyKind,
    pub label: String,
}

impl fmt::Display for UnknownEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.kind, self.label)
    }
}

/// Errors raised when front matter does not fit the taxonomy.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Not in taxonomy: {}", join(.0))]
    Unknown(Vec<UnknownEntry>),

    #[error("`{0}` must be a list of strings")]
    NotAList(TaxonomyKind),
}

fn join(entries: &[UnknownEntry]) -> String {
    entries
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Check `categories` and `tags` against the taxonomy.
///
/// Unknown entries are returned as warnings, or rejected when `strict`.
pub fn validate(
    fm: &Mapping,
    taxonomy: &TaxonomyStore,
    strict: bool,
) -> Result<Vec<UnknownEntry>, ValidationError> {
    let mut unknown = Vec::new();

    for kind in [TaxonomyKind::Categories, TaxonomyKind::Tags] {
        if !fm.contains_key(kind.key()) {
            continue;
        }
        let labels = string_list(fm, kind.key()).ok_or(ValidationError::NotAList(kind))?;
        unknown.extend(
            labels
                .into_iter()
                .filter(|label| !taxonomy.contains(kind, label))
                .map(|label| UnknownEntry { kind, label }),
        );
    }

    if strict && !unknown.is_empty() {
        return Err(ValidationError::Unknown(unknown));
    }
    Ok(unknown)
}

/// Front matter produced by [`FrontMatterBuilder::build`].
#[derive(Debug, Clone)]
pub struct Built {
    pub front_matter: Mapping,

    /// Entries unknown to a non-strict taxonomy
    pub warnings: Vec<UnknownEntry>,
}

/// Assembles front matter from settings, the taxonomy and the clock.
pub struct FrontMatterBuilder<'a> {
    config: &'a Config,
    taxonomy: &'a TaxonomyStore,
    clock: &'a Clock,
}

impl<'a> FrontMatterBuilder<'a> {
    pub fn new(config: &'a Config, taxonomy: &'a TaxonomyStore, clock: &'a Clock) -> Self {
        Self {
            config,
            taxonomy,
            clock,
        }
    }

    /// Front matter for a new document in `folder`.
    ///
    /// Categories default to those inferred from `dir_rules`; `fields`
    /// override any generated value. Keys follow `yfm.enforce_key_order`.
    pub fn build(&self, title: &str, folder: &str, fields: Mapping) -> Result<Built, ValidationError> {
        let defaults = &self.config.frontmatter_defaults;
        let categories = self.config.categories_for_folder(folder);

        let mut fm = Mapping::new();
        let mut put = |key: &str, value: Value| {
            fm.insert(Value::String(key.to_string()), value);
        };
        put("layout", Value::String(defaults.layout.clone()));
        put("title", Value::String(title.to_string()));
        put("description", Value::String(String::new()));
        put("date", Value::String(self.clock.today()));
        put("last_update", Value::String(self.clock.timestamp()));
        put("categories", string_seq(&categories));
        put("tags", string_seq::<&str>(&[]));
        put("img_path", Value::String(defaults.img_path.clone()));
        put("math", Value::Bool(defaults.math));
        put("toc", Value::Bool(defaults.toc));
        put("comments", Value::Bool(defaults.comments));
        put("image", Value::String(defaults.image.clone()));
        for (key, value) in &defaults.extra {
            put(key, value.clone());
        }

        merge(&mut fm, fields);
        let fm = order_keys(&fm, &self.config.yfm.enforce_key_order);
        let warnings = validate(&fm, self.taxonomy, self.config.yfm.strict_taxonomy)?;

        tracing::debug!("Built front matter with {} keys", fm.len());
        Ok(Built {
            front_matter: fm,
            warnings,
        })
    }

    /// Apply edits to existing front matter and refresh `last_update`.
    pub fn edit(&self, fm: &Mapping, updates: Mapping, unset: &[String]) -> Result<Built, ValidationError> {
        let mut fm = fm.clone();
        for key in unset {
            fm.shift_remove(key.as_str());
        }
        merge(&mut fm, updates);
        fm.insert(
            Value::String("last_update".to_string()),
            Value::String(self.clock.timestamp()),
        );

        let fm = order_keys(&fm, &self.config.yfm.enforce_key_order);
        let warnings = validate(&fm, self.taxonomy, self.config.yfm.strict_taxonomy)?;
        Ok(Built {
            front_matter: fm,
            warnings,
        })
    }
}
