//! Front matter splitting, parsing and serialization.
//!
//! A document's front matter is the block between an opening `---` line at
//! the very start of the file and the next `---` line. Everything after the
//! closing line is the body and is never altered here.

use serde_yaml::{Mapping, Value};

/// Errors that can occur when parsing front matter.
#[derive(Debug, thiserror::Error)]
pub enum FrontmatterError {
    #[error("No front matter block found")]
    Missing,

    #[error("Unclosed front matter block - missing closing ---")]
    Unclosed,

    #[error("Invalid YAML in front matter: {0}")]
    InvalidYaml(String),

    #[error("Front matter must be a key-value mapping")]
    NotMapping,

    #[error("Cannot update `{0}` in place without changing other fields")]
    Conflict(String),
}

/// Byte layout of a front matter block inside a document.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Block {
    /// Start of the YAML text (just after the opening line)
    yaml_start: usize,

    /// End of the YAML text (start of the closing line)
    yaml_end: usize,

    /// Start of the body (just after the closing line)
    body_start: usize,
}

fn is_delimiter(line: &str) -> bool {
    line.trim_end() == "---"
}

/// Locate the front matter block, if the document has one.
fn locate(source: &str) -> Result<Option<Block>, FrontmatterError> {
    let Some(first_end) = source.find('\n') else {
        return if is_delimiter(source) {
            Err(FrontmatterError::Unclosed)
        } else {
            Ok(None)
        };
    };
    if !is_delimiter(&source[..first_end]) {
        return Ok(None);
    }

    let yaml_start = first_end + 1;
    let mut pos = yaml_start;
    while pos < source.len() {
        let line_end = source[pos..].find('\n').map(|i| pos + i);
        let line = &source[pos..line_end.unwrap_or(source.len())];
        if is_delimiter(line) {
            return Ok(Some(Block {
                yaml_start,
                yaml_end: pos,
                body_start: line_end.map_or(source.len(), |e| e + 1),
            }));
        }
        match line_end {
            Some(end) => pos = end + 1,
            None => break,
        }
    }

    Err(FrontmatterError::Unclosed)
}

fn parse_yaml(yaml: &str) -> Result<Mapping, FrontmatterError> {
    if yaml.trim().is_empty() {
        return Ok(Mapping::new());
    }
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(map)) => Ok(map),
        Ok(Value::Null) => Ok(Mapping::new()),
        Ok(_) => Err(FrontmatterError::NotMapping),
        Err(e) => Err(FrontmatterError::InvalidYaml(e.to_string())),
    }
}

/// Split a document into its front matter mapping and body.
///
/// A document without a leading `---` line has an empty mapping and the
/// whole text as body.
pub fn parse(source: &str) -> Result<(Mapping, &str), FrontmatterError> {
    match locate(source)? {
        None => Ok((Mapping::new(), source)),
        Some(block) => {
            let fm = parse_yaml(&source[block.yaml_start..block.yaml_end])?;
            Ok((fm, &source[block.body_start..]))
        }
    }
}

/// Render a front matter mapping and body back into a document.
///
/// Inverse of [`parse`].
pub fn serialize(fm: &Mapping, body: &str) -> String {
    let mut out = String::from("---\n");
    out.push_str(&to_yaml(fm));
    out.push_str("---\n");
    out.push_str(body);
    out
}

/// Render a mapping as front matter YAML, one top-level key per entry.
///
/// Lists of scalars use flow style (`tags: [a, b]`), everything else the
/// block style serde_yaml emits.
pub fn to_yaml(fm: &Mapping) -> String {
    let mut out = String::new();
    for (key, value) in fm {
        match (scalar_text(key), flow_list(value)) {
            (Some(key), Some(list)) => {
                out.push_str(&key);
                out.push_str(": ");
                out.push_str(&list);
                out.push('\n');
            }
            _ => {
                let mut entry = Mapping::new();
                entry.insert(key.clone(), value.clone());
                // Mappings of plain YAML values always serialize.
                out.push_str(&serde_yaml::to_string(&entry).unwrap_or_default());
            }
        }
    }
    out
}

/// Render a YAML scalar on one line, or `None` for anything else.
pub fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => {
            let text = serde_yaml::to_string(value).ok()?;
            let text = text.strip_suffix('\n').unwrap_or(&text);
            (!text.contains('\n')).then(|| text.to_string())
        }
        _ => None,
    }
}

fn flow_list(value: &Value) -> Option<String> {
    let Value::Sequence(items) = value else {
        return None;
    };

    let mut rendered = Vec::with_capacity(items.len());
    for item in items {
        // Quoted scalars carry YAML escapes and are valid inside a flow
        // sequence as emitted. Plain ones may hold flow indicators.
        let text = scalar_text(item)?;
        let quoted = text.starts_with(['\'', '"']);
        if quoted || !text.contains([',', '[', ']', '{', '}', ':', '#']) {
            rendered.push(text);
        } else {
            rendered.push(format!("'{}'", text.replace('\'', "''")));
        }
    }

    Some(format!("[{}]", rendered.join(", ")))
}

/// Set `field` to the scalar `value`, touching nothing else in the document.
///
/// The field's line (and any indented continuation lines) is replaced in
/// place. A missing field is inserted after `date`, or at the end of the
/// block. Fails when the document has no valid front matter, or when the
/// edited block would read back with anything but `field` changed.
pub fn touch(source: &str, field: &str, value: &str) -> Result<String, FrontmatterError> {
    let block = locate(source)?.ok_or(FrontmatterError::Missing)?;
    let yaml = &source[block.yaml_start..block.yaml_end];
    let before = parse_yaml(yaml)?;

    let new_value = Value::String(value.to_string());
    let rendered = scalar_text(&new_value)
        .ok_or_else(|| FrontmatterError::InvalidYaml(format!("`{}` is not a scalar", value)))?;

    let newline = if yaml.contains("\r\n") { "\r\n" } else { "\n" };
    let line = format!("{}: {}{}", field, rendered, newline);

    let (start, end) = match entry_span(yaml, field) {
        Some(span) => span,
        None => {
            let at = entry_span(yaml, "date").map_or(yaml.len(), |(_, end)| end);
            (at, at)
        }
    };

    let mut edited = String::with_capacity(yaml.len() + line.len());
    edited.push_str(&yaml[..start]);
    if start == yaml.len() && !yaml.is_empty() && !yaml.ends_with('\n') {
        edited.push_str(newline);
    }
    edited.push_str(&line);
    edited.push_str(&yaml[end..]);

    let mut expected = before;
    expected.insert(Value::String(field.to_string()), new_value);
    let after = parse_yaml(&edited).map_err(|_| FrontmatterError::Conflict(field.to_string()))?;
    let same = after.len() == expected.len() && expected.iter().all(|(k, v)| after.get(k) == Some(v));
    if !same {
        return Err(FrontmatterError::Conflict(field.to_string()));
    }

    let mut out = String::with_capacity(source.len() + line.len());
    out.push_str(&source[..block.yaml_start]);
    out.push_str(&edited);
    out.push_str(&source[block.yaml_end..]);
    Ok(out)
}

/// Length of the `key` prefix of a line, bare or quoted, up to and including
/// the `:` that ends it.
fn key_prefix(line: &str, key: &str) -> Option<usize> {
    let quoted = [format!("\"{}\"", key), format!("'{}'", key)];
    let written = [key, quoted[0].as_str(), quoted[1].as_str()]
        .into_iter()
        .find(|k| line.starts_with(k))?;

    let rest = &line[written.len()..];
    let gap = rest.len() - rest.trim_start_matches([' ', '\t']).len();
    let after_colon = rest[gap..].strip_prefix(':')?;
    if !after_colon.is_empty() && !after_colon.starts_with([' ', '\t', '\r', '\n']) {
        return None;
    }
    Some(written.len() + gap + 1)
}

/// Byte span of a top-level `key:` entry in block YAML, continuation lines
/// included. Blank lines belong to the entry only when an indented line
/// follows them.
fn entry_span(yaml: &str, key: &str) -> Option<(usize, usize)> {
    let mut offset = 0;
    let mut span: Option<(usize, usize)> = None;

    for line in yaml.split_inclusive('\n') {
        let next = offset + line.len();
        match span {
            None => {
                if key_prefix(line, key).is_some() {
                    span = Some((offset, next));
                }
            }
            Some((start, end)) => {
                if line.trim().is_empty() {
                    // undecided until the next non-blank line
                } else if line.starts_with([' ', '\t']) || line.starts_with("- ") || line.trim_end() == "-" {
                    span = Some((start, next));
                } else {
                    return Some((start, end));
                }
            }
        }
        offset = next;
    }

    span
}

/// Set or replace keys, keeping existing keys in place and appending new ones.
pub fn merge(fm: &mut Mapping, updates: Mapping) {
    for (key, value) in updates {
        fm.insert(key, value);
    }
}

/// Put the named keys first, in the given order. Other keys keep their order.
pub fn order_keys(fm: &Mapping, order: &[String]) -> Mapping {
    let mut ordered = Mapping::new();
    for name in order {
        if let Some(value) = fm.get(name.as_str()) {
            ordered.insert(Value::String(name.clone()), value.clone());
        }
    }
    for (key, value) in fm {
        if !ordered.contains_key(key) {
            ordered.insert(key.clone(), value.clone());
        }
    }
    ordered
}

/// String items of a list field (a lone string counts as one item).
pub fn string_list(fm: &Mapping, key: &str) -> Option<Vec<String>> {
    match fm.get(key)? {
        Value::Sequence(items) => Some(
            items
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.clone()),
                    other => scalar_text(other),
                })
                .collect(),
        ),
        Value::String(s) => Some(vec![s.clone()]),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}

/// A YAML sequence of strings.
pub fn string_seq<S: AsRef<str>>(items: &[S]) -> Value {
    Value::Sequence(items.iter().map(|s| Value::String(s.as_ref().to_string())).collect())
}
