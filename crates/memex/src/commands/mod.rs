//! CLI commands.

pub mod base2img;
pub mod clean;
pub mod init;
pub mod new;
pub mod taxa;
pub mod yfm;

use anyhow::{bail, Result};

/// Parse a `--cats`/`--tags` value: a JSON array of strings.
pub fn parse_json_list(raw: Option<&str>) -> Result<Option<Vec<String>>> {
    let Some(raw) = raw.filter(|r| !r.trim().is_empty()) else {
        return Ok(None);
    };
    match serde_json::from_str::<Vec<String>>(raw) {
        Ok(items) => Ok(Some(items)),
        Err(_) => bail!(
            r#"Expected a JSON array of strings, e.g. '["🤖 tech","🐧 linux"]', got: {}"#,
            raw
        ),
    }
}

/// Fail with a summary when some items of a batch failed.
pub fn finish(failed: usize, total: usize, what: &str) -> Result<()> {
    if failed > 0 {
        bail!("{} of {} {} failed", failed, total, what);
    }
    Ok(())
}
