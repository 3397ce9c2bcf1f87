//! Numbered selection prompts.

use std::io::{self, BufRead, Write};

fn read_answer<R: BufRead, W: Write>(input: &mut R, output: &mut W, question: &str) -> io::Result<String> {
    write!(output, "{}: ", question)?;
    output.flush()?;
    let mut line = String::new();
    input.read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Pick one option by number. A blank answer keeps `preselect`.
pub fn single_select<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    title: &str,
    options: &[String],
    preselect: Option<&str>,
) -> io::Result<Option<String>> {
    writeln!(output, "➜ {}", title)?;
    if options.is_empty() {
        writeln!(output, "⚠ No options available.")?;
        return Ok(None);
    }

    let default = preselect.and_then(|p| options.iter().position(|o| o == p));
    for (i, option) in options.iter().enumerate() {
        let mark = if default == Some(i) { "•" } else { " " };
        writeln!(output, "  {:>2}) {} {}", i + 1, mark, option)?;
    }

    let fallback = default.map(|i| options[i].clone());
    let answer = read_answer(input, output, "Choose one by number")?;
    if answer.is_empty() {
        return Ok(fallback);
    }
    match answer.parse::<usize>() {
        Ok(n) if (1..=options.len()).contains(&n) => Ok(Some(options[n - 1].clone())),
        _ => {
            writeln!(output, "⚠ Invalid selection; using default.")?;
            Ok(fallback)
        }
    }
}

/// Pick any number of options by comma- or space-separated numbers.
///
/// A blank answer keeps `prechecked`.
pub fn multi_select<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    title: &str,
    options: &[String],
    prechecked: &[String],
) -> io::Result<Vec<String>> {
    writeln!(output, "➜ {}", title)?;
    if options.is_empty() {
        writeln!(output, "⚠ No options available.")?;
        return Ok(prechecked.to_vec());
    }

    for (i, option) in options.iter().enumerate() {
        let mark = if prechecked.contains(option) { "[x]" } else { "[ ]" };
        writeln!(output, "  {:>2}) {} {}", i + 1, mark, option)?;
    }

    let answer = read_answer(input, output, "Select by number (comma-separated), or blank to keep")?;
    if answer.is_empty() {
        return Ok(prechecked.to_vec());
    }

    let mut selected: Vec<String> = Vec::new();
    for token in answer.split([',', ' ', '\t']).filter(|t| !t.is_empty()) {
        match token.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => {
                let option = &options[n - 1];
                if !selected.contains(option) {
                    selected.push(option.clone());
                }
            }
            Ok(n) => writeln!(output, "⚠ Out-of-range index: {}", n)?,
            Err(_) => writeln!(output, "⚠ Ignored invalid token: {}", token)?,
        }
    }
    Ok(selected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn options() -> Vec<String> {
        vec!["git".to_string(), "linux".to_string(), "notes".to_string()]
    }

    #[test]
    fn single_select_by_number() {
        let mut out = Vec::new();

        let picked = single_select(&mut Cursor::new("2\n"), &mut out, "Select folder", &options(), None).unwrap();

        assert_eq!(picked.as_deref(), Some("linux"));
        assert!(String::from_utf8(out).unwrap().contains(" 2)   linux"));
    }

    #[test]
    fn single_select_blank_keeps_default() {
        let picked = single_select(&mut Cursor::new("\n"), &mut Vec::new(), "t", &options(), Some("notes")).unwrap();

        assert_eq!(picked.as_deref(), Some("notes"));
    }

    #[test]
    fn single_select_invalid_falls_back() {
        let picked = single_select(&mut Cursor::new("9\n"), &mut Vec::new(), "t", &options(), None).unwrap();

        assert_eq!(picked, None);
    }

    #[test]
    fn multi_select_dedups_and_skips_bad_tokens() {
        let mut out = Vec::new();

        let picked = multi_select(&mut Cursor::new("3, 1 x 3 7\n"), &mut out, "t", &options(), &[]).unwrap();

        assert_eq!(picked, vec!["notes".to_string(), "git".to_string()]);
        let shown = String::from_utf8(out).unwrap();
        assert!(shown.contains("Ignored invalid token: x"));
        assert!(shown.contains("Out-of-range index: 7"));
    }

    #[test]
    fn multi_select_blank_keeps_prechecked() {
        let pre = vec!["git".to_string()];

        let picked = multi_select(&mut Cursor::new(""), &mut Vec::new(), "t", &options(), &pre).unwrap();

        assert_eq!(picked, pre);
    }
}
