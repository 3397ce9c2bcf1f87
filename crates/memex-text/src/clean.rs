//! Unicode punctuation cleanup.

/// ASCII stand-in for a typographic character, if it has one.
fn replacement(c: char) -> Option<&'static str> {
    let ascii = match c {
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' => "'",
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{2033}' => "\"",
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2014}' | '\u{2015}' => "-",
        '\u{2026}' => "...",
        '\u{00A0}' | '\u{2007}' | '\u{2009}' | '\u{202F}' => " ",
        _ => return None,
    };
    Some(ascii)
}

/// Replace curly quotes, dashes, ellipses and non-breaking spaces with ASCII.
///
/// Every other character is kept as is, so cleaning clean text is a no-op.
pub fn clean(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match replacement(c) {
            Some(ascii) => out.push_str(ascii),
            None => out.push(c),
        }
    }
    out
}

/// Whether [`clean`] would change `text`.
pub fn needs_cleaning(text: &str) -> bool {
    text.chars().any(|c| replacement(c).is_some())
}
