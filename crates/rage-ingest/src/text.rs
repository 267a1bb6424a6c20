//! Text normalization helpers shared by the format parsers

use regex::Regex;
use std::sync::OnceLock;

/// Opening punctuation followed by whitespace
fn open_punct_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"([(¡¿])\s+").expect("valid regex"))
}

/// Whitespace followed by closing punctuation
fn close_punct_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\s+([,.:;?!)])").expect("valid regex"))
}

/// Remove spaces after opening and before closing punctuation
///
/// Extractors often emit "word ," or "( word" when text runs are split at
/// punctuation boundaries.
pub fn fix_punctuation(text: &str) -> String {
    let text = open_punct_pattern().replace_all(text, "$1");
    close_punct_pattern().replace_all(&text, "$1").into_owned()
}

/// Typographic characters replaced with ASCII approximations
const REPLACEMENTS: &[(char, &str)] = &[
    ('\u{2010}', "-"),   // Hyphen
    ('\u{2011}', "-"),   // Non-breaking hyphen
    ('\u{2013}', "-"),   // En dash
    ('\u{2014}', "--"),  // Em dash
    ('\u{2018}', "'"),   // Left single quote
    ('\u{2019}', "'"),   // Right single quote
    ('\u{201C}', "\""),  // Left double quote
    ('\u{201D}', "\""),  // Right double quote
    ('\u{2022}', "* "),  // Bullet
    ('\u{2026}', "..."), // Ellipsis
    ('\u{00A0}', " "),   // Non-breaking space
    ('\u{FB00}', "ff"),
    ('\u{FB01}', "fi"),
    ('\u{FB02}', "fl"),
    ('\u{FB03}', "ffi"),
    ('\u{FB04}', "ffl"),
];

/// Clean up text extracted from PDF content streams
///
/// Replaces ligatures and typographic punctuation, strips NUL bytes, trims
/// every line and drops blank lines.
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        if c == '\0' {
            continue;
        }
        match REPLACEMENTS.iter().find(|(from, _)| *from == c) {
            Some((_, to)) => result.push_str(to),
            None => result.push(c),
        }
    }

    result
        .lines()
        .map(|l| l.trim())
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse all whitespace runs into single spaces
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fix_punctuation() {
        assert_eq!(fix_punctuation("Hello , world ."), "Hello, world.");
        assert_eq!(fix_punctuation("( see below )"), "(see below)");
        assert_eq!(fix_punctuation("¿ Qué ?"), "¿Qué?");
        assert_eq!(fix_punctuation("a: b; c! d"), "a: b; c! d");
    }

    #[test]
    fn test_cleanup_pdf_text() {
        let raw = "  \u{FB01}rst line\u{0}  \n\n \u{201C}quoted\u{201D} \u{2014} done \n";
        assert_eq!(cleanup_pdf_text(raw), "first line\n\"quoted\" -- done");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace(" a \n\t b  c "), "a b c");
    }
}
