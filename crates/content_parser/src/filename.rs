//! Filename inference for code segments.
//!
//! Heuristic only: false positives and misses are acceptable.

use std::sync::OnceLock;

use regex::Regex;

fn comment_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r"^\s*(?://|#|--|/\*)\s*([A-Za-z0-9_][A-Za-z0-9_./\-]*\.[A-Za-z][A-Za-z0-9]*)")
            .expect("comment filename regex must compile")
    })
}

fn token_regex() -> &'static Regex {
    static CACHED: OnceLock<Regex> = OnceLock::new();
    CACHED.get_or_init(|| {
        Regex::new(r#"(?:^|[\s`'"(\[])([A-Za-z0-9_][A-Za-z0-9_./\-]*\.[A-Za-z][A-Za-z0-9]*)"#)
            .expect("filename token regex must compile")
    })
}

/// Reads a `// name.ext` style comment on the first line of a code body.
pub(crate) fn from_leading_comment(code: &str) -> Option<String> {
    let first_line = code.lines().next()?;
    comment_regex()
        .captures(first_line)
        .and_then(|captures| captures.get(1))
        .map(|name| name.as_str().to_string())
}

/// Scans the text before a fence, nearest line first.
pub(crate) fn from_preceding_text(text: &str) -> Option<String> {
    text.lines().rev().find_map(|line| {
        token_regex()
            .captures_iter(line)
            .filter_map(|captures| captures.get(1))
            .last()
            .map(|name| name.as_str().to_string())
    })
}
