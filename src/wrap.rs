//! Greedy word wrapping by display width.

use unicode_segmentation::UnicodeSegmentation;

use crate::width::{display_width, grapheme_width};

/// Wraps sanitized `text` to `width` columns.
///
/// Existing newlines are kept, words longer than a line are broken by
/// grapheme, and wrapped lines never start with the whitespace they broke on.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() || width == 0 {
        return vec![String::new()];
    }

    text.split('\n')
        .flat_map(|line| wrap_single_line(line, width))
        .map(|line| line.trim_end().to_string())
        .collect()
}

fn wrap_single_line(line: &str, width: usize) -> Vec<String> {
    if display_width(line) <= width {
        return vec![line.to_string()];
    }

    let mut wrapped = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for token in split_into_tokens(line) {
        let token_width = display_width(token);
        let is_whitespace = token.trim().is_empty();

        if token_width > width && !is_whitespace {
            if !current_line.is_empty() {
                wrapped.push(current_line.trim_end().to_string());
            }
            let mut broken = break_long_word(token, width);
            current_line = broken.pop().unwrap_or_default();
            current_width = display_width(&current_line);
            wrapped.extend(broken);
            continue;
        }

        if current_width + token_width > width && current_width > 0 {
            wrapped.push(current_line.trim_end().to_string());
            if is_whitespace {
                current_line = String::new();
                current_width = 0;
            } else {
                current_line = token.to_string();
                current_width = token_width;
            }
        } else if !(is_whitespace && current_width == 0 && !wrapped.is_empty()) {
            current_line.push_str(token);
            current_width += token_width;
        }
    }

    if !current_line.is_empty() || wrapped.is_empty() {
        wrapped.push(current_line);
    }

    wrapped
}

/// Splits a line into alternating runs of spaces and non-spaces.
fn split_into_tokens(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut in_whitespace = None;

    for (idx, ch) in line.char_indices() {
        let is_space = ch == ' ';
        if in_whitespace.is_some_and(|previous| previous != is_space) {
            tokens.push(&line[start..idx]);
            start = idx;
        }
        in_whitespace = Some(is_space);
    }
    if start < line.len() {
        tokens.push(&line[start..]);
    }

    tokens
}

fn break_long_word(word: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_line = String::new();
    let mut current_width = 0;

    for grapheme in word.graphemes(true) {
        let grapheme_cols = grapheme_width(grapheme);
        if current_width + grapheme_cols > width && !current_line.is_empty() {
            lines.push(std::mem::take(&mut current_line));
            current_width = 0;
        }
        current_line.push_str(grapheme);
        current_width += grapheme_cols;
    }

    if !current_line.is_empty() {
        lines.push(current_line);
    }

    lines
}
