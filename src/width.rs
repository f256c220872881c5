//! Grapheme and display width helpers for sanitized text.

use emojis::get as emoji_get;
use unicode_segmentation::UnicodeSegmentation;
use unicode_width::UnicodeWidthChar;

pub fn grapheme_width(grapheme: &str) -> usize {
    if grapheme.is_empty() {
        return 0;
    }

    if emoji_get(grapheme).is_some() {
        return 2;
    }

    grapheme
        .chars()
        .map(|ch| UnicodeWidthChar::width(ch).unwrap_or(0))
        .sum()
}

/// Terminal columns occupied by `input`, which must already be sanitized.
pub fn display_width(input: &str) -> usize {
    input.graphemes(true).map(grapheme_width).sum()
}

/// Cuts `input` to at most `max_width` columns, appending `ellipsis` when cut.
pub fn truncate_to_width(input: &str, max_width: usize, ellipsis: &str) -> String {
    if display_width(input) <= max_width {
        return input.to_string();
    }

    let ellipsis_width = display_width(ellipsis);
    if ellipsis_width >= max_width {
        return take_width(ellipsis, max_width);
    }

    let mut out = take_width(input, max_width - ellipsis_width);
    out.push_str(ellipsis);
    out
}

fn take_width(input: &str, max_width: usize) -> String {
    let mut out = String::new();
    let mut width = 0;
    for grapheme in input.graphemes(true) {
        let next = grapheme_width(grapheme);
        if width + next > max_width {
            break;
        }
        out.push_str(grapheme);
        width += next;
    }
    out
}
