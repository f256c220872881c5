//! Removal of terminal control sequences from untrusted text.
//!
//! Message content comes from users and models; anything that could move the
//! cursor, recolor the screen, set window titles or reorder text is dropped
//! before rendering. Only `\n` survives as a control character, and tabs are
//! expanded to spaces.

pub const TAB_SPACES: &str = "    ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscapeKind {
    Csi,
    Osc,
    Apc,
    Dcs,
    Pm,
    Sos,
    Ss3,
    /// Two-byte `ESC x` sequence.
    Short,
}

/// Length in bytes of the escape sequence starting at `pos`, if one starts there.
///
/// Unterminated string sequences (OSC, DCS, ...) extend to the end of input so
/// their payload is never shown.
pub fn escape_sequence_len(input: &str, pos: usize) -> Option<(usize, EscapeKind)> {
    let bytes = input.as_bytes();
    if bytes.get(pos) != Some(&0x1b) {
        return None;
    }
    let Some(&introducer) = bytes.get(pos + 1) else {
        return Some((1, EscapeKind::Short));
    };

    match introducer {
        b'[' => Some((csi_len(bytes, pos), EscapeKind::Csi)),
        b']' => Some((string_terminated_len(bytes, pos), EscapeKind::Osc)),
        b'_' => Some((string_terminated_len(bytes, pos), EscapeKind::Apc)),
        b'P' => Some((string_terminated_len(bytes, pos), EscapeKind::Dcs)),
        b'^' => Some((string_terminated_len(bytes, pos), EscapeKind::Pm)),
        b'X' => Some((string_terminated_len(bytes, pos), EscapeKind::Sos)),
        b'O' => Some(((bytes.len() - pos).min(3), EscapeKind::Ss3)),
        other if other.is_ascii() => Some((2, EscapeKind::Short)),
        // ESC followed by a multi-byte char: drop only the ESC.
        _ => Some((1, EscapeKind::Short)),
    }
}

fn csi_len(bytes: &[u8], pos: usize) -> usize {
    let mut idx = pos + 2;
    while idx < bytes.len() {
        let byte = bytes[idx];
        if (0x40..=0x7e).contains(&byte) {
            return idx + 1 - pos;
        }
        if !(0x20..=0x3f).contains(&byte) {
            // Malformed: stop before the offending byte.
            return idx - pos;
        }
        idx += 1;
    }
    bytes.len() - pos
}

fn string_terminated_len(bytes: &[u8], pos: usize) -> usize {
    let mut idx = pos + 2;
    while idx < bytes.len() {
        if bytes[idx] == 0x07 {
            return idx + 1 - pos;
        }
        if bytes[idx] == 0x1b && bytes.get(idx + 1) == Some(&b'\\') {
            return idx + 2 - pos;
        }
        idx += 1;
    }
    bytes.len() - pos
}

/// Bidirectional overrides and isolates can visually reorder surrounding text.
fn is_bidi_control(ch: char) -> bool {
    matches!(
        ch,
        '\u{202A}'..='\u{202E}' | '\u{2066}'..='\u{2069}' | '\u{200E}' | '\u{200F}' | '\u{061C}'
    )
}

fn is_dropped_char(ch: char) -> bool {
    (ch.is_control() && ch != '\n') || is_bidi_control(ch) || ch == '\u{FEFF}'
}

/// Returns `input` with escape sequences and control characters removed.
///
/// `\r\n` becomes `\n`, a lone `\r` is dropped and `\t` becomes four spaces.
pub fn sanitize(input: &str) -> String {
    let mut clean = String::with_capacity(input.len());
    let mut idx = 0;

    while idx < input.len() {
        if let Some((length, _)) = escape_sequence_len(input, idx) {
            idx += length;
            // A sequence may end inside a multi-byte char when malformed.
            while idx < input.len() && !input.is_char_boundary(idx) {
                idx += 1;
            }
            continue;
        }

        let Some(ch) = input[idx..].chars().next() else {
            break;
        };
        idx += ch.len_utf8();

        match ch {
            '\t' => clean.push_str(TAB_SPACES),
            // C1 CSI introducer behaves like ESC [ on some terminals.
            '\u{9b}' => {
                let rest = &input.as_bytes()[idx..];
                let skip = rest
                    .iter()
                    .position(|byte| (0x40..=0x7e).contains(byte))
                    .map_or(rest.len(), |end| end + 1);
                idx += skip;
                while idx < input.len() && !input.is_char_boundary(idx) {
                    idx += 1;
                }
            }
            ch if is_dropped_char(ch) => {}
            ch => clean.push(ch),
        }
    }

    clean
}

/// Sanitizes text for a single-line slot: newlines become spaces.
pub fn sanitize_inline(input: &str) -> String {
    sanitize(input).replace('\n', " ")
}
