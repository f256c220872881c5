//! Append-only terminal output for the `chat-agent` binary.
//!
//! The transcript is re-rendered after every change and only the lines that
//! extend what is already on screen are written. While a reply streams, the
//! last rendered line may still grow, so it is held back until the next
//! render confirms it or the reply settles.

use std::io::{self, Write};

use chat_view::sanitize;

use crate::app::{render_state, App, NoticeKind, HELP_TEXT};

/// Printed before lines that replace output already on screen.
pub const REPRINT_SEPARATOR: &str = "────";

/// Tracks which transcript lines are already on screen.
#[derive(Debug, Clone, Default)]
pub struct TranscriptPrinter {
    printed: Vec<String>,
}

impl TranscriptPrinter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn printed(&self) -> &[String] {
        &self.printed
    }

    /// Lines to write so the screen shows all of `rendered`.
    pub fn settle(&mut self, rendered: Vec<String>) -> Vec<String> {
        let stable = rendered.len();
        self.advance(rendered, stable)
    }

    /// Lines to write for a reply that is still streaming.
    pub fn progress(&mut self, rendered: Vec<String>) -> Vec<String> {
        let stable = rendered.len().saturating_sub(1);
        self.advance(rendered, stable)
    }

    fn advance(&mut self, mut rendered: Vec<String>, stable: usize) -> Vec<String> {
        rendered.truncate(stable);
        let common = self
            .printed
            .iter()
            .zip(&rendered)
            .take_while(|(printed, line)| printed == line)
            .count();

        if common == self.printed.len() {
            let fresh = rendered[common..].to_vec();
            self.printed = rendered;
            return fresh;
        }

        // Output diverged: repeat from the header of the first changed message.
        let start = rendered[..(common + 1).min(rendered.len())]
            .iter()
            .rposition(|line| is_header(line))
            .unwrap_or(0);
        let mut fresh = Vec::with_capacity(rendered.len() - start + 1);
        fresh.push(REPRINT_SEPARATOR.to_string());
        fresh.extend_from_slice(&rendered[start..]);
        self.printed = rendered;
        fresh
    }
}

fn is_header(line: &str) -> bool {
    !line.is_empty() && !line.starts_with(' ')
}

/// Line-oriented driver: one submitted line in, transcript delta and notices out.
pub struct Console {
    printer: TranscriptPrinter,
    width: usize,
}

impl Console {
    pub fn new(width: usize) -> Self {
        Self {
            printer: TranscriptPrinter::new(),
            width,
        }
    }

    pub fn printer(&self) -> &TranscriptPrinter {
        &self.printer
    }

    /// Writes the status line, the command help and the restored transcript.
    pub fn start(&mut self, app: &App, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", app.status_line())?;
        writeln!(out, "{HELP_TEXT}")?;
        let lines = self.printer.settle(app.render(self.width));
        write_lines(out, &lines)
    }

    /// Submits `line` and writes everything it changed.
    ///
    /// Streamed replies are written as they arrive. The first write error stops
    /// further output and is returned once the submission has finished.
    pub fn handle_line(
        &mut self,
        app: &mut App,
        line: &str,
        out: &mut dyn Write,
    ) -> io::Result<()> {
        let options = app.view_options(self.width);
        let printer = &mut self.printer;
        let mut write_error: Option<io::Error> = None;

        app.on_input_replace(line);
        app.on_submit(&mut |_, state| {
            if write_error.is_some() {
                return;
            }
            let lines = printer.progress(render_state(state, options));
            if let Err(error) = write_lines(out, &lines) {
                write_error = Some(error);
            }
        });
        if let Some(error) = write_error {
            return Err(error);
        }

        let lines = self.printer.settle(app.render(self.width));
        write_lines(out, &lines)?;

        for notice in app.drain_notices() {
            let prefix = match notice.kind {
                NoticeKind::Info => "*",
                NoticeKind::Error => "! Error:",
            };
            writeln!(out, "{prefix} {}", sanitize(&notice.text))?;
        }
        out.flush()
    }
}

fn write_lines(out: &mut dyn Write, lines: &[String]) -> io::Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    for line in lines {
        writeln!(out, "{line}")?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn appended_lines_are_written_once() {
        let mut printer = TranscriptPrinter::new();
        assert_eq!(printer.settle(lines(&["You:", "  hi"])), lines(&["You:", "  hi"]));
        assert_eq!(
            printer.settle(lines(&["You:", "  hi", "", "Assistant:", "  hello"])),
            lines(&["", "Assistant:", "  hello"])
        );
        assert_eq!(
            printer.settle(lines(&["You:", "  hi", "", "Assistant:", "  hello"])),
            lines(&[])
        );
    }

    #[test]
    fn progress_holds_back_the_growing_line() {
        let mut printer = TranscriptPrinter::new();
        assert_eq!(
            printer.progress(lines(&["You:", "  hi", "", "Assistant:", "  …"])),
            lines(&["You:", "  hi", "", "Assistant:"])
        );
        assert_eq!(
            printer.progress(lines(&["You:", "  hi", "", "Assistant:", "  hel"])),
            lines(&[])
        );
        assert_eq!(
            printer.settle(lines(&["You:", "  hi", "", "Assistant:", "  hello"])),
            lines(&["  hello"])
        );
    }

    #[test]
    fn divergence_repeats_from_the_changed_message() {
        let mut printer = TranscriptPrinter::new();
        printer.settle(lines(&["You:", "  hi", "", "Assistant:", "  one", "  two"]));

        assert_eq!(
            printer.settle(lines(&["You:", "  hi", "", "Assistant:", "  (no reply)"])),
            lines(&[REPRINT_SEPARATOR, "Assistant:", "  (no reply)"])
        );
        assert_eq!(printer.printed().len(), 5);
    }

    #[test]
    fn shrinking_transcript_is_reprinted() {
        let mut printer = TranscriptPrinter::new();
        printer.settle(lines(&["You:", "  a", "", "You:", "  b"]));

        assert_eq!(
            printer.settle(lines(&["You:", "  a"])),
            lines(&[REPRINT_SEPARATOR, "You:", "  a"])
        );
        assert_eq!(printer.settle(Vec::new()), lines(&[REPRINT_SEPARATOR]));
    }
}
