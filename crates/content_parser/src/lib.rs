//! Best-effort structural parsing of chat message content.
//!
//! [`parse`] scans raw message text for fenced code blocks (with optional
//! language tags and inferred filenames) and for "implementation plan" steps.
//! Parsing is a heuristic, not a grammar: it is total over all strings, never
//! panics, and degrades to plain prose when the expected structure is absent.
//! Unterminated fences are left in the prose untouched.

mod code;
mod filename;
mod plan;

pub use code::CodeSegment;
pub use plan::{PlanStep, PLAN_MARKER};

/// Parsing switches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Treat fence-less content as one unlabeled code segment.
    pub code_only: bool,
}

impl ParseOptions {
    #[must_use]
    pub fn code_only() -> Self {
        Self { code_only: true }
    }
}

/// Structure derived from one message body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedContent {
    pub code: Vec<CodeSegment>,
    pub plan: Vec<PlanStep>,
    /// Message text with every terminated fenced region removed.
    pub prose: String,
}

impl ParsedContent {
    #[must_use]
    pub fn has_code(&self) -> bool {
        !self.code.is_empty()
    }

    #[must_use]
    pub fn has_plan(&self) -> bool {
        !self.plan.is_empty()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.code.is_empty() && self.plan.is_empty() && self.prose.is_empty()
    }

    /// Prose without the bullet lines that became plan steps.
    ///
    /// Sentence-derived steps leave the prose untouched.
    #[must_use]
    pub fn prose_without_plan_bullets(&self) -> String {
        if self.plan.is_empty() {
            return self.prose.clone();
        }
        let is_step = |line: &str| {
            plan::bullet_text(line)
                .is_some_and(|text| self.plan.iter().any(|step| step.text == text))
        };
        self.prose
            .lines()
            .filter(|line| !is_step(line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Parses `content` with default options.
#[must_use]
pub fn parse(content: &str) -> ParsedContent {
    parse_with(content, ParseOptions::default())
}

/// Parses `content` with explicit options.
#[must_use]
pub fn parse_with(content: &str, options: ParseOptions) -> ParsedContent {
    if content.is_empty() {
        return ParsedContent::default();
    }

    let fences = code::find_fences(content);
    let prose = code::strip_fences(content, &fences);

    let mut segments = code::segments_from_fences(content, &fences);
    if segments.is_empty() && options.code_only {
        let whole = content.trim();
        if !whole.is_empty() {
            segments.push(CodeSegment {
                code: whole.to_string(),
                language: None,
                filename: filename::from_leading_comment(whole),
            });
        }
    }

    let plan = if plan::has_plan_marker(content) {
        plan::extract_steps(&prose)
    } else {
        Vec::new()
    };

    ParsedContent {
        code: segments,
        plan,
        prose,
    }
}
