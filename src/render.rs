//! Structured transcript rendering.
//!
//! Messages are first turned into [`MessageView`]s made of [`RenderBlock`]s and
//! only then laid out as plain lines. Every piece of message text passes
//! through [`sanitize`] before it is measured, so model output can never
//! smuggle terminal control sequences into the transcript.

use chat_model::{Checkpoint, Message, Role};
use content_parser::{parse_with, ParseOptions, PlanStep};

use crate::sanitize::{sanitize, sanitize_inline};
use crate::width::{display_width, truncate_to_width};
use crate::wrap::wrap_text;

const INDENT: &str = "  ";
const CODE_GUTTER: &str = "│ ";
const PENDING_LINE: &str = "…";
const FAILED_LINE: &str = "(no reply: the request failed)";
const ELLIPSIS: &str = "…";

/// Narrowest layout width; anything smaller is clamped.
pub const MIN_RENDER_WIDTH: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderBlock {
    Prose(String),
    Code {
        language: Option<String>,
        filename: Option<String>,
        code: String,
    },
    Plan(Vec<PlanStep>),
    /// Reply still outstanding.
    Pending,
    /// Reply never arrived.
    Failed,
    /// Rollback point; `ordinal` is 1-based in recording order.
    Checkpoint { id: String, ordinal: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageView {
    pub role: Role,
    pub blocks: Vec<RenderBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Parse fence-less assistant replies as one code block.
    pub code_only: bool,
    pub width: usize,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            code_only: false,
            width: 80,
        }
    }
}

impl ViewOptions {
    #[must_use]
    pub fn with_width(mut self, width: usize) -> Self {
        self.width = width;
        self
    }

    #[must_use]
    pub fn with_code_only(mut self, code_only: bool) -> Self {
        self.code_only = code_only;
        self
    }
}

impl MessageView {
    /// Builds the view of `message`.
    ///
    /// `awaiting_reply` marks an empty assistant message as pending instead of
    /// failed; callers pass it only for the last message while loading.
    pub fn build(
        message: &Message,
        checkpoint: Option<(&Checkpoint, usize)>,
        awaiting_reply: bool,
        code_only: bool,
    ) -> Self {
        let mut blocks = Vec::new();

        match message.role {
            Role::Assistant if message.content.is_empty() => {
                blocks.push(if awaiting_reply {
                    RenderBlock::Pending
                } else {
                    RenderBlock::Failed
                });
            }
            Role::Assistant => {
                let options = if code_only {
                    ParseOptions::code_only()
                } else {
                    ParseOptions::default()
                };
                let parsed = parse_with(&message.content, options);

                let prose = parsed.prose_without_plan_bullets();
                let prose = prose.trim();
                if !prose.is_empty() && !(code_only && parsed.has_code()) {
                    blocks.push(RenderBlock::Prose(prose.to_string()));
                }
                blocks.extend(parsed.code.into_iter().map(|segment| RenderBlock::Code {
                    language: segment.language,
                    filename: segment.filename,
                    code: segment.code,
                }));
                if !parsed.plan.is_empty() {
                    blocks.push(RenderBlock::Plan(parsed.plan));
                }
            }
            Role::User | Role::System => {
                blocks.push(RenderBlock::Prose(message.content.clone()));
            }
        }

        if let Some((checkpoint, ordinal)) = checkpoint {
            blocks.push(RenderBlock::Checkpoint {
                id: checkpoint.id.clone(),
                ordinal,
            });
        }

        Self {
            role: message.role,
            blocks,
        }
    }

    pub fn has_code(&self) -> bool {
        self.blocks
            .iter()
            .any(|block| matches!(block, RenderBlock::Code { .. }))
    }
}

/// Builds one view per message, pairing each with its checkpoint if any.
pub fn build_views(
    messages: &[Message],
    checkpoints: &[Checkpoint],
    is_loading: bool,
    code_only: bool,
) -> Vec<MessageView> {
    let last = messages.len().checked_sub(1);
    messages
        .iter()
        .enumerate()
        .map(|(idx, message)| {
            let checkpoint = checkpoints
                .iter()
                .enumerate()
                .find(|(_, checkpoint)| checkpoint.after_message_id == message.id)
                .map(|(position, checkpoint)| (checkpoint, position + 1));
            let awaiting_reply = is_loading && Some(idx) == last;
            MessageView::build(message, checkpoint, awaiting_reply, code_only)
        })
        .collect()
}

fn header(role: Role) -> &'static str {
    match role {
        Role::User => "You:",
        Role::Assistant => "Assistant:",
        Role::System => "System:",
    }
}

/// Lays out one view as plain lines no wider than `width` columns.
pub fn render_lines(view: &MessageView, width: usize) -> Vec<String> {
    let width = width.max(MIN_RENDER_WIDTH);
    let inner = width - INDENT.len();
    let mut lines = vec![header(view.role).to_string()];

    for block in &view.blocks {
        match block {
            RenderBlock::Prose(text) => {
                lines.extend(indented(wrap_text(&sanitize(text), inner)));
            }
            RenderBlock::Code {
                language,
                filename,
                code,
            } => render_code(&mut lines, language.as_deref(), filename.as_deref(), code, inner),
            RenderBlock::Plan(steps) => {
                for step in steps {
                    let mark = if step.completed { "[x]" } else { "[ ]" };
                    let text =
                        format!("{mark} {}. {}", step.index + 1, sanitize_inline(&step.text));
                    lines.extend(indented(wrap_text(&text, inner)));
                }
            }
            RenderBlock::Pending => lines.push(format!("{INDENT}{PENDING_LINE}")),
            RenderBlock::Failed => lines.push(format!("{INDENT}{FAILED_LINE}")),
            RenderBlock::Checkpoint { id, ordinal } => {
                let marker = format!("── checkpoint #{ordinal} {}", sanitize_inline(id));
                lines.push(format!(
                    "{INDENT}{}",
                    truncate_to_width(&marker, inner, ELLIPSIS)
                ));
            }
        }
    }

    lines
}

fn render_code(
    lines: &mut Vec<String>,
    language: Option<&str>,
    filename: Option<&str>,
    code: &str,
    inner: usize,
) {
    let label = match (language, filename) {
        (Some(language), Some(filename)) => format!("┌ {language} · {filename}"),
        (Some(language), None) => format!("┌ {language}"),
        (None, Some(filename)) => format!("┌ {filename}"),
        (None, None) => "┌".to_string(),
    };
    lines.push(format!(
        "{INDENT}{}",
        truncate_to_width(&sanitize_inline(&label), inner, ELLIPSIS)
    ));

    let code_width = inner.saturating_sub(display_width(CODE_GUTTER)).max(1);
    for line in wrap_text(&sanitize(code), code_width) {
        lines.push(format!("{INDENT}{CODE_GUTTER}{line}").trim_end().to_string());
    }
    lines.push(format!("{INDENT}└"));
}

fn indented(lines: Vec<String>) -> impl Iterator<Item = String> {
    lines.into_iter().map(|line| {
        if line.is_empty() {
            line
        } else {
            format!("{INDENT}{line}")
        }
    })
}

/// Renders the whole log, separating messages with a blank line.
pub fn render_transcript(
    messages: &[Message],
    checkpoints: &[Checkpoint],
    is_loading: bool,
    options: ViewOptions,
) -> Vec<String> {
    let mut lines = Vec::new();
    for view in build_views(messages, checkpoints, is_loading, options.code_only) {
        if !lines.is_empty() {
            lines.push(String::new());
        }
        lines.extend(render_lines(&view, options.width));
    }
    lines
}
