use chat_view::{render_transcript, sanitize_inline, truncate_to_width, ViewOptions};
use content_parser::parse;
use conversation_store::ConversationState;

use crate::commands::{parse_slash_command, RollbackTarget, SlashCommand};
use crate::engine::{CheckpointEngine, ReplyProgress, SendOutcome, APPROVE_PLAN_MESSAGE};

/// Observer handed to [`App::on_submit`] while a reply is outstanding.
pub type ReplyObserver<'a> = dyn for<'p> FnMut(ReplyProgress<'p>, &ConversationState) + 'a;

pub const HELP_TEXT: &str = "Commands: /help, /approve, /checkpoints, /rollback <id|#n>, /code, /models [provider], /reset, /quit";
const BUSY_TEXT: &str = "A reply is still loading. Please wait.";
const DISCARDED_TEXT: &str = "The reply arrived after the conversation changed and was discarded.";
const SNIPPET_WIDTH: usize = 48;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Error,
}

/// Transient status line shown once and then dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

pub struct App {
    engine: CheckpointEngine,
    pub input: String,
    pub code_only: bool,
    pub should_exit: bool,
    notices: Vec<Notice>,
}

impl App {
    pub fn new(engine: CheckpointEngine) -> Self {
        Self {
            engine,
            input: String::new(),
            code_only: false,
            should_exit: false,
            notices: Vec::new(),
        }
    }

    pub fn engine(&self) -> &CheckpointEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut CheckpointEngine {
        &mut self.engine
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    /// Returns pending notices and clears them.
    pub fn drain_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    pub fn on_input_replace(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Replaces the input with `text` and submits it.
    pub fn submit(&mut self, text: &str) {
        self.on_input_replace(text);
        self.on_submit(&mut |_, _| {});
    }

    /// Submits the current input, reporting reply progress to `observer`.
    pub fn on_submit(&mut self, observer: &mut ReplyObserver<'_>) {
        let submitted = std::mem::take(&mut self.input);
        let prompt = submitted.trim();
        if prompt.is_empty() {
            return;
        }

        let Some(command) = parse_slash_command(prompt) else {
            let outcome = self.engine.send_message_observed(prompt, observer);
            self.on_send_outcome(outcome);
            return;
        };

        match command {
            SlashCommand::Help => self.notices.push(Notice::info(HELP_TEXT)),
            SlashCommand::Approve => self.on_approve(observer),
            SlashCommand::Checkpoints => self.list_checkpoints(),
            SlashCommand::Rollback(target) => self.on_rollback(target),
            SlashCommand::Code => {
                self.code_only = !self.code_only;
                let state = if self.code_only { "on" } else { "off" };
                self.notices.push(Notice::info(format!("Code-only view {state}")));
            }
            SlashCommand::Models(provider) => self.list_models(provider),
            SlashCommand::Reset => {
                self.engine.reset_conversation();
                self.notices.push(Notice::info("Started a new conversation"));
            }
            SlashCommand::Quit => self.should_exit = true,
            SlashCommand::Unknown(command) => self
                .notices
                .push(Notice::error(format!("Unknown command: {command}"))),
        }
    }

    pub fn view_options(&self, width: usize) -> ViewOptions {
        ViewOptions::default()
            .with_width(width)
            .with_code_only(self.code_only)
    }

    /// Transcript lines for the current state.
    pub fn render(&self, width: usize) -> Vec<String> {
        render_state(self.engine.state(), self.view_options(width))
    }

    /// One-line description of the active gateway.
    pub fn status_line(&self) -> String {
        let profile = self.engine.gateway_profile();
        let mut status = format!("{} · {}", profile.gateway_id, profile.provider);
        if let Some(model) = profile.model {
            status.push_str(" · ");
            status.push_str(&model);
        }
        sanitize_inline(&status)
    }

    fn on_send_outcome(&mut self, outcome: SendOutcome) {
        match outcome {
            SendOutcome::Ignored | SendOutcome::Completed { .. } => {}
            SendOutcome::Busy => self.notices.push(Notice::info(BUSY_TEXT)),
            SendOutcome::Failed { error } => self.notices.push(Notice::error(error)),
            SendOutcome::Discarded => self.notices.push(Notice::info(DISCARDED_TEXT)),
        }
    }

    fn on_approve(&mut self, observer: &mut ReplyObserver<'_>) {
        let has_plan = self
            .engine
            .state()
            .messages
            .iter()
            .rev()
            .find(|message| message.role == chat_model::Role::Assistant)
            .is_some_and(|message| parse(&message.content).has_plan());
        if !has_plan {
            self.notices
                .push(Notice::info("There is no implementation plan to approve"));
            return;
        }

        let outcome = self
            .engine
            .send_message_observed(APPROVE_PLAN_MESSAGE, observer);
        self.on_send_outcome(outcome);
    }

    fn list_checkpoints(&mut self) {
        let state = self.engine.state();
        if state.checkpoints.is_empty() {
            self.notices.push(Notice::info("No checkpoints yet"));
            return;
        }

        let lines: Vec<String> = state
            .checkpoints
            .iter()
            .enumerate()
            .map(|(idx, checkpoint)| {
                let snippet = state
                    .message(&checkpoint.after_message_id)
                    .map(|message| {
                        truncate_to_width(&sanitize_inline(&message.content), SNIPPET_WIDTH, "…")
                    })
                    .unwrap_or_default();
                format!("#{} {} {snippet}", idx + 1, checkpoint.id)
            })
            .collect();
        self.notices.extend(lines.into_iter().map(Notice::info));
    }

    fn on_rollback(&mut self, target: Option<RollbackTarget>) {
        let Some(target) = target else {
            self.notices
                .push(Notice::error("Usage: /rollback <checkpoint-id|#n>"));
            return;
        };

        let state = self.engine.state();
        let resolved = match &target {
            RollbackTarget::Ordinal(ordinal) => ordinal
                .checked_sub(1)
                .and_then(|idx| state.checkpoints.get(idx))
                .map(|checkpoint| (checkpoint.id.clone(), *ordinal)),
            RollbackTarget::Id(id) => state
                .checkpoints
                .iter()
                .position(|checkpoint| &checkpoint.id == id)
                .map(|idx| (id.clone(), idx + 1)),
        };

        let Some((checkpoint_id, ordinal)) = resolved else {
            self.notices.push(Notice::error("Unknown checkpoint"));
            return;
        };

        self.engine.rollback_to_checkpoint(&checkpoint_id);
        self.notices
            .push(Notice::info(format!("Rolled back to checkpoint #{ordinal}")));
    }

    fn list_models(&mut self, provider: Option<String>) {
        let provider = provider.unwrap_or_else(|| self.engine.gateway_profile().provider);
        match self.engine.available_models(&provider) {
            Ok(models) if models.is_empty() => self
                .notices
                .push(Notice::info(format!("No models available for {provider}"))),
            Ok(models) => self.notices.push(Notice::info(format!(
                "Models for {provider}: {}",
                models.join(", ")
            ))),
            Err(error) => self.notices.push(Notice::error(error.message())),
        }
    }
}

/// Transcript lines for `state`.
pub fn render_state(state: &ConversationState, options: ViewOptions) -> Vec<String> {
    render_transcript(
        &state.messages,
        &state.checkpoints,
        state.is_loading,
        options,
    )
}
