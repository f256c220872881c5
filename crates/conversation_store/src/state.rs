use chat_model::{new_id, Checkpoint, Message};

/// Conversation aggregate owned by [`crate::ConversationStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationState {
    pub messages: Vec<Message>,
    pub checkpoints: Vec<Checkpoint>,
    pub is_loading: bool,
    pub conversation_id: String,
    pub error: Option<String>,
}

impl ConversationState {
    /// Empty state with a freshly generated conversation id.
    #[must_use]
    pub fn new() -> Self {
        Self::with_conversation_id(new_id())
    }

    #[must_use]
    pub fn with_conversation_id(conversation_id: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            checkpoints: Vec::new(),
            is_loading: false,
            conversation_id: conversation_id.into(),
            error: None,
        }
    }

    #[must_use]
    pub fn message(&self, id: &str) -> Option<&Message> {
        self.messages.iter().find(|message| message.id == id)
    }

    #[must_use]
    pub fn message_index(&self, id: &str) -> Option<usize> {
        self.messages.iter().position(|message| message.id == id)
    }

    #[must_use]
    pub fn checkpoint(&self, id: &str) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|checkpoint| checkpoint.id == id)
    }

    /// Returns the checkpoint anchored to `message_id`, if any.
    #[must_use]
    pub fn checkpoint_after(&self, message_id: &str) -> Option<&Checkpoint> {
        self.checkpoints
            .iter()
            .find(|checkpoint| checkpoint.after_message_id == message_id)
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

/// Tagged command applied by the store's single writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    SetMessages(Vec<Message>),
    AppendMessage(Message),
    UpdateMessageContent { id: String, content: String },
    BeginLoad,
    EndLoad,
    RecordCheckpoint(Checkpoint),
    Rollback { checkpoint_id: String },
    SetError(String),
    ClearError,
    ResetConversation { conversation_id: String },
}

impl Action {
    /// Reset action carrying a freshly generated conversation id.
    #[must_use]
    pub fn reset() -> Self {
        Self::ResetConversation {
            conversation_id: new_id(),
        }
    }

    #[must_use]
    pub fn rollback(checkpoint_id: impl Into<String>) -> Self {
        Self::Rollback {
            checkpoint_id: checkpoint_id.into(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::SetMessages(_) => "set_messages",
            Self::AppendMessage(_) => "append_message",
            Self::UpdateMessageContent { .. } => "update_message_content",
            Self::BeginLoad => "begin_load",
            Self::EndLoad => "end_load",
            Self::RecordCheckpoint(_) => "record_checkpoint",
            Self::Rollback { .. } => "rollback",
            Self::SetError(_) => "set_error",
            Self::ClearError => "clear_error",
            Self::ResetConversation { .. } => "reset_conversation",
        }
    }
}

/// Produces the next state. Deterministic: ids are carried by the actions.
#[must_use]
pub fn reduce(mut state: ConversationState, action: Action) -> ConversationState {
    match action {
        Action::SetMessages(messages) => {
            state.messages = messages;
        }
        Action::AppendMessage(message) => {
            state.messages.push(message);
        }
        Action::UpdateMessageContent { id, content } => {
            if let Some(message) = state.messages.iter_mut().find(|message| message.id == id) {
                message.content = content;
            }
        }
        Action::BeginLoad => {
            state.is_loading = true;
        }
        Action::EndLoad => {
            state.is_loading = false;
        }
        Action::RecordCheckpoint(checkpoint) => {
            let anchor_exists = state.message(&checkpoint.after_message_id).is_some();
            let duplicate = state.checkpoints.iter().any(|existing| {
                existing.id == checkpoint.id
                    || existing.after_message_id == checkpoint.after_message_id
            });
            if anchor_exists && !duplicate {
                state.checkpoints.push(checkpoint);
            }
        }
        Action::Rollback { checkpoint_id } => {
            return rollback(state, &checkpoint_id);
        }
        Action::SetError(message) => {
            state.error = Some(message);
            state.is_loading = false;
        }
        Action::ClearError => {
            state.error = None;
        }
        Action::ResetConversation { conversation_id } => {
            return ConversationState::with_conversation_id(conversation_id);
        }
    }

    state
}

fn rollback(mut state: ConversationState, checkpoint_id: &str) -> ConversationState {
    let Some(anchor_id) = state
        .checkpoint(checkpoint_id)
        .map(|checkpoint| checkpoint.after_message_id.clone())
    else {
        return state;
    };
    let Some(anchor_index) = state.message_index(&anchor_id) else {
        return state;
    };

    state.messages.truncate(anchor_index + 1);
    let retained = &state.messages;
    state.checkpoints.retain(|checkpoint| {
        retained
            .iter()
            .any(|message| message.id == checkpoint.after_message_id)
    });

    state
}
