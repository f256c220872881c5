//! Send/rollback orchestration on top of the conversation store.
//!
//! One round trip is `begin_send` (append the user message and an empty
//! assistant placeholder, set loading) followed by `finish_send` (patch the
//! placeholder and record a checkpoint, or record the error). Hosts that block
//! on the gateway use [`CheckpointEngine::send_message`], which runs both halves.

use std::sync::Arc;

use chat_model::{AgentGateway, ChatTurn, Checkpoint, GatewayError, GatewayProfile, Message};
use conversation_store::{Action, ConversationState, ConversationStore};
use tracing::{debug, info, warn};

/// Text sent by [`CheckpointEngine::approve_plan`].
pub const APPROVE_PLAN_MESSAGE: &str =
    "I approve this plan. Please proceed with the implementation.";

/// How the assistant reply is requested from the gateway.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Delivery {
    /// One request, one full reply.
    #[default]
    Complete,
    /// Incremental chunks patched into the placeholder as they arrive.
    Stream,
}

/// Progress of a reply between [`CheckpointEngine::begin_send`] and
/// [`CheckpointEngine::finish_send`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyProgress<'a> {
    /// The user message and the placeholder are in the log; the request is about to go out.
    Started,
    /// A streamed chunk was patched into the placeholder.
    Chunk(&'a str),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input; nothing was dispatched.
    Ignored,
    /// A request is already in flight.
    Busy,
    Completed {
        message_id: String,
        checkpoint_id: String,
    },
    Failed {
        error: String,
    },
    /// The reply arrived after its placeholder or conversation went away.
    Discarded,
}

/// A request started by [`CheckpointEngine::begin_send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    pub placeholder_id: String,
    pub conversation_id: String,
    pub turns: Vec<ChatTurn>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeginSend {
    Started(PendingReply),
    Rejected(SendOutcome),
}

pub struct CheckpointEngine {
    store: ConversationStore,
    gateway: Arc<dyn AgentGateway>,
    delivery: Delivery,
}

impl CheckpointEngine {
    pub fn new(store: ConversationStore, gateway: Arc<dyn AgentGateway>) -> Self {
        Self {
            store,
            gateway,
            delivery: Delivery::default(),
        }
    }

    #[must_use]
    pub fn with_delivery(mut self, delivery: Delivery) -> Self {
        self.delivery = delivery;
        self
    }

    pub fn delivery(&self) -> Delivery {
        self.delivery
    }

    pub fn state(&self) -> &ConversationState {
        self.store.state()
    }

    pub fn gateway_profile(&self) -> GatewayProfile {
        self.gateway.profile()
    }

    /// Sends `text` and blocks until the reply is applied.
    pub fn send_message(&mut self, text: &str) -> SendOutcome {
        self.send_message_with(text, &mut |_| {})
    }

    /// Like [`Self::send_message`], forwarding streamed chunks to `on_chunk`.
    ///
    /// Chunks are only produced in [`Delivery::Stream`] mode.
    pub fn send_message_with(&mut self, text: &str, on_chunk: &mut dyn FnMut(&str)) -> SendOutcome {
        self.send_message_observed(text, &mut |progress, _| {
            if let ReplyProgress::Chunk(chunk) = progress {
                on_chunk(chunk);
            }
        })
    }

    /// Like [`Self::send_message`], reporting each [`ReplyProgress`] together
    /// with the state it produced.
    pub fn send_message_observed(
        &mut self,
        text: &str,
        observer: &mut dyn FnMut(ReplyProgress<'_>, &ConversationState),
    ) -> SendOutcome {
        let pending = match self.begin_send(text) {
            BeginSend::Started(pending) => pending,
            BeginSend::Rejected(outcome) => return outcome,
        };
        observer(ReplyProgress::Started, self.state());

        let result = match self.delivery {
            Delivery::Complete => self.gateway.complete(&pending.turns),
            Delivery::Stream => self.stream_into_placeholder(&pending, observer),
        };

        self.finish_send(pending, result)
    }

    /// Appends the user message and placeholder and marks the store loading.
    pub fn begin_send(&mut self, text: &str) -> BeginSend {
        let text = text.trim();
        if text.is_empty() {
            return BeginSend::Rejected(SendOutcome::Ignored);
        }
        if self.state().is_loading {
            debug!("rejecting submission while a request is in flight");
            return BeginSend::Rejected(SendOutcome::Busy);
        }

        if self.state().error.is_some() {
            self.store.dispatch(Action::ClearError);
        }
        self.store.dispatch(Action::AppendMessage(Message::user(text)));
        self.store.dispatch(Action::BeginLoad);

        // The placeholder is appended after the snapshot of turns so it is never sent.
        let turns = self
            .state()
            .messages
            .iter()
            .map(Message::to_turn)
            .collect();
        let placeholder = Message::placeholder();
        let placeholder_id = placeholder.id.clone();
        self.store.dispatch(Action::AppendMessage(placeholder));

        BeginSend::Started(PendingReply {
            placeholder_id,
            conversation_id: self.state().conversation_id.clone(),
            turns,
        })
    }

    /// Applies the gateway result for a request started by [`Self::begin_send`].
    pub fn finish_send(
        &mut self,
        pending: PendingReply,
        result: Result<String, GatewayError>,
    ) -> SendOutcome {
        if self.is_stale(&pending) {
            info!(
                placeholder_id = %pending.placeholder_id,
                "discarding reply for a conversation that moved on"
            );
            if self.state().is_loading {
                self.store.dispatch(Action::EndLoad);
            }
            return SendOutcome::Discarded;
        }

        match result {
            Ok(content) => {
                self.store.dispatch(Action::UpdateMessageContent {
                    id: pending.placeholder_id.clone(),
                    content,
                });
                let checkpoint = Checkpoint::after(&pending.placeholder_id);
                let checkpoint_id = checkpoint.id.clone();
                self.store.dispatch(Action::RecordCheckpoint(checkpoint));
                self.store.dispatch(Action::EndLoad);
                debug!(message_id = %pending.placeholder_id, %checkpoint_id, "reply recorded");

                SendOutcome::Completed {
                    message_id: pending.placeholder_id,
                    checkpoint_id,
                }
            }
            Err(error) => {
                warn!(status = ?error.status(), "agent request failed: {error}");
                // Streamed partial text is dropped so the failed reply renders as empty.
                let partial = self
                    .state()
                    .message(&pending.placeholder_id)
                    .is_some_and(|message| !message.content.is_empty());
                if partial {
                    self.store.dispatch(Action::UpdateMessageContent {
                        id: pending.placeholder_id,
                        content: String::new(),
                    });
                }
                let error = error.message().to_string();
                self.store.dispatch(Action::SetError(error.clone()));
                SendOutcome::Failed { error }
            }
        }
    }

    /// Sends the fixed plan approval message.
    pub fn approve_plan(&mut self) -> SendOutcome {
        self.send_message(APPROVE_PLAN_MESSAGE)
    }

    /// Truncates the log back to the checkpoint's anchor. No network call.
    pub fn rollback_to_checkpoint(&mut self, checkpoint_id: &str) {
        self.store.dispatch(Action::rollback(checkpoint_id));
    }

    /// Starts a fresh conversation with a new id.
    pub fn reset_conversation(&mut self) {
        self.store.dispatch(Action::reset());
    }

    pub fn clear_error(&mut self) {
        self.store.dispatch(Action::ClearError);
    }

    pub fn available_models(&self, provider: &str) -> Result<Vec<String>, GatewayError> {
        self.gateway.list_models(provider)
    }

    fn is_stale(&self, pending: &PendingReply) -> bool {
        let state = self.state();
        state.conversation_id != pending.conversation_id
            || state.message(&pending.placeholder_id).is_none()
    }

    fn stream_into_placeholder(
        &mut self,
        pending: &PendingReply,
        observer: &mut dyn FnMut(ReplyProgress<'_>, &ConversationState),
    ) -> Result<String, GatewayError> {
        let gateway = Arc::clone(&self.gateway);
        let store = &mut self.store;
        let mut accumulated = String::new();

        gateway.stream(&pending.turns, &mut |chunk| {
            accumulated.push_str(chunk);
            store.dispatch(Action::UpdateMessageContent {
                id: pending.placeholder_id.clone(),
                content: accumulated.clone(),
            });
            observer(ReplyProgress::Chunk(chunk), store.state());
        })
    }
}
