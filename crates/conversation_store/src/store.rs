use std::mem;

use tracing::{debug, warn};

use crate::snapshot::{MemorySnapshotSink, Snapshot, SnapshotSink};
use crate::state::{reduce, Action, ConversationState};

/// Single-writer conversation container.
///
/// Every [`ConversationStore::dispatch`] applies one action and then writes a
/// full snapshot through the sink. Write failures are logged and otherwise
/// ignored: the sink is a cache, not the source of truth.
pub struct ConversationStore {
    state: ConversationState,
    sink: Box<dyn SnapshotSink>,
}

impl ConversationStore {
    /// Opens a store, hydrating from `sink` when it holds a valid snapshot.
    ///
    /// Missing or malformed data falls back to an empty state.
    pub fn open(sink: impl SnapshotSink + 'static) -> Self {
        let state = match sink.load() {
            Ok(Some(snapshot)) => {
                let state = snapshot.into_state();
                debug!(
                    conversation_id = %state.conversation_id,
                    messages = state.messages.len(),
                    checkpoints = state.checkpoints.len(),
                    "hydrated conversation snapshot"
                );
                state
            }
            Ok(None) => ConversationState::new(),
            Err(error) => {
                warn!("ignoring unreadable conversation snapshot: {error}");
                ConversationState::new()
            }
        };

        Self {
            state,
            sink: Box::new(sink),
        }
    }

    /// Store backed by a private in-memory sink.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::open(MemorySnapshotSink::new())
    }

    #[must_use]
    pub fn state(&self) -> &ConversationState {
        &self.state
    }

    /// Applies `action` and persists the resulting snapshot.
    pub fn dispatch(&mut self, action: Action) {
        let name = action.name();
        let current = mem::replace(
            &mut self.state,
            ConversationState::with_conversation_id(String::new()),
        );
        self.state = reduce(current, action);
        debug!(action = name, "applied conversation action");
        self.persist();
    }

    fn persist(&self) {
        if let Err(error) = self.sink.save(&Snapshot::of(&self.state)) {
            warn!("failed to persist conversation snapshot: {error}");
        }
    }
}
