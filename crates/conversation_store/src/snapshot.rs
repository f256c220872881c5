use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use chat_model::{Checkpoint, Message};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::state::ConversationState;

/// Persisted conversation blob, overwritten wholesale on every transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub checkpoints: Vec<Checkpoint>,
    #[serde(default)]
    pub conversation_id: Option<String>,
}

impl Snapshot {
    #[must_use]
    pub fn of(state: &ConversationState) -> Self {
        Self {
            messages: state.messages.clone(),
            checkpoints: state.checkpoints.clone(),
            conversation_id: Some(state.conversation_id.clone()),
        }
    }

    /// Rebuilds state from a snapshot.
    ///
    /// Loading and error flags are never persisted. Checkpoints whose anchor is
    /// missing, or that repeat an id or anchor, are dropped.
    #[must_use]
    pub fn into_state(self) -> ConversationState {
        let mut state = match self
            .conversation_id
            .filter(|conversation_id| !conversation_id.trim().is_empty())
        {
            Some(conversation_id) => ConversationState::with_conversation_id(conversation_id),
            None => ConversationState::new(),
        };
        state.messages = self.messages;

        for checkpoint in self.checkpoints {
            let anchored = state.message(&checkpoint.after_message_id).is_some();
            let duplicate = state.checkpoints.iter().any(|existing| {
                existing.id == checkpoint.id
                    || existing.after_message_id == checkpoint.after_message_id
            });
            if anchored && !duplicate {
                state.checkpoints.push(checkpoint);
            }
        }

        state
    }
}

/// Durable destination for conversation snapshots.
pub trait SnapshotSink: Send {
    /// Returns the stored snapshot, `None` when nothing was stored yet.
    fn load(&self) -> Result<Option<Snapshot>, StoreError>;

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError>;
}

/// Stores the snapshot as one JSON file.
///
/// Saves write a sibling temporary file and rename it over the target, so a
/// crash mid-write leaves the previous snapshot intact.
#[derive(Debug, Clone)]
pub struct FileSnapshotSink {
    path: PathBuf,
}

impl FileSnapshotSink {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn directory(&self) -> &Path {
        self.path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."))
    }

    /// Writes `raw` to a temporary file next to the target without replacing it.
    fn stage(&self, raw: &str) -> Result<NamedTempFile, StoreError> {
        let directory = self.directory();
        fs::create_dir_all(directory)
            .map_err(|source| StoreError::io("creating snapshot directory", directory, source))?;

        let mut staged = NamedTempFile::new_in(directory)
            .map_err(|source| StoreError::io("creating staged snapshot", directory, source))?;
        staged
            .write_all(raw.as_bytes())
            .and_then(|()| staged.as_file().sync_all())
            .map_err(|source| StoreError::io("writing staged snapshot", staged.path(), source))?;
        Ok(staged)
    }
}

impl SnapshotSink for FileSnapshotSink {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(error) => {
                return Err(StoreError::io("reading snapshot", &self.path, error));
            }
        };

        serde_json::from_str::<Snapshot>(&raw)
            .map(Some)
            .map_err(|source| StoreError::snapshot_parse(&self.path, source))
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot).map_err(StoreError::SnapshotSerialize)?;
        self.stage(&raw)?
            .persist(&self.path)
            .map_err(|error| StoreError::io("replacing snapshot", &self.path, error.error))?;
        Ok(())
    }
}

/// Shared in-memory blob, cloneable so a caller can inspect what was written.
#[derive(Debug, Clone, Default)]
pub struct MemorySnapshotSink {
    blob: Arc<Mutex<Option<String>>>,
}

impl MemorySnapshotSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a sink pre-seeded with raw (possibly malformed) JSON.
    #[must_use]
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            blob: Arc::new(Mutex::new(Some(raw.into()))),
        }
    }

    #[must_use]
    pub fn raw(&self) -> Option<String> {
        lock_unpoisoned(&self.blob).clone()
    }
}

impl SnapshotSink for MemorySnapshotSink {
    fn load(&self) -> Result<Option<Snapshot>, StoreError> {
        let Some(raw) = self.raw() else {
            return Ok(None);
        };

        serde_json::from_str::<Snapshot>(&raw)
            .map(Some)
            .map_err(StoreError::MemorySnapshotParse)
    }

    fn save(&self, snapshot: &Snapshot) -> Result<(), StoreError> {
        let raw = serde_json::to_string(snapshot).map_err(StoreError::SnapshotSerialize)?;
        *lock_unpoisoned(&self.blob) = Some(raw);
        Ok(())
    }
}

fn lock_unpoisoned<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
