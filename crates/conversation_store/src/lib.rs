mod error;
mod paths;
mod snapshot;
mod state;
mod store;

pub use error::StoreError;
pub use paths::{default_snapshot_path, snapshot_file_name, state_root, STORAGE_KEY};
pub use snapshot::{FileSnapshotSink, MemorySnapshotSink, Snapshot, SnapshotSink};
pub use state::{reduce, Action, ConversationState};
pub use store::ConversationStore;
