use std::path::{Path, PathBuf};

/// Fixed key the conversation snapshot is stored under.
pub const STORAGE_KEY: &str = "agentConversation";

pub const STATE_DIR: &str = ".agent";

#[must_use]
pub fn state_root(cwd: &Path) -> PathBuf {
    cwd.join(STATE_DIR)
}

#[must_use]
pub fn snapshot_file_name() -> String {
    format!("{STORAGE_KEY}.json")
}

/// Default snapshot location for a working directory.
#[must_use]
pub fn default_snapshot_path(cwd: &Path) -> PathBuf {
    state_root(cwd).join(snapshot_file_name())
}
