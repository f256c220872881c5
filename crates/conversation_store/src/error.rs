use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error while {operation} at {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse conversation snapshot at {path}: {source}")]
    SnapshotParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse in-memory conversation snapshot: {0}")]
    MemorySnapshotParse(#[source] serde_json::Error),

    #[error("failed to serialize conversation snapshot: {0}")]
    SnapshotSerialize(#[source] serde_json::Error),
}

impl StoreError {
    #[must_use]
    pub fn io(operation: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            operation,
            path: path.into(),
            source,
        }
    }

    #[must_use]
    pub fn snapshot_parse(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::SnapshotParse {
            path: path.into(),
            source,
        }
    }
}
