use std::path::PathBuf;

/// Errors raised by a [`StateStore`](crate::StateStore).
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StoreError {
    /// The shared document could not be read.
    #[error("Failed to read step data from {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The shared document exists but is not a valid step state.
    #[error("Step data in {path} is corrupt: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// The shared document could not be written.
    #[error("Failed to write step data to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Serialization of an in-memory state failed.
    #[error("Failed to serialize step data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    /// Read-side failures are recovered by falling back to a fresh document.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, StoreError::Read { .. } | StoreError::Parse { .. })
    }
}
