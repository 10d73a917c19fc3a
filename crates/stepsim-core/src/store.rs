use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::types::StepState;

/// The shared step document. Implementations perform no locking: each call is
/// an independent read or write, and concurrent writers race with
/// last-write-wins semantics.
#[async_trait]
pub trait StateStore: Send + Sync + 'static {
    /// Create the document with a fresh state if it does not exist.
    async fn ensure(&self) -> Result<(), StoreError> {
        Ok(())
    }

    /// Read and parse the current document.
    async fn load(&self) -> Result<StepState, StoreError>;

    /// Replace the document.
    async fn save(&self, state: &StepState) -> Result<(), StoreError>;

    /// The document as stored, without re-encoding where possible.
    async fn raw(&self) -> Result<String, StoreError> {
        let state = self.load().await?;
        Ok(serde_json::to_string_pretty(&state)?)
    }

    /// Human-readable location used in logs.
    fn describe(&self) -> String;

    /// Read the document, falling back to a fresh state when it is missing,
    /// unreadable or corrupt.
    async fn load_or_default(&self) -> StepState {
        match self.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!("{}; using a fresh step state", e);
                StepState::fresh()
            }
        }
    }
}

pub type SharedStore = Arc<dyn StateStore>;

/// Pretty-printed JSON file on local disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Write {
            path: self.path.clone(),
            source,
        }
    }

    async fn write_state(&self, state: &StepState) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(state)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| self.write_error(e))?;
        }
        // Plain overwrite: readers may observe a partially written file, which
        // they recover from like any other corrupt document.
        tokio::fs::write(&self.path, json)
            .await
            .map_err(|e| self.write_error(e))
    }
}

#[async_trait]
impl StateStore for JsonFileStore {
    async fn ensure(&self) -> Result<(), StoreError> {
        if let Ok(true) = tokio::fs::try_exists(&self.path).await {
            return Ok(());
        }
        debug!("Creating {}", self.path.display());
        self.write_state(&StepState::fresh()).await
    }

    async fn load(&self) -> Result<StepState, StoreError> {
        let content = self.raw().await?;
        serde_json::from_str(&content).map_err(|source| StoreError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    async fn save(&self, state: &StepState) -> Result<(), StoreError> {
        self.write_state(state).await
    }

    async fn raw(&self) -> Result<String, StoreError> {
        self.ensure().await?;
        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| StoreError::Read {
                path: self.path.clone(),
                source,
            })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
