use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::error::StoreError;
use crate::store::StateStore;
use crate::types::StepState;

/// In-memory store for tests. Writes can be switched to fail to exercise the
/// storage-write error path.
pub struct MemoryStore {
    state: RwLock<Option<StepState>>,
    fail_writes: AtomicBool,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            state: RwLock::new(None),
            fail_writes: AtomicBool::new(false),
            writes: AtomicU64::new(0),
        }
    }

    pub fn with_state(state: StepState) -> Self {
        let store = MemoryStore::new();
        *store.state.write().unwrap_or_else(|e| e.into_inner()) = Some(state);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful writes so far.
    pub fn write_count(&self) -> u64 {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current document without creating one.
    pub fn peek(&self) -> Option<StepState> {
        self.state.read().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn ensure(&self) -> Result<(), StoreError> {
        let mut state = self.state.write().unwrap_or_else(|e| e.into_inner());
        if state.is_none() {
            *state = Some(StepState::fresh());
        }
        Ok(())
    }

    async fn load(&self) -> Result<StepState, StoreError> {
        self.ensure().await?;
        Ok(self.peek().unwrap_or_default())
    }

    async fn save(&self, state: &StepState) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Write {
                path: "memory".into(),
                source: std::io::Error::other("injected write failure"),
            });
        }
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = Some(state.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
