//! Shared application state for the Axum server.

use std::sync::Arc;
use std::time::Instant;

use stepsim_core::SharedStore;

/// Shared state accessible to all route handlers.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Inner>,
}

struct Inner {
    store: SharedStore,
    started_at: Instant,
}

impl AppState {
    pub fn new(store: SharedStore) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                started_at: Instant::now(),
            }),
        }
    }

    /// The shared step document.
    pub fn store(&self) -> &SharedStore {
        &self.inner.store
    }

    pub fn uptime_secs(&self) -> u64 {
        self.inner.started_at.elapsed().as_secs()
    }
}
