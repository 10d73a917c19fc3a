//! Fire-and-forget propagation of the local state to the shared store.
//!
//! Every change spawns one detached submission. A newer change aborts the
//! previous submission if it is still in flight; failures are logged and
//! dropped, and nothing is retried until the next change.
//!
//! Aborting does not stop a write already handed to the blocking pool, so an
//! aborted submission may still land after its replacement. The state that
//! replaced it is therefore sent once more on the next call, even if
//! unchanged.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stepsim_core::{ActivityStatus, SharedStore, StepState, StoreError};
use tokio::task::JoinHandle;
use tracing::debug;

/// Request timeout for the sync endpoint.
const HTTP_TIMEOUT: Duration = Duration::from_secs(5);

/// What the simulator pushes on every change. The receiver stamps its own
/// timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateSubmission {
    pub steps: u64,
    pub status: ActivityStatus,
}

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Sync endpoint unreachable: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Sync endpoint rejected the submission with HTTP {0}")]
    Rejected(u16),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Destination of state submissions.
#[async_trait]
pub trait StateSink: Send + Sync + 'static {
    async fn submit(&self, submission: StateSubmission) -> Result<(), SyncError>;
}

/// Posts submissions to the local sync endpoint (`POST {base}/api/steps`).
pub struct HttpSink {
    client: reqwest::Client,
    url: String,
}

impl HttpSink {
    pub fn new(base_url: &str) -> Result<Self, SyncError> {
        let client = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;
        Ok(HttpSink {
            client,
            url: format!("{}/api/steps", base_url.trim_end_matches('/')),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl StateSink for HttpSink {
    async fn submit(&self, submission: StateSubmission) -> Result<(), SyncError> {
        let response = self.client.post(&self.url).json(&submission).send().await?;
        if !response.status().is_success() {
            return Err(SyncError::Rejected(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Writes submissions straight into a shared store.
pub struct StoreSink {
    store: SharedStore,
}

impl StoreSink {
    pub fn new(store: SharedStore) -> Self {
        StoreSink { store }
    }
}

#[async_trait]
impl StateSink for StoreSink {
    async fn submit(&self, submission: StateSubmission) -> Result<(), SyncError> {
        let state = StepState::new(submission.steps, submission.status);
        self.store.save(&state).await?;
        Ok(())
    }
}

pub struct SyncBridge {
    sink: Arc<dyn StateSink>,
    in_flight: Option<JoinHandle<()>>,
    last: Option<StateSubmission>,
    /// The last submission superseded another and must be confirmed.
    resend: bool,
}

impl SyncBridge {
    pub fn new(sink: Arc<dyn StateSink>) -> Self {
        SyncBridge {
            sink,
            in_flight: None,
            last: None,
            resend: false,
        }
    }

    /// Submit `submission` if it differs from the previous one. Never waits
    /// on the sink. Must be called from within a Tokio runtime.
    pub fn submit(&mut self, submission: StateSubmission) -> bool {
        if self.last == Some(submission) && !self.resend {
            return false;
        }

        let mut superseded = false;
        if let Some(previous) = self.in_flight.take() {
            if !previous.is_finished() {
                previous.abort();
                superseded = true;
                debug!("Superseded in-flight state submission");
            }
        }

        self.last = Some(submission);
        self.resend = superseded;

        let sink = Arc::clone(&self.sink);
        self.in_flight = Some(tokio::spawn(async move {
            if let Err(e) = sink.submit(submission).await {
                debug!("State sync failed (ignored): {}", e);
            }
        }));
        true
    }

    /// Wait for the latest submission to settle.
    pub async fn flush(&mut self) {
        if let Some(handle) = self.in_flight.take() {
            let _ = handle.await;
        }
    }

    pub fn last_submitted(&self) -> Option<StateSubmission> {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use stepsim_core::{MemoryStore, StateStore};
    use tokio::sync::Notify;

    fn walking(steps: u64) -> StateSubmission {
        StateSubmission {
            steps,
            status: ActivityStatus::Walking,
        }
    }

    /// Records submissions; optionally blocks until released.
    struct RecordingSink {
        seen: Mutex<Vec<StateSubmission>>,
        gate: Option<Arc<Notify>>,
    }

    #[async_trait]
    impl StateSink for RecordingSink {
        async fn submit(&self, submission: StateSubmission) -> Result<(), SyncError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.seen.lock().unwrap().push(submission);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_store_sink_writes_shared_state() {
        let store = Arc::new(MemoryStore::new());
        let mut bridge = SyncBridge::new(Arc::new(StoreSink::new(store.clone())));

        assert!(bridge.submit(walking(42)));
        bridge.flush().await;

        let state = store.load().await.unwrap();
        assert_eq!(state.steps, 42);
        assert_eq!(state.status, ActivityStatus::Walking);
    }

    #[tokio::test]
    async fn test_unchanged_state_not_resubmitted() {
        let store = Arc::new(MemoryStore::new());
        let mut bridge = SyncBridge::new(Arc::new(StoreSink::new(store.clone())));

        assert!(bridge.submit(walking(1)));
        bridge.flush().await;
        assert!(!bridge.submit(walking(1)));
        bridge.flush().await;

        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_newer_submission_aborts_stale_one() {
        let gate = Arc::new(Notify::new());
        let sink = Arc::new(RecordingSink {
            seen: Mutex::new(Vec::new()),
            gate: Some(gate.clone()),
        });
        let mut bridge = SyncBridge::new(sink.clone());

        bridge.submit(walking(1));
        tokio::task::yield_now().await;
        bridge.submit(walking(2));

        gate.notify_one();
        bridge.flush().await;

        assert_eq!(*sink.seen.lock().unwrap(), vec![walking(2)]);
    }

    #[tokio::test]
    async fn test_state_after_supersede_is_sent_again() {
        let gate = Arc::new(Notify::new());
        let sink = Arc::new(RecordingSink {
            seen: Mutex::new(Vec::new()),
            gate: Some(gate.clone()),
        });
        let mut bridge = SyncBridge::new(sink.clone());

        bridge.submit(walking(1));
        tokio::task::yield_now().await;
        bridge.submit(walking(2));
        gate.notify_one();
        bridge.flush().await;

        // A late write of the aborted state could have overwritten 2.
        assert!(bridge.submit(walking(2)));
        gate.notify_one();
        bridge.flush().await;
        assert!(!bridge.submit(walking(2)));

        assert_eq!(*sink.seen.lock().unwrap(), vec![walking(2), walking(2)]);
    }

    #[tokio::test]
    async fn test_failures_are_swallowed() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let mut bridge = SyncBridge::new(Arc::new(StoreSink::new(store.clone())));

        bridge.submit(walking(5));
        bridge.flush().await;

        assert_eq!(store.write_count(), 0);
        assert_eq!(bridge.last_submitted(), Some(walking(5)));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_swallowed() {
        // Port 9 (discard) on loopback is closed in test environments
        let sink = HttpSink::new("http://127.0.0.1:9/").unwrap();
        assert_eq!(sink.url(), "http://127.0.0.1:9/api/steps");
        assert!(sink.submit(walking(1)).await.is_err());

        let mut bridge = SyncBridge::new(Arc::new(sink));
        bridge.submit(walking(1));
        bridge.flush().await;
    }
}
