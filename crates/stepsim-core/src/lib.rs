mod error;
mod memory;
mod metrics;
mod store;
mod time;
mod types;
mod update;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use metrics::DerivedMetrics;
pub use store::{JsonFileStore, SharedStore, StateStore};
pub use time::{history_label, now_timestamp, timestamp_at};
pub use types::{ActivityStatus, HistoryPoint, HistorySeries, StepState, DEFAULT_HISTORY_CAPACITY};
pub use update::StepUpdate;
