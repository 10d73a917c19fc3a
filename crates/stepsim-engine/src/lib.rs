//! The simulation side of the step simulator: a periodic stochastic step
//! generator with a day-boundary reset, a bounded history sampler, a local
//! per-instance snapshot, and a fire-and-forget bridge to the shared store.

pub mod bridge;
pub mod engine;
pub mod local_store;
pub mod policy;
pub mod roll;
pub mod runner;

pub use bridge::{HttpSink, StateSink, StateSubmission, StoreSink, SyncBridge, SyncError};
pub use engine::{Engine, Tick, TickOutcome};
pub use local_store::{LocalSnapshot, LocalStore};
pub use policy::ActivityPolicy;
pub use roll::{RngRoll, Roll, ScriptedRolls};
pub use runner::Simulator;
