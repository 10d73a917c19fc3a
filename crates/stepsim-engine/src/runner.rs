//! Scheduled driver for the engine: the activity tick, the history sampler,
//! local persistence and the sync bridge.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use stepsim_config::SimulationConfig;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::bridge::{StateSink, SyncBridge};
use crate::engine::{Engine, Tick, TickOutcome};
use crate::local_store::LocalStore;
use crate::policy::ActivityPolicy;
use crate::roll::{RngRoll, Roll};

pub struct Simulator<R: Roll = RngRoll<ChaCha8Rng>> {
    engine: Engine,
    roll: R,
    local: LocalStore,
    bridge: SyncBridge,
    tick_interval: Duration,
    history_interval: Duration,
}

impl Simulator<RngRoll<ChaCha8Rng>> {
    /// Build a simulator from configuration, restoring today's local
    /// snapshot if there is one.
    pub fn from_config(config: &SimulationConfig, sink: Arc<dyn StateSink>) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        let local = LocalStore::new(config.local_state_path());
        let snapshot = match local.load() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                warn!("{}; starting from an empty local state", e);
                None
            }
        };

        let mut engine = Engine::restore(
            ActivityPolicy::from_config(config),
            config.history_capacity,
            snapshot,
            Local::now().date_naive(),
        );
        engine.set_simulating(!config.start_paused);

        Simulator::new(
            engine,
            RngRoll(rng),
            local,
            sink,
            config.tick_interval(),
            config.history_interval(),
        )
    }
}

impl<R: Roll> Simulator<R> {
    pub fn new(
        engine: Engine,
        roll: R,
        local: LocalStore,
        sink: Arc<dyn StateSink>,
        tick_interval: Duration,
        history_interval: Duration,
    ) -> Self {
        Simulator {
            engine,
            roll,
            local,
            bridge: SyncBridge::new(sink),
            tick_interval,
            history_interval,
        }
    }

    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    /// One activity tick at local time `now`.
    pub fn on_tick(&mut self, now: NaiveDateTime) -> Tick {
        let tick = self.engine.tick(&mut self.roll, now);
        if let TickOutcome::Active { status, added } = tick.outcome {
            debug!("{} +{} -> {} steps", status, added, self.engine.steps());
        }
        if tick.day_reset || matches!(tick.outcome, TickOutcome::Active { .. }) {
            self.persist_local();
        }
        self.sync();
        tick
    }

    /// One history sample at local time `now`.
    pub fn on_sample(&mut self, now: NaiveDateTime) {
        self.engine.sample_history(now);
        self.persist_local();
    }

    pub fn add_steps(&mut self, delta: i64) {
        self.engine.add_steps(delta);
        self.persist_local();
        self.sync();
    }

    pub fn set_steps(&mut self, value: i64) {
        self.engine.set_steps(value);
        self.persist_local();
        self.sync();
    }

    pub fn set_simulating(&mut self, simulating: bool) {
        self.engine.set_simulating(simulating);
        info!("Simulation {}", if simulating { "resumed" } else { "paused" });
    }

    /// Drive the engine until `shutdown` resolves, then wait for the last
    /// in-flight submission.
    pub async fn run_until<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        info!(
            "Simulator started at {} steps (tick every {:?}, sample every {:?})",
            self.engine.steps(),
            self.tick_interval,
            self.history_interval
        );
        self.persist_local();
        self.sync();

        let start = Instant::now();
        let mut ticks = interval_at(start + self.tick_interval, self.tick_interval);
        ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut samples = interval_at(start + self.history_interval, self.history_interval);
        samples.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticks.tick() => {
                    self.on_tick(Local::now().naive_local());
                }
                _ = samples.tick() => {
                    self.on_sample(Local::now().naive_local());
                }
            }
        }

        self.bridge.flush().await;
        info!("Simulator stopped at {} steps", self.engine.steps());
    }

    fn sync(&mut self) {
        self.bridge.submit(self.engine.submission());
    }

    fn persist_local(&self) {
        if let Err(e) = self.local.save(&self.engine.snapshot()) {
            warn!("Failed to persist local state: {}", e);
        }
    }
}
