//! In-memory mirror of the step state and the per-tick activity model.

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use stepsim_core::{history_label, ActivityStatus, HistoryPoint, HistorySeries, StepState};
use tracing::{debug, info};

use crate::bridge::StateSubmission;
use crate::local_store::LocalSnapshot;
use crate::policy::ActivityPolicy;
use crate::roll::Roll;

/// Running adds `floor(r * 8) + 4` steps: 4..=11.
const RUNNING_MIN: u64 = 4;
const RUNNING_SPAN: f64 = 8.0;
/// Walking adds `floor(r * 3) + 1` steps: 1..=3.
const WALKING_MIN: u64 = 1;
const WALKING_SPAN: f64 = 3.0;

/// What a single tick decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Simulation paused; status forced to idle.
    Paused,
    /// No activity this tick.
    Idle,
    /// Activity occurred.
    Active { status: ActivityStatus, added: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    /// A new calendar day was detected before the mutation was applied.
    pub day_reset: bool,
    pub outcome: TickOutcome,
}

/// The simulation engine's local state: steps, status, history and the
/// calendar-date marker used by the day-boundary policy.
#[derive(Debug, Clone)]
pub struct Engine {
    policy: ActivityPolicy,
    steps: u64,
    status: ActivityStatus,
    history: HistorySeries,
    date: NaiveDate,
    simulating: bool,
}

impl Engine {
    pub fn new(policy: ActivityPolicy, history_capacity: usize, today: NaiveDate) -> Self {
        Engine {
            policy,
            steps: 0,
            status: ActivityStatus::Idle,
            history: HistorySeries::new(history_capacity),
            date: today,
            simulating: true,
        }
    }

    /// Cold start from a persisted snapshot. A snapshot from another day is
    /// discarded, which is the load-time half of the day-boundary policy.
    pub fn restore(
        policy: ActivityPolicy,
        history_capacity: usize,
        snapshot: Option<LocalSnapshot>,
        today: NaiveDate,
    ) -> Self {
        let mut engine = Engine::new(policy, history_capacity, today);
        match snapshot {
            Some(snapshot) if snapshot.date == today => {
                engine.steps = snapshot.steps;
                engine.history = HistorySeries::from_points(snapshot.history, history_capacity);
                debug!("Restored {} steps from local snapshot", engine.steps);
            }
            Some(snapshot) => {
                info!(
                    "Local snapshot is from {}, starting {} at zero",
                    snapshot.date, today
                );
            }
            None => {}
        }
        engine
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn status(&self) -> ActivityStatus {
        self.status
    }

    pub fn history(&self) -> &HistorySeries {
        &self.history
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn policy(&self) -> &ActivityPolicy {
        &self.policy
    }

    pub fn is_simulating(&self) -> bool {
        self.simulating
    }

    pub fn set_simulating(&mut self, simulating: bool) {
        self.simulating = simulating;
    }

    /// Reset steps and history if `today` differs from the stored marker.
    /// Returns whether a reset happened; repeated calls on the same day are
    /// no-ops.
    pub fn check_day_boundary(&mut self, today: NaiveDate) -> bool {
        if today == self.date {
            return false;
        }
        info!("New day {} (was {}), resetting steps and history", today, self.date);
        self.steps = 0;
        self.history.clear();
        self.date = today;
        true
    }

    /// Advance the activity model by one tick at local time `now`.
    ///
    /// The day-boundary check runs before the stochastic mutation so an
    /// increment is never erased by a reset that logically preceded it.
    pub fn tick(&mut self, roll: &mut impl Roll, now: NaiveDateTime) -> Tick {
        if !self.simulating {
            self.status = ActivityStatus::Idle;
            return Tick {
                day_reset: false,
                outcome: TickOutcome::Paused,
            };
        }

        let day_reset = self.check_day_boundary(now.date());

        let threshold = self.policy.threshold_for(now.hour());
        if roll.roll() <= threshold {
            self.status = ActivityStatus::Idle;
            return Tick {
                day_reset,
                outcome: TickOutcome::Idle,
            };
        }

        let running = roll.roll() > self.policy.running_cutoff();
        let (status, added) = if running {
            (
                ActivityStatus::Running,
                (roll.roll() * RUNNING_SPAN).floor() as u64 + RUNNING_MIN,
            )
        } else {
            (
                ActivityStatus::Walking,
                (roll.roll() * WALKING_SPAN).floor() as u64 + WALKING_MIN,
            )
        };

        self.status = status;
        self.steps = self.steps.saturating_add(added);

        Tick {
            day_reset,
            outcome: TickOutcome::Active { status, added },
        }
    }

    /// Append the current step count to the history series.
    pub fn sample_history(&mut self, now: NaiveDateTime) {
        self.history.push(HistoryPoint {
            time: history_label(now),
            steps: self.steps,
        });
    }

    /// Manual relative adjustment, clamped at zero.
    pub fn add_steps(&mut self, delta: i64) {
        self.steps = clamp_steps(self.steps as i128 + delta as i128);
    }

    /// Manual absolute set, clamped at zero.
    pub fn set_steps(&mut self, value: i64) {
        self.steps = clamp_steps(value as i128);
    }

    /// The current state as a shared document, stamped now.
    pub fn state(&self) -> StepState {
        StepState::new(self.steps, self.status)
    }

    pub fn snapshot(&self) -> LocalSnapshot {
        LocalSnapshot {
            steps: self.steps,
            date: self.date,
            history: self.history.to_vec(),
        }
    }

    pub fn submission(&self) -> StateSubmission {
        StateSubmission {
            steps: self.steps,
            status: self.status,
        }
    }
}

fn clamp_steps(value: i128) -> u64 {
    value.clamp(0, u64::MAX as i128) as u64
}
