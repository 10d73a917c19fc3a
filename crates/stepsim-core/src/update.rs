use crate::types::{ActivityStatus, StepState};

/// A requested mutation of the shared state.
///
/// Precedence: `steps` is an absolute set and wins over `add`; `add` is a
/// signed delta on the current value; with neither, steps are unchanged.
/// `status` replaces the stored status when present. The result is clamped
/// at zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StepUpdate {
    pub steps: Option<i64>,
    pub add: Option<i64>,
    pub status: Option<ActivityStatus>,
}

impl StepUpdate {
    pub fn set(steps: i64) -> Self {
        StepUpdate {
            steps: Some(steps),
            ..Default::default()
        }
    }

    pub fn add(delta: i64) -> Self {
        StepUpdate {
            add: Some(delta),
            ..Default::default()
        }
    }

    pub fn with_status(mut self, status: ActivityStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Resulting step count for a given current value.
    pub fn resolve_steps(&self, current: u64) -> u64 {
        let target = match (self.steps, self.add) {
            (Some(absolute), _) => absolute as i128,
            (None, Some(delta)) => current as i128 + delta as i128,
            (None, None) => current as i128,
        };
        target.clamp(0, u64::MAX as i128) as u64
    }

    /// Merge into `current`, stamping the result with `timestamp`.
    pub fn apply(&self, current: &StepState, timestamp: String) -> StepState {
        StepState {
            steps: self.resolve_steps(current.steps),
            status: self.status.unwrap_or(current.status),
            timestamp,
        }
    }
}
