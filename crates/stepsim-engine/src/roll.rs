//! Sources of uniform values in `[0, 1)` for the activity model.

use std::collections::VecDeque;

use rand::Rng;

pub trait Roll {
    /// Next uniform value in `[0, 1)`.
    fn roll(&mut self) -> f64;
}

/// Adapts any `rand` generator.
pub struct RngRoll<R>(pub R);

impl<R: Rng> Roll for RngRoll<R> {
    fn roll(&mut self) -> f64 {
        self.0.gen::<f64>()
    }
}

/// Replays a fixed sequence, then yields `0.0` (an idle tick) forever.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRolls {
    values: VecDeque<f64>,
}

impl ScriptedRolls {
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        ScriptedRolls {
            values: values.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

impl Roll for ScriptedRolls {
    fn roll(&mut self) -> f64 {
        self.values.pop_front().unwrap_or(0.0)
    }
}
