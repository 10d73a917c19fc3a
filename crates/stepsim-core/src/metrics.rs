use serde::Serialize;

/// Kilometres per step.
const KM_PER_STEP: f64 = 0.0007;
/// Kilocalories per step.
const KCAL_PER_STEP: f64 = 0.04;

/// Distance and calories derived from a step count. Never persisted; every
/// reporter computes it through [`DerivedMetrics::from_steps`] so the values
/// agree bit for bit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedMetrics {
    /// Kilometres, rounded to two decimals.
    pub distance: f64,
    /// Kilocalories, floored.
    pub calories: u64,
}

impl DerivedMetrics {
    pub fn from_steps(steps: u64) -> Self {
        DerivedMetrics {
            distance: distance_km(steps),
            calories: calories_kcal(steps),
        }
    }
}

pub fn distance_km(steps: u64) -> f64 {
    let raw = steps as f64 * KM_PER_STEP;
    // Rounds the exact binary value to two places, like a fixed-point formatter.
    format!("{:.2}", raw).parse().unwrap_or(raw)
}

pub fn calories_kcal(steps: u64) -> u64 {
    (steps as f64 * KCAL_PER_STEP).floor() as u64
}
