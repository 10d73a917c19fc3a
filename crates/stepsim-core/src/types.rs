use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::time::now_timestamp;

/// Number of history samples kept by default: two hours at five-minute resolution.
pub const DEFAULT_HISTORY_CAPACITY: usize = 24;

/// Last observed activity classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum ActivityStatus {
    #[default]
    Idle,
    Walking,
    Running,
}

impl ActivityStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActivityStatus::Idle => "IDLE",
            ActivityStatus::Walking => "WALKING",
            ActivityStatus::Running => "RUNNING",
        }
    }

    pub fn all() -> [ActivityStatus; 3] {
        [ActivityStatus::Idle, ActivityStatus::Walking, ActivityStatus::Running]
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "IDLE" => Ok(ActivityStatus::Idle),
            "WALKING" => Ok(ActivityStatus::Walking),
            "RUNNING" => Ok(ActivityStatus::Running),
            other => Err(format!(
                "invalid status '{}' (expected IDLE, WALKING or RUNNING)",
                other
            )),
        }
    }
}

/// The shared document every process reads and writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepState {
    pub steps: u64,
    #[serde(default)]
    pub status: ActivityStatus,
    #[serde(default = "now_timestamp")]
    pub timestamp: String,
}

impl StepState {
    /// `{steps: 0, status: IDLE, timestamp: now}`.
    pub fn fresh() -> Self {
        StepState::new(0, ActivityStatus::Idle)
    }

    /// A state stamped with the current time.
    pub fn new(steps: u64, status: ActivityStatus) -> Self {
        StepState {
            steps,
            status,
            timestamp: now_timestamp(),
        }
    }
}

impl Default for StepState {
    fn default() -> Self {
        StepState::fresh()
    }
}

/// One sampled point of the trend series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// Local wall-clock label, `HH:MM`.
    pub time: String,
    pub steps: u64,
}

/// Bounded, insertion-ordered series of history points. Appending past the
/// capacity evicts from the front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistorySeries {
    points: VecDeque<HistoryPoint>,
    capacity: usize,
}

impl HistorySeries {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        HistorySeries {
            points: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild from persisted points, keeping only the most recent `capacity`.
    pub fn from_points(points: Vec<HistoryPoint>, capacity: usize) -> Self {
        let mut series = HistorySeries::new(capacity);
        for point in points {
            series.push(point);
        }
        series
    }

    pub fn push(&mut self, point: HistoryPoint) {
        self.points.push_back(point);
        while self.points.len() > self.capacity {
            self.points.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryPoint> {
        self.points.iter()
    }

    pub fn latest(&self) -> Option<&HistoryPoint> {
        self.points.back()
    }

    pub fn to_vec(&self) -> Vec<HistoryPoint> {
        self.points.iter().cloned().collect()
    }
}

impl Default for HistorySeries {
    fn default() -> Self {
        HistorySeries::new(DEFAULT_HISTORY_CAPACITY)
    }
}

impl Serialize for HistorySeries {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.points.iter())
    }
}

impl<'de> Deserialize<'de> for HistorySeries {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let points = Vec::<HistoryPoint>::deserialize(deserializer)?;
        Ok(HistorySeries::from_points(points, DEFAULT_HISTORY_CAPACITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(i: u64) -> HistoryPoint {
        HistoryPoint {
            time: format!("{:02}:{:02}", i / 12, (i % 12) * 5),
            steps: i * 10,
        }
    }

    #[test]
    fn test_status_wire_format() {
        let json = serde_json::to_string(&ActivityStatus::Walking).unwrap();
        assert_eq!(json, "\"WALKING\"");
        let parsed: ActivityStatus = serde_json::from_str("\"RUNNING\"").unwrap();
        assert_eq!(parsed, ActivityStatus::Running);
        assert!(serde_json::from_str::<ActivityStatus>("\"UNKNOWN\"").is_err());
    }

    #[test]
    fn test_status_from_str() {
        for status in ActivityStatus::all() {
            assert_eq!(status.as_str().parse::<ActivityStatus>(), Ok(status));
        }
        assert!("walking".parse::<ActivityStatus>().is_err());
    }

    #[test]
    fn test_fresh_state() {
        let state = StepState::fresh();
        assert_eq!(state.steps, 0);
        assert_eq!(state.status, ActivityStatus::Idle);
        assert!(state.timestamp.ends_with('Z'));
    }

    #[test]
    fn test_state_missing_status_defaults_idle() {
        let state: StepState =
            serde_json::from_str(r#"{"steps": 12, "timestamp": "2026-10-19T00:00:00.000Z"}"#)
                .unwrap();
        assert_eq!(state.steps, 12);
        assert_eq!(state.status, ActivityStatus::Idle);
    }

    #[test]
    fn test_state_negative_steps_rejected() {
        assert!(serde_json::from_str::<StepState>(r#"{"steps": -4}"#).is_err());
    }

    #[test]
    fn test_history_evicts_oldest() {
        let mut series = HistorySeries::new(24);
        for i in 0..24 {
            series.push(point(i));
        }
        assert_eq!(series.len(), 24);

        series.push(point(24));
        assert_eq!(series.len(), 24);
        let first = series.iter().next().unwrap();
        assert_eq!(first, &point(1));
        assert_eq!(series.latest(), Some(&point(24)));
    }

    #[test]
    fn test_history_order_is_insertion_order() {
        let mut series = HistorySeries::new(5);
        for i in 0..40 {
            series.push(point(i));
            assert!(series.len() <= 5);
        }
        let steps: Vec<u64> = series.iter().map(|p| p.steps).collect();
        assert_eq!(steps, vec![350, 360, 370, 380, 390]);
    }

    #[test]
    fn test_history_from_points_truncates_front() {
        let points: Vec<_> = (0..30).map(point).collect();
        let series = HistorySeries::from_points(points, 24);
        assert_eq!(series.len(), 24);
        assert_eq!(series.iter().next(), Some(&point(6)));
    }

    #[test]
    fn test_history_serializes_as_array() {
        let mut series = HistorySeries::new(24);
        series.push(HistoryPoint {
            time: "09:05".to_string(),
            steps: 42,
        });
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json, serde_json::json!([{"time": "09:05", "steps": 42}]));

        let back: HistorySeries = serde_json::from_value(json).unwrap();
        assert_eq!(back, series);
    }
}
