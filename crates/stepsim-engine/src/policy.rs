use stepsim_config::SimulationConfig;

/// Parameters of the two-tier (night/day) activity model.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityPolicy {
    /// A tick is active when its roll exceeds this during the day.
    pub day_threshold: f64,
    /// A tick is active when its roll exceeds this during the night.
    pub night_threshold: f64,
    /// Night window `[start, end)` in local hours; wraps past midnight when
    /// `start > end`.
    pub night_start_hour: u32,
    pub night_end_hour: u32,
    /// Share of active ticks classified as running.
    pub running_probability: f64,
}

impl Default for ActivityPolicy {
    fn default() -> Self {
        ActivityPolicy::from_config(&SimulationConfig::default())
    }
}

impl ActivityPolicy {
    pub fn from_config(config: &SimulationConfig) -> Self {
        ActivityPolicy {
            day_threshold: config.day_threshold,
            night_threshold: config.night_threshold,
            night_start_hour: config.night_start_hour,
            night_end_hour: config.night_end_hour,
            running_probability: config.running_probability,
        }
    }

    pub fn is_night(&self, hour: u32) -> bool {
        if self.night_start_hour <= self.night_end_hour {
            hour >= self.night_start_hour && hour < self.night_end_hour
        } else {
            hour >= self.night_start_hour || hour < self.night_end_hour
        }
    }

    pub fn threshold_for(&self, hour: u32) -> f64 {
        if self.is_night(hour) {
            self.night_threshold
        } else {
            self.day_threshold
        }
    }

    /// Rolls above this value classify an active tick as running.
    pub fn running_cutoff(&self) -> f64 {
        1.0 - self.running_probability
    }
}
