use crate::types::StepSimConfig;
use crate::ConfigError;

impl StepSimConfig {
    /// Validate the configuration and return a list of errors.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();
        let sim = &self.simulation;

        for (name, value) in [
            ("day_threshold", sim.day_threshold),
            ("night_threshold", sim.night_threshold),
            ("running_probability", sim.running_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                errors.push(ConfigError::InvalidConfig(format!(
                    "simulation.{} must be within [0, 1], got {}",
                    name, value
                )));
            }
        }

        if sim.tick_interval_ms == 0 {
            errors.push(ConfigError::InvalidConfig(
                "simulation.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        if sim.history_interval_secs == 0 {
            errors.push(ConfigError::InvalidConfig(
                "simulation.history_interval_secs must be greater than 0".to_string(),
            ));
        }
        if sim.history_capacity == 0 {
            errors.push(ConfigError::InvalidConfig(
                "simulation.history_capacity must be greater than 0".to_string(),
            ));
        }
        if sim.night_start_hour > 23 || sim.night_end_hour > 24 {
            errors.push(ConfigError::InvalidConfig(format!(
                "simulation night window {}..{} is not a valid hour range",
                sim.night_start_hour, sim.night_end_hour
            )));
        }

        if self.gateway.reconnect_delay_secs == 0 {
            errors.push(ConfigError::InvalidConfig(
                "gateway.reconnect_delay_secs must be greater than 0".to_string(),
            ));
        }

        errors
    }

    /// Validate and return Ok(()) if valid, or Err with the first error.
    pub fn validate_or_err(&self) -> Result<(), ConfigError> {
        match self.validate().into_iter().next() {
            None => Ok(()),
            Some(err) => Err(err),
        }
    }
}
