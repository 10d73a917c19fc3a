mod defaults;
mod env;
pub mod types;
mod validation;

use std::path::Path;

pub use defaults::{find_config, CONFIG_ENV, ENDPOINT_ENV, PORT_ENV, STORE_PATH_ENV};
pub use types::*;

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Missing environment variables: {0:?}")]
    MissingEnvVars(Vec<String>),

    #[error("Environment variable {0} has an invalid value: {1}")]
    InvalidEnvValue(String, String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl StepSimConfig {
    /// Parse a configuration from a YAML string.
    /// Environment variables in the format `${VAR_NAME}` will be interpolated.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let interpolated = env::interpolate_env(yaml)?;

        // An empty document deserializes to unit, not to a mapping
        if interpolated.trim().is_empty() {
            return Ok(StepSimConfig::default());
        }

        let config: StepSimConfig = serde_yaml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Load a configuration from a file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Load the configuration the way every `stepsim` process does: the given
    /// file (or the discovered one, or built-in defaults), then environment
    /// overrides, then validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let discovered = match path {
            Some(p) => Some(p.to_path_buf()),
            None => find_config(),
        };

        let mut config = match discovered {
            Some(p) => Self::from_file(&p)?,
            None => StepSimConfig::default(),
        };
        config.apply_env_overrides()?;
        config.validate_or_err()?;
        Ok(config)
    }
}
