use std::path::PathBuf;

use crate::types::StepSimConfig;
use crate::ConfigError;

/// Overrides the shared state file path.
pub const STORE_PATH_ENV: &str = "STEP_FILE_PATH";
/// Overrides the remote WebSocket endpoint.
pub const ENDPOINT_ENV: &str = "MCP_WS_ENDPOINT";
/// Overrides the sync endpoint listen port.
pub const PORT_ENV: &str = "STEP_SERVER_PORT";
/// Points at a configuration file.
pub const CONFIG_ENV: &str = "STEPSIM_CONFIG";

impl StepSimConfig {
    /// Apply the process environment on top of the loaded file.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from an arbitrary lookup. Only presence is checked;
    /// the port is the one value that has to parse.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(STORE_PATH_ENV) {
            self.store.path = path;
        }
        if let Some(endpoint) = lookup(ENDPOINT_ENV) {
            self.gateway.ws_endpoint = Some(endpoint);
        }
        if let Some(port) = lookup(PORT_ENV) {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnvValue(PORT_ENV.to_string(), port.clone()))?;
        }
        Ok(())
    }
}

/// Locate a configuration file: `STEPSIM_CONFIG`, then `stepsim.yaml` in the
/// working directory.
pub fn find_config() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(CONFIG_ENV) {
        let path = PathBuf::from(path);
        if path.exists() {
            return Some(path);
        }
    }

    let cwd_config = PathBuf::from("stepsim.yaml");
    if cwd_config.exists() {
        return Some(cwd_config);
    }

    None
}
