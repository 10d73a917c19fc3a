use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Which operations a Tool Gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ToolSetName {
    /// get_steps, update_steps, reset_steps, get_step_status
    #[default]
    Full,
    /// get_wechat_steps only
    Wechat,
}

impl std::str::FromStr for ToolSetName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "full" => Ok(ToolSetName::Full),
            "wechat" => Ok(ToolSetName::Wechat),
            other => Err(format!("unknown tool set '{}' (expected full or wechat)", other)),
        }
    }
}

/// Shared state file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Path of the shared JSON document.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            path: "step-data.json".to_string(),
        }
    }
}

/// Simulation engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SimulationConfig {
    /// Period of the activity tick.
    pub tick_interval_ms: u64,
    /// Period of the history sampler.
    pub history_interval_secs: u64,
    /// Maximum number of history points retained.
    pub history_capacity: usize,
    /// Probability threshold above which a daytime tick is active.
    pub day_threshold: f64,
    /// Probability threshold above which a night-time tick is active.
    pub night_threshold: f64,
    /// First hour (inclusive) of the night window.
    pub night_start_hour: u32,
    /// Last hour (exclusive) of the night window.
    pub night_end_hour: u32,
    /// Chance that an active tick is classified as running.
    pub running_probability: f64,
    /// Per-instance snapshot file (steps, date marker, history).
    pub local_state_path: String,
    /// Fixed RNG seed; entropy is used when absent.
    pub seed: Option<u64>,
    /// Start with the simulation paused.
    pub start_paused: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            tick_interval_ms: 2000,
            history_interval_secs: 300,
            history_capacity: 24,
            day_threshold: 0.6,
            night_threshold: 0.95,
            night_start_hour: 0,
            night_end_hour: 6,
            running_probability: 0.2,
            local_state_path: ".stepsim/local-state.json".to_string(),
            seed: None,
            start_paused: false,
        }
    }
}

impl SimulationConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn history_interval(&self) -> Duration {
        Duration::from_secs(self.history_interval_secs)
    }

    pub fn local_state_path(&self) -> PathBuf {
        PathBuf::from(&self.local_state_path)
    }
}

/// Synchronization bridge settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct SyncConfig {
    /// Base URL of the sync endpoint (e.g. `http://127.0.0.1:3001`).
    /// When unset the bridge writes the shared file directly.
    pub endpoint: Option<String>,
}

/// Local sync endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 3001,
        }
    }
}

/// Tool Gateway settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GatewayConfig {
    /// Remote WebSocket endpoint the outbound connector dials.
    pub ws_endpoint: Option<String>,
    /// Constant delay between reconnect attempts.
    pub reconnect_delay_secs: u64,
    /// Operation allow-list.
    pub tools: ToolSetName,
    /// Address the local WebSocket listener binds.
    pub listen: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            ws_endpoint: None,
            reconnect_delay_secs: 5,
            tools: ToolSetName::Full,
            listen: "127.0.0.1:3002".to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }
}

/// Root configuration document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct StepSimConfig {
    pub store: StoreConfig,
    pub simulation: SimulationConfig,
    pub sync: SyncConfig,
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
}

impl StepSimConfig {
    pub fn store_path(&self) -> PathBuf {
        PathBuf::from(&self.store.path)
    }
}
