//! MCP tool handler: the step-data operations against the shared store.

use std::collections::HashMap;

use serde_json::{json, Value};
use stepsim_config::ToolSetName;
use stepsim_core::{
    now_timestamp, ActivityStatus, DerivedMetrics, SharedStore, StepState, StepUpdate,
};
use tracing::{debug, info, warn};

use crate::error::GatewayError;
use crate::protocol::{McpToolDef, ToolCallResult};

/// Which operations a gateway exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolSet {
    /// get_steps, update_steps, reset_steps, get_step_status
    #[default]
    Full,
    /// get_wechat_steps only
    Wechat,
}

impl ToolSet {
    pub fn tool_names(&self) -> &'static [&'static str] {
        match self {
            ToolSet::Full => &["get_steps", "update_steps", "reset_steps", "get_step_status"],
            ToolSet::Wechat => &["get_wechat_steps"],
        }
    }

    pub fn allows(&self, name: &str) -> bool {
        self.tool_names().contains(&name)
    }

    /// Definitions of the tools in this set.
    pub fn tool_definitions(&self) -> Vec<McpToolDef> {
        all_tool_definitions()
            .into_iter()
            .filter(|def| self.allows(&def.name))
            .collect()
    }
}

impl From<ToolSetName> for ToolSet {
    fn from(name: ToolSetName) -> Self {
        match name {
            ToolSetName::Full => ToolSet::Full,
            ToolSetName::Wechat => ToolSet::Wechat,
        }
    }
}

/// Stateless handler: every call is an independent read or read-modify-write
/// of the shared store, with no locking.
pub struct StepToolHandler {
    store: SharedStore,
    tools: ToolSet,
}

impl StepToolHandler {
    pub fn new(store: SharedStore, tools: ToolSet) -> Self {
        StepToolHandler { store, tools }
    }

    pub fn tool_set(&self) -> ToolSet {
        self.tools
    }

    pub fn store_description(&self) -> String {
        self.store.describe()
    }

    pub fn tool_definitions(&self) -> Vec<McpToolDef> {
        self.tools.tool_definitions()
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Option<HashMap<String, Value>>,
    ) -> Result<ToolCallResult, GatewayError> {
        if !self.tools.allows(name) {
            return Err(GatewayError::UnknownOperation(name.to_string()));
        }
        let args = arguments.unwrap_or_default();
        debug!("Tool call: {} {:?}", name, args);

        let payload = match name {
            "get_steps" => self.get_steps().await?,
            "update_steps" => self.update_steps(&args).await?,
            "reset_steps" => self.reset_steps().await?,
            "get_step_status" => self.step_status(None).await?,
            "get_wechat_steps" => self.step_status(Some("wechat")).await?,
            other => return Err(GatewayError::UnknownOperation(other.to_string())),
        };

        Ok(ToolCallResult::text(serde_json::to_string_pretty(&payload)?))
    }

    /// The stored document as parsed JSON, unknown fields included.
    async fn get_steps(&self) -> Result<Value, GatewayError> {
        let document = self
            .store
            .raw()
            .await
            .map_err(|e| e.to_string())
            .and_then(|raw| serde_json::from_str::<Value>(&raw).map_err(|e| e.to_string()));
        match document {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("{}; using a fresh step state", e);
                Ok(serde_json::to_value(StepState::fresh())?)
            }
        }
    }

    async fn update_steps(&self, args: &HashMap<String, Value>) -> Result<Value, GatewayError> {
        let update = StepUpdate {
            steps: integer_arg(args, "steps")?,
            add: integer_arg(args, "add")?,
            status: status_arg(args)?,
        };

        let current = self.store.load_or_default().await;
        let updated = update.apply(&current, now_timestamp());
        self.save(&updated).await?;
        info!("Steps updated to {} ({})", updated.steps, updated.status);

        let message = format!(
            "Steps updated to {}, status: {}",
            updated.steps, updated.status
        );
        Ok(json!({
            "success": true,
            "data": updated,
            "message": message,
        }))
    }

    async fn reset_steps(&self) -> Result<Value, GatewayError> {
        let reset = StepState::fresh();
        self.save(&reset).await?;
        info!("Steps reset to 0");

        Ok(json!({
            "success": true,
            "data": reset,
            "message": "Steps reset to 0",
        }))
    }

    async fn step_status(&self, source: Option<&str>) -> Result<Value, GatewayError> {
        let state = self.store.load_or_default().await;
        let metrics = DerivedMetrics::from_steps(state.steps);

        let mut payload = json!({
            "steps": state.steps,
            "status": state.status,
            "timestamp": state.timestamp,
            "distance": metrics.distance,
            "distanceUnit": "km",
            "calories": metrics.calories,
            "caloriesUnit": "kcal",
        });
        if let (Some(source), Some(map)) = (source, payload.as_object_mut()) {
            map.insert("source".to_string(), json!(source));
        }
        Ok(payload)
    }

    async fn save(&self, state: &StepState) -> Result<(), GatewayError> {
        self.store.save(state).await.map_err(GatewayError::Storage)
    }
}

/// Reads an optional integer argument. Floats are truncated toward zero and
/// numeric strings are accepted; `null` counts as absent.
fn integer_arg(args: &HashMap<String, Value>, key: &str) -> Result<Option<i64>, GatewayError> {
    let invalid = || GatewayError::InvalidArguments(format!("'{}' must be a number", key));
    let number = match args.get(key) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => {
            if let Some(i) = n.as_i64() {
                return Ok(Some(i));
            }
            n.as_f64().ok_or_else(invalid)?
        }
        Some(Value::String(s)) => s.trim().parse::<f64>().map_err(|_| invalid())?,
        Some(_) => return Err(invalid()),
    };
    if !number.is_finite() {
        return Err(invalid());
    }
    Ok(Some(number.trunc() as i64))
}

/// Reads the optional `status` argument. An empty string counts as absent.
fn status_arg(args: &HashMap<String, Value>) -> Result<Option<ActivityStatus>, GatewayError> {
    match args.get("status") {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.is_empty() => Ok(None),
        Some(Value::String(s)) => s
            .parse::<ActivityStatus>()
            .map(Some)
            .map_err(GatewayError::InvalidArguments),
        Some(other) => Err(GatewayError::InvalidArguments(format!(
            "'status' must be a string, got {}",
            other
        ))),
    }
}

fn no_arguments() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn all_tool_definitions() -> Vec<McpToolDef> {
    vec![
        McpToolDef {
            name: "get_steps".to_string(),
            description: "Get the current step data: step count, activity status and timestamp."
                .to_string(),
            input_schema: no_arguments(),
        },
        McpToolDef {
            name: "update_steps".to_string(),
            description: "Update the step count. Either set it directly or add to it, and optionally update the activity status.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "steps": {
                        "type": "number",
                        "description": "New step count. When given it is set directly and 'add' is ignored."
                    },
                    "add": {
                        "type": "number",
                        "description": "Steps to add (negative to subtract)."
                    },
                    "status": {
                        "type": "string",
                        "enum": ["IDLE", "WALKING", "RUNNING"],
                        "description": "Activity status: IDLE, WALKING or RUNNING"
                    }
                }
            }),
        },
        McpToolDef {
            name: "reset_steps".to_string(),
            description: "Reset the step count to 0 and the status to IDLE.".to_string(),
            input_schema: no_arguments(),
        },
        McpToolDef {
            name: "get_step_status".to_string(),
            description: "Get the step status: step count, activity status, timestamp, distance walked (km) and calories burned (kcal).".to_string(),
            input_schema: no_arguments(),
        },
        McpToolDef {
            name: "get_wechat_steps".to_string(),
            description: "Get today's WeChat step count with distance (km) and calories (kcal)."
                .to_string(),
            input_schema: no_arguments(),
        },
    ]
}
