pub mod mcp;
pub mod reset;
pub mod serve;
pub mod simulate;
pub mod status;
pub mod tools;
pub mod ws;
pub mod ws_listen;

use std::sync::Arc;

use stepsim_config::{StepSimConfig, ToolSetName};
use stepsim_core::SharedStore;
use stepsim_mcp::{McpServer, StepToolHandler, ToolSet};

/// A gateway server over `store`, exposing the requested tool set or the
/// configured one.
pub fn gateway(
    config: &StepSimConfig,
    store: SharedStore,
    tools: Option<ToolSetName>,
) -> Arc<McpServer> {
    let tools = ToolSet::from(tools.unwrap_or(config.gateway.tools));
    Arc::new(McpServer::new(StepToolHandler::new(store, tools)))
}
