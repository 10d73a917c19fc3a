use stepsim_config::{StepSimConfig, ToolSetName};
use stepsim_core::SharedStore;
use stepsim_mcp::WsListener;
use tracing::info;

pub async fn run(
    config: &StepSimConfig,
    store: SharedStore,
    addr: Option<String>,
    tools: Option<ToolSetName>,
) -> Result<(), Box<dyn std::error::Error>> {
    let addr = addr.unwrap_or_else(|| config.gateway.listen.clone());
    let server = super::gateway(config, store, tools);
    let listener = WsListener::bind(&addr, server).await?;
    info!("MCP WebSocket server listening on ws://{}", listener.local_addr()?);
    listener.serve_until(stepsim_server::shutdown_signal()).await;
    Ok(())
}
