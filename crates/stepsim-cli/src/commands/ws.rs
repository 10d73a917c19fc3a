use stepsim_config::{StepSimConfig, ToolSetName, ENDPOINT_ENV};
use stepsim_core::SharedStore;
use stepsim_mcp::WsConnector;

pub async fn run(
    config: &StepSimConfig,
    store: SharedStore,
    endpoint: Option<String>,
    tools: Option<ToolSetName>,
) -> Result<(), Box<dyn std::error::Error>> {
    let endpoint = endpoint
        .or_else(|| config.gateway.ws_endpoint.clone())
        .ok_or_else(|| {
            format!(
                "No WebSocket endpoint configured. Use --endpoint, set {}, or set gateway.ws_endpoint",
                ENDPOINT_ENV
            )
        })?;

    let server = super::gateway(config, store, tools);
    let connector = WsConnector::new(endpoint, server, config.gateway.reconnect_delay());
    connector.run_until(stepsim_server::shutdown_signal()).await;
    Ok(())
}
