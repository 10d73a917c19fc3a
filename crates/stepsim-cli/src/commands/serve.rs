use stepsim_config::StepSimConfig;
use stepsim_core::SharedStore;
use stepsim_server::ServerConfig;

pub async fn run(
    config: &StepSimConfig,
    store: SharedStore,
    host: Option<String>,
    port: Option<u16>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut server_config = ServerConfig::from(&config.server);
    if let Some(host) = host {
        server_config.host = host;
    }
    if let Some(port) = port {
        server_config.port = port;
    }
    stepsim_server::serve(store, server_config).await
}
