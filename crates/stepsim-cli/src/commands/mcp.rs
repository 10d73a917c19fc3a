use stepsim_config::{StepSimConfig, ToolSetName};
use stepsim_core::SharedStore;

pub async fn run(
    config: &StepSimConfig,
    store: SharedStore,
    tools: Option<ToolSetName>,
) -> Result<(), Box<dyn std::error::Error>> {
    let server = super::gateway(config, store, tools);
    server.run().await?;
    Ok(())
}
