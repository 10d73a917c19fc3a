use std::sync::Arc;

use stepsim_config::StepSimConfig;
use stepsim_core::SharedStore;
use stepsim_engine::{HttpSink, Simulator, StateSink, StoreSink};
use tracing::info;

pub async fn run(
    config: &StepSimConfig,
    store: SharedStore,
    paused: bool,
    seed: Option<u64>,
    endpoint: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut simulation = config.simulation.clone();
    simulation.start_paused |= paused;
    if seed.is_some() {
        simulation.seed = seed;
    }

    let sink: Arc<dyn StateSink> = match endpoint.or_else(|| config.sync.endpoint.clone()) {
        Some(url) => {
            let sink = HttpSink::new(&url)?;
            info!("Syncing to {}", sink.url());
            Arc::new(sink)
        }
        None => {
            store.ensure().await?;
            info!("Syncing to {}", store.describe());
            Arc::new(StoreSink::new(store))
        }
    };

    let mut simulator = Simulator::from_config(&simulation, sink);
    simulator.run_until(stepsim_server::shutdown_signal()).await;
    Ok(())
}
