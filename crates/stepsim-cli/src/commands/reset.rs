use stepsim_core::{SharedStore, StepState};

pub async fn run(store: SharedStore) -> Result<(), Box<dyn std::error::Error>> {
    let state = StepState::fresh();
    store.save(&state).await?;
    println!("Steps reset to 0 ({})", store.describe());
    Ok(())
}
