use stepsim_core::{DerivedMetrics, SharedStore};

pub async fn run(store: SharedStore) -> Result<(), Box<dyn std::error::Error>> {
    let state = store.load_or_default().await;
    let metrics = DerivedMetrics::from_steps(state.steps);

    println!("Step Status");
    println!("===========");
    println!();
    println!("Store:     {}", store.describe());
    println!("Steps:     {}", state.steps);
    println!("Status:    {}", state.status);
    println!("Updated:   {}", state.timestamp);
    println!("Distance:  {:.2} km", metrics.distance);
    println!("Calories:  {} kcal", metrics.calories);

    Ok(())
}
