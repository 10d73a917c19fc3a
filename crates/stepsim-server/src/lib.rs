//! Local sync endpoint for the step simulator.
//!
//! Endpoints: `POST /api/steps` (simulators submit their state),
//! `GET /step-data.json` (the shared file, verbatim), `/health`.

mod handlers;
mod payload;
mod routes;
mod state;

pub use handlers::ApiError;
pub use payload::{parse_submission, PayloadError};
pub use routes::build_router;
pub use state::AppState;

use stepsim_core::SharedStore;
use tracing::{info, warn};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from(&stepsim_config::ServerConfig::default())
    }
}

impl From<&stepsim_config::ServerConfig> for ServerConfig {
    fn from(config: &stepsim_config::ServerConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
        }
    }
}

/// Start the sync endpoint with graceful shutdown on SIGTERM/SIGINT.
pub async fn serve(
    store: SharedStore,
    config: ServerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    store.ensure().await?;

    let app = build_router(AppState::new(store.clone()));
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Step data server listening on http://{}", addr);
    info!(
        "Current step JSON available at http://{}/step-data.json ({})",
        addr,
        store.describe()
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("Step data server shut down gracefully");
    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM). A handler that cannot be
/// installed never fires.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => { info!("Received SIGINT, shutting down..."); }
        _ = terminate => { info!("Received SIGTERM, shutting down..."); }
    }
}
