use stepsim_core::StoreError;

use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};

/// Failure of a single tool call, surfaced to the caller as a JSON-RPC error.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Unknown tool: {0}")]
    UnknownOperation(String),

    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("Failed to write step data to file")]
    Storage(#[source] StoreError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl GatewayError {
    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> i32 {
        match self {
            GatewayError::UnknownOperation(_) => METHOD_NOT_FOUND,
            GatewayError::InvalidArguments(_) => INVALID_PARAMS,
            GatewayError::Storage(_) | GatewayError::Serialize(_) => INTERNAL_ERROR,
        }
    }
}

/// Channel-level failure. Never fatal: the stdio loop ends, WebSocket
/// sessions are re-established.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
