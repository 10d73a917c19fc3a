mod error;
mod handler;
mod protocol;
mod server;
mod websocket;

pub use error::{GatewayError, TransportError};
pub use handler::{StepToolHandler, ToolSet};
pub use protocol::*;
pub use server::McpServer;
pub use websocket::{redact_endpoint, WsConnector, WsListener};
