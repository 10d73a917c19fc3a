//! WebSocket transports: an outbound connector that dials a remote MCP
//! endpoint and keeps redialing, and a local listener.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async, WebSocketStream};
use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::protocol::JsonRpcRequest;
use crate::server::McpServer;

/// Id of the `initialize` request the connector sends on every connection.
const INIT_REQUEST_ID: u64 = 1;
const CLIENT_NAME: &str = "stepsim";

/// Endpoint with its query string (where access tokens live) removed, for logs.
pub fn redact_endpoint(endpoint: &str) -> String {
    match endpoint.split_once('?') {
        Some((base, _)) => format!("{}?<redacted>", base),
        None => endpoint.to_string(),
    }
}

/// Dials a remote endpoint, serves tool requests on the connection, and
/// redials after a constant delay whenever the connection fails or closes.
pub struct WsConnector {
    endpoint: String,
    server: Arc<McpServer>,
    reconnect_delay: Duration,
}

impl WsConnector {
    pub fn new(endpoint: impl Into<String>, server: Arc<McpServer>, reconnect_delay: Duration) -> Self {
        WsConnector {
            endpoint: endpoint.into(),
            server,
            reconnect_delay,
        }
    }

    /// Run until `shutdown` resolves. There is no retry limit.
    pub async fn run_until<F>(&self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                outcome = self.connect_once() => match outcome {
                    Ok(()) => info!("WebSocket closed"),
                    Err(e) => warn!("WebSocket session ended: {}", e),
                },
            }

            info!("Reconnecting in {}s", self.reconnect_delay.as_secs_f64());
            tokio::select! {
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }
        info!("WebSocket connector stopped");
    }

    async fn connect_once(&self) -> Result<(), TransportError> {
        info!("Connecting to {}", redact_endpoint(&self.endpoint));
        let (ws, _response) = connect_async(self.endpoint.as_str()).await?;
        info!("WebSocket connected");
        serve_session(ws, &self.server, Some(INIT_REQUEST_ID)).await
    }
}

/// Accepts WebSocket connections locally and serves each one independently.
pub struct WsListener {
    listener: TcpListener,
    server: Arc<McpServer>,
}

impl WsListener {
    pub async fn bind(addr: &str, server: Arc<McpServer>) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr).await?;
        Ok(WsListener { listener, server })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        Ok(self.listener.local_addr()?)
    }

    pub async fn serve_until<F>(self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer)) => {
                        let server = Arc::clone(&self.server);
                        tokio::spawn(async move {
                            debug!("WebSocket client {} connected", peer);
                            match serve_connection(stream, &server).await {
                                Ok(()) => debug!("WebSocket client {} disconnected", peer),
                                Err(e) => warn!("WebSocket client {}: {}", peer, e),
                            }
                        });
                    }
                    Err(e) => warn!("Failed to accept connection: {}", e),
                },
            }
        }
        info!("WebSocket listener stopped");
    }
}

async fn serve_connection(stream: TcpStream, server: &McpServer) -> Result<(), TransportError> {
    let ws = accept_async(stream).await?;
    serve_session(ws, server, None).await
}

/// Serve one session until the peer closes. With `init_id` set, this side
/// opens with `initialize` and acknowledges the peer's response with
/// `notifications/initialized`.
async fn serve_session<S>(
    mut ws: WebSocketStream<S>,
    server: &McpServer,
    init_id: Option<u64>,
) -> Result<(), TransportError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    if let Some(id) = init_id {
        let init = serde_json::to_string(&JsonRpcRequest::initialize(id, CLIENT_NAME))?;
        ws.send(Message::Text(init.into())).await?;
        debug!("Initialize request sent");
    }

    while let Some(frame) = ws.next().await {
        match frame? {
            Message::Text(text) => {
                debug!("Received: {}", text.as_str());
                if let Some(reply) = handle_text(server, text.as_str(), init_id).await? {
                    debug!("Sending: {}", reply);
                    ws.send(Message::Text(reply.into())).await?;
                }
            }
            Message::Ping(data) => ws.send(Message::Pong(data)).await?,
            Message::Close(_) => break,
            _ => {}
        }
    }
    Ok(())
}

/// Route one text frame. Requests go to the server; responses are matched
/// against our own `initialize`.
async fn handle_text(
    server: &McpServer,
    text: &str,
    init_id: Option<u64>,
) -> Result<Option<String>, TransportError> {
    let is_request = serde_json::from_str::<Value>(text)
        .map(|v| v.get("method").is_some())
        .unwrap_or(true);

    if is_request {
        return match server.handle_message(text).await {
            Some(resp) => Ok(Some(serde_json::to_string(&resp)?)),
            None => Ok(None),
        };
    }

    let value: Value = serde_json::from_str(text)?;
    let id = value.get("id").and_then(Value::as_u64);
    if let Some(err) = value.get("error") {
        warn!("Peer rejected request {:?}: {}", id, err);
        return Ok(None);
    }
    if id.is_some() && id == init_id && value.get("result").is_some() {
        info!("MCP session initialized");
        let ack = JsonRpcRequest::notification("notifications/initialized");
        return Ok(Some(serde_json::to_string(&ack)?));
    }
    debug!("Ignoring response {:?}", id);
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{StepToolHandler, ToolSet};
    use stepsim_core::MemoryStore;

    fn server() -> McpServer {
        McpServer::new(StepToolHandler::new(Arc::new(MemoryStore::new()), ToolSet::Full))
    }

    #[test]
    fn test_redact_endpoint() {
        assert_eq!(
            redact_endpoint("wss://api.example.com/mcp/?token=secret"),
            "wss://api.example.com/mcp/?<redacted>"
        );
        assert_eq!(redact_endpoint("ws://127.0.0.1:3002"), "ws://127.0.0.1:3002");
    }

    #[tokio::test]
    async fn test_initialize_response_is_acknowledged() {
        let server = server();
        let reply = handle_text(
            &server,
            r#"{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05"}}"#,
            Some(1),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(
            reply,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#
        );
    }

    #[tokio::test]
    async fn test_other_responses_are_ignored() {
        let server = server();
        let text = r#"{"jsonrpc":"2.0","id":7,"result":{}}"#;
        assert!(handle_text(&server, text, Some(1)).await.unwrap().is_none());
        assert!(handle_text(&server, text, None).await.unwrap().is_none());

        let rejected = r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32600,"message":"no"}}"#;
        assert!(handle_text(&server, rejected, Some(1)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_requests_reach_the_server() {
        let server = server();
        let reply = handle_text(&server, r#"{"jsonrpc":"2.0","id":"a","method":"ping"}"#, Some(1))
            .await
            .unwrap()
            .unwrap();
        let value: Value = serde_json::from_str(&reply).unwrap();
        assert_eq!(value["id"], "a");
        assert!(value["result"].is_object());
    }

    #[tokio::test]
    async fn test_garbage_gets_parse_error() {
        let server = server();
        let reply = handle_text(&server, "{{", None).await.unwrap().unwrap();
        assert!(reply.contains("-32700"));
    }
}
