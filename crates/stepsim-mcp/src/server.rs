//! MCP server: JSON-RPC dispatch plus the stdio transport.

use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, error, info, warn};

use crate::error::TransportError;
use crate::handler::StepToolHandler;
use crate::protocol::*;

const TOOL_TIMEOUT: Duration = Duration::from_secs(30);

pub struct McpServer {
    handler: StepToolHandler,
}

impl McpServer {
    pub fn new(handler: StepToolHandler) -> Self {
        McpServer { handler }
    }

    pub fn handler(&self) -> &StepToolHandler {
        &self.handler
    }

    /// Serve newline-delimited JSON-RPC on stdin/stdout until stdin closes.
    pub async fn run(&self) -> Result<(), TransportError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        info!(
            "Step simulator MCP server running on stdio ({})",
            self.handler.store_description()
        );
        self.run_with(stdin, stdout).await?;
        info!("Step simulator MCP server shutting down");
        Ok(())
    }

    /// Serve newline-delimited JSON-RPC over any reader/writer pair.
    pub async fn run_with<R, W>(&self, mut reader: R, mut writer: W) -> Result<(), TransportError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf).await? == 0 {
                break;
            }
            // Invalid UTF-8 turns into a parse error for this line only.
            let decoded = String::from_utf8_lossy(&buf);
            let line = decoded.trim();
            if line.is_empty() {
                continue;
            }

            debug!("Received: {}", line);

            if let Some(resp) = self.handle_message(line).await {
                let json = serde_json::to_string(&resp)?;
                debug!("Sending: {}", json);
                writer.write_all(json.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
        }
        Ok(())
    }

    /// Process a single JSON-RPC message and return an optional response.
    /// Returns None for notifications (no id).
    pub async fn handle_message(&self, line: &str) -> Option<JsonRpcResponse> {
        let value: serde_json::Value = match serde_json::from_str(line) {
            Ok(v) => v,
            Err(e) => {
                error!("Failed to parse JSON-RPC: {}", e);
                return Some(JsonRpcResponse::error(
                    None,
                    PARSE_ERROR,
                    format!("Parse error: {}", e),
                ));
            }
        };

        let request_id = value.get("id").cloned().filter(|id| !id.is_null());
        let request: JsonRpcRequest = match serde_json::from_value(value) {
            Ok(req) => req,
            Err(e) => {
                warn!("Invalid JSON-RPC request: {}", e);
                return Some(JsonRpcResponse::error(
                    request_id,
                    INVALID_REQUEST,
                    format!("Invalid request: {}", e),
                ));
            }
        };

        if request.id.is_none() {
            debug!("Notification: {}", request.method);
            return None;
        }

        let id = request.id.clone();

        match request.method.as_str() {
            "initialize" => {
                let result = InitializeResult {
                    protocol_version: PROTOCOL_VERSION.to_string(),
                    capabilities: ServerCapabilities {
                        tools: Some(ToolsCapability {
                            list_changed: Some(false),
                        }),
                    },
                    server_info: ServerInfo {
                        name: "stepsim".to_string(),
                        version: env!("CARGO_PKG_VERSION").to_string(),
                    },
                };
                Some(to_response(id, result))
            }
            "tools/list" => {
                let tools = self.handler.tool_definitions();
                Some(to_response(id, ToolListResult { tools }))
            }
            "tools/call" => {
                let params: ToolCallParams = match request.params {
                    Some(p) => match serde_json::from_value(p) {
                        Ok(params) => params,
                        Err(e) => {
                            return Some(JsonRpcResponse::error(
                                id,
                                INVALID_PARAMS,
                                format!("Invalid params: {}", e),
                            ))
                        }
                    },
                    None => {
                        return Some(JsonRpcResponse::error(
                            id,
                            INVALID_PARAMS,
                            "Missing params".to_string(),
                        ))
                    }
                };

                let outcome = tokio::time::timeout(
                    TOOL_TIMEOUT,
                    self.handler.call_tool(&params.name, params.arguments),
                )
                .await;

                match outcome {
                    Ok(Ok(result)) => Some(to_response(id, result)),
                    Ok(Err(e)) => {
                        warn!("Tool '{}' failed: {}", params.name, e);
                        Some(JsonRpcResponse::error(id, e.code(), e.to_string()))
                    }
                    Err(_) => Some(JsonRpcResponse::error(
                        id,
                        INTERNAL_ERROR,
                        format!(
                            "Tool '{}' timed out after {}s",
                            params.name,
                            TOOL_TIMEOUT.as_secs()
                        ),
                    )),
                }
            }
            "ping" => Some(JsonRpcResponse::success(id, serde_json::json!({}))),
            _ => Some(JsonRpcResponse::error(
                id,
                METHOD_NOT_FOUND,
                format!("Unknown method: {}", request.method),
            )),
        }
    }
}

fn to_response<T: serde::Serialize>(
    id: Option<serde_json::Value>,
    result: T,
) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(v) => JsonRpcResponse::success(id, v),
        Err(e) => JsonRpcResponse::error(id, INTERNAL_ERROR, format!("Serialization error: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::ToolSet;
    use std::sync::Arc;
    use stepsim_core::{ActivityStatus, MemoryStore, StepState};

    fn make_server(store: Arc<MemoryStore>, tools: ToolSet) -> McpServer {
        McpServer::new(StepToolHandler::new(store, tools))
    }

    fn tool_payload(resp: JsonRpcResponse) -> serde_json::Value {
        let result = resp.result.unwrap();
        serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let msg = r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{}}}"#;
        let resp = server.handle_message(msg).await.unwrap();
        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert!(result["capabilities"]["tools"].is_object());
        assert_eq!(result["serverInfo"]["name"], "stepsim");
    }

    #[tokio::test]
    async fn test_tools_list_wechat() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Wechat);

        let msg = r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#;
        let result = server.handle_message(msg).await.unwrap().result.unwrap();
        let tools = result["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0]["name"], "get_wechat_steps");
    }

    #[tokio::test]
    async fn test_tools_call_get_steps() {
        let store = Arc::new(MemoryStore::with_state(StepState::new(42, ActivityStatus::Walking)));
        let server = make_server(store, ToolSet::Full);

        let msg = r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"get_steps","arguments":{}}}"#;
        let payload = tool_payload(server.handle_message(msg).await.unwrap());
        assert_eq!(payload["steps"], 42);
        assert_eq!(payload["status"], "WALKING");
    }

    #[tokio::test]
    async fn test_unknown_tool_is_method_not_found() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let msg = r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{"name":"fly"}}"#;
        let err = server.handle_message(msg).await.unwrap().error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
        assert_eq!(err.message, "Unknown tool: fly");
    }

    #[tokio::test]
    async fn test_write_failure_is_internal_error() {
        let store = Arc::new(MemoryStore::new());
        store.set_fail_writes(true);
        let server = make_server(store, ToolSet::Full);

        let msg = r#"{"jsonrpc":"2.0","id":5,"method":"tools/call","params":{"name":"update_steps","arguments":{"add":10}}}"#;
        let err = server.handle_message(msg).await.unwrap().error.unwrap();
        assert_eq!(err.code, INTERNAL_ERROR);
        assert_eq!(err.message, "Failed to write step data to file");
    }

    #[tokio::test]
    async fn test_notification_no_response() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let msg = r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#;
        assert!(server.handle_message(msg).await.is_none());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let msg = r#"{"jsonrpc":"2.0","id":6,"method":"resources/list"}"#;
        let err = server.handle_message(msg).await.unwrap().error.unwrap();
        assert_eq!(err.code, METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_parse_error() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let resp = server.handle_message("not json").await.unwrap();
        assert_eq!(resp.error.unwrap().code, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_request_without_method_is_invalid_request() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let resp = server.handle_message(r#"{"jsonrpc":"2.0","id":8}"#).await.unwrap();
        assert_eq!(resp.id, Some(serde_json::json!(8)));
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);

        let resp = server.handle_message("[1, 2]").await.unwrap();
        assert_eq!(resp.id, None);
        assert_eq!(resp.error.unwrap().code, INVALID_REQUEST);
    }

    #[tokio::test]
    async fn test_missing_params() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let msg = r#"{"jsonrpc":"2.0","id":9,"method":"tools/call"}"#;
        let err = server.handle_message(msg).await.unwrap().error.unwrap();
        assert_eq!(err.code, INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_run_with_line_transport() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#,
            "\n\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"update_steps","arguments":{"add":3}}}"#,
            "\n",
        );
        let mut output = Vec::new();
        server.run_with(input.as_bytes(), &mut output).await.unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        let first: JsonRpcResponse = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.id, Some(serde_json::json!(1)));
        let second: JsonRpcResponse = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(tool_payload(second)["data"]["steps"], 3);
    }

    #[tokio::test]
    async fn test_run_with_survives_invalid_utf8_line() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let input: &[u8] = b"\xff\xfe garbage\n{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
        let mut output = Vec::new();
        server.run_with(input, &mut output).await.unwrap();

        let lines: Vec<&str> = std::str::from_utf8(&output).unwrap().lines().collect();
        assert_eq!(lines.len(), 2);
        let first: JsonRpcResponse = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.error.unwrap().code, PARSE_ERROR);
        let second: JsonRpcResponse = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.id, Some(serde_json::json!(1)));
        assert!(second.error.is_none());
    }

    #[tokio::test]
    async fn test_run_with_handles_final_line_without_newline() {
        let server = make_server(Arc::new(MemoryStore::new()), ToolSet::Full);

        let input = r#"{"jsonrpc":"2.0","id":7,"method":"ping"}"#;
        let mut output = Vec::new();
        server.run_with(input.as_bytes(), &mut output).await.unwrap();

        let reply: JsonRpcResponse = serde_json::from_str(std::str::from_utf8(&output).unwrap().trim()).unwrap();
        assert_eq!(reply.id, Some(serde_json::json!(7)));
    }
}
