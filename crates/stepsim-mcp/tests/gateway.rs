//! Tool gateway integration tests over a real on-disk store and real sockets.

use std::sync::Arc;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{json, Value};
use stepsim_core::{JsonFileStore, SharedStore, StateStore};
use stepsim_mcp::{McpServer, StepToolHandler, ToolSet, WsConnector, WsListener};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, connect_async};

fn file_server(tmp: &TempDir, tools: ToolSet) -> (McpServer, SharedStore) {
    let store: SharedStore = Arc::new(JsonFileStore::new(tmp.path().join("step-data.json")));
    (McpServer::new(StepToolHandler::new(store.clone(), tools)), store)
}

fn call(id: u64, name: &str, arguments: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments},
    })
    .to_string()
}

async fn payload(server: &McpServer, msg: &str) -> Value {
    let resp = server.handle_message(msg).await.unwrap();
    let result = resp.result.expect("tool call failed");
    serde_json::from_str(result["content"][0]["text"].as_str().unwrap()).unwrap()
}

#[tokio::test]
async fn test_add_then_status_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let (server, _) = file_server(&tmp, ToolSet::Full);

    payload(&server, &call(1, "reset_steps", json!({}))).await;
    payload(&server, &call(2, "update_steps", json!({"add": 500}))).await;
    let status = payload(&server, &call(3, "get_step_status", json!({}))).await;

    assert_eq!(status["steps"], 500);
    assert_eq!(status["distance"], 0.35);
    assert_eq!(status["calories"], 20);

    let on_disk: Value =
        serde_json::from_str(&std::fs::read_to_string(tmp.path().join("step-data.json")).unwrap())
            .unwrap();
    assert_eq!(on_disk["steps"], 500);
}

#[tokio::test]
async fn test_gateways_share_one_file() {
    let tmp = TempDir::new().unwrap();
    let (full, _) = file_server(&tmp, ToolSet::Full);
    let (wechat, _) = file_server(&tmp, ToolSet::Wechat);

    payload(&full, &call(1, "update_steps", json!({"steps": 100}))).await;
    payload(&full, &call(2, "update_steps", json!({"steps": 200}))).await;

    let seen = payload(&wechat, &call(1, "get_wechat_steps", json!({}))).await;
    assert_eq!(seen["steps"], 200);
    assert_eq!(seen["source"], "wechat");
}

#[tokio::test]
async fn test_corrupt_file_reads_as_fresh_state() {
    let tmp = TempDir::new().unwrap();
    std::fs::write(tmp.path().join("step-data.json"), "{ not json").unwrap();
    let (server, store) = file_server(&tmp, ToolSet::Full);

    let steps = payload(&server, &call(1, "get_steps", json!({}))).await;
    assert_eq!(steps["steps"], 0);
    assert_eq!(steps["status"], "IDLE");

    payload(&server, &call(2, "update_steps", json!({"add": 5}))).await;
    assert_eq!(store.load().await.unwrap().steps, 5);
}

#[tokio::test]
async fn test_local_listener_serves_tool_calls() {
    let tmp = TempDir::new().unwrap();
    let (server, _) = file_server(&tmp, ToolSet::Full);
    let listener = WsListener::bind("127.0.0.1:0", Arc::new(server)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let serving = tokio::spawn(listener.serve_until(async {
        let _ = stop_rx.await;
    }));

    let (mut ws, _) = connect_async(format!("ws://{}", addr)).await.unwrap();
    ws.send(Message::Text(call(1, "update_steps", json!({"add": 42})).into()))
        .await
        .unwrap();

    let reply = loop {
        if let Message::Text(text) = ws.next().await.unwrap().unwrap() {
            break text;
        }
    };
    let resp: Value = serde_json::from_str(reply.as_str()).unwrap();
    assert_eq!(resp["id"], 1);
    let data: Value = serde_json::from_str(resp["result"]["content"][0]["text"].as_str().unwrap()).unwrap();
    assert_eq!(data["data"]["steps"], 42);

    ws.close(None).await.unwrap();
    stop_tx.send(()).unwrap();
    serving.await.unwrap();
}

#[tokio::test]
async fn test_connector_handshakes_and_redials() {
    let tmp = TempDir::new().unwrap();
    let (server, _) = file_server(&tmp, ToolSet::Full);
    let remote = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!("ws://{}/mcp/?token=secret", remote.local_addr().unwrap());

    let connector = WsConnector::new(endpoint, Arc::new(server), Duration::from_millis(20));
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
    let running = tokio::spawn(async move {
        connector
            .run_until(async {
                let _ = stop_rx.await;
            })
            .await
    });

    let session = async {
        for attempt in 0..2 {
            let (stream, _) = remote.accept().await.unwrap();
            let mut ws = accept_async(stream).await.unwrap();

            let init: Value = match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
                other => panic!("expected initialize, got {:?}", other),
            };
            assert_eq!(init["method"], "initialize");
            let init_id = init["id"].clone();

            let ack = json!({"jsonrpc": "2.0", "id": init_id, "result": {"protocolVersion": "2024-11-05"}});
            ws.send(Message::Text(ack.to_string().into())).await.unwrap();
            let notified: Value = match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
                other => panic!("expected notification, got {:?}", other),
            };
            assert_eq!(notified["method"], "notifications/initialized");

            ws.send(Message::Text(call(10 + attempt, "get_steps", json!({})).into()))
                .await
                .unwrap();
            let reply: Value = match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
                other => panic!("expected tool result, got {:?}", other),
            };
            assert_eq!(reply["id"], 10 + attempt);

            ws.close(None).await.unwrap();
        }
    };
    tokio::time::timeout(Duration::from_secs(10), session)
        .await
        .expect("connector did not redial");

    stop_tx.send(()).unwrap();
    running.await.unwrap();
}
