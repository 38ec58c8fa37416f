//! Connection lifecycle over the framed transport.

use serde_json::{Value, json};

use crate::common::TestClient;

/// Nothing in these tests should ever reach the checker.
const NO_CHECKER: &str = "/nonexistent/ansible-lint";

#[tokio::test]
async fn test_initialize_shutdown_exit_returns_zero() {
    let mut client = TestClient::start(NO_CHECKER);

    let response = client.initialize().await;
    let capabilities = &response["result"]["capabilities"];
    assert_eq!(capabilities["textDocumentSync"]["openClose"], true);
    assert_eq!(capabilities["textDocumentSync"]["change"], 1);
    assert!(response["result"]["serverInfo"]["name"].is_string());

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_exit_without_shutdown_returns_one() {
    let mut client = TestClient::start(NO_CHECKER);
    client.initialize().await;
    client.notify("exit", Value::Null).await;
    assert_eq!(client.finish().await, 1);
}

#[tokio::test]
async fn test_client_disconnect_returns_one() {
    let mut client = TestClient::start(NO_CHECKER);
    client.initialize().await;
    client.close_input();
    assert_eq!(client.finish().await, 1);
}

#[tokio::test]
async fn test_request_before_initialize_rejected() {
    let mut client = TestClient::start(NO_CHECKER);
    let id = client.request("textDocument/hover", json!({})).await;
    let response = client.response(id).await;
    assert_eq!(response["error"]["code"], -32002);

    // The server still accepts a proper handshake afterwards.
    let response = client.initialize().await;
    assert!(response["result"]["capabilities"].is_object());
    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_unknown_request_method_not_found() {
    let mut client = TestClient::start(NO_CHECKER);
    client.initialize().await;

    let id = client.request("textDocument/completion", json!({})).await;
    let response = client.response(id).await;
    assert_eq!(response["error"]["code"], -32601);

    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_malformed_json_answered_with_parse_error() {
    let mut client = TestClient::start(NO_CHECKER);
    client.send_raw(b"{ not json").await;

    let frame = client.recv().await.unwrap();
    assert!(frame["id"].is_null());
    assert_eq!(frame["error"]["code"], -32700);

    client.initialize().await;
    assert_eq!(client.shutdown_and_exit().await, 0);
}

#[tokio::test]
async fn test_requests_after_shutdown_rejected() {
    let mut client = TestClient::start(NO_CHECKER);
    client.initialize().await;

    let id = client.request("shutdown", Value::Null).await;
    client.response(id).await;
    let id = client.request("textDocument/hover", json!({})).await;
    assert_eq!(client.response(id).await["error"]["code"], -32600);

    client.notify("exit", Value::Null).await;
    assert_eq!(client.finish().await, 0);
}

#[tokio::test]
async fn test_close_before_open_clears_diagnostics() {
    let mut client = TestClient::start(NO_CHECKER);
    client.initialize().await;

    client.did_close("file:///srv/playbooks/site.yml").await;
    let params = client.publish_diagnostics().await;
    assert_eq!(params["uri"], "file:///srv/playbooks/site.yml");
    assert_eq!(params["diagnostics"], json!([]));

    assert_eq!(client.shutdown_and_exit().await, 0);
}
