//! Shared test utilities and fixtures
//!
//! Runs the server over in-memory pipes and speaks framed JSON-RPC to it.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use ansible_ls_server::ServerOptions;
use ansible_ls_server::codec::MessageReader;
use serde_json::{Value, json};
use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::task::JoinHandle;

/// Upper bound for any single wait on the server.
pub const RECV_TIMEOUT: Duration = Duration::from_secs(10);

/// A client connected to a server running in a background task.
pub struct TestClient {
    input: Option<DuplexStream>,
    output: MessageReader<DuplexStream>,
    server: JoinHandle<i32>,
    next_id: u64,
}

impl TestClient {
    pub fn start(checker: impl Into<String>) -> Self {
        let (input, server_input) = tokio::io::duplex(64 * 1024);
        let (server_output, output) = tokio::io::duplex(64 * 1024);
        let options = ServerOptions {
            checker: checker.into(),
        };
        let server = tokio::spawn(ansible_ls_server::run(options, server_input, server_output));
        Self {
            input: Some(input),
            output: MessageReader::new(output),
            server,
            next_id: 1,
        }
    }

    /// Write one framed body as-is.
    pub async fn send_raw(&mut self, body: &[u8]) {
        let input = self.input.as_mut().expect("input already closed");
        let header = format!("Content-Length: {}\r\n\r\n", body.len());
        input.write_all(header.as_bytes()).await.unwrap();
        input.write_all(body).await.unwrap();
        input.flush().await.unwrap();
    }

    pub async fn send(&mut self, message: &Value) {
        let body = serde_json::to_vec(message).unwrap();
        self.send_raw(&body).await;
    }

    /// Send a request and return its id.
    pub async fn request(&mut self, method: &str, params: Value) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        self.send(&json!({ "jsonrpc": "2.0", "id": id, "method": method, "params": params }))
            .await;
        id
    }

    pub async fn notify(&mut self, method: &str, params: Value) {
        self.send(&json!({ "jsonrpc": "2.0", "method": method, "params": params }))
            .await;
    }

    /// Next frame from the server, or `None` once it closed its output.
    pub async fn recv(&mut self) -> Option<Value> {
        tokio::time::timeout(RECV_TIMEOUT, self.output.read_message())
            .await
            .expect("timed out waiting for the server")
            .unwrap()
    }

    /// Skip frames until the response to `id`.
    pub async fn response(&mut self, id: u64) -> Value {
        loop {
            let frame = self.recv().await.expect("server closed before responding");
            if frame.get("method").is_none() && frame["id"] == id {
                return frame;
            }
        }
    }

    /// Skip frames until a notification named `method`; returns its params.
    pub async fn notification(&mut self, method: &str) -> Value {
        loop {
            let frame = self.recv().await.expect("server closed before notifying");
            if frame["method"] == method {
                return frame["params"].clone();
            }
        }
    }

    pub async fn publish_diagnostics(&mut self) -> Value {
        self.notification("textDocument/publishDiagnostics").await
    }

    pub async fn initialize(&mut self) -> Value {
        let id = self
            .request("initialize", json!({ "processId": null, "rootUri": null, "capabilities": {} }))
            .await;
        let response = self.response(id).await;
        self.notify("initialized", json!({})).await;
        response
    }

    pub async fn did_open(&mut self, uri: &str) {
        self.notify(
            "textDocument/didOpen",
            json!({
                "textDocument": {
                    "uri": uri,
                    "languageId": "ansible",
                    "version": 1,
                    "text": "- hosts: all\n"
                }
            }),
        )
        .await;
    }

    pub async fn did_save(&mut self, uri: &str) {
        self.notify("textDocument/didSave", json!({ "textDocument": { "uri": uri } }))
            .await;
    }

    pub async fn did_close(&mut self, uri: &str) {
        self.notify("textDocument/didClose", json!({ "textDocument": { "uri": uri } }))
            .await;
    }

    /// Orderly `shutdown` + `exit`; returns the server's exit code.
    pub async fn shutdown_and_exit(mut self) -> i32 {
        let id = self.request("shutdown", Value::Null).await;
        let response = self.response(id).await;
        assert!(response["result"].is_null(), "shutdown failed: {response}");
        self.notify("exit", Value::Null).await;
        self.finish().await
    }

    /// Close the input stream as if the client process died.
    pub fn close_input(&mut self) {
        self.input = None;
    }

    pub async fn finish(self) -> i32 {
        tokio::time::timeout(RECV_TIMEOUT, self.server)
            .await
            .expect("server did not stop")
            .unwrap()
    }
}

/// The URI the server publishes for a checker-reported path.
pub fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

/// Write an executable `/bin/sh` script standing in for `ansible-lint`.
///
/// The script sees the same arguments as the real checker: `-p --nocolor
/// <target>`, so the target is `$3`.
#[cfg(unix)]
pub fn write_checker(dir: &Path, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join("fake-ansible-lint");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    let mut perms = std::fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    std::fs::set_permissions(&path, perms).unwrap();
    path
}
