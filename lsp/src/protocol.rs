//! LSP message serde types for the server side of the connection.

use ansible_ls_types::Diagnostic;
use serde::{Deserialize, Serialize};

pub(crate) const PARSE_ERROR: i64 = -32700;
pub(crate) const INVALID_REQUEST: i64 = -32600;
pub(crate) const METHOD_NOT_FOUND: i64 = -32601;
pub(crate) const SERVER_NOT_INITIALIZED: i64 = -32002;

/// A classified message from the client.
#[derive(Debug)]
pub(crate) enum Incoming {
    Request {
        id: serde_json::Value,
        method: String,
        params: serde_json::Value,
    },
    Notification {
        method: String,
        params: serde_json::Value,
    },
    /// Reply to a server-initiated request. The server sends none, so these
    /// are only logged.
    Response { id: serde_json::Value },
}

impl Incoming {
    pub fn parse(frame: serde_json::Value) -> Option<Self> {
        let serde_json::Value::Object(mut map) = frame else {
            return None;
        };
        let id = map.remove("id");
        let method = match map.remove("method") {
            Some(serde_json::Value::String(method)) => Some(method),
            _ => None,
        };
        let has_result_or_error = map.contains_key("result") || map.contains_key("error");
        let params = map.remove("params").unwrap_or(serde_json::Value::Null);

        match (id, method, has_result_or_error) {
            (Some(id), Some(method), _) => Some(Self::Request { id, method, params }),
            (None, Some(method), _) => Some(Self::Notification { method, params }),
            (Some(id), None, true) => Some(Self::Response { id }),
            _ => None,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct ResponseError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct Response {
    pub jsonrpc: &'static str,
    pub id: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ResponseError>,
}

impl Response {
    /// Successful reply. A `null` result is serialized, not omitted.
    pub fn ok(id: serde_json::Value, result: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: serde_json::Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(ResponseError {
                code,
                message: message.into(),
            }),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct Notification<P> {
    pub jsonrpc: &'static str,
    pub method: &'static str,
    pub params: P,
}

impl<P: Serialize> Notification<P> {
    pub fn new(method: &'static str, params: P) -> Self {
        Self {
            jsonrpc: "2.0",
            method,
            params,
        }
    }
}

pub(crate) fn initialize_result() -> serde_json::Value {
    serde_json::json!({
        "capabilities": {
            "textDocumentSync": {
                "openClose": true,
                // Full document sync.
                "change": 1,
                "save": { "includeText": false }
            }
        },
        "serverInfo": {
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION")
        }
    })
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InitializeParams {
    #[serde(default)]
    pub root_uri: Option<String>,
    #[serde(default)]
    pub root_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextDocumentIdentifier {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDocumentItem {
    pub uri: String,
    #[serde(default)]
    pub language_id: String,
    pub version: i32,
    pub text: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VersionedTextDocumentIdentifier {
    pub uri: String,
    pub version: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TextDocumentContentChange {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidOpenTextDocumentParams {
    pub text_document: TextDocumentItem,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DidChangeTextDocumentParams {
    pub text_document: VersionedTextDocumentIdentifier,
    pub content_changes: Vec<TextDocumentContentChange>,
}

/// Shared shape of `didSave` and `didClose`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TextDocumentParams {
    pub text_document: TextDocumentIdentifier,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DidChangeConfigurationParams {
    #[serde(default)]
    pub settings: serde_json::Value,
}

#[derive(Debug, Serialize)]
pub(crate) struct PublishDiagnosticsParams<'a> {
    pub uri: &'a str,
    pub diagnostics: &'a [Diagnostic],
}

/// `window/logMessage` type for plain log output.
pub(crate) const MESSAGE_TYPE_LOG: u8 = 4;

#[derive(Debug, Serialize)]
pub(crate) struct LogMessageParams<'a> {
    #[serde(rename = "type")]
    pub kind: u8,
    pub message: &'a str,
}
