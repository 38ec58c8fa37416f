//! Server dispatch loop - reads client messages and drives the pipeline.
//!
//! Lifecycle: `Uninitialized → Running → ShuttingDown → exit`. Document
//! events map onto the pipeline as follows:
//!
//! | client message                      | action                              |
//! |-------------------------------------|-------------------------------------|
//! | `textDocument/didOpen`              | track, validate                     |
//! | `textDocument/didChange`            | track text only                     |
//! | `textDocument/didSave`              | validate                            |
//! | `textDocument/didClose`             | untrack, publish empty batch        |
//! | `workspace/didChangeConfiguration`  | store settings, validate all open   |

use std::sync::Arc;
use std::time::Duration;

use ansible_ls_config::LinterSettings;
use ansible_ls_pipeline::{Publisher, RunCoordinator};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::client::{ClientHandle, run_writer};
use crate::codec::MessageReader;
use crate::documents::{DocumentStore, OpenDocument};
use crate::protocol::{
    self, DidChangeConfigurationParams, DidChangeTextDocumentParams, DidOpenTextDocumentParams,
    Incoming, InitializeParams, Response, TextDocumentParams,
};

/// How long queued messages may take to drain after `exit`.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Options the binary passes to the server.
#[derive(Debug, Clone)]
pub struct ServerOptions {
    /// Checker executable name or path.
    pub checker: String,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            checker: ansible_ls_types::DEFAULT_CHECKER.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerState {
    Uninitialized,
    Running,
    ShuttingDown,
}

/// What the read loop does after a message.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Exit(i32),
}

/// Serve one client connection until `exit` or EOF.
///
/// Returns the process exit code: 0 after an orderly `shutdown` + `exit`,
/// 1 otherwise.
pub async fn run<R, W>(options: ServerOptions, input: R, output: W) -> i32
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (client, rx) = ClientHandle::channel();
    let writer = tokio::spawn(run_writer(output, rx));

    let mut server = Server::new(options, client.clone());
    let mut reader = MessageReader::new(input);

    let code = loop {
        match reader.read_message().await {
            Ok(Some(frame)) => {
                if let Flow::Exit(code) = server.dispatch(frame) {
                    break code;
                }
            }
            Ok(None) => {
                tracing::info!("Client closed the connection");
                break server.exit_code();
            }
            Err(e) if e.is_recoverable() => {
                tracing::warn!("Discarding malformed message: {e}");
                client.respond(Response::error(
                    serde_json::Value::Null,
                    protocol::PARSE_ERROR,
                    e.to_string(),
                ));
            }
            Err(e) => {
                tracing::warn!("LSP reader error: {e}");
                break server.exit_code();
            }
        }
    };

    client.shutdown();
    drop(server);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer)
        .await
        .is_err()
    {
        tracing::debug!("Writer did not drain in time");
    }
    code
}

struct Server {
    client: ClientHandle,
    coordinator: RunCoordinator,
    documents: DocumentStore,
    settings: LinterSettings,
    state: ServerState,
}

impl Server {
    fn new(options: ServerOptions, client: ClientHandle) -> Self {
        let publisher: Arc<dyn Publisher> = Arc::new(client.clone());
        Self {
            coordinator: RunCoordinator::new(options.checker, publisher),
            client,
            documents: DocumentStore::new(),
            settings: LinterSettings::default(),
            state: ServerState::Uninitialized,
        }
    }

    fn exit_code(&self) -> i32 {
        if self.state == ServerState::ShuttingDown {
            0
        } else {
            1
        }
    }

    fn dispatch(&mut self, frame: serde_json::Value) -> Flow {
        match Incoming::parse(frame) {
            Some(Incoming::Request { id, method, params }) => {
                self.handle_request(id, &method, params);
                Flow::Continue
            }
            Some(Incoming::Notification { method, params }) => {
                self.handle_notification(&method, params)
            }
            Some(Incoming::Response { id }) => {
                tracing::trace!(%id, "Ignoring response from client");
                Flow::Continue
            }
            None => {
                tracing::debug!("Ignoring message that is neither request nor notification");
                self.client.respond(Response::error(
                    serde_json::Value::Null,
                    protocol::INVALID_REQUEST,
                    "not a JSON-RPC request or notification",
                ));
                Flow::Continue
            }
        }
    }

    fn handle_request(&mut self, id: serde_json::Value, method: &str, params: serde_json::Value) {
        let response = match (self.state, method) {
            (ServerState::Uninitialized, "initialize") => self.initialize(id, params),
            (ServerState::Uninitialized, _) => Response::error(
                id,
                protocol::SERVER_NOT_INITIALIZED,
                format!("Server not initialized: {method}"),
            ),
            (_, "initialize") => Response::error(
                id,
                protocol::INVALID_REQUEST,
                "initialize may only be sent once",
            ),
            (ServerState::ShuttingDown, _) => Response::error(
                id,
                protocol::INVALID_REQUEST,
                format!("Server is shutting down: {method}"),
            ),
            (ServerState::Running, "shutdown") => {
                tracing::info!("Shutdown requested");
                self.state = ServerState::ShuttingDown;
                Response::ok(id, serde_json::Value::Null)
            }
            (ServerState::Running, _) => {
                tracing::debug!("Client sent unsupported request: {method}");
                Response::error(
                    id,
                    protocol::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                )
            }
        };
        self.client.respond(response);
    }

    fn initialize(&mut self, id: serde_json::Value, params: serde_json::Value) -> Response {
        let params: InitializeParams = serde_json::from_value(params).unwrap_or_default();
        let root = params.root_uri.or(params.root_path);
        tracing::info!(
            root = root.as_deref().unwrap_or("<none>"),
            checker = self.coordinator.checker(),
            "Initializing"
        );
        self.state = ServerState::Running;
        Response::ok(id, protocol::initialize_result())
    }

    fn handle_notification(&mut self, method: &str, params: serde_json::Value) -> Flow {
        if method == "exit" {
            let code = self.exit_code();
            tracing::info!(code, "Exit requested");
            return Flow::Exit(code);
        }
        if self.state != ServerState::Running {
            tracing::debug!("Dropping notification {method} outside the running state");
            return Flow::Continue;
        }

        match method {
            "initialized" => tracing::debug!("Client initialized"),
            "textDocument/didOpen" => {
                if let Some(params) = parse_params::<DidOpenTextDocumentParams>(method, params) {
                    self.did_open(params);
                }
            }
            "textDocument/didChange" => {
                if let Some(params) = parse_params::<DidChangeTextDocumentParams>(method, params) {
                    self.did_change(params);
                }
            }
            "textDocument/didSave" => {
                if let Some(params) = parse_params::<TextDocumentParams>(method, params) {
                    self.did_save(params);
                }
            }
            "textDocument/didClose" => {
                if let Some(params) = parse_params::<TextDocumentParams>(method, params) {
                    self.did_close(params);
                }
            }
            "workspace/didChangeConfiguration" => {
                if let Some(params) = parse_params::<DidChangeConfigurationParams>(method, params)
                {
                    self.did_change_configuration(params);
                }
            }
            _ => tracing::trace!("Ignoring notification: {method}"),
        }
        Flow::Continue
    }

    fn did_open(&mut self, params: DidOpenTextDocumentParams) {
        let item = params.text_document;
        tracing::debug!(uri = %item.uri, language = %item.language_id, "Document opened");
        self.documents.open(
            item.uri.clone(),
            OpenDocument {
                language_id: item.language_id,
                version: item.version,
                text: item.text,
            },
        );
        self.validate(&item.uri);
    }

    fn did_change(&mut self, params: DidChangeTextDocumentParams) {
        // Full sync: the last change carries the whole document.
        let Some(change) = params.content_changes.into_iter().next_back() else {
            return;
        };
        let doc = params.text_document;
        self.documents.change(&doc.uri, doc.version, change.text);
    }

    fn did_save(&mut self, params: TextDocumentParams) {
        let uri = params.text_document.uri;
        if let Some(doc) = self.documents.get(&uri) {
            tracing::debug!(
                uri = %uri,
                version = doc.version,
                bytes = doc.text.len(),
                language = %doc.language_id,
                "Document saved"
            );
        }
        self.validate(&uri);
    }

    fn did_close(&mut self, params: TextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!(uri = %uri, "Document closed");
        self.documents.close(&uri);
        // Clears stale diagnostics; a run still in flight is left alone.
        self.client.publish(&uri, Vec::new());
    }

    fn did_change_configuration(&mut self, params: DidChangeConfigurationParams) {
        self.settings = LinterSettings::from_settings(&params.settings);
        tracing::info!(
            max_number_of_problems = self.settings.max_number_of_problems(),
            open_documents = self.documents.len(),
            "Configuration changed, revalidating"
        );
        for uri in self.documents.uris() {
            self.validate(&uri);
        }
    }

    fn validate(&self, uri: &str) {
        // Triggers while a run is in flight are dropped by the coordinator.
        let _ = self.coordinator.validate(uri);
    }
}

fn parse_params<T: DeserializeOwned>(method: &str, params: serde_json::Value) -> Option<T> {
    match serde_json::from_value(params) {
        Ok(params) => Some(params),
        Err(e) => {
            tracing::warn!("Invalid params for {method}: {e}");
            None
        }
    }
}
