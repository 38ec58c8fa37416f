//! Outgoing side of the connection.
//!
//! Every message to the client goes through one FIFO channel drained by a
//! single writer task, so messages are written in the order they were
//! produced. In particular, batches published for the same URI by one run
//! can never be reordered.
//!
//! The channel is unbounded because [`Publisher::publish`] is called from
//! synchronous accumulator code. If the client stops reading its input,
//! queued messages grow without limit; there is no backpressure.

use ansible_ls_pipeline::Publisher;
use ansible_ls_types::Diagnostic;
use serde::Serialize;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;

use crate::codec::MessageWriter;
use crate::protocol::{
    LogMessageParams, MESSAGE_TYPE_LOG, Notification, PublishDiagnosticsParams, Response,
};

pub(crate) enum WriterCommand {
    Send(serde_json::Value),
    Shutdown,
}

/// Cheap, cloneable sender for client-bound messages.
#[derive(Clone)]
pub(crate) struct ClientHandle {
    tx: mpsc::UnboundedSender<WriterCommand>,
}

impl ClientHandle {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<WriterCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn respond(&self, response: Response) {
        self.send(&response);
    }

    pub fn notify<P: Serialize>(&self, method: &'static str, params: P) {
        self.send(&Notification::new(method, params));
    }

    /// Ask the writer to stop after everything queued so far.
    pub fn shutdown(&self) {
        let _ = self.tx.send(WriterCommand::Shutdown);
    }

    fn send<T: Serialize>(&self, msg: &T) {
        let frame = match serde_json::to_value(msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!("Failed to serialize outgoing message: {e}");
                return;
            }
        };
        if self.tx.send(WriterCommand::Send(frame)).is_err() {
            tracing::debug!("Client writer closed, dropping message");
        }
    }
}

impl Publisher for ClientHandle {
    fn publish(&self, uri: &str, diagnostics: Vec<Diagnostic>) {
        self.notify(
            "textDocument/publishDiagnostics",
            PublishDiagnosticsParams {
                uri,
                diagnostics: &diagnostics,
            },
        );
    }

    fn log(&self, message: &str) {
        self.notify(
            "window/logMessage",
            LogMessageParams {
                kind: MESSAGE_TYPE_LOG,
                message,
            },
        );
    }
}

/// Drain `rx` into `output` until shutdown, channel close, or a write error.
pub(crate) async fn run_writer<W: AsyncWrite + Unpin>(
    output: W,
    mut rx: mpsc::UnboundedReceiver<WriterCommand>,
) {
    let mut writer = MessageWriter::new(output);
    while let Some(cmd) = rx.recv().await {
        match cmd {
            WriterCommand::Send(frame) => {
                if let Err(e) = writer.write_message(&frame).await {
                    tracing::warn!("LSP write error: {e}");
                    break;
                }
            }
            WriterCommand::Shutdown => break,
        }
    }
}
