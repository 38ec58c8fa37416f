//! Publisher boundary between the pipeline and the client connection.

use std::sync::Mutex;

use ansible_ls_types::Diagnostic;

/// Receives completed diagnostic batches.
///
/// Each `publish` call is an authoritative replacement of the diagnostics
/// for `uri`: when a run flushes the same URI twice (non-contiguous checker
/// output), the later batch wins.
pub trait Publisher: Send + Sync {
    fn publish(&self, uri: &str, diagnostics: Vec<Diagnostic>);

    /// Informational message for the client's output channel.
    fn log(&self, message: &str);
}

/// A publish recorded by [`RecordingPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedBatch {
    pub uri: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// In-memory publisher that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    batches: Mutex<Vec<PublishedBatch>>,
    logs: Mutex<Vec<String>>,
}

impl RecordingPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn batches(&self) -> Vec<PublishedBatch> {
        self.batches
            .lock()
            .map(|b| b.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    #[must_use]
    pub fn logs(&self) -> Vec<String> {
        self.logs
            .lock()
            .map(|l| l.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }
}

impl Publisher for RecordingPublisher {
    fn publish(&self, uri: &str, diagnostics: Vec<Diagnostic>) {
        let batch = PublishedBatch {
            uri: uri.to_string(),
            diagnostics,
        };
        match self.batches.lock() {
            Ok(mut batches) => batches.push(batch),
            Err(poisoned) => poisoned.into_inner().push(batch),
        }
    }

    fn log(&self, message: &str) {
        match self.logs.lock() {
            Ok(mut logs) => logs.push(message.to_string()),
            Err(poisoned) => poisoned.into_inner().push(message.to_string()),
        }
    }
}
