//! Groups checker findings into per-file batches.
//!
//! Checker output is file-clustered: all findings for one file are printed
//! together. The accumulator keeps a batch for the *active* file and flushes
//! it to the [`Publisher`] as soon as a finding for another file shows up,
//! so earlier files are published while the checker is still running. The
//! last batch is flushed by [`Accumulator::finalize`], even when empty, which
//! is what clears stale diagnostics for a document that is now clean.

use ansible_ls_types::Diagnostic;

use crate::grammar;
use crate::publisher::Publisher;

/// Counters for one run, logged when the run finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Stdout lines recognised as findings.
    pub findings: usize,
    /// Stdout lines that were not findings.
    pub dropped: usize,
    /// Stderr lines turned into diagnostics.
    pub stderr: usize,
    /// Batches published, including the final one.
    pub flushes: usize,
}

pub struct Accumulator<'p> {
    publisher: &'p dyn Publisher,
    document_uri: String,
    active_uri: String,
    batch: Vec<Diagnostic>,
    summary: RunSummary,
}

impl<'p> Accumulator<'p> {
    pub fn new(document_uri: impl Into<String>, publisher: &'p dyn Publisher) -> Self {
        let document_uri = document_uri.into();
        Self {
            publisher,
            active_uri: document_uri.clone(),
            document_uri,
            batch: Vec::new(),
            summary: RunSummary::default(),
        }
    }

    #[must_use]
    pub fn active_uri(&self) -> &str {
        &self.active_uri
    }

    #[must_use]
    pub fn pending(&self) -> &[Diagnostic] {
        &self.batch
    }

    /// A line from the checker's stderr.
    ///
    /// Stderr is not attributed per file: the whole line becomes a line-0
    /// warning in the current batch. It is also echoed to the client log.
    pub fn on_stderr_line(&mut self, raw: &str) {
        tracing::debug!(uri = %self.document_uri, line = raw, "checker stderr");
        self.publisher.log(raw);
        self.batch.push(Diagnostic::line_warning(0, raw.to_string()));
        self.summary.stderr += 1;
    }

    /// A line from the checker's stdout.
    pub fn on_stdout_line(&mut self, raw: &str) {
        let Some(found) = grammar::parse_line(raw) else {
            tracing::trace!(uri = %self.document_uri, line = raw, "dropping non-finding line");
            self.summary.dropped += 1;
            return;
        };

        let matched_uri = format!("file://{}", found.path);
        if matched_uri != self.active_uri {
            self.flush();
            self.active_uri = matched_uri;
        }

        self.batch
            .push(Diagnostic::line_warning(found.zero_based_line(), found.message));
        self.summary.findings += 1;
    }

    /// Publish whatever is left under the active URI and end the run.
    pub fn finalize(mut self) -> RunSummary {
        self.flush();
        self.summary
    }

    fn flush(&mut self) {
        let batch = std::mem::take(&mut self.batch);
        tracing::debug!(uri = %self.active_uri, count = batch.len(), "publishing batch");
        for diag in &batch {
            tracing::trace!("{}", diag.display_with_uri(&self.active_uri));
        }
        self.publisher.publish(&self.active_uri, batch);
        self.summary.flushes += 1;
    }
}
