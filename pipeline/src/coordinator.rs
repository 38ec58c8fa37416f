//! Run coordinator - at most one checker process per document.
//!
//! [`RunCoordinator::validate`] claims the document's in-flight slot, spawns
//! a task that runs the checker and feeds its output through an
//! [`Accumulator`], and returns immediately. The slot is an RAII guard owned
//! by that task, so it is released on every way out of a run: clean exit,
//! spawn failure, or a panic while parsing.
//!
//! There is no timeout. A checker that never exits keeps its document
//! claimed until the process is killed externally.

use std::collections::HashSet;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::process::{Child, Command};
use tokio::task::JoinHandle;

use crate::accumulator::{Accumulator, RunSummary};
use crate::lines::LineReader;
use crate::publisher::Publisher;
use crate::target::lint_target;

/// Parseable, colourless output. The lint target is appended last.
pub const CHECKER_ARGS: [&str; 2] = ["-p", "--nocolor"];

#[derive(Debug, thiserror::Error)]
pub enum SpawnError {
    #[error("document is not a local file: {0}")]
    NotAFile(String),
    #[error("{program} not found in PATH")]
    NotFound {
        program: String,
        #[source]
        source: which::Error,
    },
    #[error("spawning {program}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
}

/// Set of document URIs with a checker run in progress.
#[derive(Debug, Default)]
struct InFlight {
    uris: Mutex<HashSet<String>>,
}

impl InFlight {
    /// Claim `uri`, or `None` when a run already holds it.
    fn try_claim(self: &Arc<Self>, uri: &str) -> Option<InFlightGuard> {
        let mut uris = self.uris.lock().unwrap_or_else(PoisonError::into_inner);
        if !uris.insert(uri.to_string()) {
            return None;
        }
        Some(InFlightGuard {
            set: Arc::clone(self),
            uri: uri.to_string(),
        })
    }

    fn contains(&self, uri: &str) -> bool {
        self.uris
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(uri)
    }
}

struct InFlightGuard {
    set: Arc<InFlight>,
    uri: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.set
            .uris
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.uri);
    }
}

/// Outcome of a [`RunCoordinator::validate`] call.
#[must_use]
pub enum Validation {
    Started(RunHandle),
    /// A run for the document was already in progress; nothing happened.
    AlreadyRunning,
}

impl Validation {
    #[must_use]
    pub fn is_started(&self) -> bool {
        matches!(self, Self::Started(_))
    }
}

/// Handle to a spawned run.
///
/// Dropping it detaches the run; it still finishes and publishes.
pub struct RunHandle(JoinHandle<RunSummary>);

impl RunHandle {
    /// Wait for the run to finish. `None` if the run task panicked.
    pub async fn wait(self) -> Option<RunSummary> {
        self.0.await.ok()
    }
}

#[derive(Clone)]
pub struct RunCoordinator {
    checker: Arc<str>,
    publisher: Arc<dyn Publisher>,
    in_flight: Arc<InFlight>,
}

impl RunCoordinator {
    pub fn new(checker: impl Into<Arc<str>>, publisher: Arc<dyn Publisher>) -> Self {
        Self {
            checker: checker.into(),
            publisher,
            in_flight: Arc::default(),
        }
    }

    #[must_use]
    pub fn checker(&self) -> &str {
        &self.checker
    }

    #[must_use]
    pub fn is_running(&self, uri: &str) -> bool {
        self.in_flight.contains(uri)
    }

    /// Validate the document at `uri`.
    ///
    /// Must be called from within a tokio runtime. A call while a run for the
    /// same URI is in progress is dropped, not queued.
    pub fn validate(&self, uri: &str) -> Validation {
        let Some(guard) = self.in_flight.try_claim(uri) else {
            tracing::debug!(uri, "validation already running, dropping trigger");
            return Validation::AlreadyRunning;
        };

        let run = CheckerRun {
            uri: uri.to_string(),
            checker: Arc::clone(&self.checker),
            publisher: Arc::clone(&self.publisher),
        };
        Validation::Started(RunHandle(tokio::spawn(run.execute(guard))))
    }
}

struct CheckerRun {
    uri: String,
    checker: Arc<str>,
    publisher: Arc<dyn Publisher>,
}

impl CheckerRun {
    async fn execute(self, guard: InFlightGuard) -> RunSummary {
        let _guard = guard;
        let mut acc = Accumulator::new(self.uri.clone(), self.publisher.as_ref());

        match self.spawn() {
            Ok(child) => drive(child, &mut acc, &self.uri).await,
            Err(e) => {
                let chain = std::error::Error::source(&e)
                    .map(|source| format!("{e}: {source}"))
                    .unwrap_or_else(|| e.to_string());
                tracing::warn!(uri = %self.uri, "checker did not start: {chain}");
            }
        }

        let summary = acc.finalize();
        tracing::debug!(
            uri = %self.uri,
            findings = summary.findings,
            dropped = summary.dropped,
            stderr = summary.stderr,
            flushes = summary.flushes,
            "validation finished"
        );
        summary
    }

    fn spawn(&self) -> Result<Child, SpawnError> {
        let path = document_path(&self.uri).ok_or_else(|| SpawnError::NotAFile(self.uri.clone()))?;
        let target = lint_target(&path);

        let invocation = format!(
            "{} {} {}",
            self.checker,
            CHECKER_ARGS.join(" "),
            target.display()
        );
        tracing::info!(uri = %self.uri, "running {invocation}");
        self.publisher.log(&format!("running {invocation}"));

        let program = which::which(&*self.checker).map_err(|source| SpawnError::NotFound {
            program: self.checker.to_string(),
            source,
        })?;

        Command::new(&program)
            .args(CHECKER_ARGS)
            .arg(&target)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| SpawnError::Spawn {
                program: self.checker.to_string(),
                source,
            })
    }
}

fn document_path(uri: &str) -> Option<PathBuf> {
    url::Url::parse(uri)
        .ok()
        .and_then(|u| u.to_file_path().ok())
}

/// Pump both output streams into `acc` until they close, then reap the child.
///
/// Lines keep their arrival order within a stream; the two streams are not
/// ordered relative to each other.
async fn drive(mut child: Child, acc: &mut Accumulator<'_>, uri: &str) {
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        tracing::warn!(uri, "checker started without output pipes");
        let _ = child.kill().await;
        return;
    };

    let mut stdout = LineReader::new(stdout);
    let mut stderr = LineReader::new(stderr);
    let mut stdout_open = true;
    let mut stderr_open = true;

    while stdout_open || stderr_open {
        tokio::select! {
            line = stdout.next_line(), if stdout_open => match line {
                Ok(Some(line)) => acc.on_stdout_line(&line),
                Ok(None) => stdout_open = false,
                Err(e) => {
                    tracing::warn!(uri, "reading checker stdout failed: {e}");
                    stdout_open = false;
                }
            },
            line = stderr.next_line(), if stderr_open => match line {
                Ok(Some(line)) => acc.on_stderr_line(&line),
                Ok(None) => stderr_open = false,
                Err(e) => {
                    tracing::warn!(uri, "reading checker stderr failed: {e}");
                    stderr_open = false;
                }
            },
        }
    }

    // Exit status is informational only: findings make the checker exit non-zero.
    match child.wait().await {
        Ok(status) => tracing::debug!(uri, %status, "checker exited"),
        Err(e) => tracing::warn!(uri, "waiting for checker failed: {e}"),
    }
}
