//! Validation pipeline: runs `ansible-lint` for a document and turns its
//! output into per-file diagnostic batches.
//!
//! ```text
//! validate(uri) ─► RunCoordinator ─► checker process
//!                                      │ stdout / stderr lines
//!                                      ▼
//!                          grammar::parse_line ─► Accumulator ─► Publisher
//! ```

pub mod accumulator;
pub mod coordinator;
pub mod grammar;
pub mod lines;
pub mod publisher;
pub mod target;

pub use accumulator::{Accumulator, RunSummary};
pub use ansible_ls_types::DEFAULT_CHECKER;
pub use coordinator::{CHECKER_ARGS, RunCoordinator, RunHandle, SpawnError, Validation};
pub use grammar::{LintMatch, parse_line};
pub use publisher::{PublishedBatch, Publisher, RecordingPublisher};
pub use target::lint_target;
