//! Language server that publishes `ansible-lint` findings as diagnostics.

pub mod codec;

pub(crate) mod client;
pub(crate) mod documents;
pub(crate) mod protocol;

mod server;

pub use server::{ServerOptions, run};
