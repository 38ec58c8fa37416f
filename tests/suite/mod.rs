//! Integration test modules

mod lifecycle;
#[cfg(unix)]
mod validation;
