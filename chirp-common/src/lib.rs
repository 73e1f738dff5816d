//! Shared plumbing for the chirp workspace.
//!
//! Right now this is only the [`observability`] module, which owns the global
//! `tracing` setup used by the `chirp` binary and by integration tests across
//! the other crates.
pub mod observability;

pub use observability::{init_logging, LogConfig, LogFormat};
