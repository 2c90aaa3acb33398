//! Mirror Core - Domain types
//!
//! This crate provides the foundational types shared by the mirror engine
//! and the bot binary: repository keys, sync jobs and status sinks.

pub mod error;
pub mod job;
pub mod sink;
pub mod types;

pub use error::{MirrorError, Result};
pub use job::Job;
pub use sink::StatusSink;
pub use types::RepositoryKey;

/// Returns the crate version.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
