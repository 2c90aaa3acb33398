//! # Mirror Engine
//!
//! Keeps bare Git mirrors of remote repositories up to date in response to
//! trigger events.
//!
//! Triggers become jobs in a deduplicating [`JobExchange`]. A fixed pool of
//! worker threads takes jobs one repository at a time, runs a single
//! clone-or-fetch attempt through [`RepoSyncer`] and hands failures to the
//! [`RetryScheduler`], which re-submits them after a delay until the retry
//! ceiling is reached.
//!
//! ## Features
//!
//! - Git operations via system `git` CLI, behind the [`GitCommand`] trait
//! - No repository is ever synced by two workers at once
//! - Retry timers on a tokio runtime, never blocking a worker
//! - Progress reported as plain text through a caller-supplied [`StatusSink`]
//!
//! ## Example
//!
//! ```ignore
//! use mirror_git::{MirrorConfig, MirrorService, RepositoryKey, StatusSink};
//!
//! let config = MirrorConfig::builder()
//!     .owner("acme")
//!     .mirror_root("/srv/mirrors")
//!     .workers(2)
//!     .build()?;
//!
//! let service = MirrorService::start(config, tokio::runtime::Handle::current())?;
//! service.submit(
//!     RepositoryKey::parse("acme/widgets")?,
//!     StatusSink::new(|msg| println!("{msg}")),
//! );
//! ```

pub mod error;
pub mod pool;
pub mod repository;
pub mod service;
pub mod sync;
pub mod telemetry;

// Re-exports
pub use error::SyncError;
pub use pool::WorkerPool;
pub use repository::{
    GitCommand, MirrorConfig, MirrorConfigBuilder, RepoSyncer, SyncAction, SyncOutcome, SystemGit,
};
pub use service::MirrorService;
pub use sync::{
    JobExchange, MirrorState, RepoStatus, RetryConfig, RetryDecision, RetryScheduler,
    StateSummary, Submission,
};
pub use telemetry::register_sync_metrics;

// Re-export mirror_core for consumers
pub use mirror_core;
pub use mirror_core::{Job, RepositoryKey, StatusSink};
