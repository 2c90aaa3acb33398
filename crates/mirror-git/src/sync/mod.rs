//! Job queueing, retry scheduling and state tracking.
//!
//! This module holds the synchronization core: the deduplicating
//! [`JobExchange`], the timer-driven [`RetryScheduler`] and the
//! per-repository [`MirrorState`].

mod exchange;
mod scheduler;
mod state;

pub use exchange::{JobExchange, Submission};
pub use scheduler::{RetryConfig, RetryDecision, RetryScheduler, ordinal};
pub use state::{MirrorState, RepoStatus, StateSummary};
