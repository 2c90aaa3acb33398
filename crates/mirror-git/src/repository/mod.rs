//! Mirror repository management.
//!
//! This module provides configuration and the single-attempt
//! clone-or-fetch operation for bare mirrors.

mod config;
mod git_ops;
mod syncer;

pub use config::{MirrorConfig, MirrorConfigBuilder};
pub use git_ops::{GitCommand, SystemGit};
pub use syncer::{RepoSyncer, SyncAction, SyncOutcome};
