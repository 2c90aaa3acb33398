//! Per-repository sync state tracking.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use mirror_core::RepositoryKey;
use parking_lot::RwLock;

use crate::repository::SyncAction;

/// Last known sync state of one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoStatus {
    /// The action of the most recent attempt.
    pub last_action: Option<SyncAction>,
    /// When the mirror was last brought up to date.
    pub last_success: Option<Instant>,
    /// The last error message, if the latest attempt failed.
    pub last_error: Option<String>,
    /// Number of consecutive failed attempts.
    pub consecutive_failures: u32,
    /// Number of successful syncs since startup.
    pub successes: u64,
    /// True if the latest job for this repository was given up.
    pub given_up: bool,
}

impl RepoStatus {
    fn new() -> Self {
        Self {
            last_action: None,
            last_success: None,
            last_error: None,
            consecutive_failures: 0,
            successes: 0,
            given_up: false,
        }
    }

    /// Returns true if the latest attempt succeeded.
    pub fn is_healthy(&self) -> bool {
        self.last_success.is_some() && self.last_error.is_none()
    }

    /// Returns the duration since the last successful sync.
    pub fn time_since_success(&self) -> Option<Duration> {
        self.last_success.map(|t| t.elapsed())
    }
}

/// Counts over every tracked repository.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSummary {
    pub tracked: usize,
    pub healthy: usize,
    pub failing: usize,
    pub given_up: usize,
}

/// Tracks the outcome of sync attempts for every repository seen so far.
#[derive(Debug, Default)]
pub struct MirrorState {
    repos: RwLock<HashMap<RepositoryKey, RepoStatus>>,
}

impl MirrorState {
    /// Creates an empty state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful attempt.
    pub fn record_success(&self, key: &RepositoryKey, action: SyncAction) {
        let mut repos = self.repos.write();
        let status = repos.entry(key.clone()).or_insert_with(RepoStatus::new);

        status.last_action = Some(action);
        status.last_success = Some(Instant::now());
        status.last_error = None;
        status.consecutive_failures = 0;
        status.successes += 1;
        status.given_up = false;
    }

    /// Records a failed attempt.
    pub fn record_failure(&self, key: &RepositoryKey, action: SyncAction, error: impl Into<String>) {
        let mut repos = self.repos.write();
        let status = repos.entry(key.clone()).or_insert_with(RepoStatus::new);

        status.last_action = Some(action);
        status.last_error = Some(error.into());
        status.consecutive_failures += 1;
        status.given_up = false;
    }

    /// Marks the latest job for `key` as abandoned.
    pub fn record_give_up(&self, key: &RepositoryKey) {
        let mut repos = self.repos.write();
        repos
            .entry(key.clone())
            .or_insert_with(RepoStatus::new)
            .given_up = true;
    }

    /// Returns the status of one repository.
    pub fn status(&self, key: &RepositoryKey) -> Option<RepoStatus> {
        self.repos.read().get(key).cloned()
    }

    /// Returns counts over all tracked repositories.
    pub fn summary(&self) -> StateSummary {
        let repos = self.repos.read();
        let mut summary = StateSummary {
            tracked: repos.len(),
            ..Default::default()
        };

        for status in repos.values() {
            if status.given_up {
                summary.given_up += 1;
            } else if status.is_healthy() {
                summary.healthy += 1;
            } else if status.last_error.is_some() {
                summary.failing += 1;
            }
        }
        summary
    }

    /// Forgets every repository.
    pub fn reset(&self) {
        self.repos.write().clear();
    }
}
