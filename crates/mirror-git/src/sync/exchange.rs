//! Deduplicating, blocking job queue.

use std::collections::HashSet;
use std::time::{Duration, Instant};

use indexmap::IndexMap;
use mirror_core::{Job, RepositoryKey};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};

use crate::telemetry::{record_pending, record_submission};

/// What [`JobExchange::submit`] did with a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The key was new to the queue and is now pending.
    Queued,
    /// The key was already pending; the new job replaced the old one and
    /// moved to the back of the queue.
    Replaced,
    /// The key is being synced right now; the job was dropped.
    Suppressed,
    /// The exchange is closed; the job was dropped.
    Closed,
}

impl Submission {
    /// Returns true if the job is now waiting in the queue.
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Queued | Self::Replaced)
    }

    /// Returns the metric label for this outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Replaced => "replaced",
            Self::Suppressed => "suppressed",
            Self::Closed => "closed",
        }
    }
}

#[derive(Debug, Default)]
struct ExchangeState {
    /// Insertion order is dequeue order.
    pending: IndexMap<RepositoryKey, Job>,
    in_progress: HashSet<RepositoryKey>,
    closed: bool,
}

impl ExchangeState {
    /// Moves the oldest pending key that nobody is working on into
    /// `in_progress`.
    fn claim_next(&mut self) -> Option<(RepositoryKey, Job)> {
        let in_progress = &self.in_progress;
        let index = self.pending.keys().position(|k| !in_progress.contains(k))?;
        let (key, job) = self.pending.shift_remove_index(index)?;
        self.in_progress.insert(key.clone());
        record_pending(self.pending.len());
        Some((key, job))
    }
}

/// The single source of truth for which sync work exists and which of it is
/// claimed by a worker.
///
/// One lock guards both the pending queue and the in-progress set; workers
/// block on a condition variable while nothing is eligible.
///
/// A submission for a key that is in progress is suppressed. A submission
/// for a key that is only pending replaces the queued job. The mirror of a
/// key is therefore never touched by two workers at once.
#[derive(Debug, Default)]
pub struct JobExchange {
    state: Mutex<ExchangeState>,
    available: Condvar,
}

impl JobExchange {
    /// Creates an empty, open exchange.
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers a job to the queue.
    pub fn submit(&self, job: Job) -> Submission {
        let submission = self.insert(job);
        record_submission(submission);
        submission
    }

    fn insert(&self, job: Job) -> Submission {
        let mut state = self.state.lock();

        if state.closed {
            return Submission::Closed;
        }

        let key = job.key().clone();
        if state.in_progress.contains(&key) {
            debug!("Dropping submission for {}: already in progress", key);
            return Submission::Suppressed;
        }

        let replaced = state.pending.shift_remove(&key).is_some();
        state.pending.insert(key.clone(), job);
        record_pending(state.pending.len());
        drop(state);

        self.available.notify_one();

        if replaced {
            debug!("Replaced pending job for {}", key);
            Submission::Replaced
        } else {
            debug!("Queued job for {}", key);
            Submission::Queued
        }
    }

    /// Blocks until an eligible job exists, claims it and returns it.
    ///
    /// Returns `None` only once the exchange has been closed.
    pub fn take_next(&self) -> Option<(RepositoryKey, Job)> {
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(claimed) = state.claim_next() {
                return Some(claimed);
            }
            self.available.wait(&mut state);
        }
    }

    /// Like [`take_next`](Self::take_next) but gives up after `timeout`.
    pub fn take_next_timeout(&self, timeout: Duration) -> Option<(RepositoryKey, Job)> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        loop {
            if state.closed {
                return None;
            }
            if let Some(claimed) = state.claim_next() {
                return Some(claimed);
            }
            if self.available.wait_until(&mut state, deadline).timed_out() {
                return state.claim_next();
            }
        }
    }

    /// Releases a key claimed by [`take_next`](Self::take_next).
    ///
    /// Must be called exactly once per claimed key, on every exit path.
    /// Returns false if the key was not in progress.
    pub fn complete(&self, key: &RepositoryKey) -> bool {
        let mut state = self.state.lock();
        let removed = state.in_progress.remove(key);
        let wake = removed && state.pending.contains_key(key);
        drop(state);

        if !removed {
            warn!("Completed {} which was not in progress", key);
        }
        if wake {
            self.available.notify_one();
        }
        removed
    }

    /// Closes the exchange: pending jobs are dropped, waiting workers wake
    /// up and every later `take_next` returns `None`.
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.closed = true;
        state.pending.clear();
        record_pending(0);
        drop(state);
        self.available.notify_all();
    }

    /// Returns true once [`close`](Self::close) has been called.
    pub fn is_closed(&self) -> bool {
        self.state.lock().closed
    }

    /// Returns the number of pending jobs.
    pub fn pending_len(&self) -> usize {
        self.state.lock().pending.len()
    }

    /// Returns the number of keys being worked on.
    pub fn in_progress_len(&self) -> usize {
        self.state.lock().in_progress.len()
    }

    /// Returns true if a job for `key` is waiting in the queue.
    pub fn is_pending(&self, key: &RepositoryKey) -> bool {
        self.state.lock().pending.contains_key(key)
    }

    /// Returns true if a worker currently holds `key`.
    pub fn is_in_progress(&self, key: &RepositoryKey) -> bool {
        self.state.lock().in_progress.contains(key)
    }

    /// Returns the failure count of the pending job for `key`, if any.
    pub fn pending_failures(&self, key: &RepositoryKey) -> Option<u32> {
        self.state.lock().pending.get(key).map(Job::failures)
    }
}
