//! Retry scheduling for failed sync attempts.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use metrics::counter;
use mirror_core::Job;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::JobExchange;
use crate::repository::SyncAction;

/// Configuration for retrying failed jobs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts per job, the first one included.
    pub max_attempts: u32,
    /// Delay before a failed job is submitted again.
    pub delay: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            delay: Duration::from_secs(30),
        }
    }
}

impl RetryConfig {
    /// Decides what happens after the `failures`'th failed attempt of a job.
    pub fn decide(&self, failures: u32) -> RetryDecision {
        if failures >= self.max_attempts {
            RetryDecision::GiveUp { attempts: failures }
        } else {
            RetryDecision::Retry { delay: self.delay }
        }
    }
}

/// The scheduler's verdict on a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Re-submit the job after `delay`.
    Retry { delay: Duration },
    /// The ceiling is reached; drop the job.
    GiveUp { attempts: u32 },
}

/// Decides between giving up and retrying, and arms retry timers.
///
/// Timers run as tasks on a tokio runtime so the worker that saw the
/// failure goes straight back to the queue. Each timer watches a shutdown
/// channel; [`stop`](Self::stop) cancels all of them.
pub struct RetryScheduler {
    exchange: Arc<JobExchange>,
    config: RetryConfig,
    runtime: Handle,
    shutdown_tx: watch::Sender<bool>,
    armed: Arc<AtomicUsize>,
}

impl RetryScheduler {
    /// Creates a scheduler that re-submits into `exchange`, running its
    /// timers on `runtime`.
    pub fn new(exchange: Arc<JobExchange>, config: RetryConfig, runtime: Handle) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            exchange,
            config,
            runtime,
            shutdown_tx,
            armed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns the retry configuration.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Handles a failed attempt of `job`.
    ///
    /// The caller must already have completed the job's key on the exchange,
    /// otherwise a short delay could see the re-submission suppressed.
    pub fn on_failure(&self, job: Job, action: SyncAction) -> RetryDecision {
        let failures = job.attempt();
        let decision = self.config.decide(failures);

        match decision {
            RetryDecision::GiveUp { attempts } => {
                job.sink().report(format!(
                    "{} times failed to sync {}, giving up",
                    attempts,
                    job.key()
                ));
                warn!("Giving up on {} after {} attempts", job.key(), attempts);
                counter!("mirror_give_ups_total").increment(1);
            },
            RetryDecision::Retry { delay } => {
                job.sink().report(format!(
                    "{} error {} {}. Retrying in {} seconds",
                    ordinal(failures),
                    action.gerund(),
                    job.key(),
                    delay.as_secs()
                ));
                info!(
                    "Retrying {} in {:?} (attempt {} of {})",
                    job.key(),
                    delay,
                    failures + 1,
                    self.config.max_attempts
                );
                counter!("mirror_retries_scheduled_total").increment(1);
                self.schedule(job.into_retry(), delay);
            },
        }

        decision
    }

    /// Arms a one-shot timer that submits `job` after `delay`.
    fn schedule(&self, job: Job, delay: Duration) {
        let mut shutdown_rx = self.shutdown_tx.subscribe();
        if *shutdown_rx.borrow() {
            debug!("Scheduler stopped, dropping retry for {}", job.key());
            return;
        }

        let exchange = Arc::clone(&self.exchange);
        let armed = Arc::clone(&self.armed);
        armed.fetch_add(1, Ordering::SeqCst);

        self.runtime.spawn(async move {
            tokio::select! {
                _ = tokio::time::sleep(delay) => {
                    let key = job.key().clone();
                    let submission = exchange.submit(job);
                    debug!("Retry for {} submitted: {:?}", key, submission);
                }
                _ = shutdown_rx.changed() => {
                    debug!("Retry for {} cancelled", job.key());
                }
            }
            armed.fetch_sub(1, Ordering::SeqCst);
        });
    }

    /// Returns the number of retry timers that have not fired yet.
    pub fn scheduled(&self) -> usize {
        self.armed.load(Ordering::SeqCst)
    }

    /// Cancels every armed timer and refuses to arm new ones.
    pub fn stop(&self) {
        // send_replace stores the flag even when no timer is listening
        self.shutdown_tx.send_replace(true);
    }
}

impl Drop for RetryScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

impl std::fmt::Debug for RetryScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryScheduler")
            .field("config", &self.config)
            .field("scheduled", &self.scheduled())
            .finish()
    }
}

/// English ordinal: 1st, 2nd, 3rd, 4th, 11th, 21st...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}
