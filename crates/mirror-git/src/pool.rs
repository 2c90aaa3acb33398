//! Fixed-size pool of sync workers.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use mirror_core::{Job, RepositoryKey};
use tracing::{debug, error, info, info_span};

use crate::error::SyncError;
use crate::repository::{RepoSyncer, SyncOutcome};
use crate::sync::{JobExchange, MirrorState, RetryDecision, RetryScheduler};
use crate::telemetry::record_outcome;

/// Everything a worker needs, shared by all workers.
struct WorkerContext {
    exchange: Arc<JobExchange>,
    syncer: Arc<RepoSyncer>,
    scheduler: Arc<RetryScheduler>,
    state: Arc<MirrorState>,
}

/// A key claimed from the exchange. Dropping it without calling
/// [`release`](Claim::release) still completes the key, so an unwinding
/// worker cannot leave it stuck in progress.
struct Claim<'a> {
    exchange: &'a JobExchange,
    key: &'a RepositoryKey,
    released: bool,
}

impl<'a> Claim<'a> {
    fn new(exchange: &'a JobExchange, key: &'a RepositoryKey) -> Self {
        Self {
            exchange,
            key,
            released: false,
        }
    }

    fn release(mut self) {
        self.released = true;
        self.exchange.complete(self.key);
    }
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.exchange.complete(self.key);
        }
    }
}

impl WorkerContext {
    fn process(&self, key: &RepositoryKey, job: Job) {
        let claim = Claim::new(&self.exchange, key);

        debug!("Starting attempt {}", job.attempt());
        let outcome = self.syncer.sync(key, job.sink());
        record_outcome(&outcome);

        match outcome {
            SyncOutcome::Success(action) => {
                self.state.record_success(key, action);
                claim.release();
            },
            SyncOutcome::Failure { action, error } => {
                self.state.record_failure(key, action, error.to_string());
                // the key must be free before a retry can be submitted
                claim.release();
                if let RetryDecision::GiveUp { .. } = self.scheduler.on_failure(job, action) {
                    self.state.record_give_up(key);
                }
            },
        }
    }
}

/// A fixed number of worker threads pulling from a [`JobExchange`].
///
/// Each worker blocks for the full duration of its git command, so the pool
/// size bounds concurrent clones and fetches. Workers run until the exchange
/// is closed.
pub struct WorkerPool {
    exchange: Arc<JobExchange>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns `size` workers.
    pub fn spawn(
        size: usize,
        exchange: Arc<JobExchange>,
        syncer: Arc<RepoSyncer>,
        scheduler: Arc<RetryScheduler>,
        state: Arc<MirrorState>,
    ) -> Result<Self, SyncError> {
        if size == 0 {
            return Err(SyncError::invalid_config("worker pool size must be at least 1"));
        }

        let context = Arc::new(WorkerContext {
            exchange: Arc::clone(&exchange),
            syncer,
            scheduler,
            state,
        });

        let mut pool = Self {
            exchange,
            workers: Vec::with_capacity(size),
        };

        for worker_id in 0..size {
            let context = Arc::clone(&context);
            let spawned = thread::Builder::new()
                .name(format!("mirror-worker-{}", worker_id))
                .spawn(move || worker_loop(worker_id, &context));

            match spawned {
                Ok(handle) => pool.workers.push(handle),
                Err(e) => {
                    pool.shutdown_and_join();
                    return Err(SyncError::Worker(e));
                },
            }
        }

        info!("Started {} sync workers", size);
        Ok(pool)
    }

    /// Returns the number of workers.
    pub fn size(&self) -> usize {
        self.workers.len()
    }

    /// Closes the exchange and waits for every worker to finish its current
    /// attempt.
    pub fn shutdown_and_join(self) {
        self.exchange.close();
        for worker in self.workers {
            if worker.join().is_err() {
                error!("A sync worker exited with a panic");
            }
        }
        info!("Sync workers stopped");
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("size", &self.size())
            .finish()
    }
}

fn worker_loop(worker_id: usize, context: &WorkerContext) {
    debug!("Worker {} waiting for jobs", worker_id);

    while let Some((key, job)) = context.exchange.take_next() {
        let span = info_span!("sync", worker = worker_id, key = %key);
        let _entered = span.enter();

        let result = panic::catch_unwind(AssertUnwindSafe(|| context.process(&key, job)));
        if result.is_err() {
            error!("Sync of {} panicked; worker {} continues", key, worker_id);
        }
    }

    debug!("Worker {} exiting", worker_id);
}
