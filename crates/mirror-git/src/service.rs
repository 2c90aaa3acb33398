//! Mirror service: the wired-up engine behind the submit-trigger interface.

use std::sync::Arc;

use mirror_core::{Job, RepositoryKey, StatusSink};
use tokio::runtime::Handle;
use tracing::{debug, info};

use crate::error::SyncError;
use crate::pool::WorkerPool;
use crate::repository::{GitCommand, MirrorConfig, RepoSyncer, SystemGit};
use crate::sync::{JobExchange, MirrorState, RetryScheduler, Submission};

/// Keeps repository mirrors up to date in response to triggers.
///
/// Owns one [`JobExchange`], the worker pool draining it and the retry
/// scheduler feeding failed jobs back into it.
pub struct MirrorService {
    config: MirrorConfig,
    exchange: Arc<JobExchange>,
    scheduler: Arc<RetryScheduler>,
    state: Arc<MirrorState>,
    syncer: Arc<RepoSyncer>,
    pool: Option<WorkerPool>,
}

impl MirrorService {
    /// Starts the service with the system git binary.
    ///
    /// `runtime` hosts the retry timers; workers are OS threads.
    pub fn start(config: MirrorConfig, runtime: Handle) -> Result<Self, SyncError> {
        let git = Arc::new(SystemGit::new(config.git_binary()));
        Self::with_git(config, git, runtime)
    }

    /// Starts the service with a custom git implementation.
    pub fn with_git(
        config: MirrorConfig,
        git: Arc<dyn GitCommand>,
        runtime: Handle,
    ) -> Result<Self, SyncError> {
        config.validate()?;

        let exchange = Arc::new(JobExchange::new());
        let state = Arc::new(MirrorState::new());
        let syncer = Arc::new(RepoSyncer::new(&config, git));
        let scheduler = Arc::new(RetryScheduler::new(
            Arc::clone(&exchange),
            config.retry_config(),
            runtime,
        ));

        let pool = WorkerPool::spawn(
            config.workers(),
            Arc::clone(&exchange),
            Arc::clone(&syncer),
            Arc::clone(&scheduler),
            Arc::clone(&state),
        )?;

        info!(
            "Mirror service started: {} workers, mirrors under {:?}, {} attempts per job",
            pool.size(),
            config.mirror_root(),
            config.max_attempts()
        );

        Ok(Self {
            config,
            exchange,
            scheduler,
            state,
            syncer,
            pool: Some(pool),
        })
    }

    /// Enqueues a sync of `key`, reporting progress to `sink`.
    ///
    /// A trigger for a repository that is being synced right now is dropped;
    /// the sink is told so.
    pub fn submit(&self, key: RepositoryKey, sink: StatusSink) -> Submission {
        let job = Job::new(key.clone(), sink.clone());
        let submission = self.exchange.submit(job);

        match submission {
            Submission::Suppressed => {
                sink.report(format!("repository {} is already being synced", key));
            },
            Submission::Closed => {
                debug!("Ignoring trigger for {}: service is shutting down", key);
            },
            Submission::Queued | Submission::Replaced => {},
        }
        submission
    }

    /// Returns the configuration.
    pub fn config(&self) -> &MirrorConfig {
        &self.config
    }

    /// Returns the job exchange.
    pub fn exchange(&self) -> &Arc<JobExchange> {
        &self.exchange
    }

    /// Returns the retry scheduler.
    pub fn scheduler(&self) -> &RetryScheduler {
        &self.scheduler
    }

    /// Returns the per-repository sync state.
    pub fn state(&self) -> &MirrorState {
        &self.state
    }

    /// Returns the syncer, e.g. to locate a mirror on disk.
    pub fn syncer(&self) -> &RepoSyncer {
        &self.syncer
    }

    /// Cancels pending retries, stops taking jobs and waits for in-flight
    /// attempts to finish. Blocks; call it from a blocking context.
    pub fn shutdown(&mut self) {
        if let Some(pool) = self.pool.take() {
            info!("Shutting down mirror service");
            self.scheduler.stop();
            pool.shutdown_and_join();
        }
    }
}

impl Drop for MirrorService {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl std::fmt::Debug for MirrorService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorService")
            .field("mirror_root", &self.config.mirror_root())
            .field("pending", &self.exchange.pending_len())
            .field("in_progress", &self.exchange.in_progress_len())
            .finish()
    }
}
