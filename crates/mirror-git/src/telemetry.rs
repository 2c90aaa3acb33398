//! Sync metrics recording.

use metrics::{counter, gauge};

use crate::repository::SyncOutcome;
use crate::sync::Submission;

/// Describes the sync metrics.
/// Call once at startup, after a recorder is installed.
pub fn register_sync_metrics() {
    metrics::describe_counter!(
        "mirror_sync_total",
        "Sync attempts by action (clone/fetch) and result"
    );
    metrics::describe_counter!(
        "mirror_submissions_total",
        "Job submissions by outcome (queued/replaced/suppressed/closed)"
    );
    metrics::describe_counter!(
        "mirror_retries_scheduled_total",
        "Failed attempts that armed a retry timer"
    );
    metrics::describe_counter!(
        "mirror_give_ups_total",
        "Jobs abandoned after reaching the retry ceiling"
    );
    metrics::describe_gauge!("mirror_pending_jobs", "Jobs waiting for a worker");
}

pub(crate) fn record_outcome(outcome: &SyncOutcome) {
    let result = if outcome.is_success() {
        "success"
    } else {
        "failure"
    };
    counter!(
        "mirror_sync_total",
        "action" => outcome.action().as_str(),
        "result" => result
    )
    .increment(1);
}

pub(crate) fn record_submission(submission: Submission) {
    counter!("mirror_submissions_total", "outcome" => submission.as_str()).increment(1);
}

pub(crate) fn record_pending(pending: usize) {
    gauge!("mirror_pending_jobs").set(pending as f64);
}
