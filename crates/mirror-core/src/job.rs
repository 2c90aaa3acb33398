//! Sync jobs.

use crate::sink::StatusSink;
use crate::types::RepositoryKey;

/// A request to bring one repository mirror up to date.
///
/// `failures` counts the attempts of this job that already failed; a fresh
/// trigger starts at zero and every retry re-submission carries the count
/// one higher.
#[derive(Debug, Clone)]
pub struct Job {
    key: RepositoryKey,
    failures: u32,
    sink: StatusSink,
}

impl Job {
    /// Creates a fresh job for a trigger.
    pub fn new(key: RepositoryKey, sink: StatusSink) -> Self {
        Self {
            key,
            failures: 0,
            sink,
        }
    }

    /// Returns the repository key.
    pub fn key(&self) -> &RepositoryKey {
        &self.key
    }

    /// Returns how many attempts of this job already failed.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Returns the attempt number (1-based) the next run of this job will be.
    pub fn attempt(&self) -> u32 {
        self.failures + 1
    }

    /// Returns the status sink.
    pub fn sink(&self) -> &StatusSink {
        &self.sink
    }

    /// Returns the job to re-submit after another failed attempt.
    pub fn into_retry(self) -> Self {
        Self {
            failures: self.failures + 1,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_increments_failures() {
        let key = RepositoryKey::parse("acme/foo").unwrap();
        let job = Job::new(key.clone(), StatusSink::noop());
        assert_eq!(job.failures(), 0);
        assert_eq!(job.attempt(), 1);

        let retry = job.into_retry().into_retry();
        assert_eq!(retry.failures(), 2);
        assert_eq!(retry.attempt(), 3);
        assert_eq!(retry.key(), &key);
    }
}
