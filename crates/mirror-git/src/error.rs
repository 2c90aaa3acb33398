//! Error types for mirror synchronization.

use std::path::PathBuf;

/// Errors that can occur while syncing mirrors or wiring the engine.
///
/// Sync errors never escape a worker: they are classified, reported through
/// the job's status sink and handed to the retry scheduler.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// A git command ran and exited with a non-zero status.
    #[error("git command failed: {command} ({status})")]
    CommandFailed { command: String, status: String },

    /// A git command could not be started at all (e.g. missing binary).
    #[error("could not run {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Preparing or cleaning the mirror directory failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread could not be started.
    #[error("failed to start worker: {0}")]
    Worker(#[source] std::io::Error),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl SyncError {
    /// Creates a command failure error.
    pub fn command_failed(command: impl Into<String>, status: impl ToString) -> Self {
        Self::CommandFailed {
            command: command.into(),
            status: status.to_string(),
        }
    }

    /// Creates an I/O error bound to a path.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Returns true if this error might not happen again on a later attempt.
    ///
    /// A binary that cannot be spawned counts as transient: it is retried and
    /// eventually given up on like any failed fetch.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::CommandFailed { .. } | Self::Spawn { .. } | Self::Io { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::command_failed("git fetch", "exit status: 128");
        assert_eq!(
            err.to_string(),
            "git command failed: git fetch (exit status: 128)"
        );

        let err = SyncError::invalid_config("workers must be at least 1");
        assert_eq!(
            err.to_string(),
            "invalid configuration: workers must be at least 1"
        );
    }

    #[test]
    fn test_is_transient() {
        assert!(SyncError::command_failed("git clone", "exit status: 1").is_transient());
        assert!(
            SyncError::Spawn {
                command: "git clone".to_string(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            }
            .is_transient()
        );
        assert!(!SyncError::invalid_config("bad").is_transient());
    }
}
