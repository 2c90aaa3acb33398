//! Mirror engine configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SyncError;
use crate::sync::RetryConfig;

/// Configuration for the mirror engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MirrorConfig {
    /// Default owner (namespace) for triggers that name only a repository.
    owner: String,

    /// Root directory holding `<owner>/<repo>.git` mirrors.
    mirror_root: PathBuf,

    /// Base URL the remote is derived from: `<remote_base>/<owner>/<repo>.git`.
    #[serde(default = "default_remote_base")]
    remote_base: String,

    /// Number of worker threads.
    #[serde(default = "default_workers")]
    workers: usize,

    /// Attempts per job before giving up.
    #[serde(default = "default_max_attempts")]
    max_attempts: u32,

    /// Delay before a failed job is re-submitted.
    #[serde(default = "default_retry_delay", with = "secs_serde")]
    retry_delay: Duration,

    /// Git executable to invoke.
    #[serde(default = "default_git_binary")]
    git_binary: PathBuf,
}

fn default_remote_base() -> String {
    "https://github.com".to_string()
}

fn default_workers() -> usize {
    4
}

fn default_max_attempts() -> u32 {
    5
}

fn default_retry_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_git_binary() -> PathBuf {
    PathBuf::from("git")
}

impl MirrorConfig {
    /// Creates a new builder for MirrorConfig.
    pub fn builder() -> MirrorConfigBuilder {
        MirrorConfigBuilder::default()
    }

    /// Returns the default owner.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the mirror root directory.
    pub fn mirror_root(&self) -> &Path {
        &self.mirror_root
    }

    /// Returns the remote base URL.
    pub fn remote_base(&self) -> &str {
        &self.remote_base
    }

    /// Returns the worker pool size.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Returns the retry ceiling.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the retry delay.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    /// Returns the git executable.
    pub fn git_binary(&self) -> &Path {
        &self.git_binary
    }

    /// Returns the retry policy derived from this configuration.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            delay: self.retry_delay,
        }
    }

    /// Checks the values a deserialized config may carry.
    pub fn validate(&self) -> Result<(), SyncError> {
        if self.owner.trim().is_empty() {
            return Err(SyncError::invalid_config("owner cannot be empty"));
        }
        if self.workers == 0 {
            return Err(SyncError::invalid_config("workers must be at least 1"));
        }
        if self.max_attempts == 0 {
            return Err(SyncError::invalid_config("max_attempts must be at least 1"));
        }
        if self.remote_base.trim().is_empty() {
            return Err(SyncError::invalid_config("remote_base cannot be empty"));
        }
        Ok(())
    }
}

/// Builder for MirrorConfig.
#[derive(Debug, Default)]
pub struct MirrorConfigBuilder {
    owner: Option<String>,
    mirror_root: Option<PathBuf>,
    remote_base: Option<String>,
    workers: Option<usize>,
    max_attempts: Option<u32>,
    retry_delay: Option<Duration>,
    git_binary: Option<PathBuf>,
}

impl MirrorConfigBuilder {
    /// Sets the default owner.
    pub fn owner(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    /// Sets the mirror root directory.
    pub fn mirror_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.mirror_root = Some(path.into());
        self
    }

    /// Sets the remote base URL.
    pub fn remote_base(mut self, base: impl Into<String>) -> Self {
        self.remote_base = Some(base.into());
        self
    }

    /// Sets the worker pool size.
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = Some(workers);
        self
    }

    /// Sets the retry ceiling.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Sets the retry delay.
    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = Some(delay);
        self
    }

    /// Sets the git executable.
    pub fn git_binary(mut self, path: impl Into<PathBuf>) -> Self {
        self.git_binary = Some(path.into());
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or a value is out of range.
    pub fn build(self) -> Result<MirrorConfig, SyncError> {
        let owner = self
            .owner
            .ok_or_else(|| SyncError::invalid_config("owner is required"))?;
        let mirror_root = self
            .mirror_root
            .ok_or_else(|| SyncError::invalid_config("mirror_root is required"))?;

        let config = MirrorConfig {
            owner,
            mirror_root,
            remote_base: self.remote_base.unwrap_or_else(default_remote_base),
            workers: self.workers.unwrap_or_else(default_workers),
            max_attempts: self.max_attempts.unwrap_or_else(default_max_attempts),
            retry_delay: self.retry_delay.unwrap_or_else(default_retry_delay),
            git_binary: self.git_binary.unwrap_or_else(default_git_binary),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_minimal() {
        let config = MirrorConfig::builder()
            .owner("acme")
            .mirror_root("/srv/mirrors")
            .build()
            .unwrap();

        assert_eq!(config.owner(), "acme");
        assert_eq!(config.mirror_root(), Path::new("/srv/mirrors"));
        assert_eq!(config.remote_base(), "https://github.com");
        assert_eq!(config.workers(), 4);
        assert_eq!(config.max_attempts(), 5);
        assert_eq!(config.retry_delay(), Duration::from_secs(30));
        assert_eq!(config.git_binary(), Path::new("git"));
    }

    #[test]
    fn test_builder_full() {
        let config = MirrorConfig::builder()
            .owner("acme")
            .mirror_root("/srv/mirrors")
            .remote_base("ssh://git@example.com")
            .workers(2)
            .max_attempts(3)
            .retry_delay(Duration::from_secs(10))
            .git_binary("/usr/local/bin/git")
            .build()
            .unwrap();

        assert_eq!(config.workers(), 2);
        let retry = config.retry_config();
        assert_eq!(retry.max_attempts, 3);
        assert_eq!(retry.delay, Duration::from_secs(10));
    }

    #[test]
    fn test_builder_missing_owner() {
        let result = MirrorConfig::builder().mirror_root("/srv/mirrors").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_rejects_zero_workers() {
        let result = MirrorConfig::builder()
            .owner("acme")
            .mirror_root("/srv/mirrors")
            .workers(0)
            .build();
        assert!(matches!(result, Err(SyncError::InvalidConfig(_))));
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: MirrorConfig = serde_json::from_str(
            r#"{"owner": "acme", "mirrorRoot": "/srv/mirrors", "retryDelay": 12}"#,
        )
        .unwrap();

        assert_eq!(config.retry_delay(), Duration::from_secs(12));
        assert_eq!(config.workers(), 4);
        assert!(config.validate().is_ok());
    }
}

mod secs_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
