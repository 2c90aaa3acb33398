//! Error types for the mirror domain.
//!
//! Only key validation can fail at this layer. Sync failures are owned by
//! `mirror-git` and never cross the worker boundary as errors.
//!
//! # Example
//!
//! ```
//! use mirror_core::{MirrorError, RepositoryKey};
//!
//! let err = RepositoryKey::parse("no-slash-here").unwrap_err();
//! assert!(matches!(err, MirrorError::InvalidKey { .. }));
//! ```

use thiserror::Error;

/// Main error type for mirror domain operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    /// A repository key could not be built from the given input.
    #[error("invalid repository key '{input}': {reason}")]
    InvalidKey {
        /// The rejected input.
        input: String,
        /// Why it was rejected.
        reason: String,
    },
}

impl MirrorError {
    /// Creates an invalid key error.
    pub fn invalid_key(input: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            input: input.into(),
            reason: reason.into(),
        }
    }
}

/// Result type alias using [`MirrorError`].
pub type Result<T> = std::result::Result<T, MirrorError>;
