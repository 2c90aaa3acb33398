//! One clone-or-fetch attempt for a repository mirror.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use mirror_core::{RepositoryKey, StatusSink};
use tracing::{debug, info, warn};

use super::{GitCommand, MirrorConfig};
use crate::error::SyncError;

/// Which git operation an attempt performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncAction {
    /// No mirror existed; a bare clone was made.
    Clone,
    /// A mirror existed; it was fetched.
    Fetch,
}

impl SyncAction {
    /// Returns the metric label for this action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::Fetch => "fetch",
        }
    }

    /// "cloning" / "fetching", for progress text.
    pub fn gerund(&self) -> &'static str {
        match self {
            Self::Clone => "cloning",
            Self::Fetch => "fetching",
        }
    }

    /// "cloned" / "fetched", for progress text.
    pub fn past(&self) -> &'static str {
        match self {
            Self::Clone => "cloned",
            Self::Fetch => "fetched",
        }
    }
}

impl fmt::Display for SyncAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a single attempt. There is no partial success.
#[derive(Debug)]
pub enum SyncOutcome {
    /// The git command exited with status zero.
    Success(SyncAction),
    /// The git command failed or could not be run.
    Failure { action: SyncAction, error: SyncError },
}

impl SyncOutcome {
    /// Returns the action that was attempted.
    pub fn action(&self) -> SyncAction {
        match self {
            Self::Success(action) | Self::Failure { action, .. } => *action,
        }
    }

    /// Returns true for a successful attempt.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

/// Performs one attempt of bringing a local bare mirror up to date.
///
/// The mirror path and remote URL are derived from the key alone:
/// `<mirror_root>/<owner>/<name>.git` and `<remote_base>/<owner>/<name>.git`.
/// Whether the mirror directory exists is the only signal used to choose
/// between clone and fetch.
pub struct RepoSyncer {
    mirror_root: PathBuf,
    remote_base: String,
    git: Arc<dyn GitCommand>,
}

impl RepoSyncer {
    /// Creates a syncer for the configured mirror root and remote base.
    pub fn new(config: &MirrorConfig, git: Arc<dyn GitCommand>) -> Self {
        Self {
            mirror_root: config.mirror_root().to_path_buf(),
            remote_base: config.remote_base().trim_end_matches('/').to_string(),
            git,
        }
    }

    /// Returns the local mirror directory for a key.
    pub fn mirror_path(&self, key: &RepositoryKey) -> PathBuf {
        self.mirror_root
            .join(key.owner())
            .join(format!("{}.git", key.name()))
    }

    /// Returns the remote URL for a key.
    pub fn remote_url(&self, key: &RepositoryKey) -> String {
        format!("{}/{}/{}.git", self.remote_base, key.owner(), key.name())
    }

    /// Runs exactly one clone-or-fetch attempt.
    ///
    /// Success is reported through `sink`; failures are only returned, the
    /// retry scheduler owns their wording.
    pub fn sync(&self, key: &RepositoryKey, sink: &StatusSink) -> SyncOutcome {
        let path = self.mirror_path(key);
        let url = self.remote_url(key);

        if path.exists() {
            self.fetch_mirror(key, &path, &url, sink)
        } else {
            self.clone_mirror(key, &path, &url, sink)
        }
    }

    fn clone_mirror(
        &self,
        key: &RepositoryKey,
        path: &Path,
        url: &str,
        sink: &StatusSink,
    ) -> SyncOutcome {
        sink.report(format!("repository {} does not exist yet. Cloning...", key));
        info!("Cloning {} into {:?}", url, path);

        let result = create_parent(path).and_then(|()| self.git.clone_bare(url, path));

        match result {
            Ok(()) => {
                sink.report(format!("repository {} successfully cloned", key));
                info!("Repository {} cloned", key);
                SyncOutcome::Success(SyncAction::Clone)
            },
            Err(error) => {
                warn!("Clone of {} failed: {}", key, error);
                remove_partial_mirror(path);
                SyncOutcome::Failure {
                    action: SyncAction::Clone,
                    error,
                }
            },
        }
    }

    fn fetch_mirror(
        &self,
        key: &RepositoryKey,
        path: &Path,
        url: &str,
        sink: &StatusSink,
    ) -> SyncOutcome {
        sink.report(format!("fetching repository {}", key));
        info!("Fetching {} into {:?}", url, path);

        match self.git.fetch(path, url) {
            Ok(()) => {
                sink.report(format!("repository {} successfully fetched", key));
                info!("Repository {} fetched", key);
                SyncOutcome::Success(SyncAction::Fetch)
            },
            Err(error) => {
                // the existing mirror stays as it was
                warn!("Fetch of {} failed: {}", key, error);
                SyncOutcome::Failure {
                    action: SyncAction::Fetch,
                    error,
                }
            },
        }
    }
}

impl fmt::Debug for RepoSyncer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoSyncer")
            .field("mirror_root", &self.mirror_root)
            .field("remote_base", &self.remote_base)
            .finish()
    }
}

fn create_parent(path: &Path) -> Result<(), SyncError> {
    match path.parent() {
        Some(parent) => fs::create_dir_all(parent).map_err(|e| SyncError::io(parent, e)),
        None => Ok(()),
    }
}

fn remove_partial_mirror(path: &Path) {
    match fs::remove_dir_all(path) {
        Ok(()) => debug!("Removed partial mirror at {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {},
        Err(e) => warn!("Could not remove partial mirror at {:?}: {}", path, e),
    }
}
