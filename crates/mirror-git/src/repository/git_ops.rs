//! Git invocations via the system `git` CLI.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use tracing::{debug, warn};

use crate::error::SyncError;

/// The two git operations a mirror needs.
///
/// Implementations run exactly one command per call and block until it
/// exits. `Ok(())` means exit status zero; any other exit, or a command that
/// cannot be started, is an error.
pub trait GitCommand: Send + Sync {
    /// Creates a bare clone of `remote_url` at `dest`.
    fn clone_bare(&self, remote_url: &str, dest: &Path) -> Result<(), SyncError>;

    /// Updates the bare repository at `git_dir` from `remote_url`, pruning
    /// deleted refs and fetching tags.
    fn fetch(&self, git_dir: &Path, remote_url: &str) -> Result<(), SyncError>;
}

/// Runs the `git` executable.
#[derive(Debug, Clone)]
pub struct SystemGit {
    binary: PathBuf,
}

impl SystemGit {
    /// Creates a runner for the given git executable.
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Returns the git executable.
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Creates a git Command that never prompts for credentials.
    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.env("GIT_TERMINAL_PROMPT", "0");
        cmd.stdin(Stdio::null());
        cmd
    }

    fn run(&self, mut cmd: Command, description: String) -> Result<(), SyncError> {
        debug!("Running {}", description);

        let output = cmd.output().map_err(|source| SyncError::Spawn {
            command: description.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("{} exited with {}: {}", description, output.status, stderr.trim());
            Err(SyncError::command_failed(description, output.status))
        }
    }
}

impl Default for SystemGit {
    fn default() -> Self {
        Self::new("git")
    }
}

impl GitCommand for SystemGit {
    fn clone_bare(&self, remote_url: &str, dest: &Path) -> Result<(), SyncError> {
        let mut cmd = self.command();
        cmd.args(["clone", "--bare", "--quiet", remote_url]).arg(dest);
        self.run(cmd, format!("git clone --bare {}", remote_url))
    }

    fn fetch(&self, git_dir: &Path, remote_url: &str) -> Result<(), SyncError> {
        let mut cmd = self.command();
        // Bare clones carry no remote-tracking refspec, so heads are mapped
        // explicitly for --prune to have something to prune.
        cmd.arg("--git-dir").arg(git_dir).args([
            "fetch",
            "--prune",
            "--tags",
            "--quiet",
            remote_url,
            "+refs/heads/*:refs/heads/*",
        ]);
        self.run(cmd, format!("git fetch {}", remote_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_binary_is_a_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let git = SystemGit::new(dir.path().join("no-such-git"));

        let err = git
            .clone_bare("https://example.invalid/acme/foo.git", &dir.path().join("foo.git"))
            .unwrap_err();

        assert!(matches!(err, SyncError::Spawn { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn test_default_binary_is_git() {
        assert_eq!(SystemGit::default().binary(), Path::new("git"));
    }

    /// Runs git in `dir` and returns its stdout, failing the test on error.
    fn git_in(dir: &Path, args: &[&str]) -> String {
        let output = Command::new("git")
            .current_dir(dir)
            .args(["-c", "user.name=Mirror Test", "-c", "user.email=mirror@example.test"])
            .args(args)
            .output()
            .expect("Failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8_lossy(&output.stdout).into_owned()
    }

    fn mirror_refs(git_dir: &Path) -> Vec<String> {
        let dir = git_dir.to_str().unwrap();
        git_in(Path::new("."), &["--git-dir", dir, "for-each-ref", "--format=%(refname)"])
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_fetch_prunes_deleted_heads_and_adds_tags() {
        let dir = tempfile::tempdir().unwrap();
        let remote = dir.path().join("remote");
        std::fs::create_dir_all(&remote).unwrap();
        git_in(&remote, &["init", "--quiet", "--initial-branch=main"]);
        git_in(&remote, &["commit", "--quiet", "--allow-empty", "-m", "initial"]);
        git_in(&remote, &["branch", "doomed"]);

        let url = format!("file://{}", remote.display());
        let mirror = dir.path().join("mirrors").join("acme").join("remote.git");
        std::fs::create_dir_all(mirror.parent().unwrap()).unwrap();
        let git = SystemGit::default();

        git.clone_bare(&url, &mirror).unwrap();
        let refs = mirror_refs(&mirror);
        assert!(refs.contains(&"refs/heads/main".to_string()));
        assert!(refs.contains(&"refs/heads/doomed".to_string()));

        git_in(&remote, &["branch", "-D", "doomed"]);
        git_in(&remote, &["tag", "v1"]);
        git_in(&remote, &["commit", "--quiet", "--allow-empty", "-m", "second"]);

        git.fetch(&mirror, &url).unwrap();

        let refs = mirror_refs(&mirror);
        assert!(refs.contains(&"refs/heads/main".to_string()));
        assert!(refs.contains(&"refs/tags/v1".to_string()));
        assert!(!refs.contains(&"refs/heads/doomed".to_string()));
        assert_eq!(
            git_in(Path::new("."), &["--git-dir", mirror.to_str().unwrap(), "rev-parse", "main"]),
            git_in(&remote, &["rev-parse", "main"])
        );
    }

    #[test]
    fn test_clone_of_missing_remote_fails() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("file://{}", dir.path().join("absent").display());

        let err = SystemGit::default()
            .clone_bare(&url, &dir.path().join("absent.git"))
            .unwrap_err();

        assert!(matches!(err, SyncError::CommandFailed { .. }));
    }
}
