//! Test helpers for mirror-git.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use mirror_git::{GitCommand, MirrorConfig, RepositoryKey, StatusSink, SyncError};
use parking_lot::{Condvar, Mutex};

/// Builds a key from `owner/name`. Panics on invalid input.
pub fn key(s: &str) -> RepositoryKey {
    RepositoryKey::parse(s).expect("Failed to parse test repository key")
}

/// Returns a sink together with the buffer it records into.
pub fn recording_sink() -> (StatusSink, Arc<Mutex<Vec<String>>>) {
    let lines = Arc::new(Mutex::new(Vec::new()));
    let captured = Arc::clone(&lines);
    let sink = StatusSink::new(move |msg| captured.lock().push(msg.to_string()));
    (sink, lines)
}

/// Config for tests: owner `acme`, a short retry delay.
pub fn config(root: &Path, workers: usize, max_attempts: u32) -> MirrorConfig {
    MirrorConfig::builder()
        .owner("acme")
        .mirror_root(root)
        .remote_base("https://git.example.test")
        .workers(workers)
        .max_attempts(max_attempts)
        .retry_delay(Duration::from_millis(20))
        .build()
        .expect("Failed to build test config")
}

/// Polls `condition` until it holds. Panics after five seconds.
pub fn wait_until(what: &str, condition: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !condition() {
        if Instant::now() > deadline {
            panic!("timed out waiting for {}", what);
        }
        std::thread::sleep(Duration::from_millis(5));
    }
}

/// A scripted git: fails a configured number of times per repository and
/// can hold clones until released.
#[derive(Default)]
pub struct FakeGit {
    clone_failures: Mutex<HashMap<String, u32>>,
    fetch_failures: Mutex<HashMap<String, u32>>,
    held: Mutex<Option<String>>,
    released: Condvar,
    calls: Mutex<Vec<String>>,
}

impl FakeGit {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Makes the next `times` clones of `repo` fail.
    pub fn fail_clone(&self, repo: &str, times: u32) {
        self.clone_failures.lock().insert(repo.to_string(), times);
    }

    /// Makes the next `times` fetches of `repo` fail.
    pub fn fail_fetch(&self, repo: &str, times: u32) {
        self.fetch_failures.lock().insert(repo.to_string(), times);
    }

    /// Blocks clones of `repo` until [`release`](Self::release).
    pub fn hold(&self, repo: &str) {
        *self.held.lock() = Some(repo.to_string());
    }

    pub fn release(&self) {
        *self.held.lock() = None;
        self.released.notify_all();
    }

    /// Invocations so far, as `"clone owner/name"` / `"fetch owner/name"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| *c == call).count()
    }

    fn take_failure(table: &Mutex<HashMap<String, u32>>, repo: &str) -> bool {
        let mut table = table.lock();
        match table.get_mut(repo) {
            Some(left) if *left > 0 => {
                *left -= 1;
                true
            },
            _ => false,
        }
    }
}

/// `https://host/acme/foo.git` -> `acme/foo`
fn repo_of(url: &str) -> String {
    let trimmed = url.trim_end_matches(".git");
    let mut parts = trimmed.rsplit('/');
    let name = parts.next().unwrap_or_default();
    let owner = parts.next().unwrap_or_default();
    format!("{}/{}", owner, name)
}

impl GitCommand for FakeGit {
    fn clone_bare(&self, remote_url: &str, dest: &Path) -> Result<(), SyncError> {
        let repo = repo_of(remote_url);
        self.calls.lock().push(format!("clone {}", repo));

        let mut held = self.held.lock();
        while held.as_deref() == Some(repo.as_str()) {
            self.released.wait(&mut held);
        }
        drop(held);

        // a real clone leaves a partial directory behind when it fails
        fs::create_dir_all(dest.join("objects")).expect("create fake mirror");

        if Self::take_failure(&self.clone_failures, &repo) {
            Err(SyncError::command_failed("git clone", "exit status: 128"))
        } else {
            Ok(())
        }
    }

    fn fetch(&self, _git_dir: &Path, remote_url: &str) -> Result<(), SyncError> {
        let repo = repo_of(remote_url);
        self.calls.lock().push(format!("fetch {}", repo));

        if Self::take_failure(&self.fetch_failures, &repo) {
            Err(SyncError::command_failed("git fetch", "exit status: 1"))
        } else {
            Ok(())
        }
    }
}
