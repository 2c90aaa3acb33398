//! Turns free-form trigger text into sync submissions.

use mirror_git::{MirrorService, RepositoryKey, StatusSink, Submission};
use tracing::debug;

/// Command word that names a repository of the default owner.
pub const SYNC_COMMAND: &str = "!sync";

/// Anything that accepts sync triggers.
pub trait TriggerTarget {
    fn submit(&self, key: RepositoryKey, sink: StatusSink) -> Submission;
}

impl TriggerTarget for MirrorService {
    fn submit(&self, key: RepositoryKey, sink: StatusSink) -> Submission {
        MirrorService::submit(self, key, sink)
    }
}

/// Extracts repository references from a message and submits them.
///
/// Recognized forms:
/// - `owner/name` tokens
/// - `http(s)://host/owner/name[.git]` URLs
/// - `!sync name` or `!sync owner/name`, using the default owner for a bare name
#[derive(Debug, Clone)]
pub struct TriggerRouter {
    default_owner: String,
}

impl TriggerRouter {
    pub fn new(default_owner: impl Into<String>) -> Self {
        Self {
            default_owner: default_owner.into(),
        }
    }

    pub fn default_owner(&self) -> &str {
        &self.default_owner
    }

    /// Returns the repositories mentioned in `text`, in order of first
    /// mention, each at most once.
    pub fn extract_keys(&self, text: &str) -> Vec<RepositoryKey> {
        let mut keys: Vec<RepositoryKey> = Vec::new();
        let mut after_command = false;

        for raw in text.split_whitespace() {
            if raw.eq_ignore_ascii_case(SYNC_COMMAND) {
                after_command = true;
                continue;
            }

            let token = trim_punctuation(raw);
            let parsed = if after_command {
                RepositoryKey::parse_with_default_owner(token, &self.default_owner).ok()
            } else if let Some(rest) = strip_scheme(token) {
                key_from_url_path(rest)
            } else if token.contains('/') {
                RepositoryKey::parse(token).ok()
            } else {
                None
            };
            after_command = false;

            match parsed {
                Some(key) if !keys.contains(&key) => keys.push(key),
                Some(_) => {},
                None => debug!("Ignoring token {:?}", raw),
            }
        }

        keys
    }

    /// Submits every repository mentioned in `text` to `target`.
    pub fn route<T>(&self, text: &str, target: &T, sink: &StatusSink) -> Vec<(RepositoryKey, Submission)>
    where
        T: TriggerTarget + ?Sized,
    {
        self.extract_keys(text)
            .into_iter()
            .map(|key| {
                let submission = target.submit(key.clone(), sink.clone());
                debug!("Trigger for {}: {}", key, submission.as_str());
                (key, submission)
            })
            .collect()
    }
}

fn trim_punctuation(token: &str) -> &str {
    token
        .trim_start_matches(['(', '[', '<', '"', '\''])
        .trim_end_matches([')', ']', '>', '"', '\'', ',', '.', ';', ':', '!', '?'])
}

fn strip_scheme(token: &str) -> Option<&str> {
    token
        .strip_prefix("https://")
        .or_else(|| token.strip_prefix("http://"))
}

/// `host/owner/name[.git][/...]` -> `owner/name`
fn key_from_url_path(rest: &str) -> Option<RepositoryKey> {
    let mut segments = rest.split('/').filter(|s| !s.is_empty());
    let _host = segments.next()?;
    let owner = segments.next()?;
    let name = segments.next()?;
    RepositoryKey::new(owner, name).ok()
}
