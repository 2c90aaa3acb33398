//! Repository identity.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{MirrorError, Result};

/// Identity of a mirrored repository: `owner/name`.
///
/// The key is both the dedup key of the job queue and the source of the
/// on-disk path components, so both parts are restricted to characters that
/// are safe as a single path segment.
///
/// # Example
///
/// ```
/// use mirror_core::RepositoryKey;
///
/// let key = RepositoryKey::parse("acme/widgets.git").unwrap();
/// assert_eq!(key.owner(), "acme");
/// assert_eq!(key.name(), "widgets");
/// assert_eq!(key.to_string(), "acme/widgets");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepositoryKey {
    owner: String,
    name: String,
}

impl RepositoryKey {
    /// Creates a key from its two parts, validating both.
    ///
    /// A trailing `.git` on the name is dropped.
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Result<Self> {
        let owner = owner.into();
        let name = name.into();
        let display = format!("{}/{}", owner, name);

        validate_segment(&display, "owner", &owner)?;
        let name = name.strip_suffix(".git").unwrap_or(&name).to_string();
        validate_segment(&display, "name", &name)?;

        Ok(Self { owner, name })
    }

    /// Parses `owner/name`.
    pub fn parse(input: &str) -> Result<Self> {
        let trimmed = input.trim();
        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) => Self::new(owner, name),
            (_, _, Some(_)) => Err(MirrorError::invalid_key(input, "too many '/' separators")),
            _ => Err(MirrorError::invalid_key(input, "expected 'owner/name'")),
        }
    }

    /// Parses either `owner/name` or a bare `name`, in which case
    /// `default_owner` supplies the owner.
    pub fn parse_with_default_owner(input: &str, default_owner: &str) -> Result<Self> {
        let trimmed = input.trim();
        if trimmed.contains('/') {
            Self::parse(trimmed)
        } else {
            Self::new(default_owner, trimmed)
        }
    }

    /// Returns the owner (namespace) part.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Returns the repository name, without any `.git` suffix.
    pub fn name(&self) -> &str {
        &self.name
    }
}

fn validate_segment(input: &str, part: &str, segment: &str) -> Result<()> {
    if segment.is_empty() {
        return Err(MirrorError::invalid_key(input, format!("{part} cannot be empty")));
    }

    if segment == "." || segment == ".." {
        return Err(MirrorError::invalid_key(
            input,
            format!("{part} cannot be '.' or '..'"),
        ));
    }

    if let Some(c) = segment
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.')))
    {
        return Err(MirrorError::invalid_key(
            input,
            format!("{part} contains invalid character {c:?}"),
        ));
    }

    Ok(())
}

impl fmt::Display for RepositoryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepositoryKey {
    type Err = MirrorError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for RepositoryKey {
    type Error = MirrorError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<RepositoryKey> for String {
    fn from(key: RepositoryKey) -> Self {
        key.to_string()
    }
}
