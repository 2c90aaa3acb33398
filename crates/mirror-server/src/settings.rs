//! Process settings, layered from defaults, a TOML file and the environment.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use mirror_git::{MirrorConfig, SyncError};
use serde::Deserialize;

/// Prefix of the environment variables that override file settings.
pub const ENV_PREFIX: &str = "MIRRORBOT";

/// Variable naming the settings file when no path is given on the command line.
pub const CONFIG_PATH_VAR: &str = "MIRRORBOT_CONFIG";

/// Settings file used when neither argv nor the environment names one.
pub const DEFAULT_CONFIG_PATH: &str = "mirrorbot.toml";

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to load settings: {0}")]
    Load(#[from] config::ConfigError),

    #[error(transparent)]
    Invalid(#[from] SyncError),
}

/// Settings of the mirror bot process.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Default owner for `!sync name` triggers.
    pub owner: String,
    pub mirror_root: PathBuf,
    pub remote_base: String,
    pub workers: usize,
    pub max_attempts: u32,
    pub retry_delay_secs: u64,
    pub git_binary: PathBuf,
    /// Address of the Prometheus scrape endpoint. Metrics are off when unset.
    #[serde(default)]
    pub metrics_addr: Option<SocketAddr>,
}

impl Settings {
    /// Loads settings from `file` (if it exists) and `MIRRORBOT_*` variables.
    pub fn load(file: &Path) -> Result<Self, SettingsError> {
        Self::load_with_env(file, Environment::with_prefix(ENV_PREFIX))
    }

    /// Loads settings with a caller-supplied environment source.
    pub fn load_with_env(file: &Path, env: Environment) -> Result<Self, SettingsError> {
        let settings = Config::builder()
            .set_default("mirror_root", "mirrors")?
            .set_default("remote_base", "https://github.com")?
            .set_default("workers", 4)?
            .set_default("max_attempts", 5)?
            .set_default("retry_delay_secs", 30)?
            .set_default("git_binary", "git")?
            .add_source(File::from(file).format(FileFormat::Toml).required(false))
            .add_source(env.try_parsing(true))
            .build()?
            .try_deserialize::<Self>()?;

        settings.to_mirror_config()?;
        Ok(settings)
    }

    /// Picks the settings file: first argument, then `MIRRORBOT_CONFIG`,
    /// then `mirrorbot.toml`.
    pub fn resolve_path(arg: Option<String>, env_value: Option<String>) -> PathBuf {
        arg.or(env_value)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
    }

    /// Converts to the engine configuration, validating every value.
    pub fn to_mirror_config(&self) -> Result<MirrorConfig, SyncError> {
        MirrorConfig::builder()
            .owner(&self.owner)
            .mirror_root(&self.mirror_root)
            .remote_base(&self.remote_base)
            .workers(self.workers)
            .max_attempts(self.max_attempts)
            .retry_delay(Duration::from_secs(self.retry_delay_secs))
            .git_binary(&self.git_binary)
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_path_precedence() {
        assert_eq!(
            Settings::resolve_path(Some("a.toml".into()), Some("b.toml".into())),
            PathBuf::from("a.toml")
        );
        assert_eq!(
            Settings::resolve_path(None, Some("b.toml".into())),
            PathBuf::from("b.toml")
        );
        assert_eq!(
            Settings::resolve_path(None, None),
            PathBuf::from(DEFAULT_CONFIG_PATH)
        );
    }
}
