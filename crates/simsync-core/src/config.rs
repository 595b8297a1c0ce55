use crate::retry::RetryPolicy;
use crate::CoreError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Instruments identifier of the simulator used when `--device` is absent.
pub const DEFAULT_SIMULATOR: &str = "iPhone 15 (17.0)";
pub const DEFAULT_BACKEND: &str = "simctl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub default_device: String,
    pub backend: String,
    pub retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_device: DEFAULT_SIMULATOR.to_owned(),
            backend: DEFAULT_BACKEND.to_owned(),
            retry: RetryPolicy::default(),
        }
    }
}

impl Config {
    /// Load from `$SIMSYNC_CONFIG` or `~/.config/simsync/config.toml`, then
    /// apply environment overrides. A missing file yields the defaults.
    pub fn load_default() -> Result<Self, CoreError> {
        let path = match std::env::var_os("SIMSYNC_CONFIG") {
            Some(p) => Some(PathBuf::from(p)),
            None => default_config_path(),
        };
        let config = match path {
            Some(p) if p.is_file() => Self::load(&p)?,
            Some(p) => {
                debug!("no config at {}; using defaults", p.display());
                Self::default()
            }
            None => Self::default(),
        };
        Ok(config.with_env_overrides(|key| std::env::var(key).ok()))
    }

    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::parse(&content)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, CoreError> {
        toml::from_str(content).map_err(|e| CoreError::Config(format!("invalid config: {e}")))
    }

    /// Apply `SIMSYNC_DEFAULT_DEVICE` and `SIMSYNC_BACKEND` as resolved by
    /// `lookup`. Empty values are ignored.
    #[must_use]
    pub fn with_env_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(device) = lookup("SIMSYNC_DEFAULT_DEVICE").filter(|v| !v.is_empty()) {
            self.default_device = device;
        }
        if let Some(backend) = lookup("SIMSYNC_BACKEND").filter(|v| !v.is_empty()) {
            self.backend = backend;
        }
        self
    }
}

fn default_config_path() -> Option<PathBuf> {
    let home = std::env::var_os("HOME")?;
    Some(PathBuf::from(home).join(".config/simsync/config.toml"))
}
