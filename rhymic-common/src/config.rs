//! Configuration loading and resolution
//!
//! Every setting resolves through the same priority order:
//! 1. Explicit override from the embedding application (highest priority)
//! 2. Environment variable (`RHYMIC_API_URL`, `RHYMIC_DATABASE`,
//!    `RHYMIC_EVENT_CAPACITY`)
//! 3. TOML config file (`~/.config/rhymic/config.toml`, or
//!    `/etc/rhymic/config.toml` on Linux)
//! 4. Compiled default (fallback)
//!
//! Missing config files never cause termination; resolution degrades to the
//! compiled defaults with a warning.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::warn;

/// Default authentication/asset host, matching the development server
pub const DEFAULT_API_BASE_URL: &str = "http://127.0.0.1:5000";

/// Default event bus channel capacity
pub const DEFAULT_EVENT_CAPACITY: usize = 100;

/// Environment variable overriding the API base URL
pub const ENV_API_URL: &str = "RHYMIC_API_URL";

/// Environment variable overriding the session database path
pub const ENV_DATABASE: &str = "RHYMIC_DATABASE";

/// Environment variable overriding the event bus capacity
pub const ENV_EVENT_CAPACITY: &str = "RHYMIC_EVENT_CAPACITY";

/// Optional settings read from the TOML config file
///
/// All fields are optional; absent fields fall through to the next
/// resolution priority.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub api_base_url: Option<String>,
    pub database_path: Option<PathBuf>,
    pub event_capacity: Option<usize>,
}

impl TomlConfig {
    /// Load the config file if one exists
    ///
    /// Returns `Ok(None)` when no config file is present; parse failures are
    /// reported as [`Error::Config`].
    pub fn load() -> Result<Option<Self>> {
        let Some(path) = config_file_path() else {
            return Ok(None);
        };
        let content = std::fs::read_to_string(&path)?;
        let config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("invalid config file {}: {}", path.display(), e)))?;
        Ok(Some(config))
    }
}

/// Fully resolved client configuration
#[derive(Debug, Clone)]
pub struct RhymicConfig {
    /// Base URL of the authentication/asset service
    pub api_base_url: String,
    /// Path of the local session database
    pub database_path: PathBuf,
    /// Event bus channel capacity
    pub event_capacity: usize,
}

/// Overrides supplied by the embedding application (priority 1)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_base_url: Option<String>,
    pub database_path: Option<PathBuf>,
    pub event_capacity: Option<usize>,
}

impl RhymicConfig {
    /// Resolve the full configuration using the documented priority order
    pub fn resolve(overrides: &ConfigOverrides) -> Self {
        let toml_config = match TomlConfig::load() {
            Ok(config) => config.unwrap_or_default(),
            Err(e) => {
                warn!(error = %e, "ignoring unreadable config file");
                TomlConfig::default()
            }
        };

        let api_base_url = overrides
            .api_base_url
            .clone()
            .or_else(|| std::env::var(ENV_API_URL).ok())
            .or(toml_config.api_base_url)
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());

        let database_path = overrides
            .database_path
            .clone()
            .or_else(|| std::env::var(ENV_DATABASE).ok().map(PathBuf::from))
            .or(toml_config.database_path)
            .unwrap_or_else(default_database_path);

        let event_capacity = overrides
            .event_capacity
            .or_else(env_event_capacity)
            .or(toml_config.event_capacity)
            .unwrap_or(DEFAULT_EVENT_CAPACITY);

        Self {
            api_base_url,
            database_path,
            event_capacity,
        }
    }
}

/// Read the event capacity env var, ignoring unparsable values with a warning
fn env_event_capacity() -> Option<usize> {
    let raw = std::env::var(ENV_EVENT_CAPACITY).ok()?;
    match raw.parse() {
        Ok(capacity) => Some(capacity),
        Err(_) => {
            warn!(value = %raw, "ignoring unparsable {}", ENV_EVENT_CAPACITY);
            None
        }
    }
}

/// Locate the platform config file, if any exists
fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = dirs::config_dir().map(|d| d.join("rhymic").join("config.toml")) {
        if path.exists() {
            return Some(path);
        }
    }
    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/rhymic/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }
    None
}

/// OS-dependent default location for the session database
fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rhymic").join("session.db"))
        .unwrap_or_else(|| PathBuf::from("rhymic-session.db"))
}
