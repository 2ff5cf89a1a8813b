//! Configuration loading and validation.
//!
//! [`Settings`] are read from an optional TOML file and overridden by command
//! line arguments and environment variables, then validated into an
//! [`IngestConfig`].

mod error;
mod ingest_config;
mod settings;

pub use error::ConfigError;
pub use ingest_config::{
    IngestConfig, DEFAULT_CONCURRENCY, DEFAULT_CONFIG_FILENAMES, DEFAULT_MAX_RETRIES,
    DEFAULT_ONBOARDING_PR_PATTERN, DEFAULT_SAMPLING_INTERVAL_WEEKS, DEFAULT_SAMPLING_MAX_WEEKS,
};
pub use settings::Settings;

use std::path::Path;
use tracing::debug;

/// Loads settings from a TOML file.
///
/// # Errors
///
/// Returns [`ConfigError`] if the file cannot be read or parsed.
pub fn load_settings(path: &Path) -> Result<Settings, ConfigError> {
    debug!(path = %path.display(), "Loading settings");

    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.display().to_string(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::TomlError {
        path: path.display().to_string(),
        source: e,
    })
}
