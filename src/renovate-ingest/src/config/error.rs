//! Configuration error types.

use thiserror::Error;

/// Errors that can occur while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read a file.
    #[error("Failed to read file '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML content.
    #[error("Failed to parse configuration file '{path}': {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    /// A required setting is absent.
    #[error("Missing required setting: {setting}")]
    MissingSetting { setting: &'static str },

    /// A setting has an invalid value.
    #[error("Invalid value for '{setting}': {message}")]
    ValidationError {
        setting: &'static str,
        message: String,
    },
}
