//! Runner error types.

/// Errors that abort a run. Nothing is committed when one is returned.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// Configuration loading and validation errors.
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    /// A configured repository entry could not be resolved.
    #[error(transparent)]
    Discovery(#[from] crate::discovery::DiscoveryError),

    /// Authentication, rate limit or exhausted retry errors.
    #[error(transparent)]
    Provider(#[from] crate::provider::ProviderError),

    /// The batch could not be written.
    #[error(transparent)]
    Persistence(#[from] crate::persistence::PersistenceError),

    /// The blocking persistence task panicked or was cancelled.
    #[error("Persistence task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
