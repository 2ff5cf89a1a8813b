//! Repository discovery error types.

use crate::provider::ProviderError;
use thiserror::Error;

/// Errors that can occur while resolving configured repositories.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// An explicitly listed repository does not exist or is not visible.
    #[error("Repository '{entry}' not found")]
    RepositoryNotFound { entry: String },

    /// An owner entry matches neither a group nor a user.
    #[error("Owner '{owner}' not found as an organization, group or user")]
    OwnerNotFound { owner: String },

    /// Provider error while resolving an entry.
    #[error("Failed to resolve '{entry}': {source}")]
    Provider {
        entry: String,
        #[source]
        source: ProviderError,
    },
}
