//! Per-repository processing results.

use crate::ingest::RepositoryIngest;
use crate::model::OnboardingSample;

/// Result of processing a single repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepositoryOutcome {
    /// Pull requests were ingested and onboarding was sampled.
    Processed {
        /// Repository full name.
        repository: String,
        /// Ingested pull requests and skip counts.
        ingest: RepositoryIngest,
        /// Onboarding samples, in chronological order.
        samples: Vec<OnboardingSample>,
    },

    /// Processing failed with an error that does not affect other
    /// repositories.
    Failed {
        /// Repository full name.
        repository: String,
        /// Error message.
        error: String,
    },
}

impl RepositoryOutcome {
    /// Returns the repository full name.
    #[must_use]
    pub fn repository(&self) -> &str {
        match self {
            Self::Processed { repository, .. } | Self::Failed { repository, .. } => repository,
        }
    }
}
