//! Resolved repository information.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A repository resolved on the hosting provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Repository {
    /// Full repository path in "owner/name" format. GitLab paths may contain
    /// nested groups ("group/subgroup/name").
    pub full_name: String,

    /// When the repository was created, if the provider reports it.
    pub created_at: Option<DateTime<Utc>>,
}

impl Repository {
    /// Creates a repository without a known creation date.
    #[must_use]
    pub fn new(full_name: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            created_at: None,
        }
    }

    /// Sets the creation date.
    #[must_use]
    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    /// Splits the full name into namespace and repository name.
    ///
    /// Returns `None` when the name has no namespace separator.
    #[must_use]
    pub fn split(&self) -> Option<(&str, &str)> {
        self.full_name.rsplit_once('/')
    }
}
