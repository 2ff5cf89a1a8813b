//! Pull request records.

use super::dependency::DependencyUpdate;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

/// A pull request as returned by a provider adapter, before qualification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawPullRequest {
    /// Provider-assigned number (GitHub number, GitLab iid).
    pub number: u64,
    /// Pull request title.
    pub title: String,
    /// Markdown body. Empty when the provider returned none.
    pub body: String,
    /// Label names.
    pub labels: Vec<String>,
    /// Login of the author, when known.
    pub author: Option<String>,
    /// Canonical web URL.
    pub url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Close timestamp, if closed without or before merging.
    pub closed_at: Option<DateTime<Utc>>,
    /// Merge timestamp, if merged.
    pub merged_at: Option<DateTime<Utc>>,
}

impl RawPullRequest {
    /// Returns true if the pull request carries `label` (case-insensitive).
    #[must_use]
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l.eq_ignore_ascii_case(label))
    }

    /// Derives the close disposition and timestamp.
    ///
    /// A merge wins over a plain close; a pull request with neither field is
    /// still open.
    #[must_use]
    pub fn close_state(&self) -> Option<(CloseDisposition, DateTime<Utc>)> {
        if let Some(merged_at) = self.merged_at {
            return Some((CloseDisposition::Merged, self.closed_at.unwrap_or(merged_at)));
        }
        self.closed_at
            .map(|closed_at| (CloseDisposition::Closed, closed_at))
    }

    /// Returns true if the pull request was open at `instant`.
    #[must_use]
    pub fn is_open_at(&self, instant: DateTime<Utc>) -> bool {
        if self.created_at > instant {
            return false;
        }
        match self.close_state() {
            Some((_, closed_at)) => closed_at > instant,
            None => true,
        }
    }
}

/// How a pull request was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseDisposition {
    /// The pull request was merged.
    Merged,
    /// The pull request was closed without merging.
    Closed,
}

impl CloseDisposition {
    /// Returns the value stored in the `close_type` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Merged => "merge",
            Self::Closed => "close",
        }
    }
}

/// A qualifying bot-authored pull request with its dependency updates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PullRequestRecord {
    /// Repository full name ("owner/repo").
    pub repository: String,
    /// Provider-assigned number.
    pub number: u64,
    /// Canonical web URL.
    pub url: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Close timestamp and disposition, if closed.
    pub closed: Option<(CloseDisposition, DateTime<Utc>)>,
    /// Dependency updates extracted from the pull request.
    pub dependency_updates: Vec<DependencyUpdate>,
}

impl PullRequestRecord {
    /// Builds a record from a raw pull request.
    ///
    /// A close timestamp earlier than the creation timestamp is clamped to
    /// the creation timestamp.
    #[must_use]
    pub fn from_raw(
        repository: &str,
        raw: &RawPullRequest,
        dependency_updates: Vec<DependencyUpdate>,
    ) -> Self {
        let closed = raw.close_state().map(|(disposition, closed_at)| {
            if closed_at < raw.created_at {
                warn!(
                    repo = repository,
                    number = raw.number,
                    "Close timestamp precedes creation, clamping"
                );
                (disposition, raw.created_at)
            } else {
                (disposition, closed_at)
            }
        });

        Self {
            repository: repository.to_string(),
            number: raw.number,
            url: raw.url.clone(),
            created_at: raw.created_at,
            closed,
            dependency_updates,
        }
    }

    /// Returns true if no dependency update could be extracted.
    #[must_use]
    pub fn is_unparsed(&self) -> bool {
        self.dependency_updates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, 12, 0, 0).unwrap()
    }

    fn raw() -> RawPullRequest {
        RawPullRequest {
            number: 7,
            title: "Update dependency serde to v1.0.200".to_string(),
            body: String::new(),
            labels: vec!["Dependencies".to_string()],
            author: Some("renovate[bot]".to_string()),
            url: "https://github.com/acme/app/pull/7".to_string(),
            created_at: at(1),
            closed_at: None,
            merged_at: None,
        }
    }

    #[test]
    fn merged_pull_request_uses_merge_disposition() {
        let pr = RawPullRequest {
            merged_at: Some(at(3)),
            closed_at: Some(at(3)),
            ..raw()
        };
        assert_eq!(pr.close_state(), Some((CloseDisposition::Merged, at(3))));
    }

    #[test]
    fn merged_without_close_timestamp_falls_back_to_merge_time() {
        let pr = RawPullRequest {
            merged_at: Some(at(4)),
            ..raw()
        };
        assert_eq!(pr.close_state(), Some((CloseDisposition::Merged, at(4))));
    }

    #[test]
    fn closed_pull_request_uses_close_disposition() {
        let pr = RawPullRequest {
            closed_at: Some(at(2)),
            ..raw()
        };
        assert_eq!(pr.close_state(), Some((CloseDisposition::Closed, at(2))));
        assert_eq!(raw().close_state(), None);
    }

    #[test]
    fn open_at_respects_creation_and_close() {
        let pr = RawPullRequest {
            closed_at: Some(at(5)),
            ..raw()
        };
        assert!(!pr.is_open_at(Utc.with_ymd_and_hms(2024, 2, 28, 0, 0, 0).unwrap()));
        assert!(pr.is_open_at(at(3)));
        assert!(!pr.is_open_at(at(5)));
    }

    #[test]
    fn labels_match_case_insensitively() {
        assert!(raw().has_label("dependencies"));
        assert!(!raw().has_label("security"));
    }

    #[test]
    fn record_clamps_close_before_creation() {
        let pr = RawPullRequest {
            created_at: at(5),
            closed_at: Some(at(2)),
            ..raw()
        };
        let record = PullRequestRecord::from_raw("acme/app", &pr, Vec::new());
        assert_eq!(record.closed, Some((CloseDisposition::Closed, at(5))));
        assert!(record.is_unparsed());
    }
}
