//! Source-control hosting providers.
//!
//! [`ScmProvider`] is the only surface the rest of the crate talks to. Each
//! implementation exposes single pages of results; [`list_pull_requests`] and
//! [`list_repositories`] turn those into lazy streams that fetch the next page
//! only when the previous one has been consumed.

mod error;
mod github;
mod gitlab;
mod pagination;

pub use error::ProviderError;
pub(crate) use error::classify_status;
pub use github::GitHubProvider;
pub use gitlab::GitLabProvider;
pub use pagination::{list_pull_requests, list_repositories, paginate, MAX_PAGES};

use crate::model::{RawPullRequest, Repository};
use crate::rate_limit::RetryPolicy;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Supported hosting providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    GitHub,
    GitLab,
}

impl ProviderKind {
    /// Returns the lowercase provider name.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::GitHub => "github",
            Self::GitLab => "gitlab",
        }
    }

    /// Returns the public API endpoint used when none is configured.
    #[must_use]
    pub fn default_api_base_url(&self) -> &'static str {
        match self {
            Self::GitHub => "https://api.github.com",
            Self::GitLab => "https://gitlab.com",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "github" => Ok(Self::GitHub),
            "gitlab" => Ok(Self::GitLab),
            other => Err(format!(
                "unknown provider '{other}', expected 'github' or 'gitlab'"
            )),
        }
    }
}

/// Server-side narrowing hints for pull request listing.
///
/// Providers apply what their API supports; callers must still check every
/// returned pull request themselves.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PullRequestFilter {
    /// Only pull requests opened by this account.
    pub author: Option<String>,
    /// Only pull requests carrying this label.
    pub label: Option<String>,
}

impl PullRequestFilter {
    /// Returns true if `pr` satisfies every configured hint.
    #[must_use]
    pub fn matches(&self, pr: &RawPullRequest) -> bool {
        let author_ok = self.author.as_deref().map_or(true, |author| {
            pr.author
                .as_deref()
                .is_some_and(|login| login.eq_ignore_ascii_case(author))
        });
        let label_ok = self.label.as_deref().map_or(true, |label| pr.has_label(label));
        author_ok && label_ok
    }
}

/// Position within a paginated listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PageCursor {
    /// The first page.
    First,
    /// A numbered page (GitLab `X-Next-Page`).
    Number(u32),
    /// An absolute URL (GitHub `Link: rel="next"`).
    Link(String),
}

/// One page of results and the cursor for the page after it.
#[derive(Debug, Clone)]
pub struct ProviderPage<T> {
    pub items: Vec<T>,
    pub next: Option<PageCursor>,
}

impl<T> ProviderPage<T> {
    /// Creates a page with no successor.
    #[must_use]
    pub fn last(items: Vec<T>) -> Self {
        Self { items, next: None }
    }
}

/// Namespace whose repositories should be listed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepositoryOwner {
    /// An organization (GitHub) or group including subgroups (GitLab).
    Group(String),
    /// A personal namespace.
    User(String),
}

impl RepositoryOwner {
    /// Returns the namespace name.
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Group(name) | Self::User(name) => name,
        }
    }
}

impl fmt::Display for RepositoryOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Group(name) => write!(f, "{name}"),
            Self::User(name) => write!(f, "user:{name}"),
        }
    }
}

/// A file found in a repository at a specific revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryFile {
    pub path: String,
    pub size: u64,
}

/// Read-only access to one hosting provider.
#[async_trait]
pub trait ScmProvider: Send + Sync {
    /// Returns which provider this is.
    fn kind(&self) -> ProviderKind;

    /// Returns the account the configured credential belongs to.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Authentication`] if the credential is rejected.
    async fn authenticated_user(&self) -> Result<String, ProviderError>;

    /// Looks up a single repository by its full name.
    async fn repository(&self, full_name: &str) -> Result<Repository, ProviderError>;

    /// Fetches one page of pull requests in any state.
    async fn pull_request_page(
        &self,
        repository: &str,
        filter: &PullRequestFilter,
        cursor: PageCursor,
    ) -> Result<ProviderPage<RawPullRequest>, ProviderError>;

    /// Fetches one page of repositories belonging to `owner`.
    async fn repository_page(
        &self,
        owner: &RepositoryOwner,
        cursor: PageCursor,
    ) -> Result<ProviderPage<Repository>, ProviderError>;

    /// Returns the newest default-branch commit at or before `instant`.
    async fn commit_as_of(
        &self,
        repository: &str,
        instant: DateTime<Utc>,
    ) -> Result<Option<String>, ProviderError>;

    /// Returns the file at `path` as of `git_ref`, or `None` if absent.
    async fn get_file_at_ref(
        &self,
        repository: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<RepositoryFile>, ProviderError>;
}

/// Time limits applied to every provider HTTP request.
///
/// A request that exceeds them fails as [`ProviderError::Transient`] and is
/// retried like any other transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Limit for establishing a connection.
    pub connect: Duration,
    /// Limit for receiving a response.
    pub read: Duration,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(10),
            read: Duration::from_secs(60),
        }
    }
}

/// Creates the provider selected by `kind`.
///
/// # Errors
///
/// Returns [`ProviderError::InvalidBaseUrl`] if the client cannot be built
/// for `api_base_url`.
pub fn create_provider(
    kind: ProviderKind,
    api_base_url: &str,
    token: &str,
    retry: RetryPolicy,
) -> Result<Arc<dyn ScmProvider>, ProviderError> {
    let provider: Arc<dyn ScmProvider> = match kind {
        ProviderKind::GitHub => Arc::new(GitHubProvider::new(api_base_url, token, retry)?),
        ProviderKind::GitLab => Arc::new(GitLabProvider::new(api_base_url, token, retry)?),
    };
    Ok(provider)
}
