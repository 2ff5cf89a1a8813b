//! GitHub adapter backed by octocrab.

use super::{
    classify_status, HttpTimeouts, PageCursor, ProviderError, ProviderKind, ProviderPage, PullRequestFilter,
    RepositoryFile, RepositoryOwner, ScmProvider,
};
use crate::model::{RawPullRequest, Repository};
use crate::rate_limit::{
    now_unix_seconds, with_retry, RateLimitBudget, RateLimitInfo, RetryPolicy,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use http::{StatusCode, Uri};
use octocrab::{Octocrab, Page};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::{debug, warn};

const PER_PAGE: &str = "100";

/// Requests between two budget refreshes from `/rate_limit`.
const BUDGET_REFRESH_INTERVAL: u32 = 50;

#[derive(Debug, Deserialize)]
struct ApiUser {
    login: String,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    body: Option<String>,
    html_url: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    #[serde(default)]
    user: Option<ApiUser>,
}

impl From<ApiPullRequest> for RawPullRequest {
    fn from(pr: ApiPullRequest) -> Self {
        Self {
            number: pr.number,
            title: pr.title.unwrap_or_default(),
            body: pr.body.unwrap_or_default(),
            labels: pr.labels.into_iter().map(|label| label.name).collect(),
            author: pr.user.map(|user| user.login),
            url: pr.html_url,
            created_at: pr.created_at,
            closed_at: pr.closed_at,
            merged_at: pr.merged_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    full_name: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<ApiRepository> for Repository {
    fn from(repo: ApiRepository) -> Self {
        Self {
            full_name: repo.full_name,
            created_at: repo.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    sha: String,
}

/// GitHub (or GitHub Enterprise) provider.
pub struct GitHubProvider {
    client: Octocrab,
    budget: RateLimitBudget,
    requests: AtomicU32,
    retry: RetryPolicy,
}

impl GitHubProvider {
    /// Builds an authenticated client for `api_base_url`
    /// (e.g. `https://api.github.com` or `https://ghe.example.com/api/v3`).
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] if the URL cannot be parsed
    /// or the client cannot be constructed.
    pub fn new(api_base_url: &str, token: &str, retry: RetryPolicy) -> Result<Self, ProviderError> {
        Self::with_timeouts(api_base_url, token, retry, HttpTimeouts::default())
    }

    /// Like [`GitHubProvider::new`], with explicit request time limits.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] if the client cannot be built.
    pub fn with_timeouts(
        api_base_url: &str,
        token: &str,
        retry: RetryPolicy,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ProviderError> {
        let invalid = |message: String| ProviderError::InvalidBaseUrl {
            url: api_base_url.to_string(),
            message,
        };

        let base_uri: Uri = api_base_url
            .parse::<Uri>()
            .map_err(|error| invalid(error.to_string()))?;

        let client = Octocrab::builder()
            .set_connect_timeout(Some(timeouts.connect))
            .set_read_timeout(Some(timeouts.read))
            .personal_token(token.to_string())
            .base_uri(base_uri)
            .map_err(|error| invalid(error.to_string()))?
            .build()
            .map_err(|error| invalid(error.to_string()))?;

        Ok(Self {
            client,
            budget: RateLimitBudget::new(),
            requests: AtomicU32::new(0),
            retry,
        })
    }

    /// Returns the request budget shared by all workers.
    #[must_use]
    pub fn budget(&self) -> &RateLimitBudget {
        &self.budget
    }

    /// Takes one request from the budget, refreshing it from `/rate_limit`
    /// every [`BUDGET_REFRESH_INTERVAL`] requests.
    ///
    /// `/rate_limit` does not count against the limit.
    async fn acquire(&self) {
        if self.requests.fetch_add(1, Ordering::Relaxed) % BUDGET_REFRESH_INTERVAL == 0 {
            match self.client.ratelimit().get().await {
                Ok(limits) => {
                    let info = rate_limit_info(&limits.rate);
                    debug!(remaining = info.remaining, reset = info.reset, "GitHub budget refreshed");
                    self.budget.observe(&info);
                }
                Err(error) => debug!(error = %error, "Could not refresh GitHub budget"),
            }
        }
        self.budget.acquire().await;
    }

    /// GETs `route` and decodes the body as `T`.
    async fn get_json<T>(
        &self,
        operation: &str,
        resource: &str,
        route: &str,
        params: &[(&str, String)],
    ) -> Result<T, ProviderError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        with_retry(&self.retry, operation, move || async move {
            self.acquire().await;
            match self.client.get::<T, _, _>(route, Some(params)).await {
                Ok(value) => Ok(value),
                Err(error) => Err(self.map_error(operation, resource, error).await),
            }
        })
        .await
    }

    /// Fetches one page of a listing, following `cursor` when it is a link.
    async fn get_page<T>(
        &self,
        operation: &str,
        resource: &str,
        route: &str,
        params: &[(&str, String)],
        cursor: PageCursor,
    ) -> Result<ProviderPage<T>, ProviderError>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let page: Option<Page<T>> = match cursor {
            PageCursor::Link(link) => {
                let next = Some(link.parse::<Uri>().map_err(|error| ProviderError::Decode {
                    operation: operation.to_string(),
                    message: format!("invalid next-page link '{link}': {error}"),
                })?);
                let next = &next;
                with_retry(&self.retry, operation, move || async move {
                    self.acquire().await;
                    match self.client.get_page::<T>(next).await {
                        Ok(page) => Ok(page),
                        Err(error) => Err(self.map_error(operation, resource, error).await),
                    }
                })
                .await?
            }
            PageCursor::First | PageCursor::Number(_) => {
                let mut params = params.to_vec();
                if let PageCursor::Number(number) = cursor {
                    params.push(("page", number.to_string()));
                }
                let params = params.as_slice();
                let page = with_retry(&self.retry, operation, move || async move {
                    self.acquire().await;
                    match self.client.get::<Page<T>, _, _>(route, Some(params)).await {
                        Ok(page) => Ok(page),
                        Err(error) => Err(self.map_error(operation, resource, error).await),
                    }
                })
                .await?;
                Some(page)
            }
        };

        Ok(match page {
            Some(page) => ProviderPage {
                next: page.next.map(|uri| PageCursor::Link(uri.to_string())),
                items: page.items,
            },
            None => ProviderPage::last(Vec::new()),
        })
    }

    async fn map_error(
        &self,
        operation: &str,
        resource: &str,
        error: octocrab::Error,
    ) -> ProviderError {
        match error {
            octocrab::Error::GitHub { source, .. } => {
                if is_rate_limit_error(&source) {
                    let retry_after = self.fetch_rate_limit_reset().await;
                    return ProviderError::RateLimited {
                        operation: operation.to_string(),
                        message: source.message,
                        retry_after,
                    };
                }
                classify_status(
                    operation,
                    resource,
                    source.status_code,
                    source.message,
                    None,
                )
            }
            error @ (octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }) => ProviderError::Transient {
                operation: operation.to_string(),
                message: error.to_string(),
            },
            error => ProviderError::Decode {
                operation: operation.to_string(),
                message: error.to_string(),
            },
        }
    }

    /// Marks the budget exhausted until the reported reset and returns how
    /// long that is from now.
    async fn fetch_rate_limit_reset(&self) -> Option<Duration> {
        let rate = self.client.ratelimit().get().await.ok()?.rate;
        self.budget.mark_exhausted(rate.reset);
        let wait = rate_limit_info(&rate).until_reset(now_unix_seconds());
        debug!(reset = rate.reset, wait_secs = wait.as_secs(), "GitHub rate limit exhausted");
        Some(wait)
    }
}

fn rate_limit_info(rate: &octocrab::models::Rate) -> RateLimitInfo {
    RateLimitInfo {
        remaining: u32::try_from(rate.remaining).unwrap_or(u32::MAX),
        reset: rate.reset,
        limit: u32::try_from(rate.limit).unwrap_or(u32::MAX),
    }
}

/// Checks whether a GitHub error is a (primary or secondary) rate limit.
fn is_rate_limit_error(source: &octocrab::GitHubError) -> bool {
    let is_rate_limit_status = matches!(
        source.status_code,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    );

    let message_indicates_rate_limit = source.message.to_lowercase().contains("rate limit")
        || source
            .documentation_url
            .as_deref()
            .is_some_and(|url| url.contains("rate-limit"));

    is_rate_limit_status && message_indicates_rate_limit
}

fn split_full_name(full_name: &str) -> Result<(&str, &str), ProviderError> {
    full_name
        .split_once('/')
        .filter(|(owner, repo)| !owner.is_empty() && !repo.is_empty() && !repo.contains('/'))
        .ok_or_else(|| ProviderError::NotFound {
            resource: full_name.to_string(),
        })
}

#[async_trait]
impl ScmProvider for GitHubProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn authenticated_user(&self) -> Result<String, ProviderError> {
        let user: ApiUser = self
            .get_json("get authenticated user", "/user", "/user", &[])
            .await?;
        Ok(user.login)
    }

    async fn repository(&self, full_name: &str) -> Result<Repository, ProviderError> {
        let (owner, repo) = split_full_name(full_name)?;
        let route = format!("/repos/{owner}/{repo}");
        let repository: ApiRepository = self
            .get_json("get repository", full_name, &route, &[])
            .await?;
        Ok(repository.into())
    }

    async fn pull_request_page(
        &self,
        repository: &str,
        filter: &PullRequestFilter,
        cursor: PageCursor,
    ) -> Result<ProviderPage<RawPullRequest>, ProviderError> {
        let (owner, repo) = split_full_name(repository)?;
        let route = format!("/repos/{owner}/{repo}/pulls");
        let params = [
            ("state", "all".to_string()),
            ("sort", "created".to_string()),
            ("direction", "asc".to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];

        let page: ProviderPage<ApiPullRequest> = self
            .get_page("list pull requests", repository, &route, &params, cursor)
            .await?;

        // The pulls endpoint cannot filter by author or label.
        let items = page
            .items
            .into_iter()
            .map(RawPullRequest::from)
            .filter(|pr| filter.matches(pr))
            .collect();
        Ok(ProviderPage {
            items,
            next: page.next,
        })
    }

    async fn repository_page(
        &self,
        owner: &RepositoryOwner,
        cursor: PageCursor,
    ) -> Result<ProviderPage<Repository>, ProviderError> {
        let (route, kind) = match owner {
            RepositoryOwner::Group(name) => (format!("/orgs/{name}/repos"), "all"),
            RepositoryOwner::User(name) => (format!("/users/{name}/repos"), "owner"),
        };
        let params = [
            ("type", kind.to_string()),
            ("per_page", PER_PAGE.to_string()),
        ];

        let page: ProviderPage<ApiRepository> = self
            .get_page(
                "list repositories",
                &owner.to_string(),
                &route,
                &params,
                cursor,
            )
            .await?;
        Ok(ProviderPage {
            items: page.items.into_iter().map(Repository::from).collect(),
            next: page.next,
        })
    }

    async fn commit_as_of(
        &self,
        repository: &str,
        instant: DateTime<Utc>,
    ) -> Result<Option<String>, ProviderError> {
        let (owner, repo) = split_full_name(repository)?;
        let route = format!("/repos/{owner}/{repo}/commits");
        let params = [
            (
                "until",
                instant.to_rfc3339_opts(SecondsFormat::Secs, true),
            ),
            ("per_page", "1".to_string()),
        ];

        match self
            .get_json::<Vec<ApiCommit>>("find commit", repository, &route, &params)
            .await
        {
            Ok(commits) => Ok(commits.into_iter().next().map(|commit| commit.sha)),
            // An empty repository answers 409 Conflict.
            Err(ProviderError::Api { status: 409, .. }) => {
                warn!(repo = %repository, "Repository is empty");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    async fn get_file_at_ref(
        &self,
        repository: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<RepositoryFile>, ProviderError> {
        let (owner, repo) = split_full_name(repository)?;
        let route = format!("/repos/{owner}/{repo}/contents/{path}");
        let params = [("ref", git_ref.to_string())];
        let resource = format!("{repository}:{path}@{git_ref}");

        let content: serde_json::Value = match self
            .get_json("get file", &resource, &route, &params)
            .await
        {
            Ok(content) => content,
            Err(ProviderError::NotFound { .. }) => return Ok(None),
            Err(error) => return Err(error),
        };

        // Directories come back as arrays.
        if content.get("type").and_then(serde_json::Value::as_str) != Some("file") {
            return Ok(None);
        }
        Ok(Some(RepositoryFile {
            path: content
                .get("path")
                .and_then(serde_json::Value::as_str)
                .unwrap_or(path)
                .to_string(),
            size: content
                .get("size")
                .and_then(serde_json::Value::as_u64)
                .unwrap_or(0),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_api_pull_request() {
        let api: ApiPullRequest = serde_json::from_value(serde_json::json!({
            "number": 42,
            "title": "Update dependency serde to v1.0.200",
            "body": null,
            "html_url": "https://github.com/acme/app/pull/42",
            "created_at": "2024-01-02T03:04:05Z",
            "closed_at": "2024-01-03T00:00:00Z",
            "merged_at": "2024-01-03T00:00:00Z",
            "labels": [{ "name": "dependencies" }],
            "user": { "login": "renovate[bot]" }
        }))
        .unwrap();

        let pr = RawPullRequest::from(api);
        assert_eq!(pr.number, 42);
        assert_eq!(pr.body, "");
        assert_eq!(pr.labels, vec!["dependencies".to_string()]);
        assert_eq!(pr.author.as_deref(), Some("renovate[bot]"));
        assert!(pr.merged_at.is_some());
    }

    #[test]
    fn rejects_malformed_full_names() {
        assert!(split_full_name("acme/app").is_ok());
        assert!(split_full_name("acme").is_err());
        assert!(split_full_name("acme/").is_err());
        assert!(split_full_name("group/sub/app").is_err());
    }
}
