//! GitLab adapter talking to the REST API (`/api/v4`) through reqwest.

use super::{
    classify_status, HttpTimeouts, PageCursor, ProviderError, ProviderKind, ProviderPage, PullRequestFilter,
    RepositoryFile, RepositoryOwner, ScmProvider,
};
use crate::model::{RawPullRequest, Repository};
use crate::rate_limit::{with_retry, RateLimitBudget, RateLimitInfo, RetryPolicy};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

const PER_PAGE: &str = "100";
const USER_AGENT: &str = concat!("renovate-ingest/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Deserialize)]
struct ApiUser {
    username: String,
}

#[derive(Debug, Deserialize)]
struct ApiMergeRequest {
    iid: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: Option<String>,
    web_url: String,
    created_at: DateTime<Utc>,
    #[serde(default)]
    closed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
    #[serde(default)]
    labels: Vec<String>,
    #[serde(default)]
    author: Option<ApiUser>,
}

impl From<ApiMergeRequest> for RawPullRequest {
    fn from(mr: ApiMergeRequest) -> Self {
        Self {
            number: mr.iid,
            title: mr.title,
            body: mr.description.unwrap_or_default(),
            labels: mr.labels,
            author: mr.author.map(|user| user.username),
            url: mr.web_url,
            created_at: mr.created_at,
            closed_at: mr.closed_at,
            merged_at: mr.merged_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiProject {
    path_with_namespace: String,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl From<ApiProject> for Repository {
    fn from(project: ApiProject) -> Self {
        Self {
            full_name: project.path_with_namespace,
            created_at: project.created_at,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiCommit {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ApiFile {
    file_path: String,
    #[serde(default)]
    size: u64,
}

/// GitLab (gitlab.com or self-managed) provider.
pub struct GitLabProvider {
    client: Client,
    api_base: Url,
    budget: RateLimitBudget,
    retry: RetryPolicy,
}

impl GitLabProvider {
    /// Builds a client for the instance at `base_url`.
    ///
    /// `base_url` may be the instance root (`https://gitlab.example.com`) or
    /// already point at `/api/v4`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] if the URL cannot be parsed
    /// or the token is not a valid header value.
    pub fn new(base_url: &str, token: &str, retry: RetryPolicy) -> Result<Self, ProviderError> {
        Self::with_timeouts(base_url, token, retry, HttpTimeouts::default())
    }

    /// Like [`GitLabProvider::new`], with explicit request time limits.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidBaseUrl`] if the client cannot be built.
    pub fn with_timeouts(
        base_url: &str,
        token: &str,
        retry: RetryPolicy,
        timeouts: HttpTimeouts,
    ) -> Result<Self, ProviderError> {
        let invalid = |message: String| ProviderError::InvalidBaseUrl {
            url: base_url.to_string(),
            message,
        };

        let api_base = api_base_url(base_url).map_err(invalid)?;

        let mut token_value =
            HeaderValue::from_str(token).map_err(|error| invalid(error.to_string()))?;
        token_value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert("private-token", token_value);

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .connect_timeout(timeouts.connect)
            .timeout(timeouts.read)
            .build()
            .map_err(|error| invalid(error.to_string()))?;

        Ok(Self {
            client,
            api_base,
            budget: RateLimitBudget::new(),
            retry,
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, String)]) -> Result<Url, ProviderError> {
        let mut url = self
            .api_base
            .join(path)
            .map_err(|error| ProviderError::InvalidBaseUrl {
                url: self.api_base.to_string(),
                message: error.to_string(),
            })?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(key, value)| (*key, value.as_str())));
        }
        Ok(url)
    }

    /// Sends a GET with retries and returns the successful response.
    async fn send(
        &self,
        operation: &str,
        resource: &str,
        url: &Url,
    ) -> Result<Response, ProviderError> {
        with_retry(&self.retry, operation, move || async move {
            self.budget.acquire().await;
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|error| map_transport_error(operation, &error))?;

            if let Some(info) = RateLimitInfo::from_headers(response.headers()) {
                self.budget.observe(&info);
            }

            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let retry_after = parse_retry_after(response.headers());
            let message = response.text().await.unwrap_or_default();
            debug!(%status, url = %url, "GitLab request failed");
            Err(classify_status(
                operation,
                resource,
                status,
                message,
                retry_after,
            ))
        })
        .await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: &str,
        url: &Url,
    ) -> Result<T, ProviderError> {
        let response = self.send(operation, resource, url).await?;
        decode(operation, response).await
    }

    /// Fetches one numbered page of a listing.
    async fn get_page<T: DeserializeOwned>(
        &self,
        operation: &str,
        resource: &str,
        path: &str,
        params: &[(&str, String)],
        cursor: PageCursor,
    ) -> Result<ProviderPage<T>, ProviderError> {
        let page = match cursor {
            PageCursor::Number(number) => number,
            PageCursor::First | PageCursor::Link(_) => 1,
        };
        let mut params = params.to_vec();
        params.push(("per_page", PER_PAGE.to_string()));
        params.push(("page", page.to_string()));

        let url = self.endpoint(path, &params)?;
        let response = self.send(operation, resource, &url).await?;
        let next = next_page(response.headers());
        let items = decode(operation, response).await?;
        Ok(ProviderPage { items, next })
    }
}

/// Normalizes an instance URL to its `/api/v4/` root.
fn api_base_url(base_url: &str) -> Result<Url, String> {
    let mut url = Url::parse(base_url).map_err(|error| error.to_string())?;
    if url.cannot_be_a_base() {
        return Err("URL cannot be used as a base".to_string());
    }

    let mut path = url.path().trim_end_matches('/').to_string();
    if !path.ends_with("/api/v4") {
        path.push_str("/api/v4");
    }
    path.push('/');
    url.set_path(&path);
    Ok(url)
}

/// Percent-encodes a project path, group path or file path as a single
/// path segment (`group/sub/app` becomes `group%2Fsub%2Fapp`).
fn encode_segment(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

fn next_page(headers: &HeaderMap) -> Option<PageCursor> {
    headers
        .get("x-next-page")?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(PageCursor::Number)
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
        .map(Duration::from_secs)
}

fn map_transport_error(operation: &str, error: &reqwest::Error) -> ProviderError {
    if error.is_builder() {
        return ProviderError::InvalidBaseUrl {
            url: error.url().map(ToString::to_string).unwrap_or_default(),
            message: error.to_string(),
        };
    }
    ProviderError::Transient {
        operation: operation.to_string(),
        message: error.to_string(),
    }
}

async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T, ProviderError> {
    response
        .json::<T>()
        .await
        .map_err(|error| ProviderError::Decode {
            operation: operation.to_string(),
            message: error.to_string(),
        })
}

#[async_trait]
impl ScmProvider for GitLabProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitLab
    }

    async fn authenticated_user(&self) -> Result<String, ProviderError> {
        let url = self.endpoint("user", &[])?;
        let user: ApiUser = self
            .get_json("get authenticated user", "/user", &url)
            .await?;
        Ok(user.username)
    }

    async fn repository(&self, full_name: &str) -> Result<Repository, ProviderError> {
        let url = self.endpoint(&format!("projects/{}", encode_segment(full_name)), &[])?;
        let project: ApiProject = self.get_json("get project", full_name, &url).await?;
        Ok(project.into())
    }

    async fn pull_request_page(
        &self,
        repository: &str,
        filter: &PullRequestFilter,
        cursor: PageCursor,
    ) -> Result<ProviderPage<RawPullRequest>, ProviderError> {
        let path = format!("projects/{}/merge_requests", encode_segment(repository));
        let mut params = vec![
            ("state", "all".to_string()),
            ("order_by", "created_at".to_string()),
            ("sort", "asc".to_string()),
        ];
        if let Some(author) = &filter.author {
            params.push(("author_username", author.clone()));
        }
        if let Some(label) = &filter.label {
            params.push(("labels", label.clone()));
        }

        let page: ProviderPage<ApiMergeRequest> = self
            .get_page("list merge requests", repository, &path, &params, cursor)
            .await?;
        Ok(ProviderPage {
            items: page.items.into_iter().map(RawPullRequest::from).collect(),
            next: page.next,
        })
    }

    async fn repository_page(
        &self,
        owner: &RepositoryOwner,
        cursor: PageCursor,
    ) -> Result<ProviderPage<Repository>, ProviderError> {
        let (path, params) = match owner {
            RepositoryOwner::Group(name) => (
                format!("groups/{}/projects", encode_segment(name)),
                vec![
                    ("include_subgroups", "true".to_string()),
                    ("with_shared", "false".to_string()),
                ],
            ),
            RepositoryOwner::User(name) => {
                (format!("users/{}/projects", encode_segment(name)), vec![])
            }
        };

        let page: ProviderPage<ApiProject> = self
            .get_page(
                "list projects",
                &owner.to_string(),
                &path,
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
        let url = self.endpoint(
            &format!("projects/{}/repository/commits", encode_segment(repository)),
            &[
                (
                    "until",
                    instant.to_rfc3339_opts(SecondsFormat::Secs, true),
                ),
                ("per_page", "1".to_string()),
            ],
        )?;

        // Projects without a repository answer 404.
        match self
            .get_json::<Vec<ApiCommit>>("find commit", repository, &url)
            .await
        {
            Ok(commits) => Ok(commits.into_iter().next().map(|commit| commit.id)),
            Err(ProviderError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }

    async fn get_file_at_ref(
        &self,
        repository: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<RepositoryFile>, ProviderError> {
        let url = self.endpoint(
            &format!(
                "projects/{}/repository/files/{}",
                encode_segment(repository),
                encode_segment(path)
            ),
            &[("ref", git_ref.to_string())],
        )?;
        let resource = format!("{repository}:{path}@{git_ref}");

        match self.get_json::<ApiFile>("get file", &resource, &url).await {
            Ok(file) => Ok(Some(RepositoryFile {
                path: file.file_path,
                size: file.size,
            })),
            Err(ProviderError::NotFound { .. }) => Ok(None),
            Err(error) => Err(error),
        }
    }
}
