//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use renovate_ingest::provider::{
    PageCursor, ProviderPage, PullRequestFilter, RepositoryFile, RepositoryOwner,
};
use renovate_ingest::{
    IngestConfig, ProviderError, ProviderKind, RawPullRequest, Repository, ScmProvider, Settings,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

pub const BOT: &str = "renovate[bot]";

/// Midnight UTC on the given day of 2024.
pub fn date(month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, month, day, 0, 0, 0).unwrap()
}

/// Settings accepted by [`IngestConfig::from_settings`] for `repositories`.
pub fn settings(repositories: &[&str]) -> Settings {
    Settings {
        token: Some("token".to_string()),
        repositories: repositories.iter().map(ToString::to_string).collect(),
        bot_username: Some(BOT.to_string()),
        security_label: Some("security".to_string()),
        detect_multiple_major: Some(true),
        sampling_max_weeks: Some(4),
        database_url: Some(":memory:".to_string()),
        ..Settings::default()
    }
}

pub fn config(repositories: &[&str]) -> IngestConfig {
    IngestConfig::from_settings(settings(repositories)).unwrap()
}

/// A bot pull request opened on `created`.
pub fn bot_pr(number: u64, title: &str, body: &str, created: DateTime<Utc>) -> RawPullRequest {
    RawPullRequest {
        number,
        title: title.to_string(),
        body: body.to_string(),
        labels: Vec::new(),
        author: Some(BOT.to_string()),
        url: format!("https://github.com/acme/app/pull/{number}"),
        created_at: created,
        closed_at: None,
        merged_at: None,
    }
}

/// Which error a repository answers with.
#[derive(Debug, Clone, Copy)]
pub enum Failure {
    /// `500`-class error that stays isolated to the repository.
    Api,
    /// Rejected credentials, aborting the run.
    Authentication,
}

impl Failure {
    fn error(self, repository: &str) -> ProviderError {
        match self {
            Self::Api => ProviderError::Api {
                operation: "list pull requests".to_string(),
                status: 422,
                message: format!("{repository} is broken"),
            },
            Self::Authentication => ProviderError::Authentication {
                operation: "list pull requests".to_string(),
                message: "Bad credentials".to_string(),
            },
        }
    }
}

/// In-memory [`ScmProvider`].
///
/// Pull request listings are served in pages of `page_size` using numbered
/// cursors.
#[derive(Debug, Default)]
pub struct FakeProvider {
    pub groups: HashSet<String>,
    pub users: HashSet<String>,
    pub repositories: Vec<Repository>,
    pub pull_requests: HashMap<String, Vec<RawPullRequest>>,
    /// Extra pages appended to a repository's listing, served verbatim.
    pub pages: HashMap<String, Vec<Vec<RawPullRequest>>>,
    pub page_size: usize,
    /// Commits per repository as `(date, sha)`.
    pub commits: HashMap<String, Vec<(DateTime<Utc>, String)>>,
    /// Existing files as `(repository, sha, path)`.
    pub files: HashSet<(String, String, String)>,
    pub failures: HashMap<String, Failure>,
    pub file_requests: AtomicUsize,
    pub pull_request_pages: Mutex<Vec<(String, PageCursor)>>,
}

impl FakeProvider {
    pub fn new() -> Self {
        Self {
            page_size: 100,
            ..Self::default()
        }
    }

    pub fn with_repository(mut self, full_name: &str, created_at: DateTime<Utc>) -> Self {
        self.repositories
            .push(Repository::new(full_name).with_created_at(created_at));
        self
    }

    pub fn with_group(mut self, group: &str) -> Self {
        self.groups.insert(group.to_string());
        self
    }

    pub fn with_user(mut self, user: &str) -> Self {
        self.users.insert(user.to_string());
        self
    }

    pub fn with_pull_requests(mut self, repository: &str, prs: Vec<RawPullRequest>) -> Self {
        self.pull_requests.insert(repository.to_string(), prs);
        self
    }

    pub fn with_commit(mut self, repository: &str, at: DateTime<Utc>, sha: &str) -> Self {
        self.commits
            .entry(repository.to_string())
            .or_default()
            .push((at, sha.to_string()));
        self
    }

    pub fn with_file(mut self, repository: &str, sha: &str, path: &str) -> Self {
        self.files
            .insert((repository.to_string(), sha.to_string(), path.to_string()));
        self
    }

    pub fn with_failure(mut self, repository: &str, failure: Failure) -> Self {
        self.failures.insert(repository.to_string(), failure);
        self
    }

    fn listing(&self, repository: &str) -> Vec<Vec<RawPullRequest>> {
        let mut pages: Vec<Vec<RawPullRequest>> = self
            .pull_requests
            .get(repository)
            .map(|prs| prs.chunks(self.page_size.max(1)).map(<[_]>::to_vec).collect())
            .unwrap_or_default();
        if let Some(extra) = self.pages.get(repository) {
            pages.extend(extra.iter().cloned());
        }
        pages
    }
}

#[async_trait]
impl ScmProvider for FakeProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::GitHub
    }

    async fn authenticated_user(&self) -> Result<String, ProviderError> {
        Ok("ingest-bot".to_string())
    }

    async fn repository(&self, full_name: &str) -> Result<Repository, ProviderError> {
        self.repositories
            .iter()
            .find(|repo| repo.full_name == full_name)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound {
                resource: full_name.to_string(),
            })
    }

    async fn pull_request_page(
        &self,
        repository: &str,
        filter: &PullRequestFilter,
        cursor: PageCursor,
    ) -> Result<ProviderPage<RawPullRequest>, ProviderError> {
        if let Some(failure) = self.failures.get(repository) {
            return Err(failure.error(repository));
        }
        self.pull_request_pages
            .lock()
            .unwrap()
            .push((repository.to_string(), cursor.clone()));

        let index = match cursor {
            PageCursor::First => 0,
            PageCursor::Number(number) => number as usize,
            PageCursor::Link(_) => unreachable!("fake provider uses numbered cursors"),
        };
        let pages = self.listing(repository);
        let items = pages
            .get(index)
            .map(|page| page.iter().filter(|pr| filter.matches(pr)).cloned().collect())
            .unwrap_or_default();
        let next = (index + 1 < pages.len()).then(|| PageCursor::Number(index as u32 + 1));
        Ok(ProviderPage { items, next })
    }

    async fn repository_page(
        &self,
        owner: &RepositoryOwner,
        cursor: PageCursor,
    ) -> Result<ProviderPage<Repository>, ProviderError> {
        let known = match owner {
            RepositoryOwner::Group(name) => self.groups.contains(name),
            RepositoryOwner::User(name) => self.users.contains(name),
        };
        if !known {
            return Err(ProviderError::NotFound {
                resource: owner.to_string(),
            });
        }
        assert_eq!(cursor, PageCursor::First);

        let prefix = format!("{}/", owner.name());
        Ok(ProviderPage::last(
            self.repositories
                .iter()
                .filter(|repo| repo.full_name.starts_with(&prefix))
                .cloned()
                .collect(),
        ))
    }

    async fn commit_as_of(
        &self,
        repository: &str,
        instant: DateTime<Utc>,
    ) -> Result<Option<String>, ProviderError> {
        Ok(self.commits.get(repository).and_then(|commits| {
            commits
                .iter()
                .filter(|(at, _)| *at <= instant)
                .max_by_key(|(at, _)| *at)
                .map(|(_, sha)| sha.clone())
        }))
    }

    async fn get_file_at_ref(
        &self,
        repository: &str,
        path: &str,
        git_ref: &str,
    ) -> Result<Option<RepositoryFile>, ProviderError> {
        self.file_requests.fetch_add(1, Ordering::SeqCst);
        let key = (repository.to_string(), git_ref.to_string(), path.to_string());
        Ok(self.files.contains(&key).then(|| RepositoryFile {
            path: path.to_string(),
            size: 2,
        }))
    }
}
