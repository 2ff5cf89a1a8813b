#![doc = include_str!(concat!("../", env!("CARGO_PKG_README")))]

pub mod batch;
pub mod classifier;
pub mod config;
pub mod discovery;
pub mod ingest;
pub mod model;
pub mod onboarding;
pub mod parser;
pub mod persistence;
pub mod provider;
pub mod rate_limit;
pub mod runner;
pub mod summary;

pub use batch::RunBatch;
pub use classifier::{parse_version, ClassifierConfig, UpdateClassifier};
pub use config::{load_settings, ConfigError, IngestConfig, Settings};
pub use discovery::{resolve_repositories, DiscoveryError, RepositorySpec};
pub use ingest::{build_record, ingest_repository, BotIdentity, RepositoryIngest};
pub use model::{
    CloseDisposition, DependencyChange, DependencyUpdate, OnboardingSample, OnboardingState,
    PullRequestRecord, RawPullRequest, Repository, UpdateType,
};
pub use onboarding::{checkpoints, sample_repository, week_start};
pub use parser::{parse_dependency_changes, ParseError};
pub use persistence::{BatchRows, Datastore, PersistenceError, RunLock, SqliteDatastore};
pub use provider::{
    create_provider, GitHubProvider, GitLabProvider, HttpTimeouts, ProviderError, ProviderKind,
    ScmProvider,
};
pub use rate_limit::{with_retry, RateLimitBudget, RateLimitInfo, RetryPolicy};
pub use runner::{CollectedRun, RunContext, Runner, RunnerError};
pub use summary::{RepositoryOutcome, RunSummary};
