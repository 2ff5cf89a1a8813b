//! Orchestrates an ingestion run.
//!
//! A run authenticates, resolves the configured repositories, ingests and
//! samples every repository on a bounded worker pool and finally replaces
//! the datastore contents with the collected batch in one transaction.

mod context;
mod error;

pub use context::RunContext;
pub use error::RunnerError;

use crate::batch::RunBatch;
use crate::config::{ConfigError, IngestConfig};
use crate::discovery::resolve_repositories;
use crate::ingest::ingest_repository;
use crate::model::Repository;
use crate::onboarding::sample_repository;
use crate::persistence::{Datastore, RunLock, SqliteDatastore};
use crate::provider::{create_provider, ProviderError, ScmProvider};
use crate::summary::{RepositoryOutcome, RunSummary};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};

/// Orchestrates a full ingestion run.
pub struct Runner {
    config: Arc<IngestConfig>,
    provider: Arc<dyn ScmProvider>,
    datastore: Option<Arc<dyn Datastore>>,
    now: Option<DateTime<Utc>>,
}

impl Runner {
    /// Builds a runner from its parts.
    ///
    /// `datastore` may be `None` only in dry-run mode.
    pub fn new(
        config: IngestConfig,
        provider: Arc<dyn ScmProvider>,
        datastore: Option<Arc<dyn Datastore>>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            provider,
            datastore,
            now: None,
        }
    }

    /// Builds a runner with the configured provider and `SQLite` datastore.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the provider client cannot be built or the
    /// database cannot be opened and migrated.
    pub fn from_config(config: IngestConfig) -> Result<Self, RunnerError> {
        let provider = create_provider(
            config.provider(),
            config.api_base_url(),
            config.token(),
            config.retry_policy(),
        )?;

        let datastore: Option<Arc<dyn Datastore>> = match config.database_url() {
            Some(url) if !config.dry_run() => Some(Arc::new(SqliteDatastore::open(url)?)),
            _ => None,
        };

        Ok(Self::new(config, provider, datastore))
    }

    /// Fixes the instant onboarding checkpoints are computed from.
    #[must_use]
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Executes the full orchestration flow.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] on any fatal condition. Nothing is written
    /// to the datastore in that case.
    pub async fn run(&self) -> Result<RunSummary, RunnerError> {
        self.collect().await?.commit().await
    }

    /// Collects every repository without writing anything.
    ///
    /// The returned [`CollectedRun`] holds the run lock until it is committed
    /// or dropped.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] on any fatal condition.
    pub async fn collect(&self) -> Result<CollectedRun, RunnerError> {
        let config = &self.config;
        let mut summary = RunSummary::new(config.dry_run());

        let datastore = match (&self.datastore, config.dry_run()) {
            (Some(datastore), false) => Some(Arc::clone(datastore)),
            (None, false) => {
                return Err(ConfigError::MissingSetting {
                    setting: "database-url",
                }
                .into())
            }
            (_, true) => None,
        };
        let lock = match config.database_url() {
            Some(url) if datastore.is_some() => Some(RunLock::acquire(url)?),
            _ => None,
        };

        let user = self.provider.authenticated_user().await?;
        info!(provider = %self.provider.kind(), user = %user, "Authenticated");

        let repositories =
            resolve_repositories(self.provider.as_ref(), config.repositories()).await?;
        if repositories.is_empty() {
            warn!("No repositories found");
        }

        let ctx = RunContext::new(
            Arc::clone(&self.provider),
            Arc::clone(&self.config),
            self.now.unwrap_or_else(Utc::now),
        );
        info!(
            repositories = repositories.len(),
            checkpoints = ctx.checkpoints().len(),
            concurrency = config.concurrency(),
            "Processing repositories"
        );

        let outcomes: Vec<RepositoryOutcome> = stream::iter(repositories)
            .map(|repository| process_repository(&ctx, repository))
            .buffer_unordered(config.concurrency())
            .try_collect()
            .await?;

        for outcome in &outcomes {
            summary.record_result(outcome);
        }

        Ok(CollectedRun {
            summary,
            batch: RunBatch::from_outcomes(&outcomes),
            datastore,
            lock,
        })
    }
}

/// Everything a run collected, ready to be written.
pub struct CollectedRun {
    summary: RunSummary,
    batch: RunBatch,
    datastore: Option<Arc<dyn Datastore>>,
    lock: Option<RunLock>,
}

impl CollectedRun {
    /// Returns the counters of the collected run.
    #[must_use]
    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    /// Returns the collected batch.
    #[must_use]
    pub fn batch(&self) -> &RunBatch {
        &self.batch
    }

    /// Replaces the datastore contents with the batch, or only logs it in
    /// dry-run mode.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError`] if the write fails. The transaction is rolled
    /// back in that case.
    pub async fn commit(self) -> Result<RunSummary, RunnerError> {
        let Self {
            mut summary,
            batch,
            datastore,
            lock: _lock,
        } = self;

        let Some(datastore) = datastore else {
            info!(
                pull_requests = batch.pull_requests().len(),
                samples = batch.samples().len(),
                "Dry run, skipping database write"
            );
            return Ok(summary);
        };

        let rows = batch.to_rows();
        tokio::task::spawn_blocking(move || datastore.replace_all(&rows)).await??;
        summary.committed = true;

        Ok(summary)
    }
}

/// Ingests and samples one repository.
///
/// Errors confined to the repository become [`RepositoryOutcome::Failed`];
/// fatal errors are returned and abandon the run.
async fn process_repository(
    ctx: &RunContext,
    repository: Repository,
) -> Result<RepositoryOutcome, ProviderError> {
    let span = info_span!("repository", repo = %repository.full_name);

    async move {
        info!("Processing repository");

        let collected = async {
            let ingest = ingest_repository(ctx, &repository.full_name).await?;
            let samples = sample_repository(ctx, &repository, &ingest.onboarding).await?;
            Ok::<_, ProviderError>((ingest, samples))
        }
        .await;

        match collected {
            Ok((ingest, samples)) => {
                info!(
                    pull_requests = ingest.records.len(),
                    unparsed = ingest.unparsed,
                    samples = samples.len(),
                    "Repository processed"
                );
                Ok(RepositoryOutcome::Processed {
                    repository: repository.full_name,
                    ingest,
                    samples,
                })
            }
            Err(e) if e.is_fatal() => {
                error!(error = %e, "Fatal provider error, abandoning run");
                Err(e)
            }
            Err(e) => {
                error!(error = %e, "Failed to process repository");
                Ok(RepositoryOutcome::Failed {
                    repository: repository.full_name,
                    error: e.to_string(),
                })
            }
        }
    }
    .instrument(span)
    .await
}
