//! Pull request ingestion.
//!
//! Pages through every pull request of a repository once, keeps the bot's
//! dependency update pull requests and turns each into a
//! [`PullRequestRecord`] with its classified dependency updates. The bot's
//! onboarding pull requests from the same listing are kept for the sampler.

mod identity;
mod qualify;

pub use identity::BotIdentity;
pub use qualify::{is_relevant_title, qualify, Qualification};

use crate::classifier::UpdateClassifier;
use crate::model::{DependencyUpdate, PullRequestRecord, RawPullRequest};
use crate::parser::parse_dependency_changes;
use crate::provider::{list_pull_requests, ProviderError, PullRequestFilter};
use crate::runner::RunContext;
use futures::TryStreamExt;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Pull requests ingested from one repository, with skip counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RepositoryIngest {
    /// Qualifying pull requests, in listing order.
    pub records: Vec<PullRequestRecord>,
    /// Pull requests skipped because of an ignore label.
    pub ignored: usize,
    /// Bot pull requests skipped because they were renamed.
    pub retitled: usize,
    /// Qualifying pull requests from which no update could be extracted.
    pub unparsed: usize,
    /// The bot's onboarding pull requests, in listing order.
    pub onboarding: Vec<RawPullRequest>,
}

/// Ingests every qualifying pull request of `repository`.
///
/// # Errors
///
/// Returns the first [`ProviderError`] raised while listing.
pub async fn ingest_repository(
    ctx: &RunContext,
    repository: &str,
) -> Result<RepositoryIngest, ProviderError> {
    let config = ctx.config();
    let identity = config.identity();
    // The label is checked client-side: onboarding pull requests lack it.
    let filter = PullRequestFilter {
        author: identity.username().map(str::to_string),
        label: None,
    };

    let mut outcome = RepositoryIngest::default();
    let mut seen = HashSet::new();
    let mut pull_requests = list_pull_requests(ctx.provider(), repository, &filter);

    while let Some(pr) = pull_requests.try_next().await? {
        // Pages shift when pull requests are opened mid-listing.
        if !seen.insert(pr.number) {
            debug!(repo = %repository, number = pr.number, "Skipping duplicate pull request");
            continue;
        }

        match qualify(
            &pr,
            identity,
            config.ignore_labels(),
            config.onboarding_pattern(),
        ) {
            Qualification::Qualified => {}
            Qualification::Ignored => {
                outcome.ignored += 1;
                continue;
            }
            Qualification::Retitled => {
                debug!(repo = %repository, number = pr.number, title = %pr.title, "Skipping renamed pull request");
                outcome.retitled += 1;
                continue;
            }
            Qualification::Onboarding => {
                outcome.onboarding.push(pr);
                continue;
            }
            Qualification::NotBotAuthored => continue,
        }

        let record = build_record(repository, &pr, ctx.classifier());
        if record.is_unparsed() {
            outcome.unparsed += 1;
        }
        outcome.records.push(record);
    }

    debug!(
        repo = %repository,
        ingested = outcome.records.len(),
        ignored = outcome.ignored,
        retitled = outcome.retitled,
        unparsed = outcome.unparsed,
        onboarding = outcome.onboarding.len(),
        "Repository pull requests ingested"
    );
    Ok(outcome)
}

/// Parses and classifies the dependency updates of one pull request.
///
/// A pull request whose text cannot be parsed is kept without updates.
pub fn build_record(
    repository: &str,
    pr: &RawPullRequest,
    classifier: &UpdateClassifier,
) -> PullRequestRecord {
    let updates = match parse_dependency_changes(&pr.title, &pr.body) {
        Ok(changes) => changes
            .into_iter()
            .map(|change| {
                let update_type = classifier.classify(&change, pr);
                DependencyUpdate::new(change, update_type)
            })
            .collect(),
        Err(error) => {
            warn!(url = %pr.url, error = %error, "Could not extract dependency updates");
            Vec::new()
        }
    };

    PullRequestRecord::from_raw(repository, pr, updates)
}
