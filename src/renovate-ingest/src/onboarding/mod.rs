//! Onboarding status sampling.
//!
//! A repository is *onboarded* at a checkpoint if its default branch
//! contained a bot configuration file at that time, *onboarding* if the
//! bot's setup pull request was open instead, and *disabled* otherwise.

mod checkpoints;

pub use checkpoints::{checkpoints, week_start};

use crate::model::{OnboardingSample, OnboardingState, RawPullRequest, Repository};
use crate::provider::ProviderError;
use crate::runner::RunContext;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Samples the onboarding state of `repository` at every run checkpoint.
///
/// `onboarding_prs` are the bot's onboarding pull requests collected while
/// ingesting the repository. Checkpoints before the repository was created
/// are skipped.
///
/// # Errors
///
/// Returns the first [`ProviderError`] raised by the provider.
pub async fn sample_repository(
    ctx: &RunContext,
    repository: &Repository,
    onboarding_prs: &[RawPullRequest],
) -> Result<Vec<OnboardingSample>, ProviderError> {
    let full_name = repository.full_name.as_str();
    let mut config_by_commit: HashMap<String, bool> = HashMap::new();
    let mut samples = Vec::new();

    for &checkpoint in ctx.checkpoints() {
        if repository
            .created_at
            .is_some_and(|created_at| checkpoint < created_at)
        {
            continue;
        }

        let has_config_file = match ctx.provider().commit_as_of(full_name, checkpoint).await? {
            Some(sha) => match config_by_commit.get(&sha) {
                Some(&found) => found,
                None => {
                    let found = has_config_file(ctx, full_name, &sha).await?;
                    config_by_commit.insert(sha, found);
                    found
                }
            },
            None => false,
        };
        let has_open_onboarding_pr = has_open_pull_request(onboarding_prs, checkpoint);

        samples.push(OnboardingSample {
            repository: full_name.to_string(),
            sampled_at: checkpoint,
            state: OnboardingState::from_signals(has_config_file, has_open_onboarding_pr),
        });
    }

    debug!(repo = %full_name, samples = samples.len(), "Onboarding states sampled");
    Ok(samples)
}

/// Returns true if any of `pull_requests` was open at `instant`.
#[must_use]
pub fn has_open_pull_request(pull_requests: &[RawPullRequest], instant: DateTime<Utc>) -> bool {
    pull_requests.iter().any(|pr| pr.is_open_at(instant))
}

/// Returns true if any configured configuration file exists at `sha`.
async fn has_config_file(
    ctx: &RunContext,
    repository: &str,
    sha: &str,
) -> Result<bool, ProviderError> {
    for filename in ctx.config().config_filenames() {
        if ctx
            .provider()
            .get_file_at_ref(repository, filename, sha)
            .await?
            .is_some()
        {
            return Ok(true);
        }
    }
    Ok(false)
}
