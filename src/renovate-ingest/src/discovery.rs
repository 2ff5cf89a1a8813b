//! Repository discovery.
//!
//! Expands the configured repository entries into concrete repositories.
//! Explicit entries are looked up individually, owner entries are listed as
//! an organization or group first and as a user namespace second.

mod error;
mod spec;

pub use error::DiscoveryError;
pub use spec::RepositorySpec;

use crate::model::Repository;
use crate::provider::{list_repositories, ProviderError, RepositoryOwner, ScmProvider};
use futures::TryStreamExt;
use std::collections::HashSet;
use tracing::{debug, info, info_span, warn, Instrument};

/// Resolves every configured entry into repositories.
///
/// Repositories reached through more than one entry are kept once, in the
/// order they were first seen.
///
/// # Errors
///
/// Returns [`DiscoveryError`] if any entry cannot be resolved. Discovery
/// runs before any data is collected, so a bad entry aborts the run.
pub async fn resolve_repositories(
    provider: &dyn ScmProvider,
    specs: &[RepositorySpec],
) -> Result<Vec<Repository>, DiscoveryError> {
    let span = info_span!("discover", provider = %provider.kind(), entries = specs.len());

    async {
        let mut seen = HashSet::new();
        let mut repositories = Vec::new();

        for spec in specs {
            let resolved = resolve_entry(provider, spec).await?;
            debug!(entry = %spec, count = resolved.len(), "Resolved repository entry");

            for repository in resolved {
                if seen.insert(repository.full_name.clone()) {
                    repositories.push(repository);
                } else {
                    warn!(repo = %repository.full_name, entry = %spec, "Repository listed more than once");
                }
            }
        }

        info!(count = repositories.len(), "Discovered repositories");
        Ok(repositories)
    }
    .instrument(span)
    .await
}

async fn resolve_entry(
    provider: &dyn ScmProvider,
    spec: &RepositorySpec,
) -> Result<Vec<Repository>, DiscoveryError> {
    let provider_error = |source| DiscoveryError::Provider {
        entry: spec.to_string(),
        source,
    };

    match spec {
        RepositorySpec::Repository(full_name) => match provider.repository(full_name).await {
            Ok(repository) => Ok(vec![repository]),
            Err(ProviderError::NotFound { .. }) => Err(DiscoveryError::RepositoryNotFound {
                entry: full_name.clone(),
            }),
            Err(error) => Err(provider_error(error)),
        },
        RepositorySpec::Owner(owner) => {
            let group = RepositoryOwner::Group(owner.clone());
            match list_owner(provider, &group).await {
                Ok(repositories) => return Ok(repositories),
                Err(ProviderError::NotFound { .. }) => {
                    debug!(owner = %owner, "Not an organization, trying user namespace");
                }
                Err(error) => return Err(provider_error(error)),
            }

            let user = RepositoryOwner::User(owner.clone());
            match list_owner(provider, &user).await {
                Ok(repositories) => Ok(repositories),
                Err(ProviderError::NotFound { .. }) => Err(DiscoveryError::OwnerNotFound {
                    owner: owner.clone(),
                }),
                Err(error) => Err(provider_error(error)),
            }
        }
        RepositorySpec::User(user) => {
            let owner = RepositoryOwner::User(user.clone());
            match list_owner(provider, &owner).await {
                Ok(repositories) => Ok(repositories),
                Err(ProviderError::NotFound { .. }) => Err(DiscoveryError::OwnerNotFound {
                    owner: owner.to_string(),
                }),
                Err(error) => Err(provider_error(error)),
            }
        }
    }
}

async fn list_owner(
    provider: &dyn ScmProvider,
    owner: &RepositoryOwner,
) -> Result<Vec<Repository>, ProviderError> {
    list_repositories(provider, owner).try_collect().await
}
