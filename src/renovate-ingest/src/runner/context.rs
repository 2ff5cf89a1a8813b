//! Shared state of one run.

use crate::classifier::UpdateClassifier;
use crate::config::IngestConfig;
use crate::onboarding::checkpoints;
use crate::provider::ScmProvider;
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// State shared by every repository task of a run.
///
/// Checkpoints are fixed when the context is created so that every
/// repository is sampled at the same instants.
pub struct RunContext {
    provider: Arc<dyn ScmProvider>,
    config: Arc<IngestConfig>,
    classifier: UpdateClassifier,
    checkpoints: Vec<DateTime<Utc>>,
    started_at: DateTime<Utc>,
}

impl RunContext {
    /// Creates the context for a run starting at `now`.
    pub fn new(
        provider: Arc<dyn ScmProvider>,
        config: Arc<IngestConfig>,
        now: DateTime<Utc>,
    ) -> Self {
        let classifier = UpdateClassifier::new(config.classifier_config());
        let checkpoints = checkpoints(
            now,
            config.sampling_max_weeks(),
            config.sampling_interval_weeks(),
        );
        Self {
            provider,
            config,
            classifier,
            checkpoints,
            started_at: now,
        }
    }

    /// Returns the hosting provider.
    pub fn provider(&self) -> &dyn ScmProvider {
        self.provider.as_ref()
    }

    /// Returns the run configuration.
    pub fn config(&self) -> &IngestConfig {
        &self.config
    }

    pub fn classifier(&self) -> &UpdateClassifier {
        &self.classifier
    }

    /// Returns the onboarding checkpoints, oldest first.
    pub fn checkpoints(&self) -> &[DateTime<Utc>] {
        &self.checkpoints
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("provider", &self.provider.kind())
            .field("checkpoints", &self.checkpoints.len())
            .field("started_at", &self.started_at)
            .finish_non_exhaustive()
    }
}
