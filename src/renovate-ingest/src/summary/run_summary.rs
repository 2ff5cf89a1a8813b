//! Run summary types.

use super::result::RepositoryOutcome;

/// Summary of a complete run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of repositories processed successfully.
    pub repositories_processed: usize,

    /// Number of repositories that failed.
    pub repositories_failed: usize,

    /// Number of pull requests ingested.
    pub pull_requests_ingested: usize,

    /// Number of pull requests skipped because of an ignore label.
    pub pull_requests_ignored: usize,

    /// Number of bot pull requests skipped because they were renamed.
    pub pull_requests_retitled: usize,

    /// Number of ingested pull requests without any extracted update.
    pub pull_requests_unparsed: usize,

    /// Number of dependency updates extracted.
    pub dependency_updates: usize,

    /// Number of onboarding samples taken.
    pub onboarding_samples: usize,

    /// Whether this was a dry run.
    pub dry_run: bool,

    /// Whether the batch was written to the datastore.
    pub committed: bool,
}

impl RunSummary {
    /// Creates a new empty summary.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Default::default()
        }
    }

    /// Updates the summary with a repository outcome.
    pub fn record_result(&mut self, result: &RepositoryOutcome) {
        match result {
            RepositoryOutcome::Processed {
                ingest, samples, ..
            } => {
                self.repositories_processed += 1;
                self.pull_requests_ingested += ingest.records.len();
                self.pull_requests_ignored += ingest.ignored;
                self.pull_requests_retitled += ingest.retitled;
                self.pull_requests_unparsed += ingest.unparsed;
                self.dependency_updates += ingest
                    .records
                    .iter()
                    .map(|record| record.dependency_updates.len())
                    .sum::<usize>();
                self.onboarding_samples += samples.len();
            }
            RepositoryOutcome::Failed { .. } => self.repositories_failed += 1,
        }
    }

    /// Returns true if any repository failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.repositories_failed > 0
    }
}
