//! Run batch assembly.
//!
//! Repository outcomes arrive in completion order. The batch sorts them so
//! that an unchanged provider state always produces the same rows, ids
//! included.

use crate::model::{OnboardingSample, PullRequestRecord};
use crate::persistence::{BatchRows, DependencyUpdateRow, OnboardingStatusRow, PullRequestRow};
use crate::summary::RepositoryOutcome;

/// Every record collected by one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunBatch {
    pull_requests: Vec<PullRequestRecord>,
    samples: Vec<OnboardingSample>,
}

impl RunBatch {
    /// Collects the records of every processed repository.
    ///
    /// Pull requests are ordered by repository then number, samples by
    /// repository then date. Failed repositories contribute nothing.
    #[must_use]
    pub fn from_outcomes(outcomes: &[RepositoryOutcome]) -> Self {
        let mut pull_requests = Vec::new();
        let mut samples = Vec::new();

        for outcome in outcomes {
            if let RepositoryOutcome::Processed {
                ingest,
                samples: repo_samples,
                ..
            } = outcome
            {
                pull_requests.extend(ingest.records.iter().cloned());
                samples.extend(repo_samples.iter().cloned());
            }
        }

        pull_requests.sort_by(|a, b| (&a.repository, a.number).cmp(&(&b.repository, b.number)));
        samples.sort_by(|a, b| (&a.repository, a.sampled_at).cmp(&(&b.repository, b.sampled_at)));

        Self {
            pull_requests,
            samples,
        }
    }

    pub fn pull_requests(&self) -> &[PullRequestRecord] {
        &self.pull_requests
    }

    pub fn samples(&self) -> &[OnboardingSample] {
        &self.samples
    }

    /// Converts the batch into table rows with ids assigned from 1.
    #[must_use]
    pub fn to_rows(&self) -> BatchRows {
        let mut rows = BatchRows::default();

        for (pr_id, record) in (1_i64..).zip(&self.pull_requests) {
            rows.pull_requests.push(PullRequestRow {
                id: pr_id,
                repo: record.repository.clone(),
                created_date: record.created_at.naive_utc(),
                closed_date: record.closed.map(|(_, at)| at.naive_utc()),
                close_type: record
                    .closed
                    .map(|(disposition, _)| disposition.as_str().to_string()),
                number: i64::try_from(record.number).unwrap_or(i64::MAX),
                url: record.url.clone(),
            });

            for update in &record.dependency_updates {
                let id = i64::try_from(rows.dependency_updates.len())
                    .map_or(i64::MAX, |count| count + 1);
                rows.dependency_updates.push(DependencyUpdateRow {
                    id,
                    dependency_name: update.dependency_name.clone(),
                    old_version: update.old_version.clone(),
                    new_version: update.new_version.clone(),
                    update_type: update.update_type.as_str().to_string(),
                    pr_id,
                });
            }
        }

        for (id, sample) in (1_i64..).zip(&self.samples) {
            rows.onboarding.push(OnboardingStatusRow {
                id,
                repo: sample.repository.clone(),
                sample_date: sample.sampled_at.naive_utc(),
                onboarded: sample.state.as_str().to_string(),
            });
        }

        rows
    }
}
