//! Table rows.

use super::schema::{dependency_update, pull_request, repository_onboarding_status};
use chrono::NaiveDateTime;
use diesel::prelude::*;

/// A `pull_request` row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = pull_request)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct PullRequestRow {
    pub id: i64,
    pub repo: String,
    pub created_date: NaiveDateTime,
    pub closed_date: Option<NaiveDateTime>,
    pub close_type: Option<String>,
    pub number: i64,
    pub url: String,
}

/// A `dependency_update` row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = dependency_update)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DependencyUpdateRow {
    pub id: i64,
    pub dependency_name: String,
    pub old_version: String,
    pub new_version: String,
    pub update_type: String,
    pub pr_id: i64,
}

/// A `repository_onboarding_status` row.
#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = repository_onboarding_status)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct OnboardingStatusRow {
    pub id: i64,
    pub repo: String,
    pub sample_date: NaiveDateTime,
    pub onboarded: String,
}

/// Every row written by one run, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchRows {
    pub pull_requests: Vec<PullRequestRow>,
    pub dependency_updates: Vec<DependencyUpdateRow>,
    pub onboarding: Vec<OnboardingStatusRow>,
}

impl BatchRows {
    /// Returns the total number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.pull_requests.len() + self.dependency_updates.len() + self.onboarding.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
