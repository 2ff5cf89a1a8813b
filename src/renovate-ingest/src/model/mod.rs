//! Provider-agnostic entities produced by an ingestion run.
//!
//! - [`Repository`] - A resolved repository on the hosting provider
//! - [`PullRequestRecord`] - A bot-authored pull request and its dependency updates
//! - [`DependencyUpdate`] - One dependency change classified by [`UpdateType`]
//! - [`OnboardingSample`] - The onboarding state of a repository at a checkpoint

mod dependency;
mod onboarding;
mod pull_request;
mod repository;

pub use dependency::{DependencyChange, DependencyUpdate, UpdateType};
pub use onboarding::{OnboardingSample, OnboardingState};
pub use pull_request::{CloseDisposition, PullRequestRecord, RawPullRequest};
pub use repository::Repository;
