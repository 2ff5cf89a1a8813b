mod common;

use common::{bot_pr, config, date, FakeProvider};
use renovate_ingest::{
    sample_repository, OnboardingState, Repository, RunContext, ScmProvider,
};
use std::sync::atomic::Ordering;
use std::sync::Arc;

fn states(samples: &[renovate_ingest::OnboardingSample]) -> Vec<OnboardingState> {
    samples.iter().map(|sample| sample.state).collect()
}

fn repository(created: chrono::DateTime<chrono::Utc>) -> Repository {
    Repository::new("acme/app").with_created_at(created)
}

fn context(provider: Arc<FakeProvider>) -> RunContext {
    let provider: Arc<dyn ScmProvider> = provider;
    // Thursday; the latest checkpoint is Monday 2024-03-25.
    RunContext::new(provider, Arc::new(config(&["acme/app"])), date(3, 28))
}

#[tokio::test]
async fn config_file_marks_repository_onboarded() {
    let provider = Arc::new(
        FakeProvider::new()
            .with_commit("acme/app", date(2, 20), "c1")
            .with_commit("acme/app", date(3, 15), "c2")
            .with_file("acme/app", "c2", "renovate.json"),
    );
    let ctx = context(Arc::clone(&provider));

    let samples = sample_repository(&ctx, &repository(date(1, 1)), &[])
        .await
        .unwrap();

    let dates: Vec<_> = samples.iter().map(|sample| sample.sampled_at).collect();
    assert_eq!(dates, vec![date(3, 4), date(3, 11), date(3, 18), date(3, 25)]);
    assert_eq!(
        states(&samples),
        vec![
            OnboardingState::Disabled,
            OnboardingState::Disabled,
            OnboardingState::Onboarded,
            OnboardingState::Onboarded,
        ]
    );
    // c1 is checked for both file names once, c2 hits on the first.
    assert_eq!(provider.file_requests.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn open_onboarding_pull_request_means_in_progress() {
    let mut setup = bot_pr(1, "Configure Renovate", "", date(3, 5));
    setup.closed_at = Some(date(3, 15));
    setup.merged_at = Some(date(3, 15));
    let provider = Arc::new(
        FakeProvider::new()
            .with_commit("acme/app", date(3, 15), "c2")
            .with_file("acme/app", "c2", "renovate.json5"),
    );
    let ctx = context(provider);

    let samples = sample_repository(&ctx, &repository(date(1, 1)), &[setup])
        .await
        .unwrap();

    assert_eq!(
        states(&samples),
        vec![
            OnboardingState::Disabled,
            OnboardingState::Onboarding,
            OnboardingState::Onboarded,
            OnboardingState::Onboarded,
        ]
    );
}

#[tokio::test]
async fn skips_checkpoints_before_creation() {
    let provider = Arc::new(FakeProvider::new());
    let ctx = context(provider);

    let samples = sample_repository(&ctx, &repository(date(3, 12)), &[])
        .await
        .unwrap();

    let dates: Vec<_> = samples.iter().map(|sample| sample.sampled_at).collect();
    assert_eq!(dates, vec![date(3, 18), date(3, 25)]);
    assert!(samples
        .iter()
        .all(|sample| sample.state == OnboardingState::Disabled));
}
