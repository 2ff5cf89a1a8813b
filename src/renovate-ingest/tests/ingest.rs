mod common;

use common::{bot_pr, config, date, settings, FakeProvider};
use renovate_ingest::provider::PageCursor;
use renovate_ingest::{
    ingest_repository, CloseDisposition, IngestConfig, RunContext, ScmProvider, UpdateType,
};
use std::sync::Arc;

const TABLE: &str = "This PR contains the following updates:\n\n\
| Package | Type | Update | Change |\n\
|---|---|---|---|\n\
| [serde](https://serde.rs) | dependencies | patch | `1.0.199` -> `1.0.200` |\n\
| tokio | dependencies | minor | `1.36.0` -> `1.37.0` |\n\
| `clap` | dependencies | major | `2.34.0` -> `4.5.4` |\n";

fn context(provider: Arc<FakeProvider>, config: IngestConfig) -> RunContext {
    let provider: Arc<dyn ScmProvider> = provider;
    RunContext::new(provider, Arc::new(config), date(3, 28))
}

#[tokio::test]
async fn table_rows_become_updates_of_one_pull_request() {
    let provider = Arc::new(FakeProvider::new().with_pull_requests(
        "acme/app",
        vec![bot_pr(7, "Update rust crates", TABLE, date(3, 1))],
    ));
    let ctx = context(provider, config(&["acme/app"]));

    let ingest = ingest_repository(&ctx, "acme/app").await.unwrap();

    assert_eq!(ingest.records.len(), 1);
    let updates: Vec<_> = ingest.records[0]
        .dependency_updates
        .iter()
        .map(|u| (u.dependency_name.as_str(), u.update_type))
        .collect();
    assert_eq!(
        updates,
        vec![
            ("serde", UpdateType::Patch),
            ("tokio", UpdateType::Minor),
            ("clap", UpdateType::MultipleMajor),
        ]
    );
}

#[tokio::test]
async fn security_label_applies_to_every_update() {
    let mut pr = bot_pr(8, "Update rust crates [SECURITY]", TABLE, date(3, 1));
    pr.labels = vec!["security".to_string()];
    let provider = Arc::new(FakeProvider::new().with_pull_requests("acme/app", vec![pr]));
    let ctx = context(provider, config(&["acme/app"]));

    let ingest = ingest_repository(&ctx, "acme/app").await.unwrap();

    assert!(ingest.records[0]
        .dependency_updates
        .iter()
        .all(|u| u.update_type == UpdateType::Security));
}

#[tokio::test]
async fn pagination_union_has_no_duplicates() {
    let prs: Vec<_> = (1..=5)
        .map(|n| {
            bot_pr(
                n,
                &format!("Update dependency pkg{n} to v1.0.{n}"),
                "",
                date(2, n as u32),
            )
        })
        .collect();
    let mut fake = FakeProvider::new().with_pull_requests("acme/app", prs.clone());
    fake.page_size = 2;
    // A pull request opened mid-listing shifts #4 onto the following page.
    fake.pages
        .insert("acme/app".to_string(), vec![vec![prs[3].clone()]]);
    let provider = Arc::new(fake);
    let ctx = context(Arc::clone(&provider), config(&["acme/app"]));

    let ingest = ingest_repository(&ctx, "acme/app").await.unwrap();

    let numbers: Vec<_> = ingest.records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    let cursors: Vec<_> = provider
        .pull_request_pages
        .lock()
        .unwrap()
        .iter()
        .map(|(_, cursor)| cursor.clone())
        .collect();
    assert_eq!(
        cursors,
        vec![
            PageCursor::First,
            PageCursor::Number(1),
            PageCursor::Number(2),
            PageCursor::Number(3),
        ]
    );
}

#[tokio::test]
async fn skips_ignored_renamed_and_onboarding_pull_requests() {
    let mut ignored = bot_pr(1, "Update dependency a to v2", "", date(2, 1));
    ignored.labels = vec!["WIP".to_string()];
    let renamed = bot_pr(2, "Routine maintenance", "", date(2, 2));
    let onboarding = bot_pr(3, "Configure Renovate", "", date(2, 3));
    let mut foreign = bot_pr(4, "Update dependency b to v2", "", date(2, 4));
    foreign.author = Some("alice".to_string());
    let unparsed = bot_pr(5, "Update all non-major dependencies", "", date(2, 5));
    let mut merged = bot_pr(6, "Update dependency c to v3.1.0", "", date(2, 6));
    merged.closed_at = Some(date(2, 8));
    merged.merged_at = Some(date(2, 8));

    let provider = Arc::new(FakeProvider::new().with_pull_requests(
        "acme/app",
        vec![ignored, renamed, onboarding, foreign, unparsed, merged],
    ));
    let config = IngestConfig::from_settings(renovate_ingest::Settings {
        ignore_labels: vec!["wip".to_string()],
        ..settings(&["acme/app"])
    })
    .unwrap();
    let ctx = context(provider, config);

    let ingest = ingest_repository(&ctx, "acme/app").await.unwrap();

    let numbers: Vec<_> = ingest.records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![5, 6]);
    let onboarding: Vec<_> = ingest.onboarding.iter().map(|pr| pr.number).collect();
    assert_eq!(onboarding, vec![3]);
    assert_eq!(ingest.ignored, 1);
    assert_eq!(ingest.retitled, 1);
    assert_eq!(ingest.unparsed, 1);
    assert_eq!(
        ingest.records[1].closed,
        Some((CloseDisposition::Merged, date(2, 8)))
    );
    assert_eq!(ingest.records[1].dependency_updates[0].old_version, "");
}

#[tokio::test]
async fn onboarding_pull_requests_come_from_the_same_listing() {
    let mut update = bot_pr(1, "Update dependency serde to v1.0.200", "", date(2, 1));
    update.labels = vec!["dependencies".to_string()];
    let unlabelled = bot_pr(2, "Update dependency tokio to v1.37.0", "", date(2, 2));
    let setup = bot_pr(3, "Configure Renovate", "", date(1, 20));

    let provider = Arc::new(
        FakeProvider::new().with_pull_requests("acme/app", vec![update, unlabelled, setup]),
    );
    let config = IngestConfig::from_settings(renovate_ingest::Settings {
        pr_label: Some("dependencies".to_string()),
        ..settings(&["acme/app"])
    })
    .unwrap();
    let ctx = context(Arc::clone(&provider), config);

    let ingest = ingest_repository(&ctx, "acme/app").await.unwrap();

    let numbers: Vec<_> = ingest.records.iter().map(|r| r.number).collect();
    assert_eq!(numbers, vec![1]);
    let onboarding: Vec<_> = ingest.onboarding.iter().map(|pr| pr.number).collect();
    assert_eq!(onboarding, vec![3]);
    assert_eq!(provider.pull_request_pages.lock().unwrap().len(), 1);
}
