//! Pull request qualification rules.

use super::BotIdentity;
use crate::model::RawPullRequest;
use regex::Regex;
use std::sync::LazyLock;

static SEMANTIC_UPDATE_TITLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:chore|fix|build)\(deps\): (?:bump|update|pin) ")
        .expect("invalid semantic title regex")
});

/// What the ingestor does with a listed pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Qualification {
    /// A dependency update pull request to ingest.
    Qualified,
    /// Carries an ignore label.
    Ignored,
    /// Lacks one of the configured identity signals.
    NotBotAuthored,
    /// The bot's onboarding pull request, handed to the sampler.
    Onboarding,
    /// Bot-authored, but renamed away from an update title.
    Retitled,
}

/// Decides whether `pr` is an ingestible bot update.
///
/// Ignore labels win over everything else. Onboarding pull requests only need
/// the bot account, since they never carry the dependency label.
#[must_use]
pub fn qualify(
    pr: &RawPullRequest,
    identity: &BotIdentity,
    ignore_labels: &[String],
    onboarding_pattern: &Regex,
) -> Qualification {
    if ignore_labels.iter().any(|label| pr.has_label(label)) {
        return Qualification::Ignored;
    }
    if identity.matches_author(pr) && onboarding_pattern.is_match(&pr.title) {
        return Qualification::Onboarding;
    }
    if !identity.matches(pr) {
        return Qualification::NotBotAuthored;
    }
    if !is_relevant_title(&pr.title) {
        return Qualification::Retitled;
    }
    Qualification::Qualified
}

/// Returns true if `title` looks like one the bot generates for updates.
///
/// Team members sometimes retire an update pull request by renaming it
/// rather than closing it; such pull requests no longer match.
#[must_use]
pub fn is_relevant_title(title: &str) -> bool {
    ["Update ", "Bump ", "Pin "]
        .iter()
        .any(|prefix| title.starts_with(prefix))
        || SEMANTIC_UPDATE_TITLE.is_match(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn pr(title: &str, labels: &[&str]) -> RawPullRequest {
        RawPullRequest {
            number: 9,
            title: title.to_string(),
            body: String::new(),
            labels: labels.iter().map(ToString::to_string).collect(),
            author: Some("renovate[bot]".to_string()),
            url: "https://gitlab.com/acme/app/-/merge_requests/9".to_string(),
            created_at: Utc::now(),
            closed_at: None,
            merged_at: None,
        }
    }

    fn check(title: &str, labels: &[&str]) -> Qualification {
        let identity = BotIdentity::new(None, Some("renovate[bot]".to_string())).unwrap();
        let pattern = Regex::new("^Configure Renovate").unwrap();
        qualify(
            &pr(title, labels),
            &identity,
            &["wontfix".to_string()],
            &pattern,
        )
    }

    #[test]
    fn recognizes_update_titles() {
        assert!(is_relevant_title("Update dependency serde to v1.0.200"));
        assert!(is_relevant_title("Update all non-major dependencies - autoclosed"));
        assert!(is_relevant_title("chore(deps): bump lodash from 4.17.20 to 4.17.21"));
        assert!(is_relevant_title("fix(deps): update react to v18"));
        assert!(!is_relevant_title("DO NOT MERGE: old update"));
        assert!(!is_relevant_title("feat: add endpoint"));
    }

    #[test]
    fn applies_rules_in_order() {
        assert_eq!(
            check("Update dependency serde to v1.0.200", &[]),
            Qualification::Qualified
        );
        assert_eq!(
            check("Update dependency serde to v1.0.200", &["WontFix"]),
            Qualification::Ignored
        );
        assert_eq!(check("Configure Renovate", &[]), Qualification::Onboarding);
        assert_eq!(check("Superseded by #12", &[]), Qualification::Retitled);
    }

    #[test]
    fn foreign_authors_are_skipped() {
        let identity = BotIdentity::new(None, Some("renovate[bot]".to_string())).unwrap();
        let mut foreign = pr("Update dependency serde to v1.0.200", &[]);
        foreign.author = Some("alice".to_string());
        let pattern = Regex::new("^Configure Renovate").unwrap();
        assert_eq!(
            qualify(&foreign, &identity, &[], &pattern),
            Qualification::NotBotAuthored
        );
        foreign.title = "Configure Renovate".to_string();
        assert_eq!(
            qualify(&foreign, &identity, &[], &pattern),
            Qualification::NotBotAuthored
        );
    }

    #[test]
    fn onboarding_does_not_need_dependency_label() {
        let identity = BotIdentity::new(
            Some("dependencies".to_string()),
            Some("renovate[bot]".to_string()),
        )
        .unwrap();
        let pattern = Regex::new("^Configure Renovate").unwrap();
        assert_eq!(
            qualify(&pr("Configure Renovate", &[]), &identity, &[], &pattern),
            Qualification::Onboarding
        );
        assert_eq!(
            qualify(&pr("Update dependency serde to v1.0.200", &[]), &identity, &[], &pattern),
            Qualification::NotBotAuthored
        );
    }
}
