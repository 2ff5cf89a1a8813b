//! Raw settings deserialization.

use crate::provider::ProviderKind;
use serde::Deserialize;

/// Unvalidated settings as read from a TOML file and command line overrides.
///
/// Every field is optional here; defaults and requirements are applied by
/// [`IngestConfig::from_settings`](super::IngestConfig::from_settings).
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Settings {
    /// Hosting provider.
    pub provider: Option<ProviderKind>,

    /// API root, for self-hosted instances.
    pub api_base_url: Option<String>,

    /// Access token.
    pub token: Option<String>,

    /// Repository entries: `owner/repo`, `owner`, `owner/*` or `user:name`.
    pub repositories: Vec<String>,

    /// Label carried by the bot's pull requests.
    pub pr_label: Option<String>,

    /// Account the bot opens pull requests as.
    pub bot_username: Option<String>,

    /// Label marking security updates.
    pub security_label: Option<String>,

    /// Pull requests carrying any of these labels are skipped.
    pub ignore_labels: Vec<String>,

    /// Distinguish major jumps of more than one version.
    pub detect_multiple_major: Option<bool>,

    /// Title pattern of the bot's onboarding pull request.
    pub onboarding_pr_pattern: Option<String>,

    /// Files whose presence marks a repository as onboarded.
    pub config_filenames: Option<Vec<String>>,

    /// How far back onboarding is sampled, in weeks.
    pub sampling_max_weeks: Option<u32>,

    /// Distance between onboarding samples, in weeks.
    pub sampling_interval_weeks: Option<u32>,

    /// SQLite database path.
    pub database_url: Option<String>,

    /// Repositories processed concurrently.
    pub concurrency: Option<usize>,

    /// Maximum attempts per provider request.
    pub max_retries: Option<u32>,

    /// Collect without writing to the database.
    pub dry_run: Option<bool>,
}

impl Settings {
    /// Applies every value set in `overrides` on top of `self`.
    ///
    /// List settings are replaced, not merged.
    #[must_use]
    pub fn merge(self, overrides: Settings) -> Self {
        fn list(base: Vec<String>, over: Vec<String>) -> Vec<String> {
            if over.is_empty() {
                base
            } else {
                over
            }
        }

        Self {
            provider: overrides.provider.or(self.provider),
            api_base_url: overrides.api_base_url.or(self.api_base_url),
            token: overrides.token.or(self.token),
            repositories: list(self.repositories, overrides.repositories),
            pr_label: overrides.pr_label.or(self.pr_label),
            bot_username: overrides.bot_username.or(self.bot_username),
            security_label: overrides.security_label.or(self.security_label),
            ignore_labels: list(self.ignore_labels, overrides.ignore_labels),
            detect_multiple_major: overrides
                .detect_multiple_major
                .or(self.detect_multiple_major),
            onboarding_pr_pattern: overrides
                .onboarding_pr_pattern
                .or(self.onboarding_pr_pattern),
            config_filenames: overrides.config_filenames.or(self.config_filenames),
            sampling_max_weeks: overrides.sampling_max_weeks.or(self.sampling_max_weeks),
            sampling_interval_weeks: overrides
                .sampling_interval_weeks
                .or(self.sampling_interval_weeks),
            database_url: overrides.database_url.or(self.database_url),
            concurrency: overrides.concurrency.or(self.concurrency),
            max_retries: overrides.max_retries.or(self.max_retries),
            dry_run: overrides.dry_run.or(self.dry_run),
        }
    }
}
