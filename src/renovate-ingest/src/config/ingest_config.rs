//! Validated run configuration.

use super::{ConfigError, Settings};
use crate::classifier::ClassifierConfig;
use crate::discovery::RepositorySpec;
use crate::ingest::BotIdentity;
use crate::provider::ProviderKind;
use crate::rate_limit::RetryPolicy;
use regex::Regex;
use url::Url;

/// Default title pattern of the bot's onboarding pull request.
pub const DEFAULT_ONBOARDING_PR_PATTERN: &str = "^Configure Renovate";

/// Default bot configuration files looked up on the default branch.
pub const DEFAULT_CONFIG_FILENAMES: &[&str] = &["renovate.json", "renovate.json5"];

pub const DEFAULT_SAMPLING_MAX_WEEKS: u32 = 52;
pub const DEFAULT_SAMPLING_INTERVAL_WEEKS: u32 = 1;
pub const DEFAULT_CONCURRENCY: usize = 4;
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Configuration for one ingestion run, validated from [`Settings`].
#[derive(Debug, Clone)]
pub struct IngestConfig {
    provider: ProviderKind,
    api_base_url: String,
    token: String,
    repositories: Vec<RepositorySpec>,
    identity: BotIdentity,
    security_label: String,
    ignore_labels: Vec<String>,
    detect_multiple_major: bool,
    onboarding_pattern: Regex,
    config_filenames: Vec<String>,
    sampling_max_weeks: u32,
    sampling_interval_weeks: u32,
    database_url: Option<String>,
    concurrency: usize,
    max_retries: u32,
    dry_run: bool,
}

impl IngestConfig {
    /// Validates `settings` and fills in defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a required setting is missing or a value
    /// is malformed.
    pub fn from_settings(settings: Settings) -> Result<Self, ConfigError> {
        let provider = settings.provider.unwrap_or_default();
        let dry_run = settings.dry_run.unwrap_or(false);

        let api_base_url = non_empty(settings.api_base_url)
            .unwrap_or_else(|| provider.default_api_base_url().to_string());
        Url::parse(&api_base_url).map_err(|e| ConfigError::ValidationError {
            setting: "api-base-url",
            message: e.to_string(),
        })?;

        let token = non_empty(settings.token).ok_or(ConfigError::MissingSetting { setting: "token" })?;

        let repositories = parse_repositories(provider, &settings.repositories)?;

        let identity = BotIdentity::new(settings.pr_label, settings.bot_username).ok_or(
            ConfigError::ValidationError {
                setting: "pr-label",
                message: "one of pr-label or bot-username must be set".to_string(),
            },
        )?;

        let security_label = non_empty(settings.security_label).ok_or(
            ConfigError::MissingSetting {
                setting: "security-label",
            },
        )?;

        let ignore_labels = settings
            .ignore_labels
            .into_iter()
            .map(|label| label.trim().to_string())
            .filter(|label| !label.is_empty())
            .collect();

        let pattern = non_empty(settings.onboarding_pr_pattern)
            .unwrap_or_else(|| DEFAULT_ONBOARDING_PR_PATTERN.to_string());
        let onboarding_pattern =
            Regex::new(&pattern).map_err(|e| ConfigError::ValidationError {
                setting: "onboarding-pr-pattern",
                message: e.to_string(),
            })?;

        let config_filenames = match settings.config_filenames {
            Some(names) if names.iter().any(|name| name.trim().is_empty()) => {
                return Err(ConfigError::ValidationError {
                    setting: "config-filenames",
                    message: "file names must not be empty".to_string(),
                })
            }
            Some(names) if !names.is_empty() => names,
            _ => DEFAULT_CONFIG_FILENAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
        };

        let sampling_max_weeks = positive(
            "sampling-max-weeks",
            settings.sampling_max_weeks,
            DEFAULT_SAMPLING_MAX_WEEKS,
        )?;
        let sampling_interval_weeks = positive(
            "sampling-interval-weeks",
            settings.sampling_interval_weeks,
            DEFAULT_SAMPLING_INTERVAL_WEEKS,
        )?;
        let concurrency = positive("concurrency", settings.concurrency, DEFAULT_CONCURRENCY)?;
        let max_retries = positive("max-retries", settings.max_retries, DEFAULT_MAX_RETRIES)?;

        let database_url = non_empty(settings.database_url);
        if database_url.is_none() && !dry_run {
            return Err(ConfigError::MissingSetting {
                setting: "database-url",
            });
        }

        Ok(Self {
            provider,
            api_base_url,
            token,
            repositories,
            identity,
            security_label,
            ignore_labels,
            detect_multiple_major: settings.detect_multiple_major.unwrap_or(false),
            onboarding_pattern,
            config_filenames,
            sampling_max_weeks,
            sampling_interval_weeks,
            database_url,
            concurrency,
            max_retries,
            dry_run,
        })
    }

    /// Returns the hosting provider.
    pub fn provider(&self) -> ProviderKind {
        self.provider
    }

    /// Returns the provider API root.
    pub fn api_base_url(&self) -> &str {
        &self.api_base_url
    }

    /// Returns the access token.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Returns the parsed repository entries.
    pub fn repositories(&self) -> &[RepositorySpec] {
        &self.repositories
    }

    /// Returns how bot pull requests are recognized.
    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    pub fn security_label(&self) -> &str {
        &self.security_label
    }

    pub fn ignore_labels(&self) -> &[String] {
        &self.ignore_labels
    }

    pub fn detect_multiple_major(&self) -> bool {
        self.detect_multiple_major
    }

    /// Returns the onboarding pull request title pattern.
    pub fn onboarding_pattern(&self) -> &Regex {
        &self.onboarding_pattern
    }

    /// Returns the bot configuration files looked up when sampling.
    pub fn config_filenames(&self) -> &[String] {
        &self.config_filenames
    }

    pub fn sampling_max_weeks(&self) -> u32 {
        self.sampling_max_weeks
    }

    pub fn sampling_interval_weeks(&self) -> u32 {
        self.sampling_interval_weeks
    }

    /// Returns the database path. Only absent in dry-run mode.
    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    /// Returns the max repositories processed concurrently.
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Returns whether dry-run mode is enabled.
    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Builds the retry policy for provider requests.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }

    /// Builds the update classifier settings.
    pub fn classifier_config(&self) -> ClassifierConfig {
        ClassifierConfig {
            security_label: self.security_label.clone(),
            detect_multiple_major: self.detect_multiple_major,
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn positive<T>(setting: &'static str, value: Option<T>, default: T) -> Result<T, ConfigError>
where
    T: Copy + Default + PartialEq + std::fmt::Display,
{
    match value {
        Some(v) if v == T::default() => Err(ConfigError::ValidationError {
            setting,
            message: format!("must be at least 1, got {v}"),
        }),
        Some(v) => Ok(v),
        None => Ok(default),
    }
}

fn parse_repositories(
    provider: ProviderKind,
    entries: &[String],
) -> Result<Vec<RepositorySpec>, ConfigError> {
    let entries: Vec<&str> = entries
        .iter()
        .flat_map(|entry| entry.split(','))
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .collect();
    if entries.is_empty() {
        return Err(ConfigError::MissingSetting {
            setting: "repositories",
        });
    }

    entries
        .into_iter()
        .map(|entry| {
            let spec: RepositorySpec =
                entry
                    .parse()
                    .map_err(|message| ConfigError::ValidationError {
                        setting: "repositories",
                        message,
                    })?;

            // GitHub has no nested namespaces.
            let nested = match &spec {
                RepositorySpec::Repository(name) => name.matches('/').count() > 1,
                RepositorySpec::Owner(name) => name.contains('/'),
                RepositorySpec::User(_) => false,
            };
            if provider == ProviderKind::GitHub && nested {
                return Err(ConfigError::ValidationError {
                    setting: "repositories",
                    message: format!("'{entry}' is not a valid GitHub repository or owner"),
                });
            }
            Ok(spec)
        })
        .collect()
}
