//! Update type classification.
//!
//! Rules are applied in order and the first match wins:
//!
//! 1. the pull request carries the security label: `security`
//! 2. the title mentions a digest, or a label is `digest`: `digest`
//! 3. both versions parse and only the patch component differs: `patch`
//! 4. the minor component differs: `minor`
//! 5. the major component differs: `major`, or `multiple-major` when it
//!    grows by more than one and multiple-major detection is enabled
//! 6. anything else (hashes, unparseable versions): `digest`
//!
//! Changes recovered from a title have no old version. Their bump size is
//! unknown, so they are `digest` unless the title carries Renovate's
//! `(major)` marker, which makes them `major`.

use crate::model::{DependencyChange, RawPullRequest, UpdateType};
use regex::Regex;
use semver::Version;
use std::sync::LazyLock;

static DIGEST_WORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bdigest\b").expect("invalid digest regex"));

static HEX_DIGEST: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-f0-9]{7,40}$").expect("invalid hex digest regex"));

static MAJOR_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\(major\)").expect("invalid major marker regex"));

static NUMERIC_VERSION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+(?:\.\d+){0,2}").expect("invalid version regex"));

/// Inputs to classification that come from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// Label marking security fixes.
    pub security_label: String,
    /// Whether to distinguish major jumps of more than one version.
    pub detect_multiple_major: bool,
}

/// Assigns an [`UpdateType`] to each extracted change.
#[derive(Debug, Clone)]
pub struct UpdateClassifier {
    config: ClassifierConfig,
}

impl UpdateClassifier {
    #[must_use]
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    /// Classifies one change of `pr`.
    #[must_use]
    pub fn classify(&self, change: &DependencyChange, pr: &RawPullRequest) -> UpdateType {
        if pr.has_label(&self.config.security_label) {
            return UpdateType::Security;
        }
        if DIGEST_WORD.is_match(&pr.title) || pr.has_label("digest") {
            return UpdateType::Digest;
        }
        if HEX_DIGEST.is_match(&change.old_version) {
            return UpdateType::Digest;
        }
        if change.old_version.is_empty() && MAJOR_MARKER.is_match(&pr.title) {
            return UpdateType::Major;
        }

        let (Some(old), Some(new)) = (
            parse_version(&change.old_version),
            parse_version(&change.new_version),
        ) else {
            return UpdateType::Digest;
        };

        if old.major != new.major {
            if self.config.detect_multiple_major && new.major > old.major.saturating_add(1) {
                UpdateType::MultipleMajor
            } else {
                UpdateType::Major
            }
        } else if old.minor != new.minor {
            UpdateType::Minor
        } else {
            UpdateType::Patch
        }
    }
}

/// Parses a version string strictly as semver, falling back to the first
/// `major[.minor[.patch]]` run with `x`/`*` wildcards read as zero.
///
/// `^1.2.3`, `v1.2.3`, `stable-v1.2.3`, `1.x` and `20` all parse.
#[must_use]
pub fn parse_version(version: &str) -> Option<Version> {
    let trimmed = version.trim();
    let without_prefix = trimmed
        .strip_prefix('v')
        .or_else(|| trimmed.strip_prefix('V'))
        .unwrap_or(trimmed);
    if let Ok(parsed) = Version::parse(without_prefix) {
        return Some(parsed);
    }

    let cleaned = trimmed.replace(['x', 'X', '*'], "0");
    let numeric = NUMERIC_VERSION.find(&cleaned)?;
    let mut parts = numeric.as_str().split('.').map(str::parse::<u64>);
    let major = parts.next()?.ok()?;
    let minor = parts.next().transpose().ok()?.unwrap_or(0);
    let patch = parts.next().transpose().ok()?.unwrap_or(0);
    Some(Version::new(major, minor, patch))
}
