//! Dependency update facts.

use serde::Serialize;

/// Severity category of a dependency version change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum UpdateType {
    /// A digest or hash pin update.
    #[serde(rename = "digest")]
    Digest,
    /// Only the patch component changed.
    #[serde(rename = "patch")]
    Patch,
    /// The minor component changed.
    #[serde(rename = "minor")]
    Minor,
    /// The major component changed.
    #[serde(rename = "major")]
    Major,
    /// The major component jumped by more than one.
    #[serde(rename = "multiple-major")]
    MultipleMajor,
    /// The pull request fixes a vulnerability.
    #[serde(rename = "security")]
    Security,
}

impl UpdateType {
    /// Returns the value stored in the `update_type` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Digest => "digest",
            Self::Patch => "patch",
            Self::Minor => "minor",
            Self::Major => "major",
            Self::MultipleMajor => "multiple-major",
            Self::Security => "security",
        }
    }
}

/// A dependency change extracted from pull request text, before
/// classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyChange {
    /// Package name.
    pub name: String,
    /// Version before the update. Empty when only the target is known.
    pub old_version: String,
    /// Version after the update.
    pub new_version: String,
}

/// A classified dependency change owned by a pull request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyUpdate {
    /// Package name.
    pub dependency_name: String,
    /// Version before the update.
    pub old_version: String,
    /// Version after the update.
    pub new_version: String,
    /// Assigned category.
    pub update_type: UpdateType,
}

impl DependencyUpdate {
    /// Attaches a category to an extracted change.
    #[must_use]
    pub fn new(change: DependencyChange, update_type: UpdateType) -> Self {
        Self {
            dependency_name: change.name,
            old_version: change.old_version,
            new_version: change.new_version,
            update_type,
        }
    }
}
