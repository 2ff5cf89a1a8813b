//! Configured repository entries.

use std::fmt;
use std::str::FromStr;

/// One entry of the configured repository list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RepositorySpec {
    /// A single repository, `owner/repo` (GitLab: `group/sub/repo`).
    Repository(String),
    /// Every repository of an organization or group (`owner` or `owner/*`),
    /// falling back to a user namespace of the same name.
    Owner(String),
    /// Every repository of a user namespace (`user:name`).
    User(String),
}

impl FromStr for RepositorySpec {
    type Err = String;

    fn from_str(entry: &str) -> Result<Self, Self::Err> {
        let entry = entry.trim().trim_end_matches('/');
        if entry.is_empty() {
            return Err("empty repository entry".to_string());
        }

        if let Some(user) = entry.strip_prefix("user:") {
            let user = user.trim();
            if user.is_empty() || user.contains('/') {
                return Err(format!("invalid user entry '{entry}'"));
            }
            return Ok(Self::User(user.to_string()));
        }

        let (path, wildcard) = match entry.strip_suffix("/*") {
            Some(owner) => (owner, true),
            None => (entry, false),
        };
        if path.split('/').any(|segment| segment.trim().is_empty() || segment.contains('*')) {
            return Err(format!("invalid repository entry '{entry}'"));
        }

        if wildcard || !path.contains('/') {
            Ok(Self::Owner(path.to_string()))
        } else {
            Ok(Self::Repository(path.to_string()))
        }
    }
}

impl fmt::Display for RepositorySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Repository(name) => write!(f, "{name}"),
            Self::Owner(name) => write!(f, "{name}/*"),
            Self::User(name) => write!(f, "user:{name}"),
        }
    }
}
