//! Bot identity signals.

use crate::model::RawPullRequest;

/// How the bot's pull requests are recognized.
///
/// At least one of the label and the account name is always present. When
/// both are configured a pull request must satisfy both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    label: Option<String>,
    username: Option<String>,
}

impl BotIdentity {
    /// Creates an identity, or `None` if neither signal is configured.
    #[must_use]
    pub fn new(label: Option<String>, username: Option<String>) -> Option<Self> {
        let label = label.filter(|l| !l.trim().is_empty());
        let username = username.filter(|u| !u.trim().is_empty());
        if label.is_none() && username.is_none() {
            return None;
        }
        Some(Self { label, username })
    }

    /// Returns the dependency label, if configured.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Returns the bot account name, if configured.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Returns true if `pr` was authored by the configured account, or if no
    /// account is configured.
    #[must_use]
    pub fn matches_author(&self, pr: &RawPullRequest) -> bool {
        match &self.username {
            Some(username) => pr
                .author
                .as_deref()
                .is_some_and(|author| author.eq_ignore_ascii_case(username)),
            None => true,
        }
    }

    /// Returns true if `pr` carries every configured identity signal.
    #[must_use]
    pub fn matches(&self, pr: &RawPullRequest) -> bool {
        let label_ok = self.label.as_deref().map_or(true, |label| pr.has_label(label));
        label_ok && self.matches_author(pr)
    }
}
