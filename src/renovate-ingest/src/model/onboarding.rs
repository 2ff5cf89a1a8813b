//! Repository onboarding samples.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Whether a repository used the bot at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OnboardingState {
    /// A bot config file exists on the default branch.
    Onboarded,
    /// An onboarding pull request is open.
    Onboarding,
    /// Neither signal holds.
    Disabled,
}

impl OnboardingState {
    /// Derives the state from the two observable signals.
    ///
    /// A config file wins over an open onboarding pull request.
    #[must_use]
    pub fn from_signals(has_config_file: bool, has_open_onboarding_pr: bool) -> Self {
        match (has_config_file, has_open_onboarding_pr) {
            (true, _) => Self::Onboarded,
            (false, true) => Self::Onboarding,
            (false, false) => Self::Disabled,
        }
    }

    /// Returns the value stored in the `onboarded` column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Onboarded => "onboarded",
            Self::Onboarding => "in_progress",
            Self::Disabled => "disabled",
        }
    }
}

/// The onboarding state of one repository at one checkpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OnboardingSample {
    /// Repository full name.
    pub repository: String,
    /// Checkpoint timestamp (a week boundary).
    pub sampled_at: DateTime<Utc>,
    /// Derived state.
    pub state: OnboardingState,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_file_takes_precedence() {
        assert_eq!(
            OnboardingState::from_signals(true, true),
            OnboardingState::Onboarded
        );
        assert_eq!(
            OnboardingState::from_signals(false, true),
            OnboardingState::Onboarding
        );
        assert_eq!(
            OnboardingState::from_signals(false, false),
            OnboardingState::Disabled
        );
    }

    #[test]
    fn onboarding_is_stored_as_in_progress() {
        assert_eq!(OnboardingState::Onboarding.as_str(), "in_progress");
    }
}
