//! Rate limit information.

use http::HeaderMap;
use std::time::Duration;

/// Rate limit information reported by a provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitInfo {
    /// Requests remaining in the current window.
    pub remaining: u32,

    /// Unix timestamp when the rate limit resets.
    pub reset: u64,

    /// Total requests allowed per window.
    pub limit: u32,
}

impl RateLimitInfo {
    /// Reads GitLab-style `RateLimit-*` headers.
    ///
    /// Returns `None` unless both the remaining count and the reset
    /// timestamp are present and numeric.
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let remaining = header_number(headers, "ratelimit-remaining")?;
        let reset = header_number(headers, "ratelimit-reset")?;
        let limit = header_number(headers, "ratelimit-limit").unwrap_or(remaining);

        Some(Self {
            remaining: u32::try_from(remaining).unwrap_or(u32::MAX),
            reset,
            limit: u32::try_from(limit).unwrap_or(u32::MAX),
        })
    }
}

impl RateLimitInfo {
    /// Returns how long after `now` (unix seconds) the window resets.
    #[must_use]
    pub fn until_reset(&self, now: u64) -> Duration {
        Duration::from_secs(self.reset.saturating_sub(now))
    }
}

fn header_number(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers.get(name)?.to_str().ok()?.trim().parse().ok()
}
