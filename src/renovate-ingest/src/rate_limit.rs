//! Rate limiting utilities for provider APIs.
//!
//! Every provider adapter owns one [`RateLimitBudget`] shared by all
//! repository workers. Requests acquire from the budget before they are sent,
//! and rate-limited or transient failures are retried through [`with_retry`]
//! with a bounded exponential backoff.

mod budget;
mod info;
mod retry;

pub use budget::RateLimitBudget;
pub use info::RateLimitInfo;
pub use retry::{with_retry, RetryPolicy};

use std::time::Duration;
use tracing::{info, warn};

/// Maximum time to wait for rate limit reset (1 hour).
pub const MAX_WAIT_SECS: u64 = 3600;

/// Minimum remaining requests before proactively waiting.
pub const MIN_REMAINING_THRESHOLD: u32 = 5;

/// Returns the current unix timestamp in seconds.
pub(crate) fn now_unix_seconds() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Sleeps until `reset` (a unix timestamp), capped at [`MAX_WAIT_SECS`].
///
/// Returns `true` if we waited, `false` if the reset already passed.
pub async fn wait_until_reset(reset: u64) -> bool {
    let now = now_unix_seconds();
    if reset <= now {
        return false;
    }

    let wait_secs = reset - now;
    if wait_secs > MAX_WAIT_SECS {
        warn!(
            wait_secs,
            max_wait = MAX_WAIT_SECS,
            "Rate limit reset too far in future, capping wait time"
        );
    }

    let actual_wait = wait_secs.min(MAX_WAIT_SECS);
    info!(wait_secs = actual_wait, "Rate limit low, waiting for reset");
    tokio::time::sleep(Duration::from_secs(actual_wait)).await;
    true
}
