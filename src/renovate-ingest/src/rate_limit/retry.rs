//! Bounded exponential backoff for provider requests.

use super::MAX_WAIT_SECS;
use crate::provider::ProviderError;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// How often and how long to retry rate-limited or transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    max_attempts: u32,
    /// Delay before the second attempt.
    base_delay: Duration,
    /// Upper bound for the computed backoff delay.
    max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with the default delays and `max_attempts` attempts.
    ///
    /// At least one attempt is always made.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Overrides the base and maximum backoff delays.
    #[must_use]
    pub fn with_delays(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Returns the number of attempts.
    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Returns the backoff delay after the given failed attempt (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1_u32 << exponent)
            .min(self.max_delay)
    }
}

/// Runs `request` until it succeeds, fails permanently, or the policy's
/// attempts are used up.
///
/// Only [`ProviderError::is_retryable`] errors are retried. A `Retry-After`
/// hint longer than the computed backoff is honored, capped at one hour.
/// When attempts run out the last error is escalated: rate limiting becomes
/// [`ProviderError::RateLimitExceeded`] and transient failures become
/// [`ProviderError::RetriesExhausted`].
///
/// # Errors
///
/// Returns the first non-retryable error, or the escalated last error.
pub async fn with_retry<T, F, Fut>(
    policy: &RetryPolicy,
    operation: &str,
    mut request: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 1;
    loop {
        match request().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy
                    .delay_for(attempt)
                    .max(error.retry_after().unwrap_or_default())
                    .min(Duration::from_secs(MAX_WAIT_SECS));
                warn!(
                    operation,
                    attempt,
                    delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "Retrying request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error.escalate(attempt)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn rate_limited() -> ProviderError {
        ProviderError::RateLimited {
            operation: "list pulls".to_string(),
            message: "API rate limit exceeded".to_string(),
            retry_after: None,
        }
    }

    #[test]
    fn delays_double_and_cap() {
        let policy = RetryPolicy::new(10)
            .with_delays(Duration::from_secs(1), Duration::from_secs(10));

        assert_eq!(policy.delay_for(1), Duration::from_secs(1));
        assert_eq!(policy.delay_for(2), Duration::from_secs(2));
        assert_eq!(policy.delay_for(4), Duration::from_secs(8));
        assert_eq!(policy.delay_for(5), Duration::from_secs(10));
        assert_eq!(policy.delay_for(40), Duration::from_secs(10));
    }

    #[test]
    fn zero_attempts_still_runs_once() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn recovers_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result = with_retry(&RetryPolicy::new(3), "get user", move || async move {
            if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(ProviderError::Transient {
                    operation: "get user".to_string(),
                    message: "connection reset".to_string(),
                })
            } else {
                Ok("renovate")
            }
        })
        .await;

        assert_eq!(result.unwrap(), "renovate");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_rate_limit_escalates() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_retry(&RetryPolicy::new(4), "list pulls", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(rate_limited())
        })
        .await;

        assert!(matches!(
            result,
            Err(ProviderError::RateLimitExceeded { attempts: 4, .. })
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn persistent_transient_failure_escalates() {
        let result: Result<(), _> = with_retry(&RetryPolicy::new(2), "get user", || async {
            Err(ProviderError::Transient {
                operation: "get user".to_string(),
                message: "timed out".to_string(),
            })
        })
        .await;

        let error = result.unwrap_err();
        assert!(matches!(
            error,
            ProviderError::RetriesExhausted { attempts: 2, .. }
        ));
        assert!(error.is_fatal());
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let calls = AtomicU32::new(0);
        let counter = &calls;
        let result: Result<(), _> = with_retry(&RetryPolicy::new(5), "get repo", move || async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(ProviderError::NotFound {
                resource: "acme/missing".to_string(),
            })
        })
        .await;

        assert!(matches!(result, Err(ProviderError::NotFound { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn honors_longer_retry_after() {
        let started = tokio::time::Instant::now();
        let _ = with_retry(&RetryPolicy::new(2), "list pulls", || async {
            Err::<(), _>(ProviderError::RateLimited {
                operation: "list pulls".to_string(),
                message: "slow down".to_string(),
                retry_after: Some(Duration::from_secs(30)),
            })
        })
        .await;

        assert!(started.elapsed() >= Duration::from_secs(30));
    }
}
