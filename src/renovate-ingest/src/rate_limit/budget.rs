//! Shared request budget for one provider.

use super::info::RateLimitInfo;
use super::{now_unix_seconds, wait_until_reset, MIN_REMAINING_THRESHOLD};
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use tracing::debug;

/// Remaining-request budget shared by all workers talking to one provider.
///
/// The budget starts out unknown (effectively unlimited) and is narrowed by
/// whatever the provider reports through [`RateLimitBudget::observe`].
#[derive(Debug)]
pub struct RateLimitBudget {
    remaining: AtomicU32,
    reset: AtomicU64,
}

impl Default for RateLimitBudget {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimitBudget {
    /// Creates a budget with no known limit.
    #[must_use]
    pub fn new() -> Self {
        Self {
            remaining: AtomicU32::new(u32::MAX),
            reset: AtomicU64::new(0),
        }
    }

    /// Records rate limit information reported by the provider.
    pub fn observe(&self, info: &RateLimitInfo) {
        self.reset.store(info.reset, Ordering::Release);
        self.remaining.store(info.remaining, Ordering::Release);
    }

    /// Marks the budget as exhausted until `reset`.
    pub fn mark_exhausted(&self, reset: u64) {
        self.observe(&RateLimitInfo {
            remaining: 0,
            reset,
            limit: 0,
        });
    }

    /// Returns the number of requests believed to remain.
    #[must_use]
    pub fn remaining(&self) -> u32 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Takes one request from the budget at `now` (unix seconds).
    ///
    /// Returns the time to wait when the budget is below
    /// [`MIN_REMAINING_THRESHOLD`] and the window has not reset yet. Once the
    /// window has reset the budget becomes unknown again.
    pub fn try_acquire(&self, now: u64) -> Result<(), Duration> {
        let taken = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |remaining| {
                (remaining > MIN_REMAINING_THRESHOLD).then(|| remaining - 1)
            });
        if taken.is_ok() {
            return Ok(());
        }

        let reset = self.reset.load(Ordering::Acquire);
        if reset <= now {
            self.remaining.store(u32::MAX, Ordering::Release);
            return Ok(());
        }
        Err(Duration::from_secs(reset - now))
    }

    /// Takes one request from the budget, waiting for the reset if needed.
    pub async fn acquire(&self) {
        loop {
            match self.try_acquire(now_unix_seconds()) {
                Ok(()) => return,
                Err(wait) => {
                    debug!(wait_secs = wait.as_secs(), "Request budget exhausted");
                    wait_until_reset(self.reset.load(Ordering::Acquire)).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn unknown_budget_always_grants() {
        let budget = RateLimitBudget::new();
        for _ in 0..100 {
            assert!(budget.try_acquire(0).is_ok());
        }
    }

    #[test]
    fn low_budget_waits_until_reset() {
        let budget = RateLimitBudget::new();
        budget.observe(&RateLimitInfo {
            remaining: MIN_REMAINING_THRESHOLD + 2,
            reset: 1_000,
            limit: 100,
        });

        assert!(budget.try_acquire(900).is_ok());
        assert!(budget.try_acquire(900).is_ok());
        assert_eq!(budget.try_acquire(900), Err(Duration::from_secs(100)));
        assert_eq!(budget.remaining(), MIN_REMAINING_THRESHOLD);
    }

    #[test]
    fn budget_recovers_after_reset() {
        let budget = RateLimitBudget::new();
        budget.mark_exhausted(1_000);

        assert!(budget.try_acquire(999).is_err());
        assert!(budget.try_acquire(1_000).is_ok());
        assert_eq!(budget.remaining(), u32::MAX);
    }

    #[test]
    fn concurrent_acquire_never_overdraws() {
        let budget = Arc::new(RateLimitBudget::new());
        budget.observe(&RateLimitInfo {
            remaining: MIN_REMAINING_THRESHOLD + 50,
            reset: u64::MAX,
            limit: 100,
        });

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let budget = Arc::clone(&budget);
                std::thread::spawn(move || {
                    (0..20).filter(|_| budget.try_acquire(0).is_ok()).count()
                })
            })
            .collect();
        let granted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(granted, 50);
        assert_eq!(budget.remaining(), MIN_REMAINING_THRESHOLD);
    }
}
