//! Conflict retry with exponential backoff
//!
//! Only `Conflict` is retried. Each attempt must run in a fresh transaction;
//! the closure passed to `run` owns opening and committing it.

use crate::errors::Result;
use serde::Deserialize;
use std::time::Duration;

/// Retry section of the service configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_backoff_ms: 10,
            max_backoff_ms: 500,
        }
    }
}

impl RetryPolicy {
    /// A policy that never retries
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Backoff before attempt `attempt + 1` (attempts count from 1)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let shift = attempt.saturating_sub(1).min(16);
        let millis = self
            .initial_backoff_ms
            .saturating_mul(1u64 << shift)
            .min(self.max_backoff_ms);
        Duration::from_millis(millis)
    }

    /// Run `f` until it succeeds, fails with a non-retryable error, or the
    /// attempt budget is spent
    pub fn run<T, F>(&self, op: &'static str, mut f: F) -> Result<T>
    where
        F: FnMut() -> Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match f() {
                Err(err) if err.is_retryable() && attempt < max_attempts => {
                    let wait = self.backoff(attempt);
                    tracing::debug!(
                        op,
                        attempt,
                        backoff_ms = wait.as_millis() as u64,
                        "Transaction conflict, retrying"
                    );
                    std::thread::sleep(wait);
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storekeep_core::errors::{ExError, ExErrorKind};

    fn fast() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            initial_backoff_ms: 1,
            max_backoff_ms: 2,
        }
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(1), Duration::from_millis(10));
        assert_eq!(policy.backoff(2), Duration::from_millis(20));
        assert_eq!(policy.backoff(3), Duration::from_millis(40));
        assert_eq!(policy.backoff(10), Duration::from_millis(500));
    }

    #[test]
    fn test_conflict_retried_until_success() {
        let mut calls = 0;
        let result = fast().run("test", || {
            calls += 1;
            if calls < 3 {
                Err(ExError::new(ExErrorKind::Conflict))
            } else {
                Ok(calls)
            }
        });
        assert_eq!(result.unwrap(), 3);
    }

    #[test]
    fn test_conflict_gives_up_after_budget() {
        let mut calls = 0;
        let result: Result<()> = fast().run("test", || {
            calls += 1;
            Err(ExError::new(ExErrorKind::Conflict))
        });
        assert_eq!(result.unwrap_err().kind(), ExErrorKind::Conflict);
        assert_eq!(calls, 3);
    }

    #[test]
    fn test_other_errors_not_retried() {
        let mut calls = 0;
        let result: Result<()> = fast().run("test", || {
            calls += 1;
            Err(ExError::new(ExErrorKind::NotFound))
        });
        assert_eq!(result.unwrap_err().kind(), ExErrorKind::NotFound);
        assert_eq!(calls, 1);
    }
}
