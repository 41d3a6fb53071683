//! Reusable retry policy with exponential backoff
//!
//! One policy shared by every adapter that needs it, parameterized per call
//! site instead of inlined at each one.

use std::fmt::Display;
use std::time::Duration;
use tracing::warn;

/// Bounded retry with exponential backoff
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Delay after the first failed attempt; doubles after each subsequent one
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    /// Delay to sleep after the given failed attempt (1-indexed)
    fn delay_for(&self, attempt: u32) -> Duration {
        self.base_delay * 2u32.saturating_pow(attempt.saturating_sub(1))
    }

    /// Run `operation` until it succeeds or attempts are exhausted.
    ///
    /// Sleeps `base_delay * 2^(n-1)` after the n-th failure. The final
    /// failure is returned without sleeping.
    pub async fn run<F, Fut, T, E>(&self, operation_name: &str, mut operation: F) -> Result<T, E>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.max_attempts => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        operation = operation_name,
                        attempt,
                        max_attempts = self.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Attempt failed, will retry after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err) => {
                    warn!(
                        operation = operation_name,
                        attempt,
                        error = %err,
                        "All retry attempts exhausted"
                    );
                    return Err(err);
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    /// Default for upstream fetches: 3 attempts, 2s/4s backoff
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}
