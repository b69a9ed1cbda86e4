//! Bounded retry with backoff
//!
//! Only explicitly classified transient conditions are retried; everything
//! else fails on the first attempt. Delays go through the injected clock so
//! tests run without wall-clock sleeps.

use crate::adapters::clock::Clock;
use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

/// Bounded-attempt retry policy with exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of retries after the first attempt
    pub max_retries: usize,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Cap applied to the computed delay
    pub max_delay: Duration,

    /// Multiplier applied per retry
    pub backoff_multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based)
    pub fn delay_for(&self, retry: usize) -> Duration {
        let factor = self.backoff_multiplier.powi(retry as i32);
        let millis = (self.initial_delay.as_millis() as f64 * factor) as u64;
        Duration::from_millis(millis).min(self.max_delay)
    }
}

/// Run `operation`, retrying transient failures per `policy`
///
/// `is_transient` classifies errors; a non-transient error is returned
/// immediately, a transient one is retried until `policy.max_retries` is
/// exhausted.
pub async fn retry_transient<T, E, F, Fut>(
    policy: &RetryPolicy,
    clock: &dyn Clock,
    what: &str,
    is_transient: impl Fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(e) if is_transient(&e) && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                tracing::warn!(
                    operation = what,
                    error = %e,
                    retry = retry + 1,
                    max_retries = policy.max_retries,
                    delay_ms = delay.as_millis() as u64,
                    "Transient failure, retrying"
                );
                clock.sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::clock::ManualClock;
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy {
            max_retries: 3,
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(5),
            backoff_multiplier: 2.0,
        }
    }

    #[test]
    fn test_delay_growth_and_cap() {
        let policy = policy();
        assert_eq!(policy.delay_for(0), Duration::from_millis(100));
        assert_eq!(policy.delay_for(1), Duration::from_millis(200));
        assert_eq!(policy.delay_for(2), Duration::from_millis(400));
        // Far past the cap
        assert_eq!(policy.delay_for(20), Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_succeeds_after_transient_failures() {
        let clock = ManualClock::new(Utc::now());
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, String> =
            retry_transient(&policy(), &clock, "test", |_| true, || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err("throttled".to_string())
                    } else {
                        Ok(7)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_exhausts_retries() {
        let clock = ManualClock::new(Utc::now());
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, String> =
            retry_transient(&policy(), &clock, "test", |_| true, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("throttled".to_string()) }
            })
            .await;

        assert!(result.is_err());
        // Initial attempt plus max_retries
        assert_eq!(attempts.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_non_transient_fails_immediately() {
        let clock = ManualClock::new(Utc::now());
        let attempts = AtomicUsize::new(0);

        let result: Result<u32, String> =
            retry_transient(&policy(), &clock, "test", |_| false, || {
                attempts.fetch_add(1, Ordering::SeqCst);
                async { Err("bad request".to_string()) }
            })
            .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
