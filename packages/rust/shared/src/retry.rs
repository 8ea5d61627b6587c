//! Bounded retry for calls to external collaborators.
//!
//! Both the text-generation client and the competitor search go through
//! [`call_with_retry`]: a fixed number of attempts, a fixed wait between
//! them, and only failures that report themselves as retryable are retried.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

/// A failure that knows whether another attempt could succeed.
pub trait Retryable {
    /// `true` if the same call may succeed after waiting.
    fn is_retryable(&self) -> bool;

    /// Wait requested by the remote side, if any. Capped by the policy delay.
    fn retry_after(&self) -> Option<Duration> {
        None
    }
}

/// Max attempts plus a fixed back-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    delay: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first call; zero is treated as one.
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// A single attempt, never retried.
    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn wait_for<E: Retryable>(&self, err: &E) -> Duration {
        err.retry_after()
            .map_or(self.delay, |hint| hint.min(self.delay))
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are exhausted. `op` receives the 1-based attempt number.
pub async fn call_with_retry<T, E, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && attempt < policy.max_attempts => {
                let wait = policy.wait_for(&err);
                warn!(attempt, error = %err, wait_ms = wait.as_millis() as u64, "retryable failure");
                if !wait.is_zero() {
                    tokio::time::sleep(wait).await;
                }
                attempt += 1;
            }
            Err(err) => {
                debug!(attempt, error = %err, "giving up");
                return Err(err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Debug)]
    enum Fail {
        Busy,
        Broken,
    }

    impl std::fmt::Display for Fail {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            write!(f, "{self:?}")
        }
    }

    impl Retryable for Fail {
        fn is_retryable(&self) -> bool {
            matches!(self, Fail::Busy)
        }
    }

    #[tokio::test]
    async fn retries_retryable_failure_then_succeeds() {
        let calls = Cell::new(0);
        let result = call_with_retry(RetryPolicy::new(2, Duration::ZERO), |attempt| {
            calls.set(calls.get() + 1);
            async move {
                if attempt == 1 {
                    Err(Fail::Busy)
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn stops_after_max_attempts() {
        let calls = Cell::new(0);
        let result: Result<(), Fail> =
            call_with_retry(RetryPolicy::new(2, Duration::ZERO), |_| {
                calls.set(calls.get() + 1);
                async { Err(Fail::Busy) }
            })
            .await;
        assert!(matches!(result, Err(Fail::Busy)));
        assert_eq!(calls.get(), 2);
    }

    #[tokio::test]
    async fn non_retryable_failure_is_not_retried() {
        let calls = Cell::new(0);
        let result: Result<(), Fail> =
            call_with_retry(RetryPolicy::new(5, Duration::ZERO), |_| {
                calls.set(calls.get() + 1);
                async { Err(Fail::Broken) }
            })
            .await;
        assert!(matches!(result, Err(Fail::Broken)));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn zero_attempts_means_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
        assert_eq!(RetryPolicy::once().max_attempts(), 1);
    }
}
