// Retry logic for upstream fetches
use crate::application::constants::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS,
};
use crate::port::{SourceError, SourceResult};
use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Retry decision result
#[derive(Debug, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry after the given delay
    Retry(Duration),
    /// Give up and surface the error
    GiveUp,
}

/// Retry policy for calls to `NavSource` / `BenchmarkSource`
///
/// Only transient errors (network, timeouts, 5xx, 429) are retried. Parse
/// and not-found errors fail on the first attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay_ms: u64,
    backoff_factor: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_BASE_DELAY_MS)
    }
}

impl RetryPolicy {
    /// # Arguments
    /// * `max_attempts` - Total attempts including the first one (min 1)
    /// * `base_delay_ms` - Delay before the first retry
    pub fn new(max_attempts: u32, base_delay_ms: u64) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay_ms,
            backoff_factor: DEFAULT_BACKOFF_FACTOR,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Decide what to do after `attempt` (1-based) failed with `err`
    ///
    /// Backoff: delay = base_delay * factor^(attempt - 1), with ±10% jitter.
    pub fn decide(&self, attempt: u32, err: &SourceError) -> RetryDecision {
        if !err.is_transient() || attempt >= self.max_attempts {
            return RetryDecision::GiveUp;
        }

        let base = self.base_delay_ms as f64 * self.backoff_factor.powi(attempt as i32 - 1);
        let jitter = rand::thread_rng().gen_range(0.9..=1.1);
        RetryDecision::Retry(Duration::from_millis((base * jitter) as u64))
    }

    /// Run `op` until it succeeds or the policy gives up
    pub async fn run<T, F, Fut>(&self, key: &str, mut op: F) -> SourceResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = SourceResult<T>>,
    {
        let mut attempt = 1;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => match self.decide(attempt, &err) {
                    RetryDecision::Retry(delay) => {
                        info!(
                            key = %key,
                            attempt = attempt,
                            max_attempts = self.max_attempts,
                            delay_ms = delay.as_millis() as u64,
                            error = %err,
                            "Retrying upstream fetch"
                        );
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                    RetryDecision::GiveUp => {
                        warn!(key = %key, attempt = attempt, error = %err, "Upstream fetch failed");
                        return Err(err);
                    }
                },
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_decide_backoff_grows() {
        let policy = RetryPolicy::new(4, 1000);
        let err = SourceError::Timeout("slow".into());

        let first = match policy.decide(1, &err) {
            RetryDecision::Retry(d) => d.as_millis(),
            other => panic!("expected retry, got {:?}", other),
        };
        let second = match policy.decide(2, &err) {
            RetryDecision::Retry(d) => d.as_millis(),
            other => panic!("expected retry, got {:?}", other),
        };

        assert!((900..=1100).contains(&first), "first delay {}", first);
        assert!((1800..=2200).contains(&second), "second delay {}", second);
        assert_eq!(policy.decide(4, &err), RetryDecision::GiveUp);
    }

    #[test]
    fn test_permanent_errors_not_retried() {
        let policy = RetryPolicy::new(5, 10);
        assert_eq!(
            policy.decide(1, &SourceError::Parse("bad".into())),
            RetryDecision::GiveUp
        );
        assert_eq!(
            policy.decide(1, &SourceError::NotFound("x".into())),
            RetryDecision::GiveUp
        );
    }

    #[tokio::test]
    async fn test_run_retries_until_success() {
        let policy = RetryPolicy::new(3, 1);
        let calls = AtomicU32::new(0);

        let result = policy
            .run("122639", || {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 2 {
                        Err(SourceError::Http("connection reset".into()))
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_run_gives_up_after_max_attempts() {
        let policy = RetryPolicy::new(2, 1);
        let calls = AtomicU32::new(0);

        let result: SourceResult<()> = policy
            .run("122639", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(SourceError::Timeout("slow".into())) }
            })
            .await;

        assert!(matches!(result, Err(SourceError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
