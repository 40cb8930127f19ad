//! Exponential backoff around a single fallible async call.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, error, warn};

use crate::config::TranslatorConfig;
use crate::error::BackendError;

/// How often, and how patiently, a failed call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Wait before the first retry; doubled for each following one
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&TranslatorConfig::default())
    }
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    pub const fn from_config(config: &TranslatorConfig) -> Self {
        Self::new(config.retry_count, config.retry_delay())
    }

    /// A policy that gives up after the first failure.
    pub const fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Delay before retry number `retry` (0-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

/// Errors that can tell whether another attempt might succeed.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for BackendError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}

/// Run `op` until it succeeds or the retry budget is spent.
///
/// A non-retryable error ends the loop at once. The error of the final
/// attempt is returned unchanged.
pub async fn with_backoff<T, E, F, Fut>(policy: RetryPolicy, label: &str, mut op: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display + Retryable,
{
    let mut retry = 0;

    loop {
        match op().await {
            Ok(value) => {
                if retry > 0 {
                    debug!("{} succeeded after {} retries", label, retry);
                }
                return Ok(value);
            }
            Err(e) if !e.is_retryable() => {
                error!("{} failed and cannot be retried: {}", label, e);
                return Err(e);
            }
            Err(e) if retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                warn!(
                    "{} failed (attempt {}/{}), retrying in {:?}: {}",
                    label,
                    retry + 1,
                    policy.max_retries + 1,
                    delay,
                    e
                );
                tokio::time::sleep(delay).await;
                retry += 1;
            }
            Err(e) => {
                error!("{} failed after {} attempts: {}", label, retry + 1, e);
                return Err(e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Provider;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    /// An op that fails `failures` times, then returns the attempt number.
    fn flaky(failures: u32, calls: Arc<AtomicU32>) -> impl FnMut() -> std::future::Ready<Result<u32, BackendError>> {
        move || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            std::future::ready(if n > failures {
                Ok(n)
            } else {
                Err(BackendError::with_status(Provider::DeepSeek, 503, format!("failure {n}")))
            })
        }
    }

    #[test]
    fn test_delay_doubles() {
        let policy = RetryPolicy::new(3, Duration::from_millis(2000));
        assert_eq!(policy.delay_for(0), Duration::from_millis(2000));
        assert_eq!(policy.delay_for(1), Duration::from_millis(4000));
        assert_eq!(policy.delay_for(2), Duration::from_millis(8000));
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_within_budget() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(2000));
        let start = Instant::now();

        let result = with_backoff(policy, "test", flaky(3, Arc::clone(&calls))).await;

        assert_eq!(result.ok(), Some(4));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
        // 2s + 4s + 8s of backoff
        assert_eq!(start.elapsed(), Duration::from_millis(14_000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_budget_returns_last_error() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_millis(10));

        let result = with_backoff(policy, "test", flaky(u32::MAX, Arc::clone(&calls))).await;

        assert_eq!(result.err().map(|e| e.message), Some("failure 4".to_string()));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_success_does_not_sleep() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result = with_backoff(RetryPolicy::default(), "test", flaky(0, Arc::clone(&calls))).await;

        assert_eq!(result.ok(), Some(1));
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn test_no_retry_policy() {
        let calls = Arc::new(AtomicU32::new(0));
        let result = with_backoff(RetryPolicy::none(), "test", flaky(1, Arc::clone(&calls))).await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let start = Instant::now();

        let result: Result<(), BackendError> = with_backoff(RetryPolicy::default(), "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Err(BackendError::fatal(Provider::OpenAi, "no key")))
        })
        .await;

        assert!(result.is_err_and(|e| !e.retryable));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
