//! Bounded retry with exponential backoff
//!
//! `retry_with_backoff` runs an operation, and while it fails with a retryable
//! error, sleeps `backoff_base^attempt` seconds and tries again, at most
//! `max_retries` times after the first attempt.

use std::future::Future;
use std::time::Duration;

use tracing::warn;

use crate::config::RetryConfig;

/// Retry parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
  /// Retries allowed after the first attempt
  pub max_retries: u32,
  /// Base of the exponential backoff, in seconds
  pub backoff_base: u64,
}

impl Default for RetryPolicy {
  fn default() -> Self {
    RetryConfig::default().into()
  }
}

impl From<RetryConfig> for RetryPolicy {
  fn from(config: RetryConfig) -> Self {
    Self { max_retries: config.max_retries, backoff_base: config.backoff_base }
  }
}

impl RetryPolicy {
  /// Policy that never retries
  pub fn no_retry() -> Self {
    Self { max_retries: 0, backoff_base: 1 }
  }

  /// Delay before retry number `attempt` (1-based): `backoff_base^attempt` seconds.
  ///
  /// Saturates instead of overflowing.
  pub fn delay_for(&self, attempt: u32) -> Duration {
    Duration::from_secs(self.backoff_base.saturating_pow(attempt))
  }

  /// Upper bound on attempts, the first one included
  pub fn max_attempts(&self) -> u32 {
    self.max_retries.saturating_add(1)
  }
}

/// Final failure of a retried operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryFailure<E> {
  /// Attempts made, the first one included
  pub attempts: u32,
  /// Last error returned by the operation
  pub error: E,
}

/// Runs `operation` until it succeeds, fails with a non-retryable error, or
/// the retry budget is spent.
///
/// `operation` receives the 0-based attempt number. Between attempts the task
/// sleeps for `policy.delay_for(retry)`.
pub async fn retry_with_backoff<T, E, F, Fut, P>(
  policy: &RetryPolicy,
  is_retryable: P,
  mut operation: F,
) -> Result<T, RetryFailure<E>>
where
  F: FnMut(u32) -> Fut,
  Fut: Future<Output = Result<T, E>>,
  P: Fn(&E) -> bool,
  E: std::fmt::Display,
{
  let mut attempt: u32 = 0;
  loop {
    let error = match operation(attempt).await {
      Ok(value) => return Ok(value),
      Err(error) => error,
    };
    attempt += 1;

    if !is_retryable(&error) {
      return Err(RetryFailure { attempts: attempt, error });
    }
    if attempt > policy.max_retries {
      return Err(RetryFailure { attempts: attempt, error });
    }

    let delay = policy.delay_for(attempt);
    warn!(
      retry = attempt,
      max_retries = policy.max_retries,
      delay_secs = delay.as_secs(),
      %error,
      "request failed, retrying after backoff"
    );
    tokio::time::sleep(delay).await;
  }
}
