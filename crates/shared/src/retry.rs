//! Timeout and retry policy shared by every registry call.
//!
//! The executor is runtime-agnostic: callers supply the `sleep` function, so
//! the browser build drives it with `gloo-timers` and tests drive it with
//! immediately-ready futures.

use std::future::Future;
use std::pin::pin;
use std::time::Duration;

use futures::future::{select, Either};

use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one.
    pub max_retries: u32,
    /// Backoff unit; the n-th retry waits `base_delay * n`.
    pub base_delay: Duration,
    /// Deadline for each individual attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            timeout: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Linear backoff before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay * retry
    }

    /// Run `op` until it succeeds, fails with a non-retryable error, or the
    /// retries are used up. Each attempt is bounded by `timeout`.
    pub async fn execute<T, Op, Fut, S, SF>(&self, mut op: Op, sleep: S) -> Result<T, ApiError>
    where
        Op: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
        S: Fn(Duration) -> SF,
        SF: Future<Output = ()>,
    {
        let mut retry = 0;
        loop {
            match with_timeout(op(), self.timeout, &sleep).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_retryable() && retry < self.max_retries => {
                    retry += 1;
                    let delay = self.delay_for(retry);
                    tracing::warn!(
                        retry,
                        max_retries = self.max_retries,
                        error = %err,
                        "registry request failed, retrying in {}ms",
                        delay.as_millis()
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Race `fut` against a timer. The losing future is dropped, which for a
/// browser fetch aborts the request.
pub async fn with_timeout<T, F, S, SF>(fut: F, timeout: Duration, sleep: &S) -> Result<T, ApiError>
where
    F: Future<Output = Result<T, ApiError>>,
    S: Fn(Duration) -> SF,
    SF: Future<Output = ()>,
{
    let fut = pin!(fut);
    let timer = pin!(sleep(timeout));
    match select(fut, timer).await {
        Either::Left((result, _)) => result,
        Either::Right(_) => Err(ApiError::Timeout(timeout)),
    }
}
