//! Bounded retry with a fixed delay.
//!
//! Every error is retryable and attempts are spaced by the same delay: no
//! backoff, no jitter. After the last attempt the error it produced is
//! returned unchanged.

use std::fmt::Display;
use std::time::Duration;

/// How often and how far apart an operation is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` runs the operation once.
    pub max_retries: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub const fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    /// Upper bound on invocations.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(2000))
    }
}

/// Runs `op` until it succeeds or `policy.max_retries` retries have failed.
pub async fn retry<F, Fut, T, E>(mut op: F, policy: &RetryPolicy) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Display,
{
    let mut retries = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(err) if retries < policy.max_retries => {
                retries += 1;
                #[cfg(feature = "telemetry")]
                tracing::warn!(
                    attempt = retries,
                    max_attempts = policy.max_attempts(),
                    delay_ms = policy.delay.as_millis() as u64,
                    error = %err,
                    "Attempt failed, retrying"
                );
                #[cfg(not(feature = "telemetry"))]
                let _ = err;
                tokio::time::sleep(policy.delay).await;
            }
            Err(err) => {
                #[cfg(feature = "telemetry")]
                tracing::warn!(attempts = retries + 1, error = %err, "Giving up after final attempt");
                return Err(err);
            }
        }
    }
}
