//! Retry logic with exponential backoff
//!
//! Used by delivery paths that talk to flaky sinks (the HTTP callback
//! observer). Node executors are never retried here; a failed node fails
//! its execution.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

/// Retry configuration
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, including the first
    pub max_attempts: usize,

    /// Delay before the first retry
    pub initial_delay: Duration,

    /// Upper bound on any single delay
    pub max_delay: Duration,

    /// Exponential multiplier between attempts
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    pub fn new(
        max_attempts: usize,
        initial_delay: Duration,
        max_delay: Duration,
        multiplier: f64,
    ) -> Self {
        Self {
            max_attempts,
            initial_delay,
            max_delay,
            multiplier,
        }
    }

    /// Delay before retry number `retry` (0-indexed), capped at
    /// `max_delay`.
    pub fn delay_for(&self, retry: usize) -> Duration {
        let delay = self.initial_delay.as_secs_f64() * self.multiplier.powi(retry as i32);
        Duration::from_secs_f64(delay.min(self.max_delay.as_secs_f64()))
    }
}

/// Execute an operation with retries.
///
/// Returns the first success, or the last error once attempts are
/// exhausted.
pub async fn with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    label: &str,
    mut operation: F,
) -> std::result::Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = std::result::Result<T, E>>,
    E: std::fmt::Display,
{
    let attempts = config.max_attempts.max(1);
    let mut last_error = None;

    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = config.delay_for(attempt - 1);
            debug!(label, attempt, delay_ms = delay.as_millis() as u64, "retrying after delay");
            sleep(delay).await;
        }

        match operation().await {
            Ok(result) => {
                if attempt > 0 {
                    debug!(label, attempt, "retry succeeded");
                }
                return Ok(result);
            }
            Err(e) => {
                if attempt + 1 < attempts {
                    warn!(label, attempt = attempt + 1, error = %e, "operation failed, will retry");
                } else {
                    warn!(label, attempt = attempt + 1, error = %e, "operation failed, attempts exhausted");
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.expect("at least one attempt"))
}
