//! Retry with gentle exponential backoff
//!
//! Only transient failures (timeouts, upstream overload) are retried; every
//! other error is returned on the first attempt. After the last retry the
//! final error is returned as-is.

use std::future::Future;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::error::BackendError;

/// Errors that can tell whether another attempt is worthwhile
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for BackendError {
    fn is_retryable(&self) -> bool {
        BackendError::is_retryable(self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub multiplier: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(2000),
            multiplier: 1.5,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, initial_delay_ms: u64) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::from_millis(initial_delay_ms),
            ..Default::default()
        }
    }

    /// Delay before retry number `retry` (0-based): 2000, 3000, 4500, ...
    pub fn delay_for(&self, retry: u32) -> Duration {
        let ms = self.initial_delay.as_millis() as f64 * self.multiplier.powi(retry as i32);
        Duration::from_millis(ms.round() as u64)
    }
}

/// Run `operation` until it succeeds, fails permanently, or retries run out
pub async fn with_retry<T, E, F, Fut>(policy: RetryPolicy, mut operation: F) -> Result<T, E>
where
    E: Retryable + std::fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut retry = 0;
    loop {
        match operation().await {
            Ok(value) => {
                if retry > 0 {
                    debug!("[Retry] Succeeded after {} retries", retry);
                }
                return Ok(value);
            }
            Err(e) if e.is_retryable() && retry < policy.max_retries => {
                let delay = policy.delay_for(retry);
                warn!(
                    "[Retry] Transient failure, retry {}/{} in {}ms: {}",
                    retry + 1,
                    policy.max_retries,
                    delay.as_millis(),
                    e
                );
                sleep(delay).await;
                retry += 1;
            }
            Err(e) => return Err(e),
        }
    }
}
