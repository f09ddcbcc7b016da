//! Exponential-backoff retry for job submissions.
//!
//! Only the submission call retries; poll ticks are single-attempt by
//! design. The backoff sleeps on the submitting task alone, so other
//! queue slots keep moving while one submission waits.

use std::time::Duration;

use crate::error::TransportError;
use crate::transport::{ProviderRequest, Transport};

/// Backoff parameters: `base_delay * 2^attempt`, up to `max_retries`
/// retries after the initial attempt.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Retries allowed after the initial attempt (3 -> 4 total tries).
    pub max_retries: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            base_delay: Duration::from_secs(1),
            max_retries: 3,
        }
    }
}

impl RetryPolicy {
    /// Decide whether to retry after a failed attempt.
    ///
    /// `attempt` is zero-based: the first failure consults
    /// `delay_for(err, 0)`. Returns the backoff delay, or `None` when
    /// the error is fatal or the ceiling is reached.
    pub fn delay_for(&self, error: &TransportError, attempt: u32) -> Option<Duration> {
        if !error.is_retryable() || attempt >= self.max_retries {
            return None;
        }
        Some(self.base_delay * 2u32.pow(attempt))
    }
}

/// Execute a request under the retry policy.
///
/// Retryable failures are contained here until the ceiling is reached;
/// fatal failures return on the spot.
pub async fn send_with_retry(
    transport: &dyn Transport,
    request: &ProviderRequest,
    policy: &RetryPolicy,
) -> Result<Vec<u8>, TransportError> {
    let mut attempt = 0u32;
    loop {
        match transport.send(request).await {
            Ok(bytes) => return Ok(bytes),
            Err(err) => match policy.delay_for(&err, attempt) {
                Some(delay) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        delay_ms = delay.as_millis() as u64,
                        url = %request.url,
                        error = %err,
                        "Submission attempt failed, retrying",
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                None => {
                    tracing::error!(
                        attempts = attempt + 1,
                        url = %request.url,
                        error = %err,
                        "Submission failed",
                    );
                    return Err(err);
                }
            },
        }
    }
}
