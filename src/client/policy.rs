use crate::Error;
use std::time::Duration;

/// Decision for how to proceed after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Decision {
    Retry { delay: Duration },
    Fail,
}

/// Retry policy for upstream calls.
///
/// - Network failures, attempt timeouts and HTTP 429 are retried up to `max_retries` times.
/// - Every other upstream status is terminal on first occurrence.
/// - A server-provided `retry_after` wins over exponential backoff.
#[derive(Debug, Clone)]
pub(crate) struct RetryPolicy {
    pub max_retries: u32,
    pub retry_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, retry_delay: Duration) -> Self {
        Self {
            max_retries,
            retry_delay,
        }
    }

    /// `retry_delay * 2^attempt`, or the server hint when present.
    fn backoff_delay(&self, attempt: u32, retry_after_ms: Option<u64>) -> Duration {
        if let Some(ms) = retry_after_ms {
            return Duration::from_millis(ms);
        }
        let base = self.retry_delay.as_millis().min(u64::MAX as u128) as u64;
        let factor = 1u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(base.saturating_mul(factor))
    }

    /// Decide what to do next after an attempt failed.
    ///
    /// `attempt` is 0-based (first failure => attempt=0).
    pub fn decide(&self, err: &Error, attempt: u32) -> Decision {
        if err.is_retryable() && attempt < self.max_retries {
            Decision::Retry {
                delay: self.backoff_delay(attempt, err.retry_after_ms()),
            }
        } else {
            Decision::Fail
        }
    }
}
