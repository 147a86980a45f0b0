//! Exponential backoff with jitter for cloud API calls.
//!
//! Connection failures and `429` responses never reached the handler and
//! are retried for every request. Timeouts and `5xx` responses may have
//! been processed, so they are only retried for idempotent requests.

use std::time::Duration;

use rand::Rng;

/// Tunable parameters for the retry strategy.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, doubled for each one after.
    pub backoff_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
    /// Per-request timeout applied by the HTTP client.
    pub request_timeout: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 7,
            backoff_delay: Duration::from_millis(4000),
            max_delay: Duration::from_secs(60),
            request_timeout: Duration::from_millis(25000),
        }
    }
}

impl RetryConfig {
    /// A config that never retries; for tests and one-shot tooling.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Default::default()
        }
    }
}

/// Upper bound of the delay before retry number `retry` (1-based).
///
/// `backoff_delay * 2^(retry - 1)`, clamped to [`RetryConfig::max_delay`].
pub fn backoff_ceiling(retry: u32, config: &RetryConfig) -> Duration {
    let shift = retry.saturating_sub(1).min(16);
    config
        .backoff_delay
        .saturating_mul(1u32 << shift)
        .min(config.max_delay)
}

/// Delay before retry number `retry`: uniformly drawn between half the
/// ceiling and the ceiling.
pub fn jittered_delay(retry: u32, config: &RetryConfig) -> Duration {
    let ceiling = backoff_ceiling(retry, config).as_millis() as u64;
    if ceiling == 0 {
        return Duration::ZERO;
    }
    let floor = ceiling / 2;
    Duration::from_millis(rand::rng().random_range(floor..=ceiling))
}

/// Whether a response status is worth retrying.
pub fn is_retryable_status(status: reqwest::StatusCode, idempotent: bool) -> bool {
    status == reqwest::StatusCode::TOO_MANY_REQUESTS || (idempotent && status.is_server_error())
}

/// Whether a transport error is worth retrying.
pub fn is_retryable_error(error: &reqwest::Error, idempotent: bool) -> bool {
    error.is_connect() || (idempotent && error.is_timeout())
}
