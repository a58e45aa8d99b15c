//! Retry policies for JSON-RPC requests.

use std::time::Duration;

use crate::error::ProviderError;
use crate::provider::eth::methods;

/// Retry policy for a JSON-RPC request.
#[derive(Debug, Clone)]
pub enum RetryPolicy {
    /// No retries. Used for `eth_sendTransaction`, which must never be
    /// submitted twice.
    None,
    /// Retry on transport failures + 502/503/504, with backoff on 429.
    /// Default for read methods.
    Idempotent,
    /// User-provided retry logic.
    Custom(RetryConfig),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::None
    }
}

impl RetryPolicy {
    /// The policy a method gets when no override is configured.
    pub fn for_method(method: &str) -> Self {
        match method {
            methods::SEND_TRANSACTION | methods::REQUEST_ACCOUNTS => RetryPolicy::None,
            _ => RetryPolicy::Idempotent,
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Whether to add jitter to the delay.
    pub jitter: bool,
    /// HTTP status codes that trigger a retry.
    pub retryable_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            backoff_factor: 2.0,
            jitter: true,
            retryable_statuses: vec![502, 503, 504],
        }
    }
}

impl RetryConfig {
    /// The default config for read methods.
    pub fn idempotent() -> Self {
        Self {
            retryable_statuses: vec![429, 502, 503, 504],
            ..Self::default()
        }
    }

    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let base = self.initial_delay.as_millis() as f64
            * self.backoff_factor.powi(attempt as i32);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let jitter_range = capped * 0.25;
            let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }

    /// Whether `err` is worth another attempt under this config.
    ///
    /// JSON-RPC error objects are never retried: the node answered, and the
    /// answer will not change.
    pub fn should_retry(&self, err: &ProviderError) -> bool {
        match err {
            ProviderError::ServerError { status, .. } => self.retryable_statuses.contains(status),
            ProviderError::RateLimited => self.retryable_statuses.contains(&429),
            ProviderError::Transport { retryable, .. } => *retryable,
            ProviderError::Rpc { .. }
            | ProviderError::Malformed(_)
            | ProviderError::MaxRetriesExceeded { .. } => false,
        }
    }
}
