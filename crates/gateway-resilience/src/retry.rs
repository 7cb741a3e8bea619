//! Retry policy with linear backoff.
//!
//! Attempts are numbered from 1. After a failed attempt `n` the caller
//! waits `backoff * n` before attempt `n + 1`.

use std::time::Duration;

/// Retry configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Attempts per provider; 0 behaves like 1
    pub max_retries: u32,
    /// Base delay multiplied by the attempt number
    pub backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff: Duration::from_secs(1),
        }
    }
}

/// Retry policy implementation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    /// Create a new retry policy with the given configuration
    #[must_use]
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Create a policy with custom attempts and backoff
    #[must_use]
    pub fn linear(max_retries: u32, backoff: Duration) -> Self {
        Self::new(RetryConfig {
            max_retries,
            backoff,
        })
    }

    /// Number of attempts made against one provider
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.config.max_retries.max(1)
    }

    /// Whether another attempt follows a failed `attempt`
    #[must_use]
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.attempts()
    }

    /// Delay after failed `attempt` (1-based)
    #[must_use]
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        self.config.backoff.saturating_mul(attempt)
    }

    /// Get the configuration
    #[must_use]
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }
}
