//! Pool configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Public resolvers used when none are configured
pub const DEFAULT_RESOLVERS: [&str; 4] = ["8.8.8.8", "1.1.1.1", "9.9.9.9", "208.67.222.222"];

/// Retry configuration for failed lookups
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts per lookup, including the first
    pub max_attempts: u32,

    /// Backoff unit, multiplied by the attempt index
    pub backoff_step: Duration,

    /// Maximum backoff duration
    pub max_backoff: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryConfig {
    /// Create a new retry configuration
    #[must_use]
    pub const fn new() -> Self {
        Self {
            max_attempts: 3,
            backoff_step: Duration::from_millis(200),
            max_backoff: Duration::from_secs(2),
        }
    }

    /// Set total attempts (at least one is always made)
    #[must_use]
    pub const fn max_attempts(mut self, max: u32) -> Self {
        self.max_attempts = max;
        self
    }

    /// Set the backoff unit
    #[must_use]
    pub const fn backoff_step(mut self, duration: Duration) -> Self {
        self.backoff_step = duration;
        self
    }

    /// Set maximum backoff duration
    #[must_use]
    pub const fn max_backoff(mut self, duration: Duration) -> Self {
        self.max_backoff = duration;
        self
    }

    /// Calculate backoff after a failed attempt (1-based)
    #[must_use]
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        self.backoff_step
            .saturating_mul(attempt)
            .min(self.max_backoff)
    }
}

/// Serializable pool settings, as found in the CLI config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Resolver addresses (`ip` or `ip:port`)
    #[serde(default = "default_resolvers")]
    pub resolvers: Vec<String>,

    /// Per-query timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Minimum spacing between two queries to the same resolver, in milliseconds
    #[serde(default = "default_min_interval_ms")]
    pub min_interval_ms: u64,

    /// Total attempts per lookup
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Backoff unit in milliseconds
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            resolvers: default_resolvers(),
            timeout_ms: default_timeout_ms(),
            min_interval_ms: default_min_interval_ms(),
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl PoolConfig {
    /// Per-query timeout
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Minimum spacing between queries to one resolver
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }

    /// Retry policy described by this config
    #[must_use]
    pub const fn retry(&self) -> RetryConfig {
        RetryConfig::new()
            .max_attempts(self.max_attempts)
            .backoff_step(Duration::from_millis(self.backoff_ms))
    }
}

// Default value functions for serde.
fn default_resolvers() -> Vec<String> {
    DEFAULT_RESOLVERS.iter().map(ToString::to_string).collect()
}

const fn default_timeout_ms() -> u64 {
    2_000
}

const fn default_min_interval_ms() -> u64 {
    10
}

const fn default_max_attempts() -> u32 {
    3
}

const fn default_backoff_ms() -> u64 {
    200
}
