//! Engine configuration.

use serde::{Deserialize, Serialize};
use spyder_core::SpyderError;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default certificate transparency websocket
pub const DEFAULT_CERTSTREAM_URL: &str = "wss://certstream.calidog.io";

/// Which discovery branches a run uses
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Certificate feed only
    Passive,
    /// Brute force plus recursive expansion
    #[default]
    Active,
    /// Both branches concurrently
    Both,
}

impl Mode {
    /// Whether the certificate feed runs
    #[must_use]
    pub const fn is_passive(self) -> bool {
        matches!(self, Self::Passive | Self::Both)
    }

    /// Whether brute force runs
    #[must_use]
    pub const fn is_active(self) -> bool {
        matches!(self, Self::Active | Self::Both)
    }
}

impl FromStr for Mode {
    type Err = SpyderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "passive" => Ok(Self::Passive),
            "active" => Ok(Self::Active),
            "both" | "active+passive" => Ok(Self::Both),
            _ => Err(SpyderError::Config(format!(
                "unknown mode: {s} (valid modes: passive, active, both)"
            ))),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Passive => write!(f, "passive"),
            Self::Active => write!(f, "active"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// Tuning for one enumeration engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Brute-force lookups in flight
    #[serde(default = "default_brute_concurrency")]
    pub brute_concurrency: usize,

    /// Expansion tasks running at once, independent of the brute-force cap
    #[serde(default = "default_expand_concurrency")]
    pub expand_concurrency: usize,

    /// Permutation lookups in flight inside one expansion
    #[serde(default = "default_expand_parallelism")]
    pub expand_parallelism: usize,

    /// Expansion generations; 1 expands brute-force results only
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,

    /// Upper bound on waiting for outstanding expansions, in milliseconds
    #[serde(default = "default_drain_timeout_ms")]
    pub drain_timeout_ms: u64,

    /// How long the passive branch listens, in seconds; 0 listens until
    /// the feed ends or the run is cancelled
    #[serde(default = "default_passive_window_secs")]
    pub passive_window_secs: u64,

    /// Capacity of the shared result queue
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Certificate feed websocket URL
    #[serde(default = "default_certstream_url")]
    pub certstream_url: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            brute_concurrency: default_brute_concurrency(),
            expand_concurrency: default_expand_concurrency(),
            expand_parallelism: default_expand_parallelism(),
            max_depth: default_max_depth(),
            drain_timeout_ms: default_drain_timeout_ms(),
            passive_window_secs: default_passive_window_secs(),
            queue_capacity: default_queue_capacity(),
            certstream_url: default_certstream_url(),
        }
    }
}

impl EngineConfig {
    /// Set the brute-force concurrency cap
    #[must_use]
    pub const fn brute_concurrency(mut self, limit: usize) -> Self {
        self.brute_concurrency = limit;
        self
    }

    /// Set the number of expansion generations
    #[must_use]
    pub const fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Set the passive listening window; `None` is unbounded.
    ///
    /// Windows are whole seconds, rounded up to at least one.
    #[must_use]
    pub const fn passive_window(mut self, window: Option<Duration>) -> Self {
        self.passive_window_secs = match window {
            Some(window) if window.as_secs() == 0 => 1,
            Some(window) => window.as_secs(),
            None => 0,
        };
        self
    }

    /// Set the drain bound
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub const fn drain_timeout(mut self, timeout: Duration) -> Self {
        self.drain_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Drain bound as a duration
    #[must_use]
    pub const fn drain_timeout_duration(&self) -> Duration {
        Duration::from_millis(self.drain_timeout_ms)
    }

    /// Passive window as a duration
    #[must_use]
    pub const fn passive_window_duration(&self) -> Option<Duration> {
        match self.passive_window_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

// Default value functions for serde.
const fn default_brute_concurrency() -> usize {
    500
}

const fn default_expand_concurrency() -> usize {
    50
}

const fn default_expand_parallelism() -> usize {
    3
}

const fn default_max_depth() -> usize {
    1
}

const fn default_drain_timeout_ms() -> u64 {
    5_000
}

const fn default_passive_window_secs() -> u64 {
    120
}

const fn default_queue_capacity() -> usize {
    1_024
}

fn default_certstream_url() -> String {
    String::from(DEFAULT_CERTSTREAM_URL)
}
