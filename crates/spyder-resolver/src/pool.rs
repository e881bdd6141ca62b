//! Round-robin resolver pool with retries.

use crate::config::{PoolConfig, RetryConfig, DEFAULT_RESOLVERS};
use crate::endpoint::ResolverEndpoint;
use crate::upstream::HickoryUpstream;
use spyder_core::{Result, SpyderError};
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

/// Default per-query timeout
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

/// Default spacing between queries to one resolver
const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(10);

/// Fixed set of resolver endpoints shared by every lookup of a run.
///
/// Endpoints are addressed by index; the cursor always stays in
/// `0..endpoints.len()` and advances by exactly one per selection.
#[derive(Debug)]
pub struct ResolverPool {
    endpoints: Vec<ResolverEndpoint>,
    cursor: AtomicUsize,
    retry: RetryConfig,
}

impl ResolverPool {
    /// Create a builder for custom configuration
    #[must_use]
    pub fn builder() -> ResolverPoolBuilder {
        ResolverPoolBuilder::new()
    }

    /// Build a UDP pool from serialized settings
    pub fn from_config(config: &PoolConfig) -> Result<Self> {
        Self::builder()
            .resolvers(config.resolvers.iter().cloned())
            .timeout(config.timeout())
            .min_interval(config.min_interval())
            .retry(config.retry())
            .build()
    }

    /// Build a pool over pre-made endpoints
    pub fn from_endpoints(endpoints: Vec<ResolverEndpoint>, retry: RetryConfig) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(SpyderError::Config(
                "resolver pool needs at least one endpoint".into(),
            ));
        }
        Ok(Self {
            endpoints,
            cursor: AtomicUsize::new(0),
            retry,
        })
    }

    /// Number of endpoints
    #[must_use]
    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    /// Always false; a pool is never built empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }

    /// Endpoints in rotation order
    #[must_use]
    pub fn endpoints(&self) -> &[ResolverEndpoint] {
        &self.endpoints
    }

    /// Retry policy in effect
    #[must_use]
    pub const fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Claim the next endpoint index.
    fn next_index(&self) -> usize {
        let len = self.endpoints.len();
        match self
            .cursor
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| Some((c + 1) % len))
        {
            Ok(previous) | Err(previous) => previous,
        }
    }

    /// Resolve `name`, rotating to a different endpoint on each attempt.
    ///
    /// Fails with [`SpyderError::ResolutionFailed`] when every attempt errors
    /// or comes back empty, and with [`SpyderError::Cancelled`] as soon as
    /// `cancel` fires.
    pub async fn lookup(&self, name: &str, cancel: &CancellationToken) -> Result<Vec<IpAddr>> {
        let attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(SpyderError::Cancelled);
            }

            let index = self.next_index();
            match self.endpoints[index].query(name, cancel).await {
                Ok(ips) if !ips.is_empty() => {
                    debug!(name, endpoint = index, attempt, count = ips.len(), "resolved");
                    return Ok(ips);
                }
                Ok(_) => trace!(name, endpoint = index, attempt, "empty answer"),
                Err(e) if e.is_cancelled() => return Err(e),
                Err(e) if !e.is_retryable() => {
                    debug!(name, endpoint = index, attempt, error = %e, "not retrying");
                    break;
                }
                Err(e) => trace!(name, endpoint = index, attempt, error = %e, "attempt failed"),
            }

            if attempt < attempts {
                let backoff = self.retry.backoff_for(attempt);
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(SpyderError::Cancelled),
                    () = tokio::time::sleep(backoff) => {}
                }
            }
        }

        Err(SpyderError::ResolutionFailed {
            name: name.to_string(),
        })
    }
}

/// Builder for a UDP [`ResolverPool`]
#[derive(Debug, Clone)]
pub struct ResolverPoolBuilder {
    resolvers: Vec<String>,
    timeout: Duration,
    min_interval: Duration,
    retry: RetryConfig,
}

impl Default for ResolverPoolBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ResolverPoolBuilder {
    /// Create a builder targeting the default public resolvers
    #[must_use]
    pub fn new() -> Self {
        Self {
            resolvers: DEFAULT_RESOLVERS.iter().map(ToString::to_string).collect(),
            timeout: DEFAULT_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
            retry: RetryConfig::default(),
        }
    }

    /// Replace the resolver list
    #[must_use]
    pub fn resolvers<I, S>(mut self, resolvers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resolvers = resolvers.into_iter().map(Into::into).collect();
        self
    }

    /// Set the per-query timeout
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the minimum spacing between queries to one resolver
    #[must_use]
    pub const fn min_interval(mut self, interval: Duration) -> Self {
        self.min_interval = interval;
        self
    }

    /// Set retry configuration
    #[must_use]
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry = config;
        self
    }

    /// Build the pool
    pub fn build(self) -> Result<ResolverPool> {
        let endpoints = self
            .resolvers
            .iter()
            .map(|address| {
                HickoryUpstream::parse(address, self.timeout)
                    .map(|upstream| ResolverEndpoint::new(upstream, self.min_interval))
            })
            .collect::<Result<Vec<_>>>()?;

        ResolverPool::from_endpoints(endpoints, self.retry)
    }
}
