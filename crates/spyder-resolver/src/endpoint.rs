//! A single throttled upstream.

use crate::upstream::Upstream;
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use spyder_core::{Result, SpyderError};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::trace;

type DirectLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One upstream DNS server plus its own minimum inter-query interval.
///
/// The limiter admits one query per `min_interval`, so the time of the last
/// admitted query only ever moves forward and is owned by this endpoint
/// alone. Endpoints never wait on each other.
pub struct ResolverEndpoint {
    upstream: Arc<dyn Upstream>,
    min_interval: Duration,
    limiter: Option<DirectLimiter>,
    queries: AtomicU64,
}

impl ResolverEndpoint {
    /// Wrap an upstream; a zero interval disables throttling
    pub fn new(upstream: impl Upstream + 'static, min_interval: Duration) -> Self {
        Self::from_arc(Arc::new(upstream), min_interval)
    }

    /// Wrap a shared upstream
    #[must_use]
    pub fn from_arc(upstream: Arc<dyn Upstream>, min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval).map(DirectLimiter::direct);
        Self {
            upstream,
            min_interval,
            limiter,
            queries: AtomicU64::new(0),
        }
    }

    /// Address of the wrapped upstream
    #[must_use]
    pub fn address(&self) -> String {
        self.upstream.address()
    }

    /// Configured minimum spacing between queries
    #[must_use]
    pub const fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Number of queries this endpoint has issued
    #[must_use]
    pub fn queries(&self) -> u64 {
        self.queries.load(Ordering::Relaxed)
    }

    /// Wait for this endpoint's turn, then run one query.
    pub async fn query(&self, name: &str, cancel: &CancellationToken) -> Result<Vec<IpAddr>> {
        if let Some(limiter) = &self.limiter {
            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(SpyderError::Cancelled),
                () = limiter.until_ready() => {}
            }
        }

        self.queries.fetch_add(1, Ordering::Relaxed);
        trace!(name, upstream = %self.upstream.address(), "dns query");

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(SpyderError::Cancelled),
            result = self.upstream.lookup_ip(name) => result,
        }
    }
}

impl std::fmt::Debug for ResolverEndpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverEndpoint")
            .field("address", &self.upstream.address())
            .field("min_interval", &self.min_interval)
            .field("queries", &self.queries())
            .finish()
    }
}
