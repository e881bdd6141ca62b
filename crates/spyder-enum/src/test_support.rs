//! Stub upstreams shared by unit tests.

use async_trait::async_trait;
use spyder_core::{Result, SpyderError};
use spyder_resolver::{ResolverEndpoint, ResolverPool, RetryConfig, Upstream};
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Answers only for the names it was built with and logs every query.
pub struct Zone {
    names: HashSet<String>,
    pub queries: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl Upstream for Zone {
    fn address(&self) -> String {
        "zone".into()
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>> {
        self.queries.lock().unwrap().push(name.to_string());
        if self.names.contains(name) {
            Ok(vec![IpAddr::from([192, 0, 2, 10])])
        } else {
            Err(SpyderError::Dns("NXDOMAIN".into()))
        }
    }
}

/// Single-attempt pool over a [`Zone`] resolving `names`.
pub fn zone_pool(names: &[&str]) -> (Arc<ResolverPool>, Arc<Mutex<Vec<String>>>) {
    let queries = Arc::new(Mutex::new(Vec::new()));
    let zone = Zone {
        names: names.iter().map(ToString::to_string).collect(),
        queries: Arc::clone(&queries),
    };
    let pool = ResolverPool::from_endpoints(
        vec![ResolverEndpoint::new(zone, Duration::ZERO)],
        RetryConfig::new().max_attempts(1),
    )
    .unwrap();
    (Arc::new(pool), queries)
}
