//! Upstream DNS transports.

use async_trait::async_trait;
use hickory_resolver::config::{NameServerConfig, ResolverConfig, ResolverOpts};
use hickory_resolver::name_server::TokioConnectionProvider;
use hickory_resolver::proto::xfer::Protocol;
use hickory_resolver::TokioResolver;
use spyder_core::{Result, SpyderError};
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

/// Standard DNS port
const DNS_PORT: u16 = 53;

/// One upstream DNS server.
///
/// A single call is a single attempt; retries and throttling belong to the
/// pool and the endpoint wrapping this upstream.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Address this upstream queries, for logs
    fn address(&self) -> String;

    /// Resolve `name` to its A/AAAA addresses
    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>>;
}

/// UDP upstream backed by hickory, pinned to one server
pub struct HickoryUpstream {
    addr: SocketAddr,
    resolver: TokioResolver,
}

impl HickoryUpstream {
    /// Create an upstream querying `addr` over UDP
    #[must_use]
    pub fn new(addr: SocketAddr, timeout: Duration) -> Self {
        let mut config = ResolverConfig::new();
        config.add_name_server(NameServerConfig::new(addr, Protocol::Udp));

        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        opts.cache_size = 0;

        let resolver =
            TokioResolver::builder_with_config(config, TokioConnectionProvider::default())
                .with_options(opts)
                .build();

        Self { addr, resolver }
    }

    /// Parse `ip` or `ip:port` and create an upstream for it
    pub fn parse(address: &str, timeout: Duration) -> Result<Self> {
        parse_resolver_addr(address).map(|addr| Self::new(addr, timeout))
    }
}

#[async_trait]
impl Upstream for HickoryUpstream {
    fn address(&self) -> String {
        self.addr.to_string()
    }

    async fn lookup_ip(&self, name: &str) -> Result<Vec<IpAddr>> {
        let fqdn = format!("{}.", name.trim_end_matches('.'));
        let response = self
            .resolver
            .lookup_ip(fqdn.as_str())
            .await
            .map_err(|e| SpyderError::Dns(e.to_string()))?;

        Ok(response.iter().collect())
    }
}

/// Parse a resolver address, defaulting the port to 53
pub(crate) fn parse_resolver_addr(address: &str) -> Result<SocketAddr> {
    let address = address.trim();
    if let Ok(addr) = address.parse::<SocketAddr>() {
        return Ok(addr);
    }
    address
        .trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .map(|ip| SocketAddr::new(ip, DNS_PORT))
        .map_err(|_| SpyderError::Config(format!("invalid resolver address: {address}")))
}
