//! Rate-limited, round-robin DNS resolver pool.
//!
//! This crate provides the [`ResolverPool`] used by the enumeration engine.
//! A pool owns a fixed set of [`ResolverEndpoint`]s, picks one per attempt in
//! rotation, throttles each endpoint independently and retries failed
//! lookups on the next upstream.

#![doc(html_root_url = "https://docs.rs/spyder-resolver/0.3.0")]

mod config;
mod endpoint;
mod pool;
mod upstream;

pub use config::*;
pub use endpoint::ResolverEndpoint;
pub use pool::{ResolverPool, ResolverPoolBuilder};
pub use spyder_core::{Result, SpyderError};
pub use upstream::{HickoryUpstream, Upstream};
