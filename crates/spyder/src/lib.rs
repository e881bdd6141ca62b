//! Subdomain enumeration: certificate transparency, wordlist brute force and
//! recursive permutation over a rate-limited, round-robin resolver pool.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use spyder::{CandidateSource, CertStream, Engine, EngineConfig, Mode, ResolverPool};
//! use spyder::CancellationToken;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> spyder::Result<()> {
//!     let pool = ResolverPool::builder()
//!         .resolvers(["8.8.8.8", "1.1.1.1"])
//!         .build()?;
//!
//!     let engine = Engine::new(Arc::new(pool), EngineConfig::default())
//!         .with_passive_source(CertStream::default());
//!
//!     let found = engine
//!         .run(
//!             "example.com",
//!             Mode::Both,
//!             &CandidateSource::file("subdomains.txt"),
//!             &CancellationToken::new(),
//!         )
//!         .await?;
//!
//!     for domain in found.domains() {
//!         println!("{} ({})", domain.name, domain.source);
//!     }
//!     Ok(())
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/spyder/0.3.0")]

// Re-export core types
pub use spyder_core::*;

// Re-export the resolver pool
pub use spyder_resolver::{
    PoolConfig, ResolverEndpoint, ResolverPool, ResolverPoolBuilder, RetryConfig, Upstream,
    DEFAULT_RESOLVERS,
};

// Re-export the engine
pub use spyder_enum::{
    passive, BruteForcer, CandidateSource, CertEvent, CertStream, DedupSet, Engine, EngineConfig,
    EngineState, Enumeration, Expander, Mode, PassiveSource, DEFAULT_CERTSTREAM_URL,
};

// Re-export runtime for convenience
pub use serde;
pub use serde_json;
pub use tokio;
pub use tokio_util::sync::CancellationToken;
