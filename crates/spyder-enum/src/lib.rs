//! Subdomain enumeration engine.
//!
//! Combines a passive certificate-transparency feed with an active
//! wordlist brute force and recursive permutation of confirmed names. Every
//! discovery goes through one [`DedupSet`] so each name is reported once.
//!
//! # Example
//!
//! ```rust,ignore
//! use spyder_enum::{CandidateSource, CertStream, Engine, EngineConfig, Mode};
//! use spyder_resolver::ResolverPool;
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! let pool = Arc::new(ResolverPool::builder().build()?);
//! let engine = Engine::new(pool, EngineConfig::default())
//!     .with_passive_source(CertStream::default());
//!
//! let words = CandidateSource::file("wordlists/subdomains.txt");
//! let found = engine
//!     .run("example.com", Mode::Both, &words, &CancellationToken::new())
//!     .await?;
//! for name in found.names() {
//!     println!("{name}");
//! }
//! ```

#![doc(html_root_url = "https://docs.rs/spyder-enum/0.3.0")]

pub mod brute;
pub mod candidates;
mod config;
pub mod dedup;
pub mod engine;
pub mod passive;
pub mod recursive;

pub use brute::BruteForcer;
pub use candidates::{CandidateReader, CandidateSource};
pub use config::*;
pub use dedup::DedupSet;
pub use engine::{Engine, EngineState, Enumeration};
pub use passive::{CertEvent, CertStream, PassiveSource};
pub use recursive::Expander;
pub use spyder_core::{Domain, Result, Source, SpyderError};

#[cfg(test)]
pub(crate) mod test_support;
