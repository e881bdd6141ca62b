//! # spyder-cli
//!
//! Command-line front end for the spyder enumeration engine.
//!
//! ## Features
//!
//! - **Passive discovery**: certificate transparency via CertStream
//! - **Active discovery**: wordlist brute force plus permutation of hits
//! - **Resolver pool**: round robin over public resolvers with per-resolver
//!   rate limiting
//! - **Output formats**: pretty, JSON, plain

pub mod cli;
pub mod config;
pub mod output;

pub use cli::run;
