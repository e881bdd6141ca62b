//! Core types and errors for spyder.
//!
//! This crate provides the foundational types shared by the resolver pool,
//! the enumeration engine and the command-line front end:
//!
//! - **Types**: [`Domain`] and the [`Source`] that discovered it
//! - **Errors**: the [`SpyderError`] taxonomy and the [`Result`] alias
//!
//! # Example
//!
//! ```rust
//! use spyder_core::{Domain, Source};
//!
//! let found = Domain::new("www.example.com", Source::Brute);
//! assert_eq!(found.name, "www.example.com");
//! assert!(found.is_subdomain_of("example.com"));
//! ```

#![doc(html_root_url = "https://docs.rs/spyder-core/0.3.0")]

mod error;
pub mod types;

pub use error::{Result, SpyderError};
pub use types::*;
