//! Data types shared across the workspace.

mod domain;

pub use domain::*;
