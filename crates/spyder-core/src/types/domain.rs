use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Producer that confirmed a domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Certificate transparency feed
    Certstream,
    /// Wordlist brute force
    Brute,
    /// Permutation of an already confirmed name
    Recursive,
}

impl Source {
    /// Stable lowercase label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Certstream => "certstream",
            Self::Brute => "brute",
            Self::Recursive => "recursive",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A discovered subdomain
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    /// Fully qualified name, lowercase, no trailing dot
    pub name: String,
    /// Which producer confirmed it
    pub source: Source,
    /// When it was confirmed
    pub discovered_at: DateTime<Utc>,
}

impl Domain {
    /// Create a domain confirmed now
    #[must_use]
    pub fn new(name: impl Into<String>, source: Source) -> Self {
        Self {
            name: name.into(),
            source,
            discovered_at: Utc::now(),
        }
    }

    /// Whether this is a strict subdomain of `target`
    #[must_use]
    pub fn is_subdomain_of(&self, target: &str) -> bool {
        is_strict_subdomain(&self.name, target)
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Canonical form of a DNS name: trimmed, lowercase, without a trailing dot.
#[must_use]
pub fn normalize_name(name: &str) -> String {
    name.trim().trim_end_matches('.').to_ascii_lowercase()
}

/// Suffix match on `"." + target`, ignoring ASCII case.
#[must_use]
pub fn is_strict_subdomain(name: &str, target: &str) -> bool {
    let (name, target) = (name.as_bytes(), target.as_bytes());
    if target.is_empty() || name.len() <= target.len() + 1 {
        return false;
    }
    let split = name.len() - target.len();
    name[split - 1] == b'.' && name[split..].eq_ignore_ascii_case(target)
}
