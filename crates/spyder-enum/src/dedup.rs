//! Concurrent seen-name set.

use dashmap::DashSet;

/// Names already reported during one run.
///
/// Backed by a sharded map, so writers only contend when they hash to the
/// same shard. The only mutation is [`DedupSet::check_and_insert`].
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: DashSet<String>,
}

impl DedupSet {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `name`, returning true only for the call that inserted it first.
    pub fn check_and_insert(&self, name: &str) -> bool {
        if self.seen.contains(name) {
            return false;
        }
        self.seen.insert(name.to_owned())
    }

    /// Whether `name` has been inserted. Advisory only; a false answer can be
    /// stale by the time the caller acts on it.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.seen.contains(name)
    }

    /// Number of distinct names seen
    #[must_use]
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    /// Whether nothing has been seen yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}
