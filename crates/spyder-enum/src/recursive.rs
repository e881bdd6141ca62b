//! Sibling discovery by permuting the leading label of a confirmed name.

use crate::dedup::DedupSet;
use futures_util::{future, Stream, StreamExt};
use spyder_resolver::ResolverPool;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Default permutation lookups in flight per expansion
const DEFAULT_PARALLELISM: usize = 3;

/// Candidate siblings of `found`, in a fixed order.
///
/// `app.example.com` yields `app1.example.com`, `dev-app.example.com`,
/// `app-admin.example.com` and so on. A name with fewer than two labels
/// yields nothing.
pub fn permutations(found: &str) -> Vec<String> {
    let Some((label, suffix)) = found.split_once('.') else {
        return Vec::new();
    };
    if label.is_empty() || suffix.is_empty() {
        return Vec::new();
    }

    [
        format!("{label}1"),
        format!("{label}2"),
        format!("dev-{label}"),
        format!("test-{label}"),
        format!("staging-{label}"),
        format!("{label}-dev"),
        format!("{label}-test"),
        format!("admin-{label}"),
        format!("{label}-admin"),
    ]
    .into_iter()
    .map(|permuted| format!("{permuted}.{suffix}"))
    .collect()
}

/// Re-validates permutations of confirmed names through the resolver pool.
#[derive(Debug, Clone)]
pub struct Expander {
    pool: Arc<ResolverPool>,
    seen: Arc<DedupSet>,
    parallelism: usize,
}

impl Expander {
    /// Create an expander sharing the run's pool and seen set
    #[must_use]
    pub fn new(pool: Arc<ResolverPool>, seen: Arc<DedupSet>) -> Self {
        Self {
            pool,
            seen,
            parallelism: DEFAULT_PARALLELISM,
        }
    }

    /// Set how many permutation lookups run at once
    #[must_use]
    pub fn parallelism(mut self, limit: usize) -> Self {
        self.parallelism = limit.max(1);
        self
    }

    /// Stream the permutations of `found` that resolve.
    ///
    /// Permutations already in the seen set are skipped without a query.
    /// Emitted names are not inserted into the seen set; that stays with the
    /// caller.
    pub fn expand<'a>(
        &'a self,
        found: &str,
        cancel: &'a CancellationToken,
    ) -> impl Stream<Item = String> + Send + 'a {
        futures_util::stream::iter(permutations(found))
            .map(move |candidate| async move {
                if cancel.is_cancelled() || self.seen.contains(&candidate) {
                    return None;
                }
                match self.pool.lookup(&candidate, cancel).await {
                    Ok(_) => Some(candidate),
                    Err(e) => {
                        trace!(candidate = %candidate, error = %e, "permutation dropped");
                        None
                    }
                }
            })
            .buffer_unordered(self.parallelism)
            .filter_map(future::ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::zone_pool;

    #[test]
    fn test_permutations_of_app() {
        let perms = permutations("app.example.com");
        assert_eq!(perms.len(), 9);
        assert!(perms.contains(&"dev-app.example.com".to_string()));
        assert!(perms.contains(&"app-dev.example.com".to_string()));
        assert!(perms.contains(&"app1.example.com".to_string()));
        assert!(perms.contains(&"app2.example.com".to_string()));
        assert!(perms.contains(&"staging-app.example.com".to_string()));
        assert!(perms.contains(&"admin-app.example.com".to_string()));
        assert!(perms.contains(&"app-admin.example.com".to_string()));
        assert!(perms.iter().all(|p| p.ends_with(".example.com")));
    }

    #[test]
    fn test_single_label_yields_nothing() {
        assert!(permutations("localhost").is_empty());
        assert!(permutations("").is_empty());
        assert!(permutations(".example.com").is_empty());
    }

    #[test]
    fn test_deep_name_keeps_full_suffix() {
        let perms = permutations("api.eu.example.com");
        assert_eq!(perms[0], "api1.eu.example.com");
    }

    #[tokio::test]
    async fn test_only_resolving_permutations_emitted() {
        let (pool, queries) = zone_pool(&["dev-app.example.com", "app1.example.com"]);
        let expander = Expander::new(pool, Arc::new(DedupSet::new()));
        let cancel = CancellationToken::new();

        let mut found: Vec<String> = expander.expand("app.example.com", &cancel).collect().await;
        found.sort();

        assert_eq!(found, vec!["app1.example.com", "dev-app.example.com"]);
        assert_eq!(queries.lock().unwrap().len(), 9);
    }

    #[tokio::test]
    async fn test_seen_permutations_not_queried() {
        let (pool, queries) = zone_pool(&["dev-app.example.com", "app1.example.com"]);
        let seen = Arc::new(DedupSet::new());
        seen.check_and_insert("dev-app.example.com");
        let expander = Expander::new(pool, seen);
        let cancel = CancellationToken::new();

        let found: Vec<String> = expander.expand("app.example.com", &cancel).collect().await;

        assert_eq!(found, vec!["app1.example.com"]);
        let queries = queries.lock().unwrap();
        assert_eq!(queries.len(), 8);
        assert!(!queries.contains(&"dev-app.example.com".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_expansion_queries_nothing() {
        let (pool, queries) = zone_pool(&["app1.example.com"]);
        let expander = Expander::new(pool, Arc::new(DedupSet::new()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let found: Vec<String> = expander.expand("app.example.com", &cancel).collect().await;
        assert!(found.is_empty());
        assert!(queries.lock().unwrap().is_empty());
    }
}
