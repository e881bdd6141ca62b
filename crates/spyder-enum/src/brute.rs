//! Wordlist-driven brute-force resolution.

use crate::candidates::{CandidateReader, CandidateSource};
use spyder_core::{Domain, Result, Source};
use spyder_resolver::ResolverPool;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Default number of lookups in flight
pub const DEFAULT_CONCURRENCY: usize = 500;

/// Buffered confirmations before lookups block on the consumer
const OUTPUT_BUFFER: usize = 100;

/// Resolves `label.target` for every candidate label through a shared pool.
#[derive(Debug, Clone)]
pub struct BruteForcer {
    pool: Arc<ResolverPool>,
    concurrency: usize,
}

impl BruteForcer {
    /// Create a brute forcer with the default concurrency cap
    #[must_use]
    pub fn new(pool: Arc<ResolverPool>) -> Self {
        Self {
            pool,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    /// Set the maximum number of lookups in flight
    #[must_use]
    pub fn concurrency(mut self, limit: usize) -> Self {
        self.concurrency = limit;
        self
    }

    /// Open `source` and start brute forcing `target`.
    ///
    /// Only a failure to open the source is an error; candidates that do
    /// not resolve are dropped.
    pub async fn run(
        &self,
        target: &str,
        source: &CandidateSource,
        cancel: CancellationToken,
    ) -> Result<ReceiverStream<Domain>> {
        let reader = source.open().await?;
        Ok(self.stream(target, reader, cancel))
    }

    /// Brute force `target` with an already opened reader.
    ///
    /// The returned stream closes once every candidate was dispatched and
    /// every lookup finished. After `cancel` fires no further candidate is
    /// dispatched and in-flight lookups abort.
    pub fn stream(
        &self,
        target: &str,
        mut reader: CandidateReader,
        cancel: CancellationToken,
    ) -> ReceiverStream<Domain> {
        let (tx, rx) = mpsc::channel(OUTPUT_BUFFER);
        let pool = Arc::clone(&self.pool);
        let limit = Arc::new(Semaphore::new(self.concurrency.max(1)));
        let target = target.to_string();

        tokio::spawn(async move {
            let mut dispatched = 0usize;

            loop {
                let permit = tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    permit = Arc::clone(&limit).acquire_owned() => match permit {
                        Ok(permit) => permit,
                        Err(_) => break,
                    },
                };
                let Some(label) = reader.next_candidate().await else {
                    break;
                };
                if cancel.is_cancelled() {
                    break;
                }

                let name = format!("{label}.{target}");
                let pool = Arc::clone(&pool);
                let tx = tx.clone();
                let cancel = cancel.clone();
                dispatched += 1;

                tokio::spawn(async move {
                    let _permit = permit;
                    if pool.lookup(&name, &cancel).await.is_ok() {
                        // Receiver gone means the run is over.
                        let _ = tx.send(Domain::new(name, Source::Brute)).await;
                    }
                });
            }

            debug!(
                domain = %target,
                dispatched,
                cancelled = cancel.is_cancelled(),
                "brute force dispatch finished"
            );
        });

        ReceiverStream::new(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::zone_pool;
    use futures_util::StreamExt;
    use spyder_core::SpyderError;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_only_resolving_candidates_emitted() {
        let (pool, queries) = zone_pool(&["www.example.com", "api.example.com"]);
        let brute = BruteForcer::new(pool);
        let source = CandidateSource::lines(["www", "api", "ghost-nonexistent"]);

        let found: Vec<Domain> = brute
            .run("example.com", &source, CancellationToken::new())
            .await
            .unwrap()
            .collect()
            .await;

        let names: HashSet<_> = found.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, HashSet::from(["www.example.com", "api.example.com"]));
        assert!(found.iter().all(|d| d.source == Source::Brute));
        assert_eq!(queries.lock().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_concurrency_of_one_still_completes() {
        let (pool, _queries) = zone_pool(&["a.example.com", "c.example.com"]);
        let brute = BruteForcer::new(pool).concurrency(1);
        let source = CandidateSource::lines(["a", "b", "c", "d"]);

        let found: Vec<Domain> = brute
            .run("example.com", &source, CancellationToken::new())
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(found.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_wordlist_is_error() {
        let (pool, _queries) = zone_pool(&[]);
        let brute = BruteForcer::new(pool);
        let source = CandidateSource::file("/tmp/spyder-no-such-wordlist.txt");

        let err = brute
            .run("example.com", &source, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, SpyderError::CandidateSourceOpenFailed { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_dispatches_nothing() {
        let (pool, queries) = zone_pool(&["www.example.com"]);
        let brute = BruteForcer::new(pool);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let found: Vec<Domain> = brute
            .run("example.com", &CandidateSource::lines(["www"]), cancel)
            .await
            .unwrap()
            .collect()
            .await;
        assert!(found.is_empty());
        assert!(queries.lock().unwrap().is_empty());
    }
}
