//! Enumeration engine: runs the passive and active branches and collects
//! their discoveries.

use crate::brute::BruteForcer;
use crate::candidates::{CandidateReader, CandidateSource};
use crate::config::{EngineConfig, Mode};
use crate::dedup::DedupSet;
use crate::passive::PassiveSource;
use crate::recursive::Expander;
use futures_util::future::{self, BoxFuture};
use futures_util::{FutureExt, StreamExt};
use serde::Serialize;
use spyder_core::{is_strict_subdomain, normalize_name, Domain, Result, Source, SpyderError};
use spyder_resolver::ResolverPool;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, instrument, warn};

/// Lifecycle of an engine run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    /// No run started yet
    #[default]
    Idle,
    /// Branches are producing results
    Running,
    /// Brute force finished; waiting on expansions and the passive feed
    Draining,
    /// Results collected
    Done,
}

/// Outcome of one run
#[derive(Debug, Clone, Default, Serialize)]
pub struct Enumeration {
    domains: Vec<Domain>,
    /// The run stopped early on cancellation; `domains` is partial
    pub cancelled: bool,
}

impl Enumeration {
    /// Unique domains in order of first discovery
    #[must_use]
    pub fn domains(&self) -> &[Domain] {
        &self.domains
    }

    /// Names only, in order of first discovery
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.domains.iter().map(|d| d.name.as_str())
    }

    /// Number of unique domains
    #[must_use]
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// Whether nothing was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Take the domains
    #[must_use]
    pub fn into_domains(self) -> Vec<Domain> {
        self.domains
    }
}

impl From<Vec<Domain>> for Enumeration {
    fn from(domains: Vec<Domain>) -> Self {
        Self {
            domains,
            cancelled: false,
        }
    }
}

/// Subdomain enumeration engine.
///
/// One engine can serve several runs one after another; each run gets its
/// own seen set and result queue. The resolver pool is shared. Runs must not
/// overlap: while one is `Running` or `Draining`, another `run` on the same
/// engine fails with [`SpyderError::Config`]. Build one engine per concurrent
/// enumeration.
pub struct Engine {
    pool: Arc<ResolverPool>,
    config: EngineConfig,
    passive: Option<Arc<dyn PassiveSource>>,
    state: watch::Sender<EngineState>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("resolvers", &self.pool.len())
            .field("config", &self.config)
            .field("passive", &self.passive.as_ref().map(|p| p.name().to_string()))
            .field("state", &*self.state.borrow())
            .finish()
    }
}

impl Engine {
    /// Create an engine without a passive source
    #[must_use]
    pub fn new(pool: Arc<ResolverPool>, config: EngineConfig) -> Self {
        let (state, _) = watch::channel(EngineState::Idle);
        Self {
            pool,
            config,
            passive: None,
            state,
        }
    }

    /// Attach the certificate feed used by passive and combined runs
    #[must_use]
    pub fn with_passive_source(mut self, source: impl PassiveSource + 'static) -> Self {
        self.passive = Some(Arc::new(source));
        self
    }

    /// Engine configuration
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current lifecycle state
    #[must_use]
    pub fn state(&self) -> EngineState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change
    #[must_use]
    pub fn watch_state(&self) -> watch::Receiver<EngineState> {
        self.state.subscribe()
    }

    /// Enumerate subdomains of `target`.
    ///
    /// The candidate source is opened before any branch starts, so a missing
    /// wordlist fails the run with
    /// [`SpyderError::CandidateSourceOpenFailed`] and nothing is queried. A
    /// passive feed that cannot be reached only costs the passive results.
    /// Cancelling `cancel` returns what was found so far with
    /// [`Enumeration::cancelled`] set.
    ///
    /// # Errors
    ///
    /// Fails on an empty target, an unopenable candidate source, or when
    /// another run on this engine has not finished.
    #[instrument(skip_all, fields(domain = %target, %mode))]
    pub async fn run(
        &self,
        target: &str,
        mode: Mode,
        candidates: &CandidateSource,
        cancel: &CancellationToken,
    ) -> Result<Enumeration> {
        let target = normalize_name(target);
        if target.is_empty() {
            return Err(SpyderError::Config("target domain is empty".into()));
        }

        let reader = if mode.is_active() {
            Some(candidates.open().await?)
        } else {
            None
        };

        let claimed = self.state.send_if_modified(|state| match state {
            EngineState::Running | EngineState::Draining => false,
            EngineState::Idle | EngineState::Done => {
                *state = EngineState::Running;
                true
            }
        });
        if !claimed {
            return Err(SpyderError::Config("engine is already running".into()));
        }
        let _release = Release(&self.state);
        info!("enumeration started");

        let seen = Arc::new(DedupSet::new());
        let (results, queue) = mpsc::channel(self.config.queue_capacity.max(1));
        let aggregator = tokio::spawn(aggregate(queue));

        let passive = if mode.is_passive() {
            self.spawn_passive(&target, &seen, results.clone(), cancel)
        } else {
            None
        };

        let expansions = reader.map(|reader| {
            let expansions = Expansions::new(
                Expander::new(Arc::clone(&self.pool), Arc::clone(&seen))
                    .parallelism(self.config.expand_parallelism),
                Arc::clone(&seen),
                results.clone(),
                &self.config,
                cancel.child_token(),
            );
            (reader, expansions)
        });

        if let Some((reader, expansions)) = expansions {
            self.brute_force(&target, reader, &seen, &results, &expansions, cancel)
                .await;
            self.state.send_replace(EngineState::Draining);
            expansions
                .drain(self.config.drain_timeout_duration())
                .await;
            join_passive(passive).await;
        } else {
            // The feed is the only producer; stay Running while it listens.
            join_passive(passive).await;
            self.state.send_replace(EngineState::Draining);
        }

        drop(results);
        let domains = match aggregator.await {
            Ok(domains) => unique_in_order(domains),
            Err(e) => {
                warn!(error = %e, "result aggregator failed");
                Vec::new()
            }
        };

        let cancelled = cancel.is_cancelled();
        self.state.send_replace(EngineState::Done);
        info!(found = domains.len(), cancelled, "enumeration finished");

        Ok(Enumeration { domains, cancelled })
    }

    fn spawn_passive(
        &self,
        target: &str,
        seen: &Arc<DedupSet>,
        results: mpsc::Sender<Domain>,
        cancel: &CancellationToken,
    ) -> Option<JoinHandle<()>> {
        let Some(source) = self.passive.as_ref() else {
            warn!("passive mode requested but no passive source is configured");
            return None;
        };
        Some(tokio::spawn(listen(
            Arc::clone(source),
            target.to_string(),
            Arc::clone(seen),
            results,
            cancel.clone(),
            self.config.passive_window_duration(),
        )))
    }

    async fn brute_force(
        &self,
        target: &str,
        reader: CandidateReader,
        seen: &DedupSet,
        results: &mpsc::Sender<Domain>,
        expansions: &Expansions,
        cancel: &CancellationToken,
    ) {
        let brute =
            BruteForcer::new(Arc::clone(&self.pool)).concurrency(self.config.brute_concurrency);
        let mut found = brute.stream(target, reader, cancel.clone());
        let mut confirmed = 0usize;

        while let Some(domain) = found.next().await {
            if !seen.check_and_insert(&domain.name) {
                continue;
            }
            let name = domain.name.clone();
            if results.send(domain).await.is_err() {
                break;
            }
            confirmed += 1;
            expansions.spawn(name, 1);
        }

        debug!(confirmed, "brute force stream closed");
    }
}

/// Marks the run finished if its future is dropped part way.
struct Release<'a>(&'a watch::Sender<EngineState>);

impl Drop for Release<'_> {
    fn drop(&mut self) {
        self.0.send_if_modified(|state| {
            let unfinished = matches!(state, EngineState::Running | EngineState::Draining);
            if unfinished {
                *state = EngineState::Done;
            }
            unfinished
        });
    }
}

async fn join_passive(handle: Option<JoinHandle<()>>) {
    if let Some(handle) = handle {
        if let Err(e) = handle.await {
            warn!(error = %e, "passive branch task failed");
        }
    }
}

/// Expansion tasks of one run.
#[derive(Clone)]
struct Expansions {
    inner: Arc<ExpansionContext>,
}

struct ExpansionContext {
    expander: Expander,
    seen: Arc<DedupSet>,
    results: mpsc::Sender<Domain>,
    permits: Arc<Semaphore>,
    tracker: TaskTracker,
    cancel: CancellationToken,
    max_depth: usize,
}

impl Expansions {
    fn new(
        expander: Expander,
        seen: Arc<DedupSet>,
        results: mpsc::Sender<Domain>,
        config: &EngineConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            inner: Arc::new(ExpansionContext {
                expander,
                seen,
                results,
                permits: Arc::new(Semaphore::new(config.expand_concurrency.max(1))),
                tracker: TaskTracker::new(),
                cancel,
                max_depth: config.max_depth,
            }),
        }
    }

    /// Expand `found` in the background at generation `depth`.
    fn spawn(&self, found: String, depth: usize) {
        if depth > self.inner.max_depth || self.inner.cancel.is_cancelled() {
            return;
        }
        self.inner.tracker.spawn(self.clone().expand(found, depth));
    }

    fn expand(self, found: String, depth: usize) -> BoxFuture<'static, ()> {
        async move {
            let ctx = &self.inner;
            let _permit = tokio::select! {
                biased;
                () = ctx.cancel.cancelled() => return,
                permit = Arc::clone(&ctx.permits).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => return,
                },
            };

            let siblings = ctx.expander.expand(&found, &ctx.cancel);
            tokio::pin!(siblings);
            while let Some(name) = siblings.next().await {
                if !ctx.seen.check_and_insert(&name) {
                    continue;
                }
                let domain = Domain::new(name.clone(), Source::Recursive);
                if ctx.results.send(domain).await.is_err() {
                    return;
                }
                if depth < ctx.max_depth {
                    self.spawn(name, depth + 1);
                }
            }
        }
        .boxed()
    }

    /// Wait for every expansion, including ones spawned by expansions.
    ///
    /// After `bound` the rest are cancelled and awaited.
    async fn drain(&self, bound: Duration) {
        let tracker = &self.inner.tracker;
        tracker.close();
        debug!(outstanding = tracker.len(), "draining expansions");

        if timeout(bound, tracker.wait()).await.is_err() {
            warn!(
                outstanding = tracker.len(),
                bound_ms = u64::try_from(bound.as_millis()).unwrap_or(u64::MAX),
                "expansions did not drain in time, cancelling"
            );
            self.inner.cancel.cancel();
            tracker.wait().await;
        }
    }
}

/// Listen to the passive feed until it ends, `window` elapses or the run is
/// cancelled.
async fn listen(
    source: Arc<dyn PassiveSource>,
    target: String,
    seen: Arc<DedupSet>,
    results: mpsc::Sender<Domain>,
    cancel: CancellationToken,
    window: Option<Duration>,
) {
    let subscribed = tokio::select! {
        biased;
        () = cancel.cancelled() => return,
        subscribed = source.subscribe() => subscribed,
    };
    let mut events = match subscribed {
        Ok(events) => events,
        Err(e) => {
            warn!(source = source.name(), error = %e, "passive source unavailable");
            return;
        }
    };

    let deadline = async move {
        match window {
            Some(window) => tokio::time::sleep(window).await,
            None => future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut emitted = 0usize;
    loop {
        let event = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            () = &mut deadline => {
                debug!(source = source.name(), "passive window elapsed");
                break;
            }
            event = events.next() => event,
        };

        match event {
            Some(Ok(event)) => {
                for raw in &event.names {
                    let Some(name) = matching_subdomain(raw, &target) else {
                        continue;
                    };
                    if !seen.check_and_insert(&name) {
                        continue;
                    }
                    if results
                        .send(Domain::new(name, Source::Certstream))
                        .await
                        .is_err()
                    {
                        return;
                    }
                    emitted += 1;
                }
            }
            Some(Err(e)) => {
                warn!(source = source.name(), error = %e, "passive feed interrupted");
                break;
            }
            None => {
                debug!(source = source.name(), "passive feed ended");
                break;
            }
        }
    }

    debug!(source = source.name(), emitted, "passive branch finished");
}

/// Single consumer of the result queue.
async fn aggregate(mut queue: mpsc::Receiver<Domain>) -> Vec<Domain> {
    let mut domains = Vec::new();
    while let Some(domain) = queue.recv().await {
        domains.push(domain);
    }
    domains
}

/// Normalized `raw` when it names a strict subdomain of `target`.
///
/// A leading `*.` wildcard label is stripped first.
fn matching_subdomain(raw: &str, target: &str) -> Option<String> {
    let name = normalize_name(raw);
    let name = name.strip_prefix("*.").unwrap_or(&name);
    is_strict_subdomain(name, target).then(|| name.to_string())
}

fn unique_in_order(mut domains: Vec<Domain>) -> Vec<Domain> {
    let mut names = HashSet::with_capacity(domains.len());
    domains.retain(|d| names.insert(d.name.clone()));
    domains
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::zone_pool;

    #[test]
    fn test_matching_subdomain() {
        assert_eq!(
            matching_subdomain("*.Foo.Example.com", "example.com").as_deref(),
            Some("foo.example.com")
        );
        assert_eq!(
            matching_subdomain("www.example.com.", "example.com").as_deref(),
            Some("www.example.com")
        );
        assert_eq!(matching_subdomain("example.com", "example.com"), None);
        assert_eq!(matching_subdomain("*.example.com", "example.com"), None);
        assert_eq!(matching_subdomain("badexample.com", "example.com"), None);
        assert_eq!(matching_subdomain("www.other.org", "example.com"), None);
    }

    #[test]
    fn test_unique_in_order_keeps_first() {
        let domains = vec![
            Domain::new("a.example.com", Source::Brute),
            Domain::new("b.example.com", Source::Recursive),
            Domain::new("a.example.com", Source::Certstream),
        ];
        let unique = unique_in_order(domains);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "a.example.com");
        assert_eq!(unique[0].source, Source::Brute);
        assert_eq!(unique[1].name, "b.example.com");
    }

    #[tokio::test]
    async fn test_empty_target_rejected() {
        let (pool, queries) = zone_pool(&[]);
        let engine = Engine::new(pool, EngineConfig::default());
        let err = engine
            .run(
                "  . ",
                Mode::Active,
                &CandidateSource::lines(["www"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, SpyderError::Config(_)));
        assert_eq!(engine.state(), EngineState::Idle);
        assert!(queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_active_run_expands_brute_results() {
        let (pool, _queries) = zone_pool(&["app.example.com", "app-admin.example.com"]);
        let engine = Engine::new(pool, EngineConfig::default());

        let found = engine
            .run(
                "Example.COM",
                Mode::Active,
                &CandidateSource::lines(["app", "nope"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(!found.cancelled);
        assert_eq!(found.domains()[0].name, "app.example.com");
        assert_eq!(found.domains()[0].source, Source::Brute);
        assert_eq!(found.domains()[1].name, "app-admin.example.com");
        assert_eq!(found.domains()[1].source, Source::Recursive);
        assert_eq!(found.len(), 2);
        assert_eq!(engine.state(), EngineState::Done);
    }

    #[tokio::test]
    async fn test_passive_without_source_is_empty() {
        let (pool, queries) = zone_pool(&["www.example.com"]);
        let engine = Engine::new(pool, EngineConfig::default());

        let found = engine
            .run(
                "example.com",
                Mode::Passive,
                &CandidateSource::file("/nonexistent/wordlist.txt"),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert!(found.is_empty());
        assert!(queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_zero_depth_disables_expansion() {
        let (pool, queries) = zone_pool(&["app.example.com", "app1.example.com"]);
        let engine = Engine::new(pool, EngineConfig::default().max_depth(0));

        let found = engine
            .run(
                "example.com",
                Mode::Active,
                &CandidateSource::lines(["app"]),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(found.names().collect::<Vec<_>>(), vec!["app.example.com"]);
        assert_eq!(queries.lock().unwrap().len(), 1);
    }
}
