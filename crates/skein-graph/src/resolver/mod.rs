//! The incremental graph resolver.
//!
//! Walks the dependency graph breadth-first from the entry modules,
//! consulting the cache store and the transform chain per module, and emits
//! each finalized [`ModuleRecord`] as soon as its own reference list is
//! known. Given a cache seeded from a prior run plus the set of modules
//! whose source changed, it recomputes only those modules and reuses cached
//! reference lists and transform outputs for everything else; the emitted
//! graph is indistinguishable from a from-scratch resolution.
//!
//! # Invalidation policy
//!
//! Only modules named in the Changed-Set are re-transformed. Modules that
//! merely depend on a changed module keep their cached entry: a module's
//! reference list and transformed content are a function of its own source
//! alone. Callers whose transforms read *other* modules' content must
//! pre-expand the Changed-Set to cover the dependents: see
//! [`ResolveRequest::changed`].
//!
//! # Ordering
//!
//! Emission order is deterministic: breadth-first from the entries in the
//! order supplied, ties broken by reference order within each module.
//! Loading and transforming run concurrently up to the worker limit, but
//! every state mutation (visited set, queue, cache, emission) happens at a
//! single coordinating point, in sequence order.

mod paths;

pub use paths::{ReferenceResolver, RelativeResolver};

use std::collections::{BTreeMap, VecDeque};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;
use rustc_hash::FxHashSet;
use tokio::sync::mpsc;
use tokio::task::JoinSet;

use crate::cache::{CacheEntry, CacheStore};
use crate::extract::{ReferenceExtractor, RequireExtractor};
use crate::module_id::ModuleId;
use crate::record::ModuleRecord;
use crate::runtime::{Runtime, RuntimeError};
use crate::stats::ResolveStats;
use crate::transform::{TransformChain, TransformError};

/// Errors that abort a resolution run.
///
/// None of these are retried; the first failure terminates the record
/// stream. Cache entries written for modules finalized earlier in the run
/// survive: cache updates are per-module, not transactional.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// No entry modules were supplied.
    #[error("no entry modules supplied")]
    InvalidInput,

    /// An entry path could not be canonicalized to an existing module.
    #[error("failed to resolve entry '{path}'")]
    UnresolvableEntry {
        path: PathBuf,
        #[source]
        source: RuntimeError,
    },

    /// A reference could not be mapped to any module.
    #[error("failed to resolve reference '{specifier}' from '{from}'")]
    Unresolvable { specifier: String, from: ModuleId },

    /// A transform rejected a module's content.
    #[error("transform failed on '{module}'")]
    TransformFailed {
        module: ModuleId,
        #[source]
        source: TransformError,
    },

    /// A module's content could not be loaded, or probing the filesystem
    /// for one of its references failed.
    #[error("failed to load '{module}'")]
    Read {
        module: ModuleId,
        #[source]
        source: RuntimeError,
    },

    /// The caller cancelled the run before the walk finished.
    #[error("resolution cancelled")]
    Cancelled,

    /// A worker task died. Not expected in practice.
    #[error("internal resolver failure: {0}")]
    Internal(String),
}

/// Cancellation handle for an in-flight resolution.
///
/// Cancelling stops the coordinator from dispatching further work; in-flight
/// module jobs are abandoned and the stream terminates with
/// [`ResolveError::Cancelled`]. Cache writes already applied stay: they are
/// per-module and idempotent, so a later run picks up where this one left
/// off.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// Explicit per-run configuration: entries, Changed-Set, cache seed,
/// transform chain, tuning.
///
/// This is the whole input surface: there is no environment or global
/// state behind it.
#[derive(Debug, Clone)]
pub struct ResolveRequest {
    /// Entry files, walked in the order given.
    pub entries: Vec<PathBuf>,

    /// Modules whose raw source changed since the cache snapshot was taken.
    ///
    /// Consumed read-only. Paths are canonicalized before use; a path that
    /// no longer canonicalizes is dropped with a warning (it cannot name a
    /// live cache entry). **Contract**: "changed" means *this module's own
    /// source text changed*. If any transform's output can depend on other
    /// modules' content, expand this set to cover those dependents before
    /// calling: the resolver will not do it for you.
    pub changed: Vec<PathBuf>,

    /// Cache seeded empty (first run) or from a prior run's output. The run
    /// writes fresh entries back into it as modules finalize.
    pub cache: CacheStore,

    /// Ordered transform chain applied to each freshly resolved module.
    pub chain: TransformChain,

    /// Concurrent module-job limit. Defaults to the machine's logical CPU
    /// count.
    pub workers: usize,

    /// Cooperative cancellation signal.
    pub cancel: CancelToken,
}

impl ResolveRequest {
    pub fn new(entries: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        Self {
            entries: entries.into_iter().map(Into::into).collect(),
            changed: Vec::new(),
            cache: CacheStore::new(),
            chain: TransformChain::empty(),
            workers: num_cpus::get(),
            cancel: CancelToken::new(),
        }
    }

    #[must_use]
    pub fn with_changed(mut self, changed: impl IntoIterator<Item = impl Into<PathBuf>>) -> Self {
        self.changed = changed.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = cache;
        self
    }

    #[must_use]
    pub fn with_chain(mut self, chain: TransformChain) -> Self {
        self.chain = chain;
        self
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

/// The graph resolver: holds the pluggable seams, produces one
/// [`RecordStream`] per [`ResolveRequest`].
#[derive(Debug, Clone)]
pub struct Resolver {
    runtime: Arc<dyn Runtime>,
    extractor: Arc<dyn ReferenceExtractor>,
    references: Arc<dyn ReferenceResolver>,
}

impl Resolver {
    /// Resolver with the default extractor and path resolution.
    pub fn new(runtime: Arc<dyn Runtime>) -> Self {
        Self {
            runtime,
            extractor: Arc::new(RequireExtractor::new()),
            references: Arc::new(RelativeResolver::new()),
        }
    }

    /// Swap in a caller-supplied reference extractor.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<dyn ReferenceExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Swap in a caller-supplied specifier resolver.
    #[must_use]
    pub fn with_reference_resolver(mut self, references: Arc<dyn ReferenceResolver>) -> Self {
        self.references = references;
        self
    }

    /// Start a resolution run.
    ///
    /// Returns immediately; the walk executes on the runtime's task pool
    /// and the returned stream yields records as modules finalize. The
    /// stream is finite and not restartable: one sequence per invocation.
    pub fn resolve(&self, request: ResolveRequest) -> RecordStream {
        let capacity = request.workers.max(8);
        let (tx, rx) = mpsc::channel(capacity);
        let stats = Arc::new(Mutex::new(None));

        let run = Run {
            runtime: Arc::clone(&self.runtime),
            extractor: Arc::clone(&self.extractor),
            references: Arc::clone(&self.references),
            request,
            tx,
            stats: Arc::clone(&stats),
        };
        tokio::spawn(run.execute());

        RecordStream { rx, stats }
    }
}

/// Finite stream of finalized module records.
///
/// Yields `Err` at most once, as its final item; afterwards the stream is
/// exhausted. Consume incrementally: collecting defeats the bounded-memory
/// design unless you actually need the whole graph at once.
pub struct RecordStream {
    rx: mpsc::Receiver<Result<ModuleRecord, ResolveError>>,
    stats: Arc<Mutex<Option<ResolveStats>>>,
}

impl RecordStream {
    /// Next finalized record, or `None` when resolution has completed.
    pub async fn next(&mut self) -> Option<Result<ModuleRecord, ResolveError>> {
        self.rx.recv().await
    }

    /// Statistics for the run. `None` until the stream has ended.
    pub fn stats(&self) -> Option<ResolveStats> {
        *self.stats.lock()
    }

    /// Drain the stream into a vector. Test and small-graph convenience;
    /// prefer iterating [`next`](Self::next) for real consumers.
    pub async fn collect(mut self) -> Result<Vec<ModuleRecord>, ResolveError> {
        let mut records = Vec::new();
        while let Some(item) = self.next().await {
            records.push(item?);
        }
        Ok(records)
    }
}

/// Outcome of resolving one module, before finalization.
enum Outcome {
    /// Reused verbatim from the cache; no transform, no extraction.
    Cached { id: ModuleId, entry: CacheEntry },
    /// Freshly loaded, transformed, and extracted.
    Fresh {
        id: ModuleId,
        content: Arc<str>,
        references: IndexMap<String, ModuleId>,
    },
}

struct Run {
    runtime: Arc<dyn Runtime>,
    extractor: Arc<dyn ReferenceExtractor>,
    references: Arc<dyn ReferenceResolver>,
    request: ResolveRequest,
    tx: mpsc::Sender<Result<ModuleRecord, ResolveError>>,
    stats: Arc<Mutex<Option<ResolveStats>>>,
}

impl Run {
    async fn execute(self) {
        let mut stats = ResolveStats::default();
        let result = self.walk(&mut stats).await;

        if let Err(err) = result {
            // Receiver may already be gone; nothing more to do then.
            let _ = self.tx.send(Err(err)).await;
        }
        *self.stats.lock() = Some(stats);
    }

    /// Canonicalize the Changed-Set. Paths that no longer canonicalize are
    /// dropped: they cannot name a cache entry, and a deleted module that is
    /// still referenced will fail at its referencing edge instead.
    async fn canonical_changed(&self) -> FxHashSet<ModuleId> {
        let mut changed = FxHashSet::default();
        for path in &self.request.changed {
            match self.runtime.canonicalize(path).await {
                Ok(canonical) => match ModuleId::from_canonical(&canonical) {
                    Ok(id) => {
                        changed.insert(id);
                    }
                    Err(err) => {
                        tracing::warn!(path = %canonical.display(), %err, "skipping changed path");
                    }
                },
                Err(err) => {
                    tracing::warn!(path = %path.display(), %err, "skipping changed path");
                }
            }
        }
        changed
    }

    async fn walk(&self, stats: &mut ResolveStats) -> Result<(), ResolveError> {
        if self.request.entries.is_empty() {
            return Err(ResolveError::InvalidInput);
        }

        let changed = self.canonical_changed().await;
        let cache = &self.request.cache;
        let cancel = &self.request.cancel;
        let workers = self.request.workers.max(1);

        // Entry ids, canonicalized in the order supplied. Identity is the
        // canonical path, so duplicate entries collapse here.
        let mut visited: FxHashSet<ModuleId> = FxHashSet::default();
        let mut queue: VecDeque<ModuleId> = VecDeque::new();
        let mut entry_ids: FxHashSet<ModuleId> = FxHashSet::default();
        for path in &self.request.entries {
            let canonical = self.runtime.canonicalize(path).await.map_err(|source| {
                ResolveError::UnresolvableEntry {
                    path: path.clone(),
                    source,
                }
            })?;
            let id = ModuleId::from_canonical(&canonical).map_err(|e| {
                ResolveError::UnresolvableEntry {
                    path: path.clone(),
                    source: RuntimeError::Io {
                        path: canonical.clone(),
                        message: e.to_string(),
                    },
                }
            })?;
            entry_ids.insert(id.clone());
            if visited.insert(id.clone()) {
                queue.push_back(id);
            }
        }

        tracing::debug!(
            entries = entry_ids.len(),
            cached = cache.len(),
            changed = changed.len(),
            workers = self.request.workers,
            "starting resolution"
        );

        // Modules are dispatched in queue order and tagged with a sequence
        // number; completions are re-ordered so that emission, cache writes,
        // and child discovery happen exactly as a sequential BFS would do
        // them. Cache hits never leave the coordinator.
        let mut inflight: JoinSet<(u64, Result<Outcome, ResolveError>)> = JoinSet::new();
        let mut ready: BTreeMap<u64, Result<Outcome, ResolveError>> = BTreeMap::new();
        let mut next_seq: u64 = 0;
        let mut next_emit: u64 = 0;

        loop {
            if cancel.is_cancelled() {
                inflight.abort_all();
                return Err(ResolveError::Cancelled);
            }

            // Dispatch up to the worker limit.
            while inflight.len() < workers {
                let Some(id) = queue.pop_front() else { break };
                let seq = next_seq;
                next_seq += 1;

                match cache.get(&id) {
                    Some(entry) if !changed.contains(&id) => {
                        tracing::trace!(module = %id, "cache hit");
                        ready.insert(seq, Ok(Outcome::Cached { id, entry }));
                    }
                    _ => {
                        tracing::trace!(module = %id, "resolving fresh");
                        let job = FreshJob {
                            id,
                            runtime: Arc::clone(&self.runtime),
                            extractor: Arc::clone(&self.extractor),
                            references: Arc::clone(&self.references),
                            chain: self.request.chain.clone(),
                        };
                        inflight.spawn(async move { (seq, job.run().await) });
                    }
                }
            }

            // Finalize every completed module whose turn has come.
            while let Some(outcome) = ready.remove(&next_emit) {
                next_emit += 1;
                let outcome = outcome?;
                let record = match outcome {
                    Outcome::Cached { id, entry } => {
                        stats.cache_hits += 1;
                        ModuleRecord {
                            is_entry: entry_ids.contains(&id),
                            resolved_references: entry.resolved_references,
                            content: entry.content,
                            id,
                        }
                    }
                    Outcome::Fresh {
                        id,
                        content,
                        references,
                    } => {
                        stats.fresh += 1;
                        let record = ModuleRecord {
                            is_entry: entry_ids.contains(&id),
                            resolved_references: references,
                            content,
                            id: id.clone(),
                        };
                        // Overwrite the module's cache entry the moment it
                        // finalizes; a failure later in the run must not
                        // roll this back.
                        cache.insert(id, CacheEntry::from_record(&record));
                        record
                    }
                };

                for target in record.reference_targets() {
                    if visited.insert(target.clone()) {
                        queue.push_back(target.clone());
                    }
                }

                stats.modules += 1;
                if self.tx.send(Ok(record)).await.is_err() {
                    // Consumer dropped the stream; stop quietly.
                    inflight.abort_all();
                    return Ok(());
                }
            }

            if queue.is_empty() && inflight.is_empty() && ready.is_empty() {
                break;
            }

            // Nothing more to dispatch or finalize until a worker reports.
            if let Some(joined) = inflight.join_next().await {
                match joined {
                    Ok((seq, outcome)) => {
                        ready.insert(seq, outcome);
                    }
                    Err(err) => return Err(ResolveError::Internal(err.to_string())),
                }
            }
        }

        tracing::debug!(
            modules = stats.modules,
            cache_hits = stats.cache_hits,
            fresh = stats.fresh,
            "resolution complete"
        );
        Ok(())
    }
}

/// One fresh module job: load, transform, extract, resolve references.
/// Pure with respect to resolver state: all bookkeeping stays with the
/// coordinator.
struct FreshJob {
    id: ModuleId,
    runtime: Arc<dyn Runtime>,
    extractor: Arc<dyn ReferenceExtractor>,
    references: Arc<dyn ReferenceResolver>,
    chain: TransformChain,
}

impl FreshJob {
    async fn run(self) -> Result<Outcome, ResolveError> {
        let raw = self
            .runtime
            .read_to_string(self.id.as_path())
            .await
            .map_err(|source| ResolveError::Read {
                module: self.id.clone(),
                source,
            })?;

        let transformed =
            self.chain
                .apply(&self.id, raw)
                .map_err(|source| ResolveError::TransformFailed {
                    module: self.id.clone(),
                    source,
                })?;

        let specifiers = self.extractor.extract(&self.id, &transformed);

        let mut references: IndexMap<String, ModuleId> = IndexMap::new();
        for specifier in specifiers {
            if references.contains_key(&specifier) {
                continue;
            }
            let resolved = self
                .references
                .resolve(&specifier, &self.id, self.runtime.as_ref())
                .await
                .map_err(|source| ResolveError::Read {
                    module: self.id.clone(),
                    source,
                })?;
            let Some(path) = resolved else {
                return Err(ResolveError::Unresolvable {
                    specifier,
                    from: self.id.clone(),
                });
            };
            let target =
                ModuleId::from_canonical(&path).map_err(|_| ResolveError::Unresolvable {
                    specifier: specifier.clone(),
                    from: self.id.clone(),
                })?;
            references.insert(specifier, target);
        }

        Ok(Outcome::Fresh {
            id: self.id,
            content: Arc::from(transformed),
            references,
        })
    }
}
