//! # skein-graph
//!
//! Incremental module dependency graph resolver with partial cache reuse.
//!
//! Given one or more entry files, skein walks the transitive graph of
//! module references, applies an ordered chain of source-to-source
//! transforms to each discovered module, and emits the graph as a stream of
//! module records. On incremental runs it takes a cache from the previous
//! resolution plus the set of changed modules and recomputes only what the
//! changes require: the emitted graph is byte-for-byte the one a
//! from-scratch resolution would produce.
//!
//! ## Architecture
//!
//! ```text
//! entries ─┐
//! changed ─┤      ┌──────────────┐  load/transform/extract  ┌─────────┐
//! cache  ──┼────► │   Resolver   │ ◄──────────────────────► │ workers │
//! chain  ──┘      │ (coordinator)│                           └─────────┘
//!                 └──────┬───────┘
//!                        │ finalized ModuleRecords, BFS order
//!                        ▼
//!                 ┌──────────────┐
//!                 │ RecordStream │ ──► RecordWriter (JSONL / array)
//!                 └──────────────┘
//! ```
//!
//! The coordinator owns every piece of mutable state (visited set, work
//! queue, cache writes); workers only load, transform, and extract, up to a
//! configured concurrency limit. Emission order is the deterministic BFS
//! order regardless of how workers interleave.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use skein_graph::{NativeRuntime, Resolver, ResolveRequest};
//!
//! # async fn example() -> Result<(), skein_graph::ResolveError> {
//! let resolver = Resolver::new(Arc::new(NativeRuntime::new()));
//! let mut stream = resolver.resolve(ResolveRequest::new(["src/main.js"]));
//!
//! while let Some(record) = stream.next().await {
//!     let record = record?;
//!     println!("{} -> {} refs", record.id, record.resolved_references.len());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Incremental runs
//!
//! Keep the [`CacheStore`] from a finished run (or rebuild one from a
//! [`CacheSnapshot`]) and pass the set of changed files:
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use skein_graph::{NativeRuntime, Resolver, ResolveRequest, CacheStore};
//! # async fn example(cache: CacheStore) -> Result<(), skein_graph::ResolveError> {
//! let resolver = Resolver::new(Arc::new(NativeRuntime::new()));
//! let request = ResolveRequest::new(["src/main.js"])
//!     .with_cache(cache)
//!     .with_changed(["src/util.js"]);
//! let records = resolver.resolve(request).collect().await?;
//! # Ok(())
//! # }
//! ```
//!
//! Only the modules named as changed are re-transformed; everything else is
//! served from the cache. This is deliberately narrower than invalidating
//! the reverse-dependency closure: see [`ResolveRequest::changed`] for the
//! contract that makes it sound.

pub mod cache;
pub mod changes;
pub mod emit;
pub mod extract;
pub mod module_id;
pub mod record;
pub mod resolver;
pub mod runtime;
pub mod stats;
pub mod transform;

pub use cache::{CacheEntry, CacheSnapshot, CacheStore, SnapshotError};
pub use changes::{ChangeDetector, ChangeSet, hash_content};
pub use emit::{EmitError, EmitFormat, RecordWriter, WriteStreamError, write_stream};
pub use extract::{ReferenceExtractor, RequireExtractor};
pub use module_id::{ModuleId, ModuleIdError};
pub use record::ModuleRecord;
pub use resolver::{
    CancelToken, RecordStream, ReferenceResolver, RelativeResolver, ResolveError, ResolveRequest,
    Resolver,
};
pub use runtime::{Runtime, RuntimeError, RuntimeResult};
pub use stats::ResolveStats;
pub use transform::{
    Transform, TransformChain, TransformDescriptor, TransformError, TransformRegistry,
};

// Platform-specific runtime implementation
#[cfg(not(target_family = "wasm"))]
pub use runtime::native::NativeRuntime;

// Test utilities (available in test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils {
    pub use super::runtime::test_utils::*;
}
