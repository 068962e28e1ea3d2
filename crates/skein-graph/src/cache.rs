//! The cache store: previously finalized reference lists and transform
//! outputs, keyed by module id.
//!
//! The store carries no staleness information of its own: whether an entry
//! may be reused is decided entirely by the resolver against the caller's
//! Changed-Set. Entries are never evicted within a run; cross-run retention
//! is the caller's business (the store serializes to a [`CacheSnapshot`]
//! for that).
//!
//! `CacheStore` is a cheaply clonable handle over shared state, the same
//! shape the rest of this workspace uses for graph-like containers. During
//! a resolution run only the resolver's coordinator writes to it.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::module_id::ModuleId;
use crate::record::ModuleRecord;

/// A previously finalized module: its resolved reference list and
/// transformed content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    pub resolved_references: IndexMap<String, ModuleId>,
    #[serde(with = "content_serde")]
    pub content: Arc<str>,
}

mod content_serde {
    use std::sync::Arc;

    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::Deserialize;

    pub fn serialize<S: Serializer>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Arc<str>, D::Error> {
        String::deserialize(deserializer).map(Arc::from)
    }
}

impl CacheEntry {
    /// Entry for a record finalized this run. Shares the record's content
    /// allocation.
    pub fn from_record(record: &ModuleRecord) -> Self {
        Self {
            resolved_references: record.resolved_references.clone(),
            content: Arc::clone(&record.content),
        }
    }
}

/// Mapping from module id to cache entry, shared between the caller and one
/// resolution run at a time.
#[derive(Debug, Clone, Default)]
pub struct CacheStore {
    inner: Arc<RwLock<FxHashMap<ModuleId, CacheEntry>>>,
}

impl CacheStore {
    /// Empty store for a first run.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &ModuleId) -> Option<CacheEntry> {
        self.inner.read().get(id).cloned()
    }

    pub fn insert(&self, id: ModuleId, entry: CacheEntry) {
        self.inner.write().insert(id, entry);
    }

    pub fn contains(&self, id: &ModuleId) -> bool {
        self.inner.read().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    /// All cached ids, unordered.
    pub fn ids(&self) -> Vec<ModuleId> {
        self.inner.read().keys().cloned().collect()
    }

    /// Snapshot the current contents for persistence, attaching the given
    /// content hashes (may be empty when the caller does not track them).
    pub fn to_snapshot(&self, hashes: FxHashMap<ModuleId, String>) -> CacheSnapshot {
        CacheSnapshot {
            format_version: CacheSnapshot::FORMAT_VERSION,
            modules: self
                .inner
                .read()
                .iter()
                .map(|(id, entry)| (id.clone(), entry.clone()))
                .collect(),
            hashes,
        }
    }

    /// Seed a store from a prior run's snapshot.
    ///
    /// # Errors
    ///
    /// Rejects snapshots written by an incompatible format version.
    pub fn from_snapshot(snapshot: CacheSnapshot) -> Result<Self, SnapshotError> {
        if snapshot.format_version != CacheSnapshot::FORMAT_VERSION {
            return Err(SnapshotError::IncompatibleVersion {
                expected: CacheSnapshot::FORMAT_VERSION,
                found: snapshot.format_version,
            });
        }
        let mut map = FxHashMap::default();
        map.extend(snapshot.modules);
        Ok(Self {
            inner: Arc::new(RwLock::new(map)),
        })
    }
}

/// Serialized form of a cache store, plus the content hashes change
/// detection needs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Incremented when the snapshot shape changes; incompatible versions
    /// are rejected rather than misread.
    pub format_version: u32,
    pub modules: FxHashMap<ModuleId, CacheEntry>,
    /// blake3 content hashes (hex) of the raw module sources at snapshot
    /// time. Empty when the producer did not hash.
    #[serde(default)]
    pub hashes: FxHashMap<ModuleId, String>,
}

impl CacheSnapshot {
    pub const FORMAT_VERSION: u32 = 1;

    /// Parse a snapshot from JSON.
    pub fn from_json(bytes: &[u8]) -> Result<Self, SnapshotError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Serialize to JSON for persistence.
    pub fn to_json(&self) -> Result<Vec<u8>, SnapshotError> {
        Ok(serde_json::to_vec(self)?)
    }
}

/// Errors loading or saving a cache snapshot.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("incompatible cache snapshot version: expected {expected}, found {found}")]
    IncompatibleVersion { expected: u32, found: u32 },

    #[error("malformed cache snapshot: {0}")]
    Json(#[from] serde_json::Error),
}
