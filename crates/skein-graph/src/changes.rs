//! Content-hash change detection.
//!
//! Derives a Changed-Set for an incremental run by comparing blake3 hashes
//! of the current module sources against the hashes recorded in a prior
//! cache snapshot. This is a caller-side convenience: the resolver itself
//! only ever consumes an explicit Changed-Set.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::cache::CacheStore;
use crate::module_id::ModuleId;
use crate::runtime::Runtime;

/// Tracks per-module content hashes between runs.
#[derive(Debug, Clone, Default)]
pub struct ChangeDetector {
    /// blake3 hashes (hex) of raw module sources, keyed by module id.
    pub module_hashes: FxHashMap<ModuleId, String>,
}

/// Result of comparing stored hashes against the current tree.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    /// Modules whose content hash differs from the stored one.
    pub modified: Vec<ModuleId>,

    /// Modules hashed now but absent from the stored set.
    pub added: Vec<ModuleId>,

    /// Modules in the stored set whose file can no longer be read.
    pub removed: Vec<ModuleId>,
}

impl ChangeSet {
    pub fn has_changes(&self) -> bool {
        !self.modified.is_empty() || !self.added.is_empty() || !self.removed.is_empty()
    }
}

impl ChangeDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detector seeded from previously recorded hashes (a snapshot's
    /// `hashes` table).
    pub fn from_hashes(module_hashes: FxHashMap<ModuleId, String>) -> Self {
        Self { module_hashes }
    }

    /// Hash every module currently in `store` by reading its source.
    ///
    /// A module whose file cannot be read hashes to the empty string so a
    /// later scan flags it as removed rather than silently matching.
    pub async fn from_store(store: &CacheStore, runtime: &dyn Runtime) -> Self {
        let mut module_hashes = FxHashMap::default();
        for id in store.ids() {
            match runtime.read_file(id.as_path()).await {
                Ok(bytes) => {
                    module_hashes.insert(id, hash_content(&bytes));
                }
                Err(err) => {
                    tracing::warn!(module = %id, %err, "failed to hash module; treating as changed");
                    module_hashes.insert(id, String::new());
                }
            }
        }
        Self { module_hashes }
    }

    /// Compare stored hashes against `current` (id, hash) pairs.
    pub fn detect_changes(&self, current: &[(ModuleId, String)]) -> ChangeSet {
        let mut set = ChangeSet::default();

        for (id, hash) in current {
            match self.module_hashes.get(id) {
                Some(stored) if stored == hash => {}
                Some(_) => set.modified.push(id.clone()),
                None => set.added.push(id.clone()),
            }
        }

        let current_ids: FxHashSet<&ModuleId> = current.iter().map(|(id, _)| id).collect();
        for id in self.module_hashes.keys() {
            if !current_ids.contains(id) {
                set.removed.push(id.clone());
            }
        }
        set.removed.sort();

        set
    }

    /// Re-hash every stored module from the current tree and report the
    /// differences. Files that no longer read are reported as removed.
    pub async fn scan(&self, runtime: &dyn Runtime) -> ChangeSet {
        let mut current = Vec::with_capacity(self.module_hashes.len());
        let mut removed = Vec::new();
        for id in self.module_hashes.keys() {
            match runtime.read_file(id.as_path()).await {
                Ok(bytes) => current.push((id.clone(), hash_content(&bytes))),
                Err(_) => removed.push(id.clone()),
            }
        }

        let mut set = self.detect_changes(&current);
        set.removed = removed;
        set.removed.sort();
        set.modified.sort();
        set
    }
}

/// blake3 hash of raw content, hex-encoded.
pub fn hash_content(bytes: &[u8]) -> String {
    blake3::hash(bytes).to_hex().to_string()
}
