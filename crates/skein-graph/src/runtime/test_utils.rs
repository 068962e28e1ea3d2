//! In-memory runtime for tests.
//!
//! Holds a virtual file tree plus a link table that stands in for symlinks,
//! so identity/deduplication behavior can be exercised without touching the
//! real filesystem.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::RwLock;
use path_clean::PathClean;
use rustc_hash::FxHashMap;

use super::{Runtime, RuntimeError, RuntimeResult};

/// Virtual filesystem runtime.
///
/// ```rust
/// use skein_graph::test_utils::TestRuntime;
///
/// let runtime = TestRuntime::new()
///     .with_file("/app/main.js", "require('./a');")
///     .with_file("/app/a.js", "")
///     .with_link("/app/alias.js", "/app/a.js");
/// ```
#[derive(Debug, Default)]
pub struct TestRuntime {
    inner: RwLock<Tree>,
}

#[derive(Debug, Default)]
struct Tree {
    files: FxHashMap<PathBuf, Vec<u8>>,
    links: FxHashMap<PathBuf, PathBuf>,
}

impl TestRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file at an absolute virtual path.
    #[must_use]
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) -> Self {
        self.inner.write().files.insert(path.into(), content.into());
        self
    }

    /// Add a symlink-like alias: reads and canonicalization of `link`
    /// resolve to `target`.
    #[must_use]
    pub fn with_link(self, link: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        self.inner.write().links.insert(link.into(), target.into());
        self
    }

    /// Replace a file's content in place (for change-detection tests).
    pub fn update_file(&self, path: impl Into<PathBuf>, content: impl Into<Vec<u8>>) {
        self.inner.write().files.insert(path.into(), content.into());
    }

    fn resolve_links(&self, path: &Path) -> PathBuf {
        let cleaned = path.to_path_buf().clean();
        let tree = self.inner.read();
        let mut current = cleaned;
        // Follow the link table to a fixed point; test trees are tiny and
        // never contain link cycles.
        for _ in 0..32 {
            match tree.links.get(&current) {
                Some(target) => current = target.clone().clean(),
                None => break,
            }
        }
        current
    }
}

#[async_trait]
impl Runtime for TestRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        let resolved = self.resolve_links(path);
        self.inner
            .read()
            .files
            .get(&resolved)
            .cloned()
            .ok_or_else(|| RuntimeError::FileNotFound(path.to_path_buf()))
    }

    async fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        let resolved = self.resolve_links(path);
        if !resolved.is_absolute() {
            return Err(RuntimeError::Io {
                path: path.to_path_buf(),
                message: "cannot canonicalize relative path".to_string(),
            });
        }
        if self.inner.read().files.contains_key(&resolved) {
            Ok(resolved)
        } else {
            Err(RuntimeError::FileNotFound(path.to_path_buf()))
        }
    }

    async fn exists(&self, path: &Path) -> bool {
        let resolved = self.resolve_links(path);
        self.inner.read().files.contains_key(&resolved)
    }

    async fn is_file(&self, path: &Path) -> bool {
        // The virtual tree only holds files; existence implies file-ness.
        self.exists(path).await
    }
}
