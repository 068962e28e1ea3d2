//! Platform runtime abstraction.
//!
//! The resolver never touches the filesystem directly: it goes through the
//! [`Runtime`] trait so tests can swap in an in-memory tree (including
//! simulated symlinks) and embedders can supply virtual module sources.
//!
//! Canonicalization lives here because module identity is defined as the
//! symlink-resolved absolute path; it is a required normalization step
//! before any id comparison and must not be skipped.

#[cfg(not(target_family = "wasm"))]
pub mod native;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Result type for runtime operations
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Errors that can occur during runtime operations
#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    /// File not found
    #[error("file not found: {0}")]
    FileNotFound(PathBuf),

    /// File exists but is not valid UTF-8 module source
    #[error("file is not valid UTF-8: {0}")]
    NonUtf8(PathBuf),

    /// I/O error
    #[error("I/O error on '{path}': {message}")]
    Io { path: PathBuf, message: String },
}

impl RuntimeError {
    pub(crate) fn io(path: &Path, err: &std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::NotFound {
            Self::FileNotFound(path.to_path_buf())
        } else {
            Self::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            }
        }
    }
}

/// Platform runtime trait.
///
/// Implementations must be cheap to share (`Arc<dyn Runtime>`) and safe to
/// call from concurrently running worker tasks.
#[async_trait]
pub trait Runtime: Send + Sync + std::fmt::Debug {
    /// Read a file's raw bytes.
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>>;

    /// Resolve a path to its canonical form: absolute, `.`/`..`-free, with
    /// every symlink followed.
    async fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf>;

    /// Check if a path exists (after following symlinks).
    async fn exists(&self, path: &Path) -> bool;

    /// Check if a path names a regular file (after following symlinks).
    /// Directories are not modules; specifier probing uses this.
    async fn is_file(&self, path: &Path) -> bool;

    /// Read a file as UTF-8 module source.
    async fn read_to_string(&self, path: &Path) -> RuntimeResult<String> {
        let bytes = self.read_file(path).await?;
        String::from_utf8(bytes).map_err(|_| RuntimeError::NonUtf8(path.to_path_buf()))
    }
}
