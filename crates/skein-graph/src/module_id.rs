//! Canonical module identity.
//!
//! A [`ModuleId`] is the deduplication key for the whole graph: the
//! symlink-resolved, absolute path of a module. Two references that
//! canonicalize to the same path are the same node, so every identity
//! comparison and map key in this crate goes through this type.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// Errors raised when constructing a [`ModuleId`].
#[derive(Debug, thiserror::Error)]
pub enum ModuleIdError {
    /// The path is not absolute. Canonicalization must happen before an id
    /// is formed; a relative path here means a caller skipped it.
    #[error("module id requires an absolute path, got '{0}'")]
    NotAbsolute(PathBuf),

    /// The path is not valid UTF-8 and cannot appear in record output.
    #[error("module path is not valid UTF-8: '{0}'")]
    NonUtf8(PathBuf),
}

/// Canonical (symlink-resolved, absolute) identity of a module.
///
/// Construction is restricted to paths that are already canonical: use
/// [`Runtime::canonicalize`](crate::runtime::Runtime::canonicalize) to get
/// one. The inner string is `Arc`ed so ids clone cheaply across the
/// resolver's queue, cache, and records.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(Arc<str>);

impl ModuleId {
    /// Wrap an already-canonical absolute path.
    ///
    /// # Errors
    ///
    /// Returns [`ModuleIdError::NotAbsolute`] for relative paths and
    /// [`ModuleIdError::NonUtf8`] for paths that cannot be represented as
    /// UTF-8.
    pub fn from_canonical(path: impl AsRef<Path>) -> Result<Self, ModuleIdError> {
        let path = path.as_ref();
        if !path.is_absolute() {
            return Err(ModuleIdError::NotAbsolute(path.to_path_buf()));
        }
        let s = path
            .to_str()
            .ok_or_else(|| ModuleIdError::NonUtf8(path.to_path_buf()))?;
        Ok(Self(Arc::from(s)))
    }

    /// The id as a path.
    pub fn as_path(&self) -> &Path {
        Path::new(self.0.as_ref())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<Path> for ModuleId {
    fn as_ref(&self) -> &Path {
        self.as_path()
    }
}
