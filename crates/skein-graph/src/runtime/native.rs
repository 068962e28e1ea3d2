//! Native filesystem runtime backed by `tokio::fs`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use super::{Runtime, RuntimeError, RuntimeResult};

/// Runtime that reads the real filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct NativeRuntime;

impl NativeRuntime {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Runtime for NativeRuntime {
    async fn read_file(&self, path: &Path) -> RuntimeResult<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| RuntimeError::io(path, &e))
    }

    async fn canonicalize(&self, path: &Path) -> RuntimeResult<PathBuf> {
        tokio::fs::canonicalize(path)
            .await
            .map_err(|e| RuntimeError::io(path, &e))
    }

    async fn exists(&self, path: &Path) -> bool {
        tokio::fs::metadata(path).await.is_ok()
    }

    async fn is_file(&self, path: &Path) -> bool {
        tokio::fs::metadata(path)
            .await
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_and_canonicalizes_real_files() {
        let temp = tempfile::TempDir::new().unwrap();
        let file = temp.path().join("mod.js");
        std::fs::write(&file, "module.exports = 1;").unwrap();

        let runtime = NativeRuntime::new();
        assert!(runtime.exists(&file).await);
        let content = runtime.read_to_string(&file).await.unwrap();
        assert_eq!(content, "module.exports = 1;");

        let canonical = runtime.canonicalize(&file).await.unwrap();
        assert!(canonical.is_absolute());
    }

    #[tokio::test]
    async fn missing_file_maps_to_not_found() {
        let runtime = NativeRuntime::new();
        let err = runtime
            .read_file(Path::new("/no/such/skein/file.js"))
            .await
            .unwrap_err();
        assert!(matches!(err, RuntimeError::FileNotFound(_)));
    }
}
