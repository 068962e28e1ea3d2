//! Specifier → canonical path resolution.
//!
//! Maps the specifier strings an extractor produces onto files, then
//! canonicalizes the winner so the rest of the resolver only ever sees
//! canonical identities. Pluggable: embedders with their own module layout
//! implement [`ReferenceResolver`].

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use path_clean::PathClean;

use crate::module_id::ModuleId;
use crate::runtime::{Runtime, RuntimeResult};

/// Resolves one specifier, relative to the referencing module, to the
/// canonical path of an existing file.
///
/// `Ok(None)` means "no such module": the resolver turns it into a hard
/// `Unresolvable` failure. `Err` is reserved for I/O trouble while probing.
#[async_trait]
pub trait ReferenceResolver: Send + Sync + std::fmt::Debug {
    async fn resolve(
        &self,
        specifier: &str,
        from: &ModuleId,
        runtime: &dyn Runtime,
    ) -> RuntimeResult<Option<PathBuf>>;
}

/// Default resolver: relative and absolute file paths with extension and
/// index-file fallback.
///
/// Bare specifiers (`"a"`) are treated like `"./a"`: resolved against the
/// referencing module's directory.
#[derive(Debug, Clone)]
pub struct RelativeResolver {
    extensions: Vec<String>,
    index_file: String,
}

impl Default for RelativeResolver {
    fn default() -> Self {
        Self {
            extensions: ["js", "mjs", "cjs", "json"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            index_file: "index".to_string(),
        }
    }
}

impl RelativeResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the extension candidates tried, in order.
    #[must_use]
    pub fn with_extensions(mut self, extensions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }

    /// Try `candidate` as-is, then with each extension appended, then as a
    /// directory holding an index file. Only regular files count: a bare
    /// directory is never a module.
    async fn probe(&self, candidate: &Path, runtime: &dyn Runtime) -> RuntimeResult<Option<PathBuf>> {
        if runtime.is_file(candidate).await {
            return Ok(Some(runtime.canonicalize(candidate).await?));
        }

        for ext in &self.extensions {
            let with_ext = append_extension(candidate, ext);
            if runtime.is_file(&with_ext).await {
                return Ok(Some(runtime.canonicalize(&with_ext).await?));
            }
        }

        for ext in &self.extensions {
            let index = candidate.join(format!("{}.{ext}", self.index_file));
            if runtime.is_file(&index).await {
                return Ok(Some(runtime.canonicalize(&index).await?));
            }
        }

        Ok(None)
    }
}

#[async_trait]
impl ReferenceResolver for RelativeResolver {
    async fn resolve(
        &self,
        specifier: &str,
        from: &ModuleId,
        runtime: &dyn Runtime,
    ) -> RuntimeResult<Option<PathBuf>> {
        let candidate = if Path::new(specifier).is_absolute() {
            PathBuf::from(specifier).clean()
        } else {
            let base = from.as_path().parent().unwrap_or_else(|| Path::new("/"));
            base.join(specifier).clean()
        };

        self.probe(&candidate, runtime).await
    }
}

/// `foo` + `js` → `foo.js`, keeping any existing suffix (`foo.min` →
/// `foo.min.js`).
fn append_extension(path: &Path, ext: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(".");
    s.push(ext);
    PathBuf::from(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::test_utils::TestRuntime;

    fn from_id() -> ModuleId {
        ModuleId::from_canonical("/app/src/main.js").unwrap()
    }

    #[tokio::test]
    async fn resolves_exact_relative_path() {
        let runtime = TestRuntime::new().with_file("/app/src/a.js", "");
        let resolver = RelativeResolver::new();
        let resolved = resolver
            .resolve("./a.js", &from_id(), &runtime)
            .await
            .unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/app/src/a.js")));
    }

    #[tokio::test]
    async fn falls_back_to_extensions_in_order() {
        let runtime = TestRuntime::new().with_file("/app/src/a.js", "");
        let resolver = RelativeResolver::new();
        let resolved = resolver.resolve("./a", &from_id(), &runtime).await.unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/app/src/a.js")));
    }

    #[tokio::test]
    async fn bare_specifier_resolves_like_relative() {
        let runtime = TestRuntime::new().with_file("/app/src/a.js", "");
        let resolver = RelativeResolver::new();
        let resolved = resolver.resolve("a", &from_id(), &runtime).await.unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/app/src/a.js")));
    }

    #[tokio::test]
    async fn directory_resolves_to_index_file() {
        let runtime = TestRuntime::new().with_file("/app/src/lib/index.js", "");
        let resolver = RelativeResolver::new();
        let resolved = resolver
            .resolve("./lib", &from_id(), &runtime)
            .await
            .unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/app/src/lib/index.js")));
    }

    #[tokio::test]
    async fn parent_segments_are_cleaned() {
        let runtime = TestRuntime::new().with_file("/app/shared.js", "");
        let resolver = RelativeResolver::new();
        let resolved = resolver
            .resolve("../shared", &from_id(), &runtime)
            .await
            .unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/app/shared.js")));
    }

    #[tokio::test]
    async fn missing_module_is_none_not_error() {
        let runtime = TestRuntime::new();
        let resolver = RelativeResolver::new();
        let resolved = resolver
            .resolve("./ghost", &from_id(), &runtime)
            .await
            .unwrap();
        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn symlinked_target_canonicalizes_to_real_path() {
        let runtime = TestRuntime::new()
            .with_file("/app/src/real.js", "")
            .with_link("/app/src/alias.js", "/app/src/real.js");
        let resolver = RelativeResolver::new();
        let resolved = resolver
            .resolve("./alias.js", &from_id(), &runtime)
            .await
            .unwrap();
        assert_eq!(resolved, Some(PathBuf::from("/app/src/real.js")));
    }
}
