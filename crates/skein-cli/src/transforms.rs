//! Built-in transforms and the registry the CLI hands to the resolver.
//!
//! Real pipelines plug in their own compilers through the library seam;
//! these two cover the common cases of stamping output and mechanical
//! rewriting, and give `probe` something honest to report on.

use std::sync::Arc;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use skein_graph::{ModuleId, Transform, TransformError, TransformRegistry};

/// Registry with every built-in transform registered.
pub fn builtin_registry() -> TransformRegistry {
    let mut registry = TransformRegistry::new();
    registry.register("banner", |options| BannerTransform::from_options(options));
    registry.register("replace", |options| ReplaceTransform::from_options(options));
    registry
}

#[derive(Debug, Deserialize)]
struct BannerOptions {
    text: String,
}

/// Prepends a comment banner to every module.
#[derive(Debug)]
pub struct BannerTransform {
    banner: String,
}

impl BannerTransform {
    fn from_options(options: &Value) -> Result<Arc<dyn Transform>, TransformError> {
        let opts: BannerOptions =
            serde_json::from_value(options.clone()).map_err(|e| TransformError::InvalidOptions {
                transform: "banner".to_string(),
                message: e.to_string(),
            })?;
        Ok(Arc::new(Self {
            banner: format!("/* {} */\n", opts.text),
        }))
    }
}

impl Transform for BannerTransform {
    fn name(&self) -> &str {
        "banner"
    }

    fn apply(&self, _id: &ModuleId, content: &str) -> Result<String, TransformError> {
        Ok(format!("{}{content}", self.banner))
    }
}

#[derive(Debug, Deserialize)]
struct ReplaceOptions {
    pattern: String,
    replacement: String,
}

/// Regex search-and-replace over module content.
#[derive(Debug)]
pub struct ReplaceTransform {
    pattern: Regex,
    replacement: String,
}

impl ReplaceTransform {
    fn from_options(options: &Value) -> Result<Arc<dyn Transform>, TransformError> {
        let opts: ReplaceOptions =
            serde_json::from_value(options.clone()).map_err(|e| TransformError::InvalidOptions {
                transform: "replace".to_string(),
                message: e.to_string(),
            })?;
        let pattern = Regex::new(&opts.pattern).map_err(|e| TransformError::InvalidOptions {
            transform: "replace".to_string(),
            message: e.to_string(),
        })?;
        Ok(Arc::new(Self {
            pattern,
            replacement: opts.replacement,
        }))
    }
}

impl Transform for ReplaceTransform {
    fn name(&self) -> &str {
        "replace"
    }

    fn apply(&self, _id: &ModuleId, content: &str) -> Result<String, TransformError> {
        Ok(self
            .pattern
            .replace_all(content, self.replacement.as_str())
            .into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skein_graph::TransformDescriptor;

    fn id() -> ModuleId {
        ModuleId::from_canonical("/app/a.js").unwrap()
    }

    #[test]
    fn banner_prepends_its_text() {
        let registry = builtin_registry();
        let chain = registry
            .build_chain(&[
                TransformDescriptor::new("banner").with_options(json!({"text": "skein"}))
            ])
            .unwrap();
        let out = chain.apply(&id(), "code;".to_string()).unwrap();
        assert_eq!(out, "/* skein */\ncode;");
    }

    #[test]
    fn replace_rewrites_matches() {
        let registry = builtin_registry();
        let chain = registry
            .build_chain(&[TransformDescriptor::new("replace")
                .with_options(json!({"pattern": "__ENV__", "replacement": "production"}))])
            .unwrap();
        let out = chain.apply(&id(), "var env = '__ENV__';".to_string()).unwrap();
        assert_eq!(out, "var env = 'production';");
    }

    #[test]
    fn banner_requires_text_option() {
        let registry = builtin_registry();
        let err = registry
            .build_chain(&[TransformDescriptor::new("banner")])
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidOptions { .. }));
    }

    #[test]
    fn replace_rejects_a_bad_pattern() {
        let registry = builtin_registry();
        let err = registry
            .build_chain(&[TransformDescriptor::new("replace")
                .with_options(json!({"pattern": "(", "replacement": ""}))])
            .unwrap_err();
        assert!(matches!(err, TransformError::InvalidOptions { .. }));
    }

    #[test]
    fn registry_knows_its_builtins() {
        let registry = builtin_registry();
        assert!(registry.contains("banner"));
        assert!(registry.contains("replace"));
        assert!(!registry.contains("coffeeify"));
    }
}
