//! The reference-extractor seam.
//!
//! Given a module's transformed content, an extractor produces the ordered
//! list of specifier strings the module references. The resolver treats it
//! as a pure function; any deterministic front-end works. The default
//! recognizes CommonJS `require` calls and static ESM `import`/`export from`
//! clauses, which covers the trees this tool is pointed at in practice.

use std::sync::LazyLock;

use regex::Regex;

use crate::module_id::ModuleId;

/// Extracts the ordered list of module references from content.
pub trait ReferenceExtractor: Send + Sync + std::fmt::Debug {
    /// Specifiers in order of appearance; duplicates allowed (the resolver
    /// keeps the first occurrence of each).
    fn extract(&self, id: &ModuleId, content: &str) -> Vec<String>;
}

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?x)
        \brequire\s*\(\s*["']([^"']+)["']\s*\)      # require("x")
        | \b(?:import|export)\b[^"';]*?\bfrom\s*["']([^"']+)["']  # import/export ... from "x"
        | \bimport\s*["']([^"']+)["']               # bare import "x"
        "#,
    )
    .expect("reference pattern compiles")
});

/// Default extractor: `require()` plus static ESM import/export clauses.
#[derive(Debug, Default, Clone, Copy)]
pub struct RequireExtractor;

impl RequireExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl ReferenceExtractor for RequireExtractor {
    fn extract(&self, _id: &ModuleId, content: &str) -> Vec<String> {
        REFERENCE_RE
            .captures_iter(content)
            .filter_map(|caps| {
                caps.get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str().to_string())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract(content: &str) -> Vec<String> {
        let id = ModuleId::from_canonical("/app/main.js").unwrap();
        RequireExtractor::new().extract(&id, content)
    }

    #[test]
    fn finds_require_calls() {
        let refs = extract("var a = require('./a');\nconst b = require(\"b\");");
        assert_eq!(refs, vec!["./a", "b"]);
    }

    #[test]
    fn finds_esm_imports() {
        let refs = extract(
            "import x from './x';\nimport { y } from \"./y\";\nimport './side-effect';\nexport { z } from './z';",
        );
        assert_eq!(refs, vec!["./x", "./y", "./side-effect", "./z"]);
    }

    #[test]
    fn preserves_order_of_appearance() {
        let refs = extract("require('./z');\nimport a from './a';\nrequire('./m');");
        assert_eq!(refs, vec!["./z", "./a", "./m"]);
    }

    #[test]
    fn keeps_duplicates_for_resolver_to_collapse() {
        let refs = extract("require('./a'); require('./a');");
        assert_eq!(refs, vec!["./a", "./a"]);
    }

    #[test]
    fn ignores_unquoted_or_dynamic_arguments() {
        let refs = extract("require(name);\nconst p = 'no ref here';");
        assert!(refs.is_empty());
    }
}
