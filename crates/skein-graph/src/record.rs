//! Finalized module records.

use std::sync::Arc;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::module_id::ModuleId;

/// One resolved module: its identity, the specifier → target-id mapping for
/// every reference it makes, and its transformed content.
///
/// Records are immutable once emitted. The `resolved_references` map keeps
/// the extractor's reference order: downstream consumers rely on it for
/// deterministic output, so it is an [`IndexMap`] rather than a hash map.
///
/// Content is `Arc`ed so a record and its cache entry share one allocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRecord {
    pub id: ModuleId,
    pub resolved_references: IndexMap<String, ModuleId>,
    #[serde(with = "arc_str_serde")]
    pub content: Arc<str>,
    pub is_entry: bool,
}

// Serde helper for Arc<str>
mod arc_str_serde {
    use std::sync::Arc;

    use serde::de::Deserializer;
    use serde::ser::Serializer;
    use serde::Deserialize;

    pub fn serialize<S>(value: &Arc<str>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(value)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Arc<str>, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Arc::from)
    }
}

impl ModuleRecord {
    /// Iterate over the reference targets in extraction order.
    pub fn reference_targets(&self) -> impl Iterator<Item = &ModuleId> {
        self.resolved_references.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(path: &str) -> ModuleId {
        ModuleId::from_canonical(path).unwrap()
    }

    #[test]
    fn wire_shape_uses_camel_case() {
        let mut refs = IndexMap::new();
        refs.insert("./a".to_string(), id("/srv/app/a.js"));
        let record = ModuleRecord {
            id: id("/srv/app/main.js"),
            resolved_references: refs,
            content: Arc::from("require('./a');"),
            is_entry: true,
        };

        let json: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], "/srv/app/main.js");
        assert_eq!(json["resolvedReferences"]["./a"], "/srv/app/a.js");
        assert_eq!(json["content"], "require('./a');");
        assert_eq!(json["isEntry"], true);
    }

    #[test]
    fn reference_order_is_preserved() {
        let mut refs = IndexMap::new();
        refs.insert("./z".to_string(), id("/srv/z.js"));
        refs.insert("./a".to_string(), id("/srv/a.js"));
        let record = ModuleRecord {
            id: id("/srv/main.js"),
            resolved_references: refs,
            content: Arc::from(""),
            is_entry: false,
        };

        let specifiers: Vec<_> = record.resolved_references.keys().cloned().collect();
        assert_eq!(specifiers, vec!["./z", "./a"]);

        let json = serde_json::to_string(&record).unwrap();
        let z = json.find("./z").unwrap();
        let a = json.find("./a").unwrap();
        assert!(z < a, "serialized map must keep extraction order");
    }
}
