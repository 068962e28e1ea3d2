//! The transform chain seam.
//!
//! Transforms are opaque source-to-source functions sequenced by the
//! resolver: each maps `(module id, content)` to new content, and the chain
//! applies them in order once per freshly resolved module, before reference
//! extraction. The resolver assumes a transform's output depends only on the
//! module's own content: see [`crate::resolver::ResolveRequest::changed`]
//! for the invalidation contract that assumption carries.
//!
//! There is deliberately no process-global registry. Callers build a
//! [`TransformRegistry`] value, register factories on it, and materialize a
//! [`TransformChain`] from an ordered list of [`TransformDescriptor`]s per
//! resolution call.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::module_id::ModuleId;

/// Errors raised by transforms or the registry that materializes them.
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// The transform rejected the module's content.
    #[error("transform '{transform}' failed: {message}")]
    Failed { transform: String, message: String },

    /// No factory registered under the requested name.
    #[error("unknown transform '{0}'")]
    Unknown(String),

    /// A factory rejected its options payload.
    #[error("invalid options for transform '{transform}': {message}")]
    InvalidOptions { transform: String, message: String },
}

impl TransformError {
    /// Convenience constructor for transform implementations.
    pub fn failed(transform: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Failed {
            transform: transform.into(),
            message: message.to_string(),
        }
    }
}

/// A single source-to-source transform.
///
/// Implementations must be pure with respect to the module's own content:
/// same `(id, content)` in, same content out, no inspection of other
/// modules.
pub trait Transform: Send + Sync + fmt::Debug {
    /// Stable name, used in error reporting and descriptors.
    fn name(&self) -> &str;

    /// Map the module's content to its transformed form.
    fn apply(&self, id: &ModuleId, content: &str) -> Result<String, TransformError>;
}

/// Name + options pair describing one transform to instantiate.
///
/// This is the explicit, caller-supplied replacement for the global mutable
/// transform registration the original scripts carried in the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformDescriptor {
    pub name: String,
    #[serde(default)]
    pub options: Value,
}

impl TransformDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Value::Null,
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: Value) -> Self {
        self.options = options;
        self
    }
}

/// Factory producing a transform from its JSON options.
pub type TransformFactory =
    Box<dyn Fn(&Value) -> Result<Arc<dyn Transform>, TransformError> + Send + Sync>;

/// Explicit mapping from transform names to factories.
#[derive(Default)]
pub struct TransformRegistry {
    factories: Vec<(String, TransformFactory)>,
}

impl TransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory under `name`. Later registrations shadow earlier
    /// ones.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: impl Fn(&Value) -> Result<Arc<dyn Transform>, TransformError> + Send + Sync + 'static,
    ) {
        self.factories.push((name.into(), Box::new(factory)));
    }

    /// Whether a factory is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.factories.iter().any(|(n, _)| n == name)
    }

    /// Registered names, in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.iter().map(|(n, _)| n.as_str())
    }

    /// Materialize an ordered chain from descriptors.
    ///
    /// # Errors
    ///
    /// [`TransformError::Unknown`] for an unregistered name, or whatever the
    /// factory raises for bad options.
    pub fn build_chain(
        &self,
        descriptors: &[TransformDescriptor],
    ) -> Result<TransformChain, TransformError> {
        let mut transforms = Vec::with_capacity(descriptors.len());
        for descriptor in descriptors {
            let factory = self
                .factories
                .iter()
                .rev()
                .find(|(n, _)| *n == descriptor.name)
                .map(|(_, f)| f)
                .ok_or_else(|| TransformError::Unknown(descriptor.name.clone()))?;
            transforms.push(factory(&descriptor.options)?);
        }
        Ok(TransformChain::new(transforms))
    }
}

impl fmt::Debug for TransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Ordered sequence of transforms applied once per freshly resolved module.
#[derive(Debug, Clone, Default)]
pub struct TransformChain {
    transforms: Vec<Arc<dyn Transform>>,
}

impl TransformChain {
    pub fn new(transforms: Vec<Arc<dyn Transform>>) -> Self {
        Self { transforms }
    }

    /// Chain that passes content through untouched.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// Run every transform in order over `content`.
    ///
    /// # Errors
    ///
    /// Stops at the first failing transform and returns its error; content
    /// produced by earlier transforms in the chain is discarded.
    pub fn apply(&self, id: &ModuleId, content: String) -> Result<String, TransformError> {
        let mut current = content;
        for transform in &self.transforms {
            current = transform.apply(id, &current)?;
        }
        Ok(current)
    }
}
