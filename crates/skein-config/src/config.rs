//! The `SkeinConfig` structure and file loading.

use std::path::{Path, PathBuf};

use figment::Figment;
use figment::providers::{Format, Json, Serialized, Toml};
use serde::{Deserialize, Serialize};

use skein_graph::TransformDescriptor;

use crate::error::{ConfigError, Result};

/// File names probed, in order, when no explicit config path is given.
pub const CONFIG_BASENAMES: &[&str] = &["skein.toml", "skein.json"];

/// Resolver configuration as read from a config file.
///
/// Everything here can also be expressed as CLI flags; flags override file
/// values field by field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SkeinConfig {
    /// Entry files, walked in order.
    pub entries: Vec<PathBuf>,

    /// Ordered transform chain, by descriptor.
    pub transforms: Vec<TransformDescriptor>,

    /// Cache snapshot file read before the run and rewritten after it.
    pub cache: Option<PathBuf>,

    /// Concurrent module-job limit.
    pub workers: Option<usize>,

    /// Output framing: "jsonl" (default) or "array".
    pub format: Option<String>,
}

impl SkeinConfig {
    /// Check values figment cannot: ranges and enumerations.
    pub fn validate(&self) -> Result<()> {
        if self.workers == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "workers".to_string(),
                hint: "must be at least 1".to_string(),
            });
        }
        if let Some(format) = &self.format {
            if format.parse::<skein_graph::EmitFormat>().is_err() {
                return Err(ConfigError::InvalidValue {
                    field: "format".to_string(),
                    hint: format!("'{format}' is not one of: jsonl, array"),
                });
            }
        }
        Ok(())
    }
}

/// Find a config file in `dir` by probing [`CONFIG_BASENAMES`].
pub fn discover_config(dir: &Path) -> Option<PathBuf> {
    CONFIG_BASENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Load configuration from `path`, or return defaults when `path` is
/// `None` and nothing is discovered in the current directory.
///
/// # Errors
///
/// An explicitly named file must exist and parse; a discovered file must
/// parse. Validation errors surface as [`ConfigError::InvalidValue`].
pub fn load_config(path: Option<&Path>) -> Result<SkeinConfig> {
    let resolved = match path {
        Some(explicit) => {
            if !explicit.is_file() {
                return Err(ConfigError::NotFound(explicit.to_path_buf()));
            }
            Some(explicit.to_path_buf())
        }
        None => discover_config(Path::new(".")),
    };

    let Some(file) = resolved else {
        return Ok(SkeinConfig::default());
    };

    tracing::debug!(path = %file.display(), "loading config file");

    let figment = Figment::from(Serialized::defaults(SkeinConfig::default()));
    let figment = match file.extension().and_then(|e| e.to_str()) {
        Some("toml") => figment.merge(Toml::file(&file)),
        Some("json") => figment.merge(Json::file(&file)),
        other => {
            return Err(ConfigError::UnsupportedFormat {
                path: file.clone(),
                extension: other.unwrap_or("").to_string(),
            });
        }
    };

    let config: SkeinConfig = figment.extract()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_empty() {
        let config = SkeinConfig::default();
        assert!(config.entries.is_empty());
        assert!(config.transforms.is_empty());
        assert!(config.cache.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_workers_fails_validation() {
        let config = SkeinConfig {
            workers: Some(0),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field, .. }) if field == "workers"
        ));
    }

    #[test]
    fn unknown_format_fails_validation() {
        let config = SkeinConfig {
            format: Some("yaml".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
