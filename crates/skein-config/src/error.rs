//! Configuration errors.

use std::path::PathBuf;

/// Result type alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The named config file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),

    /// The file exists but has an extension no provider handles.
    #[error("unsupported config format '{extension}' for {path}")]
    UnsupportedFormat { path: PathBuf, extension: String },

    /// Figment failed to parse or merge the file.
    #[error("invalid configuration: {0}")]
    Invalid(#[from] figment::Error),

    /// A value parsed but fails validation.
    #[error("invalid value for '{field}': {hint}")]
    InvalidValue { field: String, hint: String },
}
