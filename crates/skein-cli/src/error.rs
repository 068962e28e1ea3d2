//! CLI error type and exit-code mapping.

use std::path::PathBuf;

use skein_config::ConfigError;
use skein_graph::{EmitError, ResolveError, SnapshotError, TransformError, WriteStreamError};

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Bad invocation: missing entries, malformed flags.
    #[error("{0}")]
    Usage(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Emit(#[from] EmitError),

    #[error("cache snapshot '{path}': {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    #[error("failed to access '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<WriteStreamError> for CliError {
    fn from(err: WriteStreamError) -> Self {
        match err {
            WriteStreamError::Resolve(e) => Self::Resolve(e),
            WriteStreamError::Emit(e) => Self::Emit(e),
        }
    }
}

impl CliError {
    /// Process exit code: 2 for usage and configuration problems, 1 for
    /// everything that fails at run time.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Usage(_) | Self::Config(_) => 2,
            _ => 1,
        }
    }
}
