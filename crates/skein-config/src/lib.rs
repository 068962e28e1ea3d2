//! # skein-config
//!
//! Configuration for the skein resolver: the [`SkeinConfig`] structure, file
//! discovery, and figment-based loading.
//!
//! Configuration is an explicit value handed to the resolver's entry point -
//! there is no environment-variable plumbing and no global state. A config
//! file is optional; everything can be supplied on the command line, and CLI
//! flags win over file values.

mod config;
mod error;

pub use config::{CONFIG_BASENAMES, SkeinConfig, discover_config, load_config};
pub use error::{ConfigError, Result};
