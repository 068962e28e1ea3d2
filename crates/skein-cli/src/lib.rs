//! # skein-cli
//!
//! Command-line front end for the skein resolver. Parses arguments, sets up
//! logging, and dispatches to the `resolve` and `probe` commands.

pub mod cli;
pub mod commands;
pub mod error;
pub mod logger;
pub mod transforms;
