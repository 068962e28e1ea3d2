//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Incremental module graph resolver.
///
/// Walks module references from one or more entry files, applies the
/// configured transform chain, and streams the resolved graph as JSON
/// module records.
#[derive(Debug, Parser)]
#[command(name = "skein", version, about)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub verbose: bool,

    /// Only log errors
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Disable colored log output
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,

    /// Config file (default: discover skein.toml / skein.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Resolve the dependency graph and stream module records
    Resolve(ResolveArgs),
    /// Check which transforms are available, without side effects
    Probe(ProbeArgs),
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Entry files, walked in order
    pub entries: Vec<PathBuf>,

    /// A module whose source changed since the cached run (repeatable)
    #[arg(long = "changed")]
    pub changed: Vec<PathBuf>,

    /// Cache snapshot file: read before the run, rewritten after it
    #[arg(long)]
    pub cache: Option<PathBuf>,

    /// Derive the changed set by re-hashing files recorded in the snapshot
    #[arg(long = "detect-changes")]
    pub detect_changes: bool,

    /// Transform to apply, in order: NAME or NAME=JSON-OPTIONS (repeatable)
    #[arg(long = "transform")]
    pub transforms: Vec<String>,

    /// Output framing: jsonl (default) or array
    #[arg(long)]
    pub format: Option<String>,

    /// Concurrent module-job limit (default: logical CPUs)
    #[arg(long)]
    pub workers: Option<usize>,

    /// Write records to a file instead of stdout
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Transform names to check
    #[arg(required = true)]
    pub names: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn resolve_parses_repeatable_flags() {
        let cli = Cli::try_parse_from([
            "skein",
            "resolve",
            "src/main.js",
            "--changed",
            "src/a.js",
            "--changed",
            "src/b.js",
            "--transform",
            "banner={\"text\":\"hi\"}",
            "--cache",
            ".skein/cache.json",
            "--format",
            "array",
        ])
        .unwrap();

        let Command::Resolve(args) = cli.command else {
            panic!("expected resolve");
        };
        assert_eq!(args.entries, vec![PathBuf::from("src/main.js")]);
        assert_eq!(args.changed.len(), 2);
        assert_eq!(args.transforms, vec!["banner={\"text\":\"hi\"}"]);
        assert_eq!(args.format.as_deref(), Some("array"));
    }

    #[test]
    fn probe_requires_at_least_one_name() {
        assert!(Cli::try_parse_from(["skein", "probe"]).is_err());
        let cli = Cli::try_parse_from(["skein", "probe", "banner", "missing"]).unwrap();
        let Command::Probe(args) = cli.command else {
            panic!("expected probe");
        };
        assert_eq!(args.names, vec!["banner", "missing"]);
    }
}
