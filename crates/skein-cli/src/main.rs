//! skein - incremental module graph resolver.
//!
//! Entry point: argument parsing, logging initialization, command dispatch.
//! Records go to stdout; logs and errors go to stderr so the record stream
//! stays clean for piping.

use clap::Parser;
use skein_cli::{cli, commands, logger};

#[tokio::main]
async fn main() {
    let args = cli::Cli::parse();

    logger::init_logger(args.verbose, args.quiet, args.no_color);

    let result = match args.command {
        cli::Command::Probe(probe_args) => commands::probe_execute(&probe_args),
        cli::Command::Resolve(resolve_args) => {
            match skein_config::load_config(args.config.as_deref()) {
                Ok(config) => commands::resolve_execute(resolve_args, config).await,
                Err(err) => Err(err.into()),
            }
        }
    };

    if let Err(err) = result {
        // The record stream is stdout-only; the structured cause goes to
        // the error channel.
        tracing::error!("{err}");
        let mut source = std::error::Error::source(&err);
        while let Some(cause) = source {
            tracing::error!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(err.exit_code());
    }
}
