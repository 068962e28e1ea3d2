//! Logging setup for the skein CLI.
//!
//! Structured logging via the `tracing` ecosystem. The library crates only
//! emit events; this module installs the subscriber for the binary.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize the tracing subscriber.
///
/// Level resolution order: `--verbose` (debug for skein crates), `--quiet`
/// (errors only), `RUST_LOG`, then info. Call once, before any logging.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new("skein_graph=debug,skein_config=debug,skein_cli=debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("skein_graph=info,skein_config=info,skein_cli=info"))
    };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr) // records own stdout
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
