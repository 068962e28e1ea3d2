//! The availability probe.
//!
//! Reports, for each requested transform name, whether it can be
//! instantiated here: an existence check with no side effects, so an
//! orchestrator can verify its pipeline before kicking off a resolution.

use indexmap::IndexMap;

use crate::cli::ProbeArgs;
use crate::error::CliError;
use crate::transforms::builtin_registry;

/// Error code reported for a name with no registered transform.
pub const NOT_FOUND: &str = "TRANSFORM_NOT_FOUND";

/// Availability per name, in input order: `""` means available.
pub fn probe_report(names: &[String]) -> IndexMap<String, &'static str> {
    let registry = builtin_registry();
    names
        .iter()
        .map(|name| {
            let status = if registry.contains(name) { "" } else { NOT_FOUND };
            (name.clone(), status)
        })
        .collect()
}

pub fn probe_execute(args: &ProbeArgs) -> Result<(), CliError> {
    let report = probe_report(&args.names);
    let json = serde_json::to_string(&report).map_err(skein_graph::EmitError::from)?;
    println!("{json}");

    if report.values().any(|status| !status.is_empty()) {
        tracing::warn!("some transforms are unavailable");
    }
    Ok(())
}
