//! Conversion of CLI errors into miette reports.

use gnopkg_graph::{GraphError, PatternError};
use miette::Report;

use crate::error::CliError;

/// Convert CliError to miette Report
pub fn cli_error_to_miette(err: CliError) -> Report {
    match err {
        CliError::Load(e) => load_error_to_miette(e),
        CliError::Config(e) => miette::miette!("Configuration error: {}", e),
        _ => miette::miette!("{}", err),
    }
}

fn load_error_to_miette(err: gnopkg_graph::Error) -> Report {
    match err {
        gnopkg_graph::Error::Graph(GraphError::Cycle { path }) => miette::miette!(
            "Import cycle detected:\n  {}\n\nHint: Move the shared code into a package both sides can import",
            path.join("\n  -> ")
        ),
        gnopkg_graph::Error::Graph(GraphError::MissingDependency { missing, importer }) => {
            miette::miette!(
                "Package {} not found\nImported by: {}\n\nHint: Add its root with --root or a replace entry to gnomod.toml",
                missing,
                importer
            )
        }
        gnopkg_graph::Error::Pattern(e @ PatternError::RecursiveRemote(_)) => miette::miette!(
            "{}\n\nHint: Only local directories can be walked with '...'",
            e
        ),
        gnopkg_graph::Error::NoPackages => miette::miette!(
            "No packages to load\n\nHint: Check the patterns or pass --allow-empty"
        ),
        other => miette::miette!("{}", other),
    }
}
