//! Logging setup for the gnopkg CLI.
//!
//! Every crate in the workspace logs through `tracing`. The binary installs
//! one subscriber:
//!
//! - `--verbose` turns on debug output for the gnopkg crates
//! - `--quiet` keeps errors only
//! - otherwise `RUST_LOG` applies, falling back to info
//!
//! ```rust,no_run
//! use gnopkg_cli::logger::init_logger;
//!
//! init_logger(false, false, false);
//! tracing::info!("loading packages");
//! ```

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const VERBOSE_FILTER: &str = "gnopkg_graph=debug,gnopkg_mod=debug,gnopkg_cli=debug";
const QUIET_FILTER: &str = "error";
const DEFAULT_FILTER: &str = "gnopkg_graph=info,gnopkg_mod=info,gnopkg_cli=info";

/// Install the global subscriber. Call once, before anything logs.
pub fn init_logger(verbose: bool, quiet: bool, no_color: bool) {
    let filter = if verbose {
        EnvFilter::new(VERBOSE_FILTER)
    } else if quiet {
        EnvFilter::new(QUIET_FILTER)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
    };

    init_logger_with_filter(filter, no_color);
}

/// Install the global subscriber with an explicit filter.
pub fn init_logger_with_filter(filter: EnvFilter, no_color: bool) {
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_ansi(!no_color)
        .with_writer(std::io::stderr)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    // The global subscriber can only be installed once per process.

    #[test]
    fn test_env_filters_parse() {
        let _ = EnvFilter::new(VERBOSE_FILTER);
        let _ = EnvFilter::new(QUIET_FILTER);
        let _ = EnvFilter::new(DEFAULT_FILTER);
    }
}
