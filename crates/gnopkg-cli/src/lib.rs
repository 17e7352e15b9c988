//! gnopkg CLI - package loading and hot reload for Gno sources.
//!
//! This crate wraps `gnopkg-graph` and `gnopkg-mod` in a command-line tool.
//!
//! - [`error`] - CLI error types with actionable hints
//! - [`logger`] - `tracing` subscriber setup
//! - [`ui`] - Status lines on stderr
//! - [`config`] - Layered `gnopkg.toml` / environment / flag configuration
//! - [`dev`] - Change watching and incremental reloads
//! - `commands` - Individual CLI command implementations
//!
//! # Example
//!
//! ```rust,no_run
//! use gnopkg_cli::{error::Result, logger};
//!
//! fn main() -> Result<()> {
//!     logger::init_logger(false, false, false);
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod dev;
pub mod error;
pub mod logger;
pub mod ui;

pub use config::GnopkgConfig;
pub use dev::{ChangeWatcher, DevEvent, DevProcess, IncrementalCoordinator, PackageUpdate, PackagesUpdate};
pub use error::{CliError, ConfigError, Result, ResultExt};
