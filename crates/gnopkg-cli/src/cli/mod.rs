//! Command-line interface definition for gnopkg.
//!
//! # Command Structure
//!
//! - `gnopkg list` - Expand patterns and list packages, optionally with dependencies
//! - `gnopkg graph` - Print the sorted import graph under a view
//! - `gnopkg dev` - Watch loaded packages and reload on change
//! - `gnopkg mod` - Module file utilities

mod commands;

use std::path::PathBuf;

use clap::Parser;

pub use commands::{
    Command, DevArgs, GraphArgs, ListArgs, LoadFlags, ModArgs, ModCommand, ResolveArgs, ViewArg,
};

/// gnopkg - package loading and hot reload for Gno sources
#[derive(Parser, Debug)]
#[command(
    name = "gnopkg",
    version,
    about = "Package loading and hot reload for Gno sources",
    long_about = "gnopkg expands package patterns, resolves imports through local roots\n\
                  and workspace modules, orders packages by dependency and reloads\n\
                  them when their files change."
)]
pub struct Cli {
    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file (defaults to ./gnopkg.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}
