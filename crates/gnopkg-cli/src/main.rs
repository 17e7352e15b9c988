//! gnopkg - package loading and hot reload for Gno sources.
//!
//! Parses arguments, sets up logging and colors, then dispatches to a
//! command.

use clap::Parser;
use gnopkg_cli::{cli, commands, error, logger, ui};
use miette::Result;

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();

    let no_color = args.no_color || !ui::should_use_color();
    logger::init_logger(args.verbose, args.quiet, no_color);
    ui::init_colors(args.no_color);

    let config = args.config.as_deref();
    let result = match args.command {
        cli::Command::List(list_args) => commands::list_execute(list_args, config).await,
        cli::Command::Graph(graph_args) => commands::graph_execute(graph_args, config).await,
        cli::Command::Resolve(resolve_args) => commands::resolve_execute(resolve_args, config).await,
        cli::Command::Dev(dev_args) => commands::dev_execute(dev_args, config).await,
        cli::Command::Mod(mod_args) => commands::mod_execute(mod_args).await,
    };

    result.map_err(error::cli_error_to_miette)
}
