use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};
use gnopkg_graph::View;

/// Available gnopkg subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the packages matched by patterns
    ///
    /// Patterns are directories (`./foo`), recursive walks (`./...`), single
    /// `.gno` files or import paths (`gno.land/p/demo/avl`).
    List(ListArgs),

    /// Print the dependency-ordered import graph
    ///
    /// Every package follows its dependencies. Filters drop draft or ignored
    /// packages together with everything that imports them.
    Graph(GraphArgs),

    /// Resolve import paths through the configured resolvers
    Resolve(ResolveArgs),

    /// Watch packages and reload them when their files change
    ///
    /// Import paths typed on stdin are resolved and tracked as well.
    Dev(DevArgs),

    /// Module file utilities
    Mod(ModArgs),
}

/// Options shared by every command that loads packages
#[derive(Args, Debug, Clone, Default)]
pub struct LoadFlags {
    /// Additional package root, laid out by import path (repeatable)
    #[arg(long = "root", value_name = "DIR")]
    pub roots: Vec<PathBuf>,

    /// Resolve every import again instead of memoizing packages
    #[arg(long)]
    pub no_cache: bool,

    /// Succeed when the patterns match no package
    #[arg(long)]
    pub allow_empty: bool,
}

/// Arguments for the list command
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Package patterns
    #[arg(value_name = "PATTERN", default_value = ".")]
    pub patterns: Vec<String>,

    /// Include the dependency closure, sorted
    #[arg(short, long)]
    pub deps: bool,

    /// Follow test imports when loading dependencies
    #[arg(short, long, requires = "deps")]
    pub test: bool,

    /// Print packages as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub load: LoadFlags,
}

/// Arguments for the graph command
#[derive(Args, Debug)]
pub struct GraphArgs {
    /// Package patterns
    #[arg(value_name = "PATTERN", default_value = ".")]
    pub patterns: Vec<String>,

    /// Which imports the graph follows
    #[arg(long, value_enum, default_value = "build")]
    pub view: ViewArg,

    /// Drop draft packages and their importers
    #[arg(long)]
    pub non_draft: bool,

    /// Drop ignored packages and their importers
    #[arg(long)]
    pub non_ignored: bool,

    /// Print the graph as JSON
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub load: LoadFlags,
}

/// Arguments for the resolve command
#[derive(Args, Debug)]
pub struct ResolveArgs {
    /// Import paths to resolve
    #[arg(value_name = "IMPORT_PATH", required = true)]
    pub paths: Vec<String>,

    #[command(flatten)]
    pub load: LoadFlags,
}

/// Arguments for the dev command
#[derive(Args, Debug)]
pub struct DevArgs {
    /// Package patterns
    #[arg(value_name = "PATTERN", default_value = ".")]
    pub patterns: Vec<String>,

    /// Quiet window, in milliseconds, before changed files trigger a reload
    #[arg(long, value_name = "MS")]
    pub debounce_ms: Option<u64>,

    /// Print dev events as JSON lines on stdout
    #[arg(long)]
    pub json: bool,

    #[command(flatten)]
    pub load: LoadFlags,
}

/// Arguments for the mod command
#[derive(Args, Debug)]
pub struct ModArgs {
    #[command(subcommand)]
    pub command: ModCommand,
}

#[derive(Subcommand, Debug)]
pub enum ModCommand {
    /// Replace a legacy gno.mod with an equivalent gnomod.toml
    Migrate {
        /// Module directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },

    /// Print the module descriptor of a directory as gnomod.toml
    Show {
        /// Module directory
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
}

/// Graph view
#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum ViewArg {
    /// Source imports only
    #[value(name = "build")]
    Build,

    /// Source and test imports of the matched packages
    #[value(name = "tests")]
    Tests,

    /// Also external `_test` packages and filetests
    #[value(name = "xtests")]
    XTests,
}

impl From<ViewArg> for View {
    fn from(view: ViewArg) -> Self {
        match view {
            ViewArg::Build => View::Build,
            ViewArg::Tests => View::OwnTests,
            ViewArg::XTests => View::ExternalTests,
        }
    }
}
