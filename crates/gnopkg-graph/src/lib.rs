//! # gnopkg-graph
//!
//! Package loading for Gno sources: pattern expansion, import resolution,
//! dependency ordering and a shared package index.
//!
//! ## Overview
//!
//! ```text
//!   patterns ──► pattern::expand ──► PackageReader ──► roots
//!                                                      │
//!                 Resolver stack ◄──── GraphBuilder ◄──┘
//!   (logger ► stdlib ► checker ► draft ► cache ► base)
//!                                          │
//!                                          ▼
//!                              SortedPackages ──► PackageIndex
//! ```
//!
//! - [`Resolver`] maps one import path to a [`Package`]. Resolvers chain
//!   through [`ChainResolver`] and wrap through the [`ResolverExt`]
//!   decorators.
//! - [`GraphBuilder`] follows imports under a [`View`], detects cycles and
//!   emits dependencies before dependents.
//! - [`Loader`] ties the pieces together for command-line use.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use gnopkg_graph::{default_stack, LoadOptions, Loader, RootResolver};
//!
//! # fn main() -> Result<(), gnopkg_graph::Error> {
//! let resolver = default_stack(RootResolver::new(vec!["/opt/gno/examples".into()]));
//! let loader = Loader::new(Arc::new(resolver), LoadOptions { deps: true, ..Default::default() });
//!
//! let result = loader.load(Path::new("."), &["./..."])?;
//! for pkg in &result.packages {
//!     println!("{}", pkg.import_path);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! Resolution and graph building are synchronous. [`PackageIndex`] and the
//! cache decorator are shared behind reader/writer locks and never hold a
//! lock across an inner resolve.

pub mod error;
pub mod graph;
pub mod index;
pub mod load;
pub mod package;
pub mod pattern;
pub mod reader;
pub mod resolver;

pub use error::{Error, Result};
pub use graph::sort::{DependencyNode, SortError, sort_packages, topological_sort};
pub use graph::{DEFAULT_INJECTED, GraphBuilder, GraphError, NodeId, SortedPackages, View};
pub use index::PackageIndex;
pub use load::{
    LoadOptions, LoadResult, Loader, dir_import_path, discover_workspace_packages, package_dirs,
};
pub use package::{
    COMMAND_LINE_PACKAGE, FileKind, MemFile, MemPackage, Package, PackageError, PackageKind,
    Position, SOURCE_EXT, is_stdlib_path,
};
pub use pattern::{Expansion, MatchTarget, PatternError, PatternKind, PatternMatch};
pub use reader::{PackageReader, ReadError, ReadOptions};
pub use resolver::{
    CacheHandle, CachedResolver, ChainResolver, DefaultStack, DraftFilter, LocalResolver,
    LoggedResolver, MockResolver, QueryClient, QueryError, RemoteResolver, ResolveError,
    ResolveResult, Resolver, ResolverExt, RootResolver, SkipReason, StdlibFilter, SyntaxChecker,
    WorkspaceResolver, default_stack, default_stack_with_cache,
};
