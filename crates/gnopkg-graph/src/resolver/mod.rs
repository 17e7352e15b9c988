//! Import-path resolution.
//!
//! A [`Resolver`] maps one import path to a [`Package`]. Concrete resolvers
//! read from root directories, fixed directories or a remote node; a
//! [`ChainResolver`] tries several in order. Decorators from
//! [`ResolverExt`] wrap any resolver with the same contract:
//!
//! ```no_run
//! use gnopkg_graph::resolver::{ChainResolver, LocalResolver, ResolverExt, RootResolver};
//!
//! let chain = ChainResolver::new()
//!     .with(LocalResolver::new("gno.land/r/demo/wip", "./wip"))
//!     .with(RootResolver::new(vec!["./examples".into()]));
//! let resolver = gnopkg_graph::resolver::default_stack(chain);
//! ```

mod chain;
mod fs;
mod local;
mod middleware;
mod mock;
mod remote;

use std::sync::Arc;

use thiserror::Error;

use crate::package::Package;
use crate::reader::ReadError;

pub use chain::ChainResolver;
pub use fs::RootResolver;
pub use local::{LocalResolver, WORKSPACE_FILE_NAME, WorkspaceResolver};
pub use middleware::{
    CacheHandle, CachedResolver, DraftFilter, LoggedResolver, StdlibFilter, SyntaxChecker,
};
pub use mock::MockResolver;
pub use remote::{QFILE_QUERY, QueryClient, QueryError, RemoteResolver};

/// Why a resolver intentionally declined a package.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Stdlib,
    Draft,
    Empty,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SkipReason::Stdlib => "standard library",
            SkipReason::Draft => "draft package",
            SkipReason::Empty => "no source files",
        })
    }
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// No resolver knows this path; a chain falls through to the next one.
    #[error("package not found: {0}")]
    NotFound(String),

    /// Intentional exclusion. Never a user-facing failure.
    #[error("package {path} skipped: {reason}")]
    Skip { path: String, reason: SkipReason },

    #[error("invalid package {path}: {message}")]
    Invalid { path: String, message: String },

    #[error("unable to read package {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: ReadError,
    },

    #[error("remote query for {path} failed: {message}")]
    Remote { path: String, message: String },
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::NotFound(_))
    }

    pub fn is_skip(&self) -> bool {
        matches!(self, ResolveError::Skip { .. })
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            ResolveError::Skip { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

pub type ResolveResult = Result<Arc<Package>, ResolveError>;

/// Maps an import path to a package.
pub trait Resolver: Send + Sync {
    /// Short name used in diagnostics.
    fn name(&self) -> &str;

    fn resolve(&self, path: &str) -> ResolveResult;
}

impl<R: Resolver + ?Sized> Resolver for Arc<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        (**self).resolve(path)
    }
}

impl<R: Resolver + ?Sized> Resolver for Box<R> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        (**self).resolve(path)
    }
}

/// Builder methods for wrapping a resolver in decorators.
pub trait ResolverExt: Resolver + Sized {
    /// Memoize every successful resolution.
    fn cached(self) -> CachedResolver<Self> {
        CachedResolver::new(self, |_| true)
    }

    /// Memoize successful resolutions accepted by `should_cache`.
    fn cached_if<F>(self, should_cache: F) -> CachedResolver<Self>
    where
        F: Fn(&Package) -> bool + Send + Sync + 'static,
    {
        CachedResolver::new(self, should_cache)
    }

    fn filter_stdlibs(self) -> StdlibFilter<Self> {
        StdlibFilter::new(self)
    }

    fn filter_drafts(self) -> DraftFilter<Self> {
        DraftFilter::new(self)
    }

    fn checked(self) -> SyntaxChecker<Self> {
        SyntaxChecker::new(self)
    }

    fn logged(self) -> LoggedResolver<Self> {
        LoggedResolver::new(self)
    }
}

impl<R: Resolver> ResolverExt for R {}

/// The decorator stack used by the tools.
pub type DefaultStack<R> = LoggedResolver<StdlibFilter<SyntaxChecker<DraftFilter<CachedResolver<R>>>>>;

/// Wrap `base` so that stdlib paths, drafts and empty packages are skipped
/// before the cache or the syntax checker see them.
///
/// Use [`CachedResolver::handle`] through [`default_stack_with_cache`] to
/// invalidate entries later.
pub fn default_stack<R: Resolver>(base: R) -> DefaultStack<R> {
    default_stack_with_cache(base).0
}

/// Like [`default_stack`], also returning a handle on the cache layer.
pub fn default_stack_with_cache<R: Resolver>(base: R) -> (DefaultStack<R>, CacheHandle) {
    let cached = base.cached();
    let handle = cached.handle();
    let stack = cached.filter_drafts().checked().filter_stdlibs().logged();
    (stack, handle)
}
