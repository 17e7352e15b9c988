use thiserror::Error;

use crate::graph::GraphError;
use crate::pattern::PatternError;
use crate::reader::ReadError;
use crate::resolver::ResolveError;

/// Errors that abort a load. Problems inside a single package are kept on
/// [`Package::errors`](crate::Package::errors) instead.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Read(#[from] ReadError),

    #[error(transparent)]
    Module(#[from] gnopkg_mod::ModFileError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no packages to load")]
    NoPackages,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
