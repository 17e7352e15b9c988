use std::sync::Arc;

use thiserror::Error;
use tracing::trace;

use super::{ResolveError, ResolveResult, Resolver};
use crate::package::{MemFile, PackageKind};
use crate::reader::PackageReader;

/// Query returning a package's file listing, or a file's bytes when the
/// data names `<package>/<file>`.
pub const QFILE_QUERY: &str = "vm/qfile";

#[derive(Debug, Error)]
pub enum QueryError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Failed(String),
}

/// Request/response access to a remote node.
pub trait QueryClient: Send + Sync {
    fn query(&self, path: &str, data: &str) -> Result<Vec<u8>, QueryError>;
}

/// Builds in-memory packages from a remote node.
///
/// The node is reached through a caller-supplied [`QueryClient`]; this crate
/// does not ship one.
pub struct RemoteResolver {
    client: Arc<dyn QueryClient>,
    reader: PackageReader,
}

impl RemoteResolver {
    pub fn new(client: Arc<dyn QueryClient>) -> Self {
        Self {
            client,
            reader: PackageReader::default(),
        }
    }

    pub fn with_reader(mut self, reader: PackageReader) -> Self {
        self.reader = reader;
        self
    }

    fn query(&self, import_path: &str, data: &str) -> Result<Vec<u8>, ResolveError> {
        self.client.query(QFILE_QUERY, data).map_err(|e| match e {
            QueryError::NotFound => ResolveError::NotFound(import_path.to_string()),
            QueryError::Failed(message) => ResolveError::Remote {
                path: import_path.to_string(),
                message,
            },
        })
    }
}

impl Resolver for RemoteResolver {
    fn name(&self) -> &str {
        "remote"
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        let listing = self.query(path, path)?;
        let listing = String::from_utf8_lossy(&listing);

        let mut files = Vec::new();
        for name in listing.lines().map(str::trim).filter(|l| !l.is_empty()) {
            // Sub-package entries are not files of this package.
            if name.contains('/') {
                continue;
            }
            let body = self.query(path, &format!("{path}/{name}"))?;
            let body = String::from_utf8(body).map_err(|_| ResolveError::Remote {
                path: path.to_string(),
                message: format!("{name}: file is not valid UTF-8"),
            })?;
            files.push(MemFile::new(name, body));
        }
        if files.is_empty() {
            return Err(ResolveError::NotFound(path.to_string()));
        }

        trace!(path, files = files.len(), "fetched remote package");
        Ok(Arc::new(self.reader.read_mem(path, files, PackageKind::Remote)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use rustc_hash::FxHashMap;

    #[derive(Default)]
    struct FakeNode {
        data: FxHashMap<String, String>,
        queries: Mutex<Vec<String>>,
    }

    impl QueryClient for FakeNode {
        fn query(&self, path: &str, data: &str) -> Result<Vec<u8>, QueryError> {
            assert_eq!(path, QFILE_QUERY);
            self.queries.lock().push(data.to_string());
            self.data
                .get(data)
                .map(|s| s.as_bytes().to_vec())
                .ok_or(QueryError::NotFound)
        }
    }

    fn node() -> Arc<FakeNode> {
        let mut data = FxHashMap::default();
        data.insert("gno.land/p/demo/x".to_string(), "x.gno\ngnomod.toml\nsub/\n".to_string());
        data.insert(
            "gno.land/p/demo/x/x.gno".to_string(),
            "package x\nimport \"gno.land/p/demo/y\"\n".to_string(),
        );
        data.insert(
            "gno.land/p/demo/x/gnomod.toml".to_string(),
            "module = \"gno.land/p/demo/x\"\n".to_string(),
        );
        Arc::new(FakeNode {
            data,
            ..Default::default()
        })
    }

    #[test]
    fn fetches_listing_then_files() {
        let node = node();
        let r = RemoteResolver::new(node.clone());
        let pkg = r.resolve("gno.land/p/demo/x").unwrap();

        assert_eq!(pkg.kind, PackageKind::Remote);
        assert_eq!(pkg.name, "x");
        assert!(pkg.dir.as_os_str().is_empty());
        assert_eq!(pkg.module.as_ref().unwrap().path, "gno.land/p/demo/x");
        assert_eq!(
            pkg.imports_of(crate::package::FileKind::PackageSource),
            ["gno.land/p/demo/y"]
        );
        assert_eq!(node.queries.lock()[0], "gno.land/p/demo/x");
    }

    #[test]
    fn unknown_path_is_not_found() {
        let r = RemoteResolver::new(node());
        assert!(r.resolve("gno.land/p/demo/nope").unwrap_err().is_not_found());
    }
}
