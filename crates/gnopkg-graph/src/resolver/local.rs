use std::path::{Path, PathBuf};
use std::sync::Arc;

use gnopkg_mod::ModuleDiscovery;
use rustc_hash::FxHashMap;
use tracing::{debug, warn};
use walkdir::WalkDir;

use super::{ResolveError, ResolveResult, Resolver};
use crate::reader::PackageReader;

/// Marks the root of a nested workspace that discovery must not enter.
pub const WORKSPACE_FILE_NAME: &str = "gnowork.toml";

/// Serves exactly one import path from a fixed directory.
pub struct LocalResolver {
    import_path: String,
    dir: PathBuf,
    reader: PackageReader,
}

impl LocalResolver {
    pub fn new(import_path: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        Self {
            import_path: import_path.into(),
            dir: dir.into(),
            reader: PackageReader::default(),
        }
    }

    pub fn with_reader(mut self, reader: PackageReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn import_path(&self) -> &str {
        &self.import_path
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl Resolver for LocalResolver {
    fn name(&self) -> &str {
        "local"
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        if path != self.import_path {
            return Err(ResolveError::NotFound(path.to_string()));
        }
        self.reader
            .read_dir(&self.dir, path)
            .map(Arc::new)
            .map_err(|source| ResolveError::Read {
                path: path.to_string(),
                source,
            })
    }
}

/// Serves the modules found under a set of workspace directories.
#[derive(Default)]
pub struct WorkspaceResolver {
    dirs: FxHashMap<String, PathBuf>,
    reader: PackageReader,
}

impl WorkspaceResolver {
    pub fn new(dirs: FxHashMap<String, PathBuf>) -> Self {
        Self {
            dirs,
            reader: PackageReader::default(),
        }
    }

    /// Walk `roots` and map every module path to its directory.
    ///
    /// Hidden and underscore-prefixed directories are skipped, and so is any
    /// nested directory holding its own `gnowork.toml`. When two directories
    /// declare the same module, the first one found wins.
    pub fn discover<P: AsRef<Path>>(roots: &[P]) -> Self {
        let mut dirs: FxHashMap<String, PathBuf> = FxHashMap::default();
        for root in roots {
            let root = root.as_ref();
            let walker = WalkDir::new(root)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    if !e.file_type().is_dir() {
                        return false;
                    }
                    if e.depth() == 0 {
                        return true;
                    }
                    let name = e.file_name().to_string_lossy();
                    !name.starts_with('.')
                        && !name.starts_with('_')
                        && !e.path().join(WORKSPACE_FILE_NAME).is_file()
                });

            for entry in walker.filter_map(Result::ok) {
                let discovery = ModuleDiscovery::new(entry.path());
                if discovery.find().is_none() {
                    continue;
                }
                match discovery.load() {
                    Ok(module) => {
                        if let Some(prev) = dirs.get(&module.path) {
                            debug!(module = %module.path, kept = %prev.display(), "duplicate module ignored");
                            continue;
                        }
                        dirs.insert(module.path, entry.path().to_path_buf());
                    }
                    Err(e) => warn!(dir = %entry.path().display(), "skipping module: {e}"),
                }
            }
        }
        Self::new(dirs)
    }

    pub fn with_reader(mut self, reader: PackageReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn dir_of(&self, import_path: &str) -> Option<&Path> {
        self.dirs.get(import_path).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

impl Resolver for WorkspaceResolver {
    fn name(&self) -> &str {
        "workspace"
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        let dir = self
            .dirs
            .get(path)
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))?;
        self.reader
            .read_dir(dir, path)
            .map(Arc::new)
            .map_err(|source| ResolveError::Read {
                path: path.to_string(),
                source,
            })
    }
}
