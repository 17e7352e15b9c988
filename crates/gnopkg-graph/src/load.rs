//! Loading packages from command-line patterns.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use gnopkg_mod::{ModuleDiscovery, find_module_root};
use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::error::{Error, Result};
use crate::graph::{DEFAULT_INJECTED, GraphBuilder, SortedPackages, View};
use crate::index::PackageIndex;
use crate::package::{COMMAND_LINE_PACKAGE, Package};
use crate::pattern::{self, MatchTarget, PatternMatch};
use crate::reader::{PackageReader, ReadOptions};
use crate::resolver::{Resolver, WorkspaceResolver};

#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Resolve and sort the import closure of the matched packages
    pub deps: bool,
    /// Graph view used when `deps` is set
    pub view: View,
    /// Return an empty result instead of [`Error::NoPackages`]
    pub allow_empty: bool,
    pub keep_other_files: bool,
    pub injected: Vec<String>,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            deps: false,
            view: View::Build,
            allow_empty: false,
            keep_other_files: false,
            injected: DEFAULT_INJECTED.iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoadResult {
    /// Matched packages, or their sorted closure when dependencies were loaded
    pub packages: Vec<Arc<Package>>,
    #[serde(skip)]
    pub sorted: Option<SortedPackages>,
    pub matches: Vec<PatternMatch>,
    pub warnings: Vec<String>,
}

pub struct Loader {
    resolver: Arc<dyn Resolver>,
    reader: PackageReader,
    index: Arc<PackageIndex>,
    options: LoadOptions,
}

impl Loader {
    pub fn new(resolver: Arc<dyn Resolver>, options: LoadOptions) -> Self {
        let reader = PackageReader::new(ReadOptions {
            keep_other_files: options.keep_other_files,
        });
        Self {
            resolver,
            reader,
            index: Arc::new(PackageIndex::new()),
            options,
        }
    }

    /// Record loaded packages in a shared index.
    pub fn with_index(mut self, index: Arc<PackageIndex>) -> Self {
        self.index = index;
        self
    }

    pub fn index(&self) -> &Arc<PackageIndex> {
        &self.index
    }

    pub fn resolver(&self) -> &Arc<dyn Resolver> {
        &self.resolver
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    pub fn load<S: AsRef<str>>(&self, cwd: &Path, patterns: &[S]) -> Result<LoadResult> {
        let _span = info_span!("load", patterns = patterns.len()).entered();

        let expansion = pattern::expand(cwd, patterns)?;
        let mut warnings = expansion.warnings;
        let mut roots: Vec<Arc<Package>> = Vec::new();

        for m in &expansion.matches {
            match &m.target {
                MatchTarget::Dir(dir) => {
                    let import_path = dir_import_path(dir)?;
                    roots.push(Arc::new(self.reader.read_dir(dir, &import_path)?));
                }
                MatchTarget::Files => {
                    let pkg = self.reader.read_files(&expansion.files, COMMAND_LINE_PACKAGE)?;
                    roots.push(Arc::new(pkg));
                }
                MatchTarget::Remote(path) => match self.resolver.resolve(path) {
                    Ok(pkg) => roots.push(pkg),
                    Err(err) if err.is_skip() => {
                        warn!(path = %path, "{err}");
                        warnings.push(err.to_string());
                    }
                    Err(err) => return Err(err.into()),
                },
            }
        }

        let sorted = if self.options.deps {
            let builder = GraphBuilder::new(self.resolver.as_ref())
                .view(self.options.view)
                .injected(self.options.injected.iter().cloned())
                .reader(self.reader.clone());
            Some(builder.build(&roots)?)
        } else {
            None
        };

        let packages = match &sorted {
            Some(sorted) => sorted.packages().to_vec(),
            None => roots,
        };
        if packages.is_empty() && !self.options.allow_empty {
            return Err(Error::NoPackages);
        }

        self.index.extend(packages.iter().cloned());
        debug!(
            packages = packages.len(),
            warnings = warnings.len(),
            "load finished"
        );

        Ok(LoadResult {
            packages,
            sorted,
            matches: expansion.matches,
            warnings,
        })
    }
}

/// Import path of a local directory: the owning module's path plus the
/// relative directory, or `_` followed by the slash path outside a module.
pub fn dir_import_path(dir: &Path) -> Result<String> {
    let Some(root) = find_module_root(dir) else {
        return Ok(format!("_{}", slash_path(dir)));
    };
    let module = ModuleDiscovery::new(&root).load()?;
    let rel = dir.strip_prefix(&root).map(slash_path).unwrap_or_default();
    if rel.is_empty() {
        Ok(module.path)
    } else {
        Ok(format!("{}/{}", module.path, rel))
    }
}

fn slash_path(path: &Path) -> String {
    let mut out = String::new();
    for comp in path.components() {
        match comp {
            Component::RootDir => out.push('/'),
            Component::Normal(s) => {
                if !out.is_empty() && !out.ends_with('/') {
                    out.push('/');
                }
                out.push_str(&s.to_string_lossy());
            }
            _ => {}
        }
    }
    out
}

/// Map every module found under `roots` to its directory, without entering
/// nested workspaces.
pub fn discover_workspace_packages<P: AsRef<Path>>(roots: &[P]) -> WorkspaceResolver {
    WorkspaceResolver::discover(roots)
}

/// Directories of loaded packages that live on disk.
pub fn package_dirs(packages: &[Arc<Package>]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = packages
        .iter()
        .filter(|p| !p.dir.as_os_str().is_empty())
        .map(|p| p.dir.clone())
        .collect();
    dirs.sort();
    dirs.dedup();
    dirs
}
