use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use super::{ResolveError, ResolveResult, Resolver};
use crate::reader::PackageReader;

/// Resolves `<root>/<import path>` against an ordered list of roots.
///
/// The first root containing the directory wins.
pub struct RootResolver {
    roots: Vec<PathBuf>,
    reader: PackageReader,
}

impl RootResolver {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            roots,
            reader: PackageReader::default(),
        }
    }

    pub fn with_reader(mut self, reader: PackageReader) -> Self {
        self.reader = reader;
        self
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Directory an import path maps to under `root`, if the path is
    /// well-formed.
    pub fn dir_for(root: &Path, import_path: &str) -> Option<PathBuf> {
        let rel = path_clean::clean(import_path);
        let normal = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !normal || rel.as_os_str().is_empty() {
            return None;
        }
        Some(root.join(rel))
    }
}

impl Resolver for RootResolver {
    fn name(&self) -> &str {
        "root"
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        for root in &self.roots {
            let Some(dir) = Self::dir_for(root, path) else {
                return Err(ResolveError::NotFound(path.to_string()));
            };
            if !dir.is_dir() {
                continue;
            }
            let pkg = self
                .reader
                .read_dir(&dir, path)
                .map_err(|source| ResolveError::Read {
                    path: path.to_string(),
                    source,
                })?;
            return Ok(Arc::new(pkg));
        }
        Err(ResolveError::NotFound(path.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::PackageKind;
    use std::fs;
    use tempfile::TempDir;

    fn pkg_at(root: &Path, path: &str, name: &str) {
        let dir = root.join(path);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{name}.gno")), format!("package {name}\n")).unwrap();
    }

    #[test]
    fn first_root_wins() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        pkg_at(b.path(), "gno.land/p/demo/x", "x");
        pkg_at(a.path(), "gno.land/p/demo/x", "x");

        let r = RootResolver::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let pkg = r.resolve("gno.land/p/demo/x").unwrap();
        assert_eq!(pkg.dir, a.path().join("gno.land/p/demo/x"));
        assert_eq!(pkg.kind, PackageKind::Fs);
    }

    #[test]
    fn falls_through_roots() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        pkg_at(b.path(), "strings", "strings");

        let r = RootResolver::new(vec![a.path().to_path_buf(), b.path().to_path_buf()]);
        let pkg = r.resolve("strings").unwrap();
        assert_eq!(pkg.kind, PackageKind::Stdlib);
        assert!(r.resolve("gno.land/p/missing").unwrap_err().is_not_found());
    }

    #[test]
    fn rejects_escaping_paths() {
        let a = TempDir::new().unwrap();
        let r = RootResolver::new(vec![a.path().join("inner")]);
        pkg_at(a.path(), "outside", "outside");
        assert!(r.resolve("../outside").unwrap_err().is_not_found());
        assert!(RootResolver::dir_for(a.path(), "/etc").is_none());
    }
}
