//! Two-way lookup between import paths and package directories.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;

use crate::package::Package;

#[derive(Default)]
struct Maps {
    by_path: FxHashMap<String, Arc<Package>>,
    by_dir: FxHashMap<PathBuf, Arc<Package>>,
}

/// Thread-safe index of loaded packages.
///
/// Both directions always agree: re-adding an import path from a new
/// directory drops the stale directory entry.
#[derive(Default)]
pub struct PackageIndex {
    maps: RwLock<Maps>,
}

impl PackageIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, pkg: Arc<Package>) {
        let mut maps = self.maps.write();
        if let Some(old) = maps.by_path.remove(&pkg.import_path) {
            maps.by_dir.remove(&old.dir);
        }
        if !pkg.dir.as_os_str().is_empty() {
            if let Some(old) = maps.by_dir.insert(pkg.dir.clone(), Arc::clone(&pkg)) {
                if old.import_path != pkg.import_path {
                    maps.by_path.remove(&old.import_path);
                }
            }
        }
        maps.by_path.insert(pkg.import_path.clone(), pkg);
    }

    pub fn extend<I: IntoIterator<Item = Arc<Package>>>(&self, pkgs: I) {
        for pkg in pkgs {
            self.add(pkg);
        }
    }

    pub fn get_by_path(&self, import_path: &str) -> Option<Arc<Package>> {
        self.maps.read().by_path.get(import_path).cloned()
    }

    pub fn get_by_dir(&self, dir: &Path) -> Option<Arc<Package>> {
        self.maps.read().by_dir.get(dir).cloned()
    }

    pub fn remove_by_path(&self, import_path: &str) -> Option<Arc<Package>> {
        let mut maps = self.maps.write();
        let pkg = maps.by_path.remove(import_path)?;
        if maps
            .by_dir
            .get(&pkg.dir)
            .is_some_and(|p| p.import_path == pkg.import_path)
        {
            maps.by_dir.remove(&pkg.dir);
        }
        Some(pkg)
    }

    /// Package whose directory is the nearest ancestor of `file`.
    pub fn owner_of(&self, file: &Path) -> Option<Arc<Package>> {
        let maps = self.maps.read();
        file.ancestors()
            .skip(1)
            .find_map(|dir| maps.by_dir.get(dir).cloned())
    }

    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.maps.read().by_path.keys().cloned().collect();
        paths.sort();
        paths
    }

    pub fn dirs(&self) -> Vec<PathBuf> {
        let mut dirs: Vec<PathBuf> = self.maps.read().by_dir.keys().cloned().collect();
        dirs.sort();
        dirs
    }

    pub fn len(&self) -> usize {
        self.maps.read().by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.maps.read().by_path.is_empty()
    }

    pub fn clear(&self) {
        let mut maps = self.maps.write();
        maps.by_path.clear();
        maps.by_dir.clear();
    }
}
