//! [`DevProcess`] backed by the package loader.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use gnopkg_graph::{CacheHandle, Loader, Package};
use parking_lot::RwLock;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::dev::DevProcess;

/// Reloads the tracked patterns and import paths with a [`Loader`].
///
/// Every reload starts from an empty resolver cache so that edited files are
/// read again. The loader's index is kept in sync with the last successful
/// load.
pub struct LoaderProcess {
    loader: Arc<Loader>,
    cwd: PathBuf,
    cache: Option<CacheHandle>,
    paths: RwLock<Vec<String>>,
    loaded: RwLock<Vec<Arc<Package>>>,
}

impl LoaderProcess {
    pub fn new(loader: Loader, cwd: PathBuf, cache: Option<CacheHandle>) -> Self {
        Self {
            loader: Arc::new(loader),
            cwd,
            cache,
            paths: RwLock::new(Vec::new()),
            loaded: RwLock::new(Vec::new()),
        }
    }

    pub fn loader(&self) -> &Loader {
        &self.loader
    }

    pub fn package_paths(&self) -> Vec<String> {
        self.paths.read().clone()
    }
}

#[async_trait]
impl DevProcess for LoaderProcess {
    async fn reload(&self) -> anyhow::Result<()> {
        if let Some(cache) = &self.cache {
            cache.clear();
        }

        let loader = Arc::clone(&self.loader);
        let cwd = self.cwd.clone();
        let paths = self.package_paths();
        let result = tokio::task::spawn_blocking(move || loader.load(&cwd, &paths))
            .await
            .context("load task panicked")?
            .context("unable to load packages")?;

        let index = self.loader.index();
        let current: FxHashSet<&str> = result
            .packages
            .iter()
            .map(|p| p.import_path.as_str())
            .collect();
        for stale in index.paths() {
            if !current.contains(stale.as_str()) {
                index.remove_by_path(&stale);
            }
        }

        debug!(packages = result.packages.len(), "reloaded packages");
        *self.loaded.write() = result.packages;
        Ok(())
    }

    async fn set_package_paths(&self, paths: Vec<String>) {
        *self.paths.write() = paths;
    }

    fn has_package_loaded(&self, path: &str) -> bool {
        self.loaded.read().iter().any(|p| p.import_path == path)
    }

    fn loaded_packages(&self) -> Vec<Arc<Package>> {
        self.loaded.read().clone()
    }
}
