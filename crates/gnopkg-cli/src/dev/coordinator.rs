//! Drives reloads of a running process from file changes and path queries.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use gnopkg_graph::{Package, Resolver};
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::dev::{ChangeWatcher, DevEvent, PackagesUpdate};

const EVENT_BUFFER: usize = 64;

/// The process whose packages are kept fresh. How it executes them is its
/// own business; the coordinator only asks it to reload.
#[async_trait]
pub trait DevProcess: Send + Sync {
    async fn reload(&self) -> anyhow::Result<()>;

    /// Replace the set of import paths or patterns the next reload loads.
    async fn set_package_paths(&self, paths: Vec<String>);

    fn has_package_loaded(&self, path: &str) -> bool;

    fn loaded_packages(&self) -> Vec<Arc<Package>>;
}

pub struct IncrementalCoordinator<P> {
    process: P,
    resolver: Arc<dyn Resolver>,
    watcher: ChangeWatcher,
    base_paths: Vec<String>,
    tracked: BTreeSet<String>,
    events: broadcast::Sender<DevEvent>,
}

impl<P: DevProcess> IncrementalCoordinator<P> {
    /// `base_paths` are always loaded; paths discovered through queries are
    /// added to them.
    pub fn new(
        process: P,
        resolver: Arc<dyn Resolver>,
        watcher: ChangeWatcher,
        base_paths: Vec<String>,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            process,
            resolver,
            watcher,
            base_paths,
            tracked: BTreeSet::new(),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DevEvent> {
        self.events.subscribe()
    }

    pub fn process(&self) -> &P {
        &self.process
    }

    pub fn watcher(&self) -> &ChangeWatcher {
        &self.watcher
    }

    pub fn tracked_paths(&self) -> impl Iterator<Item = &str> {
        self.tracked.iter().map(String::as_str)
    }

    /// Base paths followed by tracked paths not already among them.
    pub fn package_paths(&self) -> Vec<String> {
        let mut paths = self.base_paths.clone();
        for path in &self.tracked {
            if !paths.contains(path) {
                paths.push(path.clone());
            }
        }
        paths
    }

    /// Push the base paths to the process and load them once.
    pub async fn start(&mut self) -> anyhow::Result<()> {
        self.process.set_package_paths(self.package_paths()).await;
        self.reload("initial load").await
    }

    /// Track queried paths the resolver knows about.
    ///
    /// When at least one path is new, the process gets the widened path set
    /// and reloads at most once, as soon as a queried path turns out not to
    /// be loaded yet. Returns whether a reload happened.
    pub async fn handle_query_paths(&mut self, paths: &[String]) -> bool {
        let resolver = Arc::clone(&self.resolver);
        let queried = paths.to_vec();
        let resolved = match tokio::task::spawn_blocking(move || {
            queried
                .into_iter()
                .map(|path| {
                    let res = resolver.resolve(&path);
                    (path, res)
                })
                .collect::<Vec<_>>()
        })
        .await
        {
            Ok(resolved) => resolved,
            Err(err) => {
                error!("resolve task failed: {err}");
                return false;
            }
        };

        let mut new_path = false;
        for (path, res) in resolved {
            match res {
                Ok(pkg) => {
                    if self.tracked.insert(pkg.import_path.clone()) {
                        debug!(path = %pkg.import_path, "tracking queried package");
                        self.emit(DevEvent::PackageDiscovered {
                            path: pkg.import_path.clone(),
                        });
                        new_path = true;
                    }
                }
                Err(err) if err.is_skip() => debug!(path = %path, "{err}"),
                Err(err) => warn!(path = %path, "unable to resolve queried path: {err}"),
            }
        }

        if !new_path {
            return false;
        }

        self.process.set_package_paths(self.package_paths()).await;
        for path in paths {
            if !self.process.has_package_loaded(path) {
                let reason = format!("{path} queried");
                let _ = self.reload(&reason).await;
                return true;
            }
        }
        false
    }

    /// Reload once for a debounced batch of changed packages.
    pub async fn handle_update(&mut self, update: &PackagesUpdate) {
        let packages = update.import_paths();
        self.emit(DevEvent::PackagesChanged {
            packages: packages.clone(),
            files: update.file_count(),
        });
        let _ = self.reload(&format!("{} changed", packages.join(", "))).await;
    }

    /// Reload the process and watch whatever it loaded. The watcher is
    /// refreshed even when the reload fails.
    pub async fn reload(&mut self, reason: &str) -> anyhow::Result<()> {
        info!("reloading: {reason}");
        self.emit(DevEvent::ReloadStarted {
            reason: reason.to_string(),
        });

        let started = Instant::now();
        let result = self.process.reload().await;
        match &result {
            Ok(()) => {
                let packages = self.process.loaded_packages().len();
                self.emit(DevEvent::ReloadCompleted {
                    packages,
                    duration_ms: started.elapsed().as_millis() as u64,
                });
            }
            Err(err) => {
                error!("unable to reload: {err:#}");
                self.emit(DevEvent::ReloadFailed {
                    error: format!("{err:#}"),
                });
            }
        }

        self.watcher.update_packages(&self.process.loaded_packages());
        result
    }

    /// Serve updates and queries until `shutdown` resolves or both channels
    /// close. Stops the watcher before returning.
    pub async fn run<F>(
        mut self,
        mut updates: mpsc::Receiver<PackagesUpdate>,
        mut queries: mpsc::Receiver<Vec<String>>,
        shutdown: F,
    ) where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        let span = info_span!("dev_loop");

        async {
            loop {
                tokio::select! {
                    _ = &mut shutdown => {
                        debug!("shutdown requested");
                        break;
                    }
                    Some(update) = updates.recv() => self.handle_update(&update).await,
                    Some(paths) = queries.recv() => {
                        self.handle_query_paths(&paths).await;
                    }
                    else => break,
                }
            }
        }
        .instrument(span)
        .await;

        self.watcher.shutdown().await;
    }

    fn emit(&self, event: DevEvent) {
        // No subscriber is fine.
        let _ = self.events.send(event);
    }
}
