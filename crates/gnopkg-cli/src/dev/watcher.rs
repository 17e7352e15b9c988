//! Debounced, per-package file watching.
//!
//! Each loaded package directory gets a non-recursive watch. Raw writes are
//! collected from the first unflushed write until the debounce window
//! elapses, then grouped by the package that owns each file and sent as one
//! [`PackagesUpdate`]. Later writes inside the window do not extend it.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use gnopkg_graph::{Package, PackageIndex, SOURCE_EXT};
use gnopkg_mod::{LEGACY_FILE_NAME, MODULE_FILE_NAME};
use notify::event::{AccessKind, AccessMode, ModifyKind};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, trace, warn};

use crate::dev::{PackageUpdate, PackagesUpdate};
use crate::error::Result;

const UPDATE_BUFFER: usize = 16;

pub struct ChangeWatcher {
    watcher: RecommendedWatcher,
    watched: BTreeSet<PathBuf>,
    writes: mpsc::UnboundedSender<PathBuf>,
    stop: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl ChangeWatcher {
    /// Start the debounce loop. Must be called from within a tokio runtime.
    ///
    /// Files are mapped to packages through `index` at flush time, so the
    /// index may change while the watcher runs.
    pub fn new(
        index: Arc<PackageIndex>,
        debounce: Duration,
    ) -> Result<(Self, mpsc::Receiver<PackagesUpdate>)> {
        let (writes, writes_rx) = mpsc::unbounded_channel();
        let (updates_tx, updates_rx) = mpsc::channel(UPDATE_BUFFER);
        let (stop, stop_rx) = oneshot::channel();

        let raw = writes.clone();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) if is_write(&event.kind) => {
                for path in event.paths.into_iter().filter(|p| is_watched_file(p)) {
                    let _ = raw.send(path);
                }
            }
            Ok(_) => {}
            Err(err) => warn!("file watcher error: {err}"),
        })?;

        let task = tokio::spawn(debounce_loop(writes_rx, updates_tx, index, debounce, stop_rx));

        Ok((
            Self {
                watcher,
                watched: BTreeSet::new(),
                writes,
                stop: Some(stop),
                task: Some(task),
            },
            updates_rx,
        ))
    }

    /// Watch the directories of `packages` that are not watched yet.
    ///
    /// Returns how many directories were added. A directory that cannot be
    /// watched is logged and skipped.
    pub fn update_packages(&mut self, packages: &[Arc<Package>]) -> usize {
        let mut added = 0;
        for pkg in packages {
            let dir = &pkg.dir;
            if dir.as_os_str().is_empty() || self.watched.contains(dir) {
                continue;
            }
            match self.watcher.watch(dir, RecursiveMode::NonRecursive) {
                Ok(()) => {
                    trace!(package = %pkg.import_path, dir = %dir.display(), "watching");
                    self.watched.insert(dir.clone());
                    added += 1;
                }
                Err(err) => warn!(package = %pkg.import_path, "unable to watch {}: {err}", dir.display()),
            }
        }
        if added > 0 {
            debug!(added, total = self.watched.len(), "updated package watches");
        }
        added
    }

    /// Feed a write as if the file system reported it.
    pub fn notify_write(&self, path: impl Into<PathBuf>) {
        let _ = self.writes.send(path.into());
    }

    pub fn watched_dirs(&self) -> impl Iterator<Item = &Path> {
        self.watched.iter().map(PathBuf::as_path)
    }

    /// Stop the debounce loop, dropping writes that were not flushed yet.
    pub async fn shutdown(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for ChangeWatcher {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

fn is_write(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Any)
            | EventKind::Access(AccessKind::Close(AccessMode::Write))
    )
}

fn is_watched_file(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    name.ends_with(SOURCE_EXT) || name == MODULE_FILE_NAME || name == LEGACY_FILE_NAME
}

async fn debounce_loop(
    mut writes: mpsc::UnboundedReceiver<PathBuf>,
    updates: mpsc::Sender<PackagesUpdate>,
    index: Arc<PackageIndex>,
    window: Duration,
    mut stop: oneshot::Receiver<()>,
) {
    let mut pending: BTreeSet<PathBuf> = BTreeSet::new();
    let mut deadline: Option<Instant> = None;

    loop {
        tokio::select! {
            _ = &mut stop => {
                if !pending.is_empty() {
                    debug!(files = pending.len(), "dropping unflushed writes");
                }
                break;
            }
            write = writes.recv() => match write {
                Some(path) => {
                    deadline.get_or_insert_with(|| Instant::now() + window);
                    pending.insert(path);
                }
                None => break,
            },
            _ = wait_until(deadline) => {
                deadline = None;
                let update = group_by_package(&index, std::mem::take(&mut pending));
                if update.is_empty() {
                    continue;
                }
                debug!(
                    packages = update.packages.len(),
                    files = update.file_count(),
                    "flushing package update"
                );
                if updates.send(update).await.is_err() {
                    break;
                }
            }
        }
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

fn group_by_package(index: &PackageIndex, files: BTreeSet<PathBuf>) -> PackagesUpdate {
    let mut grouped: BTreeMap<String, PackageUpdate> = BTreeMap::new();
    for file in files {
        let Some(pkg) = index.owner_of(&file) else {
            trace!(file = %file.display(), "write outside known packages");
            continue;
        };
        grouped
            .entry(pkg.import_path.clone())
            .or_insert_with(|| PackageUpdate {
                import_path: pkg.import_path.clone(),
                dir: pkg.dir.clone(),
                files: Vec::new(),
            })
            .files
            .push(file);
    }
    PackagesUpdate {
        packages: grouped.into_values().collect(),
    }
}
