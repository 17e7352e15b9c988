//! Development mode: watch loaded packages and reload them on change.
//!
//! - [`ChangeWatcher`] turns raw file writes into debounced per-package
//!   batches
//! - [`IncrementalCoordinator`] feeds those batches, and import paths asked
//!   for at runtime, into a [`DevProcess`]
//! - [`LoaderProcess`] is the process used by `gnopkg dev`: it reloads the
//!   tracked packages through a [`gnopkg_graph::Loader`]

pub mod coordinator;
pub mod process;
pub mod watcher;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

pub use coordinator::{DevProcess, IncrementalCoordinator};
pub use process::LoaderProcess;
pub use watcher::ChangeWatcher;

/// Events in the dev loop lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum DevEvent {
    /// Files of already loaded packages changed
    PackagesChanged { packages: Vec<String>, files: usize },

    /// A queried import path is now tracked
    PackageDiscovered { path: String },

    ReloadStarted { reason: String },

    ReloadCompleted { packages: usize, duration_ms: u64 },

    ReloadFailed { error: String },
}

/// Files of one package touched within a debounce window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageUpdate {
    pub import_path: String,
    pub dir: PathBuf,
    /// Sorted, without duplicates
    pub files: Vec<PathBuf>,
}

/// One debounced batch. Packages are sorted by import path, but consumers
/// should treat them as a set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackagesUpdate {
    pub packages: Vec<PackageUpdate>,
}

impl PackagesUpdate {
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn import_paths(&self) -> Vec<String> {
        self.packages.iter().map(|p| p.import_path.clone()).collect()
    }

    pub fn file_count(&self) -> usize {
        self.packages.iter().map(|p| p.files.len()).sum()
    }
}
