//! Shared setup for command implementations.

use std::path::{Path, PathBuf};

use crate::cli::LoadFlags;
use crate::config::{ConfigOverrides, GnopkgConfig, ResolverSetup};
use crate::error::{Result, ResultExt};

/// Everything a loading command needs: where it runs, its configuration and
/// the resolver stack built from it.
pub(crate) struct Session {
    pub cwd: PathBuf,
    pub config: GnopkgConfig,
    pub setup: ResolverSetup,
}

impl Session {
    pub fn open(flags: &LoadFlags, config_path: Option<&Path>, debounce_ms: Option<u64>) -> Result<Self> {
        let cwd = std::env::current_dir().context("Unable to determine the working directory")?;
        Self::open_in(cwd, flags, config_path, debounce_ms)
    }

    pub fn open_in(
        cwd: PathBuf,
        flags: &LoadFlags,
        config_path: Option<&Path>,
        debounce_ms: Option<u64>,
    ) -> Result<Self> {
        let overrides = ConfigOverrides {
            roots: flags.roots.clone(),
            debounce_ms,
            keep_other_files: None,
            cache: flags.no_cache.then_some(false),
        };
        let config = GnopkgConfig::load(&cwd, config_path, &overrides)?;
        let setup = config.resolver(&cwd);
        Ok(Self { cwd, config, setup })
    }
}

/// Resolve a path relative to a working directory.
pub fn resolve_path(path: &Path, cwd: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        cwd.join(path)
    }
}
