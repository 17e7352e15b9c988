//! One-way migration from `gno.mod` to `gnomod.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::descriptor::{ModuleDescriptor, ModuleFormat};
use crate::discovery::{LEGACY_FILE_NAME, MODULE_FILE_NAME, load_from};
use crate::error::{ModFileError, Result};
use crate::structured::to_toml_string;

/// Render a legacy descriptor as `gnomod.toml` text.
///
/// `require` lines are dropped; the structured format has no equivalent.
pub fn migrate(legacy: &ModuleDescriptor) -> Result<String> {
    let mut desc = legacy.clone();
    desc.format = ModuleFormat::Toml;
    desc.require.clear();
    to_toml_string(&desc)
}

/// Replace the `gno.mod` of `dir` with an equivalent `gnomod.toml`.
///
/// Returns the path of the written file. A directory that already has a
/// `gnomod.toml` is left untouched.
pub fn migrate_dir(dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    let target = dir.join(MODULE_FILE_NAME);
    if target.is_file() {
        return Ok(target);
    }

    let legacy_path = dir.join(LEGACY_FILE_NAME);
    if !legacy_path.is_file() {
        return Err(ModFileError::NotFound(dir.to_path_buf()));
    }

    let legacy = load_from(&legacy_path)?;
    fs::write(&target, migrate(&legacy)?)?;
    fs::remove_file(&legacy_path)?;
    info!(module = %legacy.path, "migrated {} to {}", LEGACY_FILE_NAME, MODULE_FILE_NAME);
    Ok(target)
}
