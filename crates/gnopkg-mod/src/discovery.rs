//! File-based module discovery
//!
//! Handles finding and loading module files from the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::descriptor::ModuleDescriptor;
use crate::error::{ModFileError, Result};
use crate::legacy::parse_legacy;
use crate::structured::parse_toml;

/// Name of the structured module file.
pub const MODULE_FILE_NAME: &str = "gnomod.toml";

/// Name of the legacy module file.
pub const LEGACY_FILE_NAME: &str = "gno.mod";

/// Module file discovery for a single directory
///
/// # Example
///
/// ```no_run
/// use gnopkg_mod::ModuleDiscovery;
///
/// let discovery = ModuleDiscovery::new("./examples/gno.land/p/demo/avl");
/// let module = discovery.load().unwrap();
/// println!("{}", module.path);
/// ```
pub struct ModuleDiscovery {
    root: PathBuf,
}

impl ModuleDiscovery {
    /// Create a new module discovery for a directory
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Find a module file in the directory
    ///
    /// Searches in this order:
    /// 1. `gnomod.toml`
    /// 2. `gno.mod`
    pub fn find(&self) -> Option<PathBuf> {
        [MODULE_FILE_NAME, LEGACY_FILE_NAME]
            .iter()
            .map(|name| self.root.join(name))
            .find(|path| path.is_file())
    }

    /// Load and sanitize the module file of the directory
    ///
    /// # Errors
    ///
    /// Returns `ModFileError::NotFound` if the directory has no module file.
    pub fn load(&self) -> Result<ModuleDescriptor> {
        let path = self
            .find()
            .ok_or_else(|| ModFileError::NotFound(self.root.clone()))?;
        load_from(&path)
    }

    /// Like [`load`](Self::load), but a missing module file is not an error.
    pub fn load_optional(&self) -> Result<Option<ModuleDescriptor>> {
        match self.find() {
            Some(path) => load_from(&path).map(Some),
            None => Ok(None),
        }
    }
}

/// Load a module file, choosing the parser from the file name.
pub fn load_from(path: &Path) -> Result<ModuleDescriptor> {
    let content = fs::read_to_string(path)?;
    let file = path.to_string_lossy();
    let mut desc = if path.file_name() == Some(std::ffi::OsStr::new(LEGACY_FILE_NAME)) {
        parse_legacy(&file, &content)?
    } else {
        parse_toml(&file, &content)?
    };
    desc.sanitize();
    trace!(module = %desc.path, file = %file, "loaded module file");
    Ok(desc)
}

/// Walk up from `start` to the nearest directory containing a module file.
pub fn find_module_root(start: impl AsRef<Path>) -> Option<PathBuf> {
    start
        .as_ref()
        .ancestors()
        .find(|dir| ModuleDiscovery::new(dir).find().is_some())
        .map(Path::to_path_buf)
}
