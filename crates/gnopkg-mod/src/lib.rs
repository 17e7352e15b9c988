//! Module descriptors for Gno packages.
//!
//! A module is declared by a `gnomod.toml` file (or the legacy `gno.mod`) at
//! the root of a package directory. Both syntaxes are parsed into the same
//! [`ModuleDescriptor`]; [`migrate`] converts the legacy form.
//!
//! ```no_run
//! use gnopkg_mod::{parse_toml, ModuleDiscovery};
//!
//! let m = parse_toml("gnomod.toml", "module = \"gno.land/p/demo/foo\"").unwrap();
//! assert_eq!(m.resolve("gno.land/p/demo/bar"), "gno.land/p/demo/bar");
//!
//! let found = ModuleDiscovery::new(".").load_optional().unwrap();
//! ```

pub mod descriptor;
pub mod discovery;
pub mod error;
pub mod legacy;
pub mod migrate;
pub mod structured;

// Re-export main types
pub use descriptor::*;
pub use error::*;

// Re-export parsers and discovery
pub use discovery::{LEGACY_FILE_NAME, MODULE_FILE_NAME, ModuleDiscovery, find_module_root, load_from};
pub use legacy::parse_legacy;
pub use migrate::{migrate, migrate_dir};
pub use structured::{parse_toml, to_toml_string};

#[cfg(all(test, feature = "proptest"))]
mod property_tests;
