//! Layered configuration for the gnopkg CLI.
//!
//! Priority, lowest first: built-in defaults, `gnopkg.toml`, `GNOPKG_*`
//! environment variables, command-line flags.
//!
//! ```toml
//! # gnopkg.toml
//! roots = ["../gno/examples"]
//! debounce_ms = 200
//! injected = ["std", "testing", "gno.land/p/demo/testutils"]
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use gnopkg_graph::{
    CacheHandle, ChainResolver, DEFAULT_INJECTED, LoadOptions, ReadOptions, PackageReader,
    QueryClient, RemoteResolver, Resolver, ResolverExt, RootResolver, View,
    default_stack_with_cache,
    discover_workspace_packages,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const CONFIG_FILE_NAME: &str = "gnopkg.toml";
pub const ENV_PREFIX: &str = "GNOPKG_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GnopkgConfig {
    /// Directories holding packages laid out by import path
    pub roots: Vec<PathBuf>,
    /// Import paths provided by the runtime; never resolved
    pub injected: Vec<String>,
    /// Quiet window of the change watcher
    pub debounce_ms: u64,
    /// Keep non-source files in loaded packages
    pub keep_other_files: bool,
    /// Memoize resolved packages
    pub cache: bool,
    /// Resolve modules found under the working directory before the roots
    pub workspace: bool,
}

impl Default for GnopkgConfig {
    fn default() -> Self {
        Self {
            roots: Vec::new(),
            injected: DEFAULT_INJECTED.iter().map(|s| s.to_string()).collect(),
            debounce_ms: 100,
            keep_other_files: false,
            cache: true,
            workspace: true,
        }
    }
}

/// Values taken from command-line flags. Unset fields leave the lower
/// layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub roots: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keep_other_files: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cache: Option<bool>,
}

/// A resolver stack built from configuration.
pub struct ResolverSetup {
    pub resolver: Arc<dyn Resolver>,
    /// Present when caching is enabled
    pub cache: Option<CacheHandle>,
}

impl GnopkgConfig {
    /// Load configuration for a command running in `cwd`.
    ///
    /// An explicit `config_path` must exist; the implicit `gnopkg.toml` is
    /// optional. Relative roots are resolved against `cwd`.
    pub fn load(cwd: &Path, config_path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Self::default()));

        let config_file = match config_path {
            Some(path) => {
                let path = cwd.join(path);
                if !path.is_file() {
                    return Err(ConfigError::NotFound(path).into());
                }
                Some(path)
            }
            None => {
                let path = cwd.join(CONFIG_FILE_NAME);
                path.is_file().then_some(path)
            }
        };

        if let Some(path) = &config_file {
            debug!(path = %path.display(), "reading config file");
            figment = figment.merge(Toml::file(path));
        }

        figment = figment
            .merge(Env::prefixed(ENV_PREFIX))
            .merge(Serialized::defaults(overrides));

        let mut config: Self = figment.extract().map_err(|e| ConfigError::InvalidValue {
            field: if e.path.is_empty() {
                "configuration".to_string()
            } else {
                e.path.join(".")
            },
            value: e.kind.to_string(),
            hint: format!("Check {} syntax and {}* variables", CONFIG_FILE_NAME, ENV_PREFIX),
        })?;

        for root in &mut config.roots {
            if root.is_relative() {
                *root = cwd.join(&*root);
            }
        }
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounce_ms".to_string(),
                value: "0".to_string(),
                hint: "Use a positive number of milliseconds".to_string(),
            });
        }
        if let Some(root) = self.roots.iter().find(|r| !r.is_dir()) {
            return Err(ConfigError::MissingRoot(root.clone()));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn load_options(&self, deps: bool, view: View, allow_empty: bool) -> LoadOptions {
        LoadOptions {
            deps,
            view,
            allow_empty,
            keep_other_files: self.keep_other_files,
            injected: self.injected.clone(),
        }
    }

    /// Build the resolver stack: workspace modules under `cwd`, then the
    /// configured roots, wrapped in the default decorators.
    pub fn resolver(&self, cwd: &Path) -> ResolverSetup {
        self.resolver_with_remote(cwd, None)
    }

    /// Like [`resolver`](Self::resolver), falling back to a remote node for
    /// paths no local source serves.
    ///
    /// The CLI ships no node client; embedders that talk to a chain pass
    /// their own [`QueryClient`].
    pub fn resolver_with_remote(
        &self,
        cwd: &Path,
        remote: Option<Arc<dyn QueryClient>>,
    ) -> ResolverSetup {
        let reader = PackageReader::new(ReadOptions {
            keep_other_files: self.keep_other_files,
        });

        let mut chain = ChainResolver::new();
        if self.workspace {
            let workspace = discover_workspace_packages(&[cwd]).with_reader(reader.clone());
            debug!(modules = workspace.len(), "discovered workspace modules");
            chain.push(workspace);
        }
        if !self.roots.is_empty() {
            chain.push(RootResolver::new(self.roots.clone()).with_reader(reader.clone()));
        }
        if let Some(client) = remote {
            chain.push(RemoteResolver::new(client).with_reader(reader));
        }

        if self.cache {
            let (stack, handle) = default_stack_with_cache(chain);
            ResolverSetup {
                resolver: Arc::new(stack),
                cache: Some(handle),
            }
        } else {
            let stack = chain.filter_drafts().checked().filter_stdlibs().logged();
            ResolverSetup {
                resolver: Arc::new(stack),
                cache: None,
            }
        }
    }
}
