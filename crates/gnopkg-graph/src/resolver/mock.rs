use std::sync::Arc;

use dashmap::DashMap;
use rustc_hash::FxHashMap;

use super::{ResolveError, ResolveResult, Resolver};
use crate::package::Package;

/// Fixed table of packages that counts how often each path is requested.
#[derive(Default)]
pub struct MockResolver {
    packages: FxHashMap<String, Arc<Package>>,
    calls: DashMap<String, usize>,
}

impl MockResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, pkg: Package) -> Self {
        self.insert(pkg);
        self
    }

    pub fn insert(&mut self, pkg: Package) {
        self.packages.insert(pkg.import_path.clone(), Arc::new(pkg));
    }

    pub fn resolve_calls(&self, path: &str) -> usize {
        self.calls.get(path).map(|c| *c).unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.iter().map(|c| *c.value()).sum()
    }
}

impl Resolver for MockResolver {
    fn name(&self) -> &str {
        "mock"
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        *self.calls.entry(path.to_string()).or_insert(0) += 1;
        self.packages
            .get(path)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(path.to_string()))
    }
}
