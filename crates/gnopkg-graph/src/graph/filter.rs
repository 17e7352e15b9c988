use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};

use super::SortedPackages;
use crate::package::Package;
use crate::resolver::SkipReason;

impl SortedPackages {
    /// Packages that neither are drafts nor depend on one, in sorted order.
    ///
    /// Dependencies a resolver skipped for being drafts count as drafts.
    pub fn non_draft(&self) -> Vec<Arc<Package>> {
        let skipped = self
            .skipped
            .iter()
            .filter(|(_, reason)| **reason == SkipReason::Draft)
            .map(|(path, _)| path.as_str());
        without_tainted(&self.packages, &self.view_edges, |p| p.draft, skipped)
    }

    /// Packages that neither are ignored nor depend on an ignored package
    /// through source imports.
    pub fn non_ignored(&self) -> Vec<Arc<Package>> {
        without_tainted(&self.packages, &self.source_edges, |p| p.ignore, std::iter::empty())
    }
}

/// Single pass over a dependency-ordered list: a package is tainted when it
/// is marked or any of its edges reach a tainted path.
fn without_tainted<'a>(
    order: &'a [Arc<Package>],
    edges: &FxHashMap<String, Vec<String>>,
    marked: impl Fn(&Package) -> bool,
    tainted_paths: impl Iterator<Item = &'a str>,
) -> Vec<Arc<Package>> {
    let mut tainted: FxHashSet<&'a str> = tainted_paths.collect();
    let mut kept = Vec::with_capacity(order.len());
    for pkg in order {
        let reaches = edges
            .get(&pkg.import_path)
            .is_some_and(|deps| deps.iter().any(|d| tainted.contains(d.as_str())));
        if marked(pkg) || reaches {
            tainted.insert(pkg.import_path.as_str());
        } else {
            kept.push(Arc::clone(pkg));
        }
    }
    kept
}
