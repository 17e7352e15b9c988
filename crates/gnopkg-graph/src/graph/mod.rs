//! Dependency-graph construction.
//!
//! [`GraphBuilder`] resolves the import closure of a set of root packages,
//! applies each importer's `replace` directives, and emits the packages in
//! dependency order. Three views decide which imports count as edges:
//!
//! - [`View::Build`]: source imports only.
//! - [`View::OwnTests`]: roots also follow their in-package test imports. A
//!   test importing its own package is not an edge, but reaching the root
//!   again through another package is a cycle.
//! - [`View::ExternalTests`]: additionally, each root gets a synthetic
//!   `<root>_test` node carrying its external-test and filetest imports.
//!   Nothing imports that node, so it can never close a cycle, and it is not
//!   part of the output.
//!
//! Test edges only apply to the root being tested: two roots whose tests
//! import each other are fine.

mod filter;
pub mod sort;

use std::collections::{BTreeMap, VecDeque};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::{debug, trace};

use crate::package::{FileKind, Package};
use crate::reader::{PackageReader, ReadError};
use crate::resolver::{ResolveError, Resolver, SkipReason};
use sort::{DependencyNode, SortError, format_cycle, topological_sort_from};

/// Imports that are always available and never resolved.
pub const DEFAULT_INJECTED: &[&str] = &["std", "testing"];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum View {
    #[default]
    Build,
    OwnTests,
    ExternalTests,
}

impl View {
    fn follows_tests(self) -> bool {
        self != View::Build
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            View::Build => "build",
            View::OwnTests => "tests",
            View::ExternalTests => "xtests",
        })
    }
}

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("import cycle detected: {}", format_cycle(.path))]
    Cycle { path: Vec<String> },

    #[error("missing dependency {missing:?} imported by {importer:?}")]
    MissingDependency { missing: String, importer: String },

    #[error("resolving {path:?} imported by {importer:?}: {source}")]
    Resolve {
        path: String,
        importer: String,
        #[source]
        source: ResolveError,
    },

    #[error("replace {old:?} => {} in {importer:?}: {source}", .dir.display())]
    Replace {
        importer: String,
        old: String,
        dir: PathBuf,
        #[source]
        source: ReadError,
    },
}

/// Node identity: a package, or the synthetic external-test node of a root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NodeId {
    Package(String),
    XTest(String),
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeId::Package(p) => f.write_str(p),
            NodeId::XTest(p) => write!(f, "{p}_test"),
        }
    }
}

struct ViewNode<'a> {
    id: NodeId,
    package: &'a Arc<Package>,
    edges: &'a [NodeId],
}

impl DependencyNode for ViewNode<'_> {
    type Id = NodeId;

    fn id(&self) -> NodeId {
        self.id.clone()
    }

    fn dependency_ids(&self) -> Vec<NodeId> {
        self.edges.to_vec()
    }
}

/// Resolution state for one build call.
#[derive(Default)]
struct Closure {
    packages: FxHashMap<String, Arc<Package>>,
    /// Discovery order
    seen: Vec<String>,
    queue: VecDeque<String>,
    skipped: BTreeMap<String, SkipReason>,
}

impl Closure {
    fn add(&mut self, pkg: Arc<Package>) -> bool {
        if self.packages.contains_key(&pkg.import_path) {
            return false;
        }
        let path = pkg.import_path.clone();
        self.packages.insert(path.clone(), pkg);
        self.seen.push(path.clone());
        self.queue.push_back(path);
        true
    }
}

/// Post-replace dependency keys per package, skipped targets included.
#[derive(Default)]
struct Deps {
    source: FxHashMap<String, Vec<String>>,
    tests: FxHashMap<String, Vec<String>>,
    xtests: FxHashMap<String, Vec<String>>,
}

pub struct GraphBuilder<'r> {
    resolver: &'r dyn Resolver,
    reader: PackageReader,
    injected: FxHashSet<String>,
    view: View,
}

impl<'r> GraphBuilder<'r> {
    pub fn new(resolver: &'r dyn Resolver) -> Self {
        Self {
            resolver,
            reader: PackageReader::default(),
            injected: DEFAULT_INJECTED.iter().map(|s| s.to_string()).collect(),
            view: View::Build,
        }
    }

    pub fn view(mut self, view: View) -> Self {
        self.view = view;
        self
    }

    /// Replace the set of always-available imports.
    pub fn injected<I, S>(mut self, injected: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.injected = injected.into_iter().map(Into::into).collect();
        self
    }

    /// Reader used for packages reached through a local-directory replace.
    pub fn reader(mut self, reader: PackageReader) -> Self {
        self.reader = reader;
        self
    }

    /// Resolve the import closure of `roots` and sort it.
    ///
    /// Roots are preferred over the resolver for their own import paths.
    pub fn build(&self, roots: &[Arc<Package>]) -> Result<SortedPackages, GraphError> {
        let mut closure = Closure::default();
        let mut root_paths: Vec<String> = Vec::new();
        for root in roots {
            if closure.add(Arc::clone(root)) {
                root_paths.push(root.import_path.clone());
            }
        }
        let root_set: FxHashSet<&str> = root_paths.iter().map(String::as_str).collect();

        let mut deps = Deps::default();
        while let Some(path) = closure.queue.pop_front() {
            let Some(pkg) = closure.packages.get(&path).cloned() else {
                continue;
            };

            let source = self.dependencies(&pkg, &[FileKind::PackageSource], false, &mut closure)?;
            deps.source.insert(path.clone(), source);

            if root_set.contains(path.as_str()) && self.view.follows_tests() {
                let tests = self.dependencies(
                    &pkg,
                    &[FileKind::PackageSource, FileKind::Test],
                    true,
                    &mut closure,
                )?;
                deps.tests.insert(path.clone(), tests);

                if self.view == View::ExternalTests {
                    let xtests = self.dependencies(
                        &pkg,
                        &[FileKind::XTest, FileKind::Filetest],
                        false,
                        &mut closure,
                    )?;
                    deps.xtests.insert(path.clone(), xtests);
                }
            }
        }

        let order = self.sort(&closure, &deps, &root_paths)?;
        debug!(
            view = %self.view,
            roots = root_paths.len(),
            packages = order.len(),
            skipped = closure.skipped.len(),
            "dependency graph built"
        );

        let mut view_edges = deps.source.clone();
        for (path, tests) in &deps.tests {
            let mut edges = tests.clone();
            if let Some(x) = deps.xtests.get(path) {
                edges.extend(x.iter().filter(|d| *d != path).cloned());
            }
            edges.sort();
            edges.dedup();
            view_edges.insert(path.clone(), edges);
        }

        Ok(SortedPackages {
            packages: order,
            source_edges: deps.source,
            view_edges,
            skipped: closure.skipped,
            view: self.view,
        })
    }

    /// Locate every import of `kinds`, resolving new packages on the way.
    fn dependencies(
        &self,
        importer: &Arc<Package>,
        kinds: &[FileKind],
        skip_self: bool,
        closure: &mut Closure,
    ) -> Result<Vec<String>, GraphError> {
        let mut out = Vec::new();
        for raw in importer.imports_for(kinds) {
            if self.injected.contains(&raw) || (skip_self && raw == importer.import_path) {
                continue;
            }
            if let Some(key) = self.locate(importer, &raw, closure)? {
                out.push(key);
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Apply the importer's replace directives and make sure the target is
    /// in the closure. Returns the target key, or `None` for injected paths.
    fn locate(
        &self,
        importer: &Package,
        raw: &str,
        closure: &mut Closure,
    ) -> Result<Option<String>, GraphError> {
        let replacement = importer.module.as_ref().and_then(|m| m.replacement_for(raw));
        let (key, local_dir) = match replacement {
            Some(r) if r.is_local_dir() => (raw.to_string(), Some(r.new.as_str())),
            Some(r) => (r.new.clone(), None),
            None => (raw.to_string(), None),
        };

        if self.injected.contains(&key) {
            return Ok(None);
        }
        if closure.packages.contains_key(&key) || closure.skipped.contains_key(&key) {
            return Ok(Some(key));
        }

        let pkg = match local_dir {
            Some(rel) => {
                let dir = path_clean::clean(importer.dir.join(rel));
                trace!(importer = %importer.import_path, path = %key, dir = %dir.display(), "replace to local directory");
                let pkg = self
                    .reader
                    .read_dir(&dir, &key)
                    .map_err(|source| GraphError::Replace {
                        importer: importer.import_path.clone(),
                        old: raw.to_string(),
                        dir: dir.clone(),
                        source,
                    })?;
                Arc::new(pkg)
            }
            None => match self.resolver.resolve(&key) {
                Ok(pkg) => pkg,
                Err(ResolveError::Skip { reason, .. }) => {
                    closure.skipped.insert(key.clone(), reason);
                    return Ok(Some(key));
                }
                Err(ResolveError::NotFound(_)) => {
                    return Err(GraphError::MissingDependency {
                        missing: key,
                        importer: importer.import_path.clone(),
                    });
                }
                Err(source) => {
                    return Err(GraphError::Resolve {
                        path: key,
                        importer: importer.import_path.clone(),
                        source,
                    });
                }
            },
        };

        if pkg.import_path != key {
            // A resolver may canonicalize; keep the requested key as identity.
            let mut owned = (*pkg).clone();
            owned.import_path = key.clone();
            closure.add(Arc::new(owned));
        } else {
            closure.add(pkg);
        }
        Ok(Some(key))
    }

    fn sort(
        &self,
        closure: &Closure,
        deps: &Deps,
        roots: &[String],
    ) -> Result<Vec<Arc<Package>>, GraphError> {
        let source_edges: FxHashMap<&str, Vec<NodeId>> = closure
            .seen
            .iter()
            .map(|p| (p.as_str(), present_ids(closure, deps.source.get(p))))
            .collect();

        let mut out: Vec<Arc<Package>> = Vec::new();
        let mut emitted: FxHashSet<String> = FxHashSet::default();

        if !self.view.follows_tests() {
            let nodes = view_nodes(closure, &source_edges, None, &[]);
            let starts: Vec<NodeId> = roots.iter().map(|r| NodeId::Package(r.clone())).collect();
            let sorted = topological_sort_from(&nodes, &starts, |_| false).map_err(sort_error)?;
            emit(sorted, &mut out, &mut emitted);
            return Ok(out);
        }

        for root in roots {
            let tests = present_ids(closure, deps.tests.get(root));
            let xtests = present_ids(closure, deps.xtests.get(root));
            let mut nodes = view_nodes(closure, &source_edges, Some(root), &tests);
            let mut starts = vec![NodeId::Package(root.clone())];

            if self.view == View::ExternalTests {
                if let Some(package) = closure.packages.get(root) {
                    nodes.push(ViewNode {
                        id: NodeId::XTest(root.clone()),
                        package,
                        edges: &xtests,
                    });
                    starts.push(NodeId::XTest(root.clone()));
                }
            }

            let sorted = topological_sort_from(&nodes, &starts, |_| false).map_err(sort_error)?;
            emit(sorted, &mut out, &mut emitted);
        }
        Ok(out)
    }
}

/// Dependency keys that made it into the closure, as node ids.
fn present_ids(closure: &Closure, keys: Option<&Vec<String>>) -> Vec<NodeId> {
    keys.into_iter()
        .flatten()
        .filter(|k| closure.packages.contains_key(*k))
        .map(|k| NodeId::Package(k.clone()))
        .collect()
}

/// One node per package, using source edges except for `active`.
fn view_nodes<'a>(
    closure: &'a Closure,
    source_edges: &'a FxHashMap<&str, Vec<NodeId>>,
    active: Option<&str>,
    active_edges: &'a [NodeId],
) -> Vec<ViewNode<'a>> {
    let mut nodes = Vec::with_capacity(closure.seen.len() + 1);
    for path in &closure.seen {
        let Some(package) = closure.packages.get(path) else {
            continue;
        };
        let edges = if active == Some(path.as_str()) {
            active_edges
        } else {
            source_edges
                .get(path.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default()
        };
        nodes.push(ViewNode {
            id: NodeId::Package(path.clone()),
            package,
            edges,
        });
    }
    nodes
}

fn emit(sorted: Vec<&ViewNode<'_>>, out: &mut Vec<Arc<Package>>, emitted: &mut FxHashSet<String>) {
    for node in sorted {
        if let NodeId::Package(path) = &node.id {
            if emitted.insert(path.clone()) {
                out.push(Arc::clone(node.package));
            }
        }
    }
}

fn sort_error(err: SortError<NodeId>) -> GraphError {
    match err {
        SortError::Cycle(path) => GraphError::Cycle {
            path: path.iter().map(ToString::to_string).collect(),
        },
        SortError::Missing { missing, importer } => GraphError::MissingDependency {
            missing: missing.to_string(),
            importer: importer.to_string(),
        },
    }
}

/// Packages in dependency order, with the edges used to produce them.
#[derive(Debug, Clone)]
pub struct SortedPackages {
    packages: Vec<Arc<Package>>,
    source_edges: FxHashMap<String, Vec<String>>,
    view_edges: FxHashMap<String, Vec<String>>,
    skipped: BTreeMap<String, SkipReason>,
    view: View,
}

impl SortedPackages {
    pub fn packages(&self) -> &[Arc<Package>] {
        &self.packages
    }

    pub fn into_packages(self) -> Vec<Arc<Package>> {
        self.packages
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<Package>> {
        self.packages.iter()
    }

    pub fn len(&self) -> usize {
        self.packages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn import_paths(&self) -> Vec<&str> {
        self.packages.iter().map(|p| p.import_path.as_str()).collect()
    }

    /// Paths that a resolver declined, with the reason.
    pub fn skipped(&self) -> &BTreeMap<String, SkipReason> {
        &self.skipped
    }

    /// Post-replace source dependencies of a package.
    pub fn source_edges(&self, import_path: &str) -> &[String] {
        self.source_edges
            .get(import_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Post-replace dependencies of a package in the built view.
    pub fn view_edges(&self, import_path: &str) -> &[String] {
        self.view_edges
            .get(import_path)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}

impl<'a> IntoIterator for &'a SortedPackages {
    type Item = &'a Arc<Package>;
    type IntoIter = std::slice::Iter<'a, Arc<Package>>;

    fn into_iter(self) -> Self::IntoIter {
        self.packages.iter()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use gnopkg_mod::{ModuleDescriptor, Replacement};
    use tempfile::TempDir;

    use super::*;
    use crate::package::PackageKind;
    use crate::resolver::{MockResolver, ResolverExt};

    fn pkg(path: &str, imports: &[&str]) -> Package {
        let mut p = Package::new(path, "", PackageKind::Remote);
        p.name = path.rsplit('/').next().unwrap_or(path).to_string();
        p.files
            .insert(FileKind::PackageSource, vec![format!("{}.gno", p.name)]);
        p.imports.insert(
            FileKind::PackageSource,
            imports.iter().map(|s| s.to_string()).collect(),
        );
        p
    }

    fn with_imports(mut p: Package, kind: FileKind, imports: &[&str]) -> Package {
        p.imports
            .insert(kind, imports.iter().map(|s| s.to_string()).collect());
        p
    }

    fn paths(sorted: &SortedPackages) -> Vec<&str> {
        sorted.import_paths()
    }

    #[test]
    fn emits_dependencies_before_dependents() {
        let r = MockResolver::new()
            .with(pkg("x.y/b", &["x.y/c"]))
            .with(pkg("x.y/c", &[]));
        let root = Arc::new(pkg("x.y/a", &["x.y/b"]));

        let sorted = GraphBuilder::new(&r).build(&[root]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/c", "x.y/b", "x.y/a"]);
    }

    #[test]
    fn cycle_reports_full_path() {
        let r = MockResolver::new()
            .with(pkg("x.y/b", &["x.y/c"]))
            .with(pkg("x.y/c", &["x.y/a"]));
        let root = Arc::new(pkg("x.y/a", &["x.y/b"]));

        let err = GraphBuilder::new(&r).build(&[root]).unwrap_err();
        match &err {
            GraphError::Cycle { path } => {
                assert_eq!(path, &["x.y/a", "x.y/b", "x.y/c", "x.y/a"]);
            }
            other => panic!("expected cycle, got {other}"),
        }
        assert_eq!(
            err.to_string(),
            "import cycle detected: x.y/a -> x.y/b -> x.y/c -> x.y/a"
        );
    }

    #[test]
    fn missing_dependency_names_importer() {
        let r = MockResolver::new();
        let root = Arc::new(pkg("x.y/a", &["x.y/ghost"]));

        let err = GraphBuilder::new(&r).build(&[root]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("x.y/ghost"), "{msg}");
        assert!(msg.contains("x.y/a"), "{msg}");
        assert!(matches!(err, GraphError::MissingDependency { .. }));
    }

    #[test]
    fn injected_imports_are_never_resolved() {
        let r = MockResolver::new();
        let root = Arc::new(pkg("x.y/a", &["std", "testing"]));

        let sorted = GraphBuilder::new(&r).build(&[root]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/a"]);
        assert_eq!(r.total_calls(), 0);
    }

    #[test]
    fn custom_injected_set() {
        let r = MockResolver::new();
        let root = Arc::new(pkg("x.y/a", &["std", "chain"]));

        let sorted = GraphBuilder::new(&r)
            .injected(["std", "chain"])
            .build(&[root])
            .unwrap();
        assert_eq!(sorted.len(), 1);
    }

    #[test]
    fn roots_are_preferred_over_resolver() {
        let r = MockResolver::new().with(pkg("x.y/b", &[]));
        let a = Arc::new(pkg("x.y/a", &["x.y/b"]));
        let b = Arc::new(pkg("x.y/b", &[]));

        let sorted = GraphBuilder::new(&r)
            .build(&[a, Arc::clone(&b), Arc::clone(&b)])
            .unwrap();
        assert_eq!(paths(&sorted), ["x.y/b", "x.y/a"]);
        assert_eq!(r.resolve_calls("x.y/b"), 0);
        assert!(Arc::ptr_eq(&sorted.packages()[0], &b));
    }

    #[test]
    fn shared_dependency_resolved_once() {
        let r = MockResolver::new()
            .with(pkg("x.y/left", &["x.y/base"]))
            .with(pkg("x.y/right", &["x.y/base"]))
            .with(pkg("x.y/base", &[]));
        let root = Arc::new(pkg("x.y/top", &["x.y/left", "x.y/right"]));

        let sorted = GraphBuilder::new(&r).build(&[root]).unwrap();
        assert_eq!(
            paths(&sorted),
            ["x.y/base", "x.y/left", "x.y/right", "x.y/top"]
        );
        assert_eq!(r.resolve_calls("x.y/base"), 1);
    }

    #[test]
    fn build_view_ignores_test_imports() {
        let r = MockResolver::new();
        let root = with_imports(pkg("x.y/a", &[]), FileKind::Test, &["x.y/only-tests"]);

        let sorted = GraphBuilder::new(&r).build(&[Arc::new(root)]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/a"]);
    }

    #[test]
    fn tests_of_two_roots_may_import_each_other() {
        let r = MockResolver::new();
        let a = with_imports(pkg("x.y/a", &[]), FileKind::Test, &["x.y/b"]);
        let b = with_imports(pkg("x.y/b", &[]), FileKind::Test, &["x.y/a"]);

        let sorted = GraphBuilder::new(&r)
            .view(View::OwnTests)
            .build(&[Arc::new(a), Arc::new(b)])
            .unwrap();
        assert_eq!(paths(&sorted), ["x.y/b", "x.y/a"]);
    }

    #[test]
    fn test_reaching_its_root_again_is_a_cycle() {
        let r = MockResolver::new().with(pkg("x.y/helper", &["x.y/a"]));
        let a = with_imports(pkg("x.y/a", &[]), FileKind::Test, &["x.y/a", "x.y/helper"]);

        let err = GraphBuilder::new(&r)
            .view(View::OwnTests)
            .build(&[Arc::new(a)])
            .unwrap_err();
        assert!(matches!(err, GraphError::Cycle { .. }), "{err}");
    }

    #[test]
    fn external_tests_may_import_their_root() {
        let r = MockResolver::new().with(pkg("x.y/helper", &["x.y/a"]));
        let a = with_imports(
            pkg("x.y/a", &[]),
            FileKind::XTest,
            &["x.y/a", "x.y/helper"],
        );
        let a = Arc::new(a);

        let sorted = GraphBuilder::new(&r)
            .view(View::ExternalTests)
            .build(&[Arc::clone(&a)])
            .unwrap();
        assert_eq!(paths(&sorted), ["x.y/a", "x.y/helper"]);

        let own = GraphBuilder::new(&r).view(View::OwnTests).build(&[a]).unwrap();
        assert_eq!(paths(&own), ["x.y/a"]);
    }

    #[test]
    fn filetest_imports_follow_external_view() {
        let r = MockResolver::new().with(pkg("x.y/fixture", &[]));
        let a = with_imports(pkg("x.y/a", &[]), FileKind::Filetest, &["x.y/fixture"]);

        let sorted = GraphBuilder::new(&r)
            .view(View::ExternalTests)
            .build(&[Arc::new(a)])
            .unwrap();
        assert_eq!(paths(&sorted), ["x.y/a", "x.y/fixture"]);
    }

    #[test]
    fn replace_to_other_path() {
        let r = MockResolver::new().with(pkg("x.y/new", &[]));
        let mut a = pkg("x.y/a", &["x.y/old"]);
        let mut module = ModuleDescriptor::new("x.y/a");
        module.replace.push(Replacement::new("x.y/old", "x.y/new"));
        a.module = Some(module);

        let sorted = GraphBuilder::new(&r).build(&[Arc::new(a)]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/new", "x.y/a"]);
        assert_eq!(sorted.source_edges("x.y/a"), ["x.y/new"]);
        assert_eq!(r.resolve_calls("x.y/old"), 0);
    }

    #[test]
    fn replace_to_local_directory() {
        let tmp = TempDir::new().unwrap();
        let a_dir = tmp.path().join("a");
        let z_dir = tmp.path().join("local/z");
        fs::create_dir_all(&a_dir).unwrap();
        fs::create_dir_all(&z_dir).unwrap();
        fs::write(z_dir.join("z.gno"), "package z\n").unwrap();

        let mut a = pkg("x.y/a", &["x.y/z"]);
        a.dir = a_dir;
        let mut module = ModuleDescriptor::new("x.y/a");
        module.replace.push(Replacement::new("x.y/z", "../local/z"));
        a.module = Some(module);

        let r = MockResolver::new();
        let sorted = GraphBuilder::new(&r).build(&[Arc::new(a)]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/z", "x.y/a"]);
        assert_eq!(sorted.packages()[0].dir, z_dir);
        assert_eq!(r.total_calls(), 0);
    }

    #[test]
    fn unreadable_local_replace_fails() {
        let tmp = TempDir::new().unwrap();
        let mut a = pkg("x.y/a", &["x.y/z"]);
        a.dir = tmp.path().to_path_buf();
        let mut module = ModuleDescriptor::new("x.y/a");
        module.replace.push(Replacement::new("x.y/z", "./missing"));
        a.module = Some(module);

        let err = GraphBuilder::new(&MockResolver::new())
            .build(&[Arc::new(a)])
            .unwrap_err();
        assert!(matches!(err, GraphError::Replace { .. }), "{err}");
    }

    #[test]
    fn skipped_dependencies_are_leaves() {
        let r = MockResolver::new().filter_stdlibs();
        let root = Arc::new(pkg("x.y/a", &["strings"]));

        let sorted = GraphBuilder::new(&r).build(&[root]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/a"]);
        assert_eq!(sorted.skipped().get("strings"), Some(&SkipReason::Stdlib));
        assert_eq!(sorted.source_edges("x.y/a"), ["strings"]);
    }

    #[test]
    fn non_draft_drops_drafts_and_dependents() {
        let mut d = pkg("x.y/d", &[]);
        d.draft = true;
        let r = MockResolver::new().with(d);
        let a = Arc::new(pkg("x.y/a", &["x.y/d"]));
        let b = Arc::new(pkg("x.y/b", &[]));

        let sorted = GraphBuilder::new(&r).build(&[a, b]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/d", "x.y/a", "x.y/b"]);
        let kept: Vec<_> = sorted.non_draft().iter().map(|p| p.import_path.clone()).collect();
        assert_eq!(kept, ["x.y/b"]);
    }

    #[test]
    fn non_draft_counts_skipped_drafts() {
        let mut d = pkg("x.y/d", &[]);
        d.draft = true;
        let r = MockResolver::new()
            .with(d)
            .with(pkg("x.y/a", &["x.y/d"]))
            .filter_drafts();
        let b = Arc::new(pkg("x.y/b", &["x.y/a"]));
        let c = Arc::new(pkg("x.y/c", &[]));

        let sorted = GraphBuilder::new(&r).build(&[b, c]).unwrap();
        assert_eq!(paths(&sorted), ["x.y/a", "x.y/b", "x.y/c"]);
        assert_eq!(sorted.skipped().get("x.y/d"), Some(&SkipReason::Draft));
        let kept: Vec<_> = sorted.non_draft().iter().map(|p| p.import_path.clone()).collect();
        assert_eq!(kept, ["x.y/c"]);
    }

    #[test]
    fn non_ignored_follows_source_edges() {
        let mut ig = pkg("x.y/ig", &[]);
        ig.ignore = true;
        let r = MockResolver::new().with(ig);
        let a = Arc::new(pkg("x.y/a", &["x.y/ig"]));
        let c = Arc::new(pkg("x.y/c", &[]));

        let sorted = GraphBuilder::new(&r).build(&[a, c]).unwrap();
        let kept: Vec<_> = sorted.non_ignored().iter().map(|p| p.import_path.clone()).collect();
        assert_eq!(kept, ["x.y/c"]);
    }
}
