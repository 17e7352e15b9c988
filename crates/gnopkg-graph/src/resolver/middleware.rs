//! Resolver decorators.

use std::sync::{Arc, Weak};
use std::time::Instant;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use tracing::{debug, trace, warn};

use super::{ResolveError, ResolveResult, Resolver, SkipReason};
use crate::package::{FileKind, Package, is_stdlib_path};
use crate::reader::scanner::{check_syntax, scan_header};

type Entries = Arc<RwLock<FxHashMap<String, Arc<Package>>>>;

/// Shared handle on a [`CachedResolver`]'s entries.
#[derive(Clone, Default)]
pub struct CacheHandle {
    entries: Entries,
}

impl CacheHandle {
    /// Drop one entry. Returns whether it was cached.
    pub fn invalidate(&self, path: &str) -> bool {
        self.entries.write().remove(path).is_some()
    }

    pub fn clear(&self) {
        self.entries.write().clear();
    }

    pub fn contains(&self, path: &str) -> bool {
        self.entries.read().contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

/// Memoizes successful resolutions per import path.
///
/// Failures are never cached. The lock is not held while the inner resolver
/// runs; if two callers race on the same path, the first insert wins and both
/// get that package.
pub struct CachedResolver<R> {
    inner: R,
    cache: CacheHandle,
    should_cache: Box<dyn Fn(&Package) -> bool + Send + Sync>,
}

impl<R: Resolver> CachedResolver<R> {
    pub fn new<F>(inner: R, should_cache: F) -> Self
    where
        F: Fn(&Package) -> bool + Send + Sync + 'static,
    {
        Self {
            inner,
            cache: CacheHandle::default(),
            should_cache: Box::new(should_cache),
        }
    }

    pub fn handle(&self) -> CacheHandle {
        self.cache.clone()
    }

    pub fn invalidate(&self, path: &str) -> bool {
        self.cache.invalidate(path)
    }

    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl<R: Resolver> Resolver for CachedResolver<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        if let Some(pkg) = self.cache.entries.read().get(path) {
            return Ok(Arc::clone(pkg));
        }

        let pkg = self.inner.resolve(path)?;
        if !(self.should_cache)(&pkg) {
            return Ok(pkg);
        }

        let mut entries = self.cache.entries.write();
        Ok(Arc::clone(entries.entry(path.to_string()).or_insert(pkg)))
    }
}

/// Skips standard-library paths without consulting the inner resolver.
pub struct StdlibFilter<R> {
    inner: R,
}

impl<R: Resolver> StdlibFilter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Resolver> Resolver for StdlibFilter<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        if is_stdlib_path(path) {
            return Err(ResolveError::Skip {
                path: path.to_string(),
                reason: SkipReason::Stdlib,
            });
        }
        self.inner.resolve(path)
    }
}

/// Skips draft packages and packages without source files.
pub struct DraftFilter<R> {
    inner: R,
}

impl<R: Resolver> DraftFilter<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Resolver> Resolver for DraftFilter<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        let pkg = self.inner.resolve(path)?;
        let reason = if pkg.draft {
            SkipReason::Draft
        } else if pkg.source_file_count() == 0 {
            SkipReason::Empty
        } else {
            return Ok(pkg);
        };
        Err(ResolveError::Skip {
            path: path.to_string(),
            reason,
        })
    }
}

/// Rejects packages whose files do not scan or whose non-test files
/// disagree on the package name.
///
/// The verdict is remembered per import path for as long as the inner
/// resolver keeps handing out the same `Arc`, so a cache hit below this
/// layer never re-reads the files.
pub struct SyntaxChecker<R> {
    inner: R,
    verdicts: RwLock<FxHashMap<String, Verdict>>,
}

struct Verdict {
    // A live Weak keeps the allocation, so the address is never reused.
    pkg: Weak<Package>,
    result: Result<(), String>,
}

impl<R: Resolver> SyntaxChecker<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            verdicts: RwLock::new(FxHashMap::default()),
        }
    }

    fn verdict(&self, path: &str, pkg: &Arc<Package>) -> Result<(), String> {
        if let Some(v) = self.verdicts.read().get(path) {
            if Weak::as_ptr(&v.pkg) == Arc::as_ptr(pkg) {
                trace!(path, "syntax verdict reused");
                return v.result.clone();
            }
        }
        let result = self.check(pkg);
        self.verdicts.write().insert(
            path.to_string(),
            Verdict {
                pkg: Arc::downgrade(pkg),
                result: result.clone(),
            },
        );
        result
    }

    fn check(&self, pkg: &Package) -> Result<(), String> {
        let mut first: Option<(String, &str)> = None;
        for kind in [
            FileKind::PackageSource,
            FileKind::Test,
            FileKind::XTest,
            FileKind::Filetest,
        ] {
            for file in pkg.files_of(kind) {
                let body = pkg
                    .read_file(file)
                    .map_err(|e| format!("unable to read {file:?}: {e}"))?;
                let header = scan_header(&body)
                    .and_then(|h| check_syntax(&body).map(|_| h))
                    .map_err(|e| format!("file {file:?} have error(s): {file}:{e}"))?;

                if kind != FileKind::PackageSource {
                    continue;
                }
                if let Some((name, first_file)) = &first {
                    if *name != header.package_name {
                        return Err(format!(
                            "found packages {name} ({first_file}) and {} ({file})",
                            header.package_name
                        ));
                    }
                } else {
                    first = Some((header.package_name, file.as_str()));
                }
            }
        }
        Ok(())
    }
}

impl<R: Resolver> Resolver for SyntaxChecker<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        let pkg = self.inner.resolve(path)?;
        self.verdict(path, &pkg).map_err(|message| ResolveError::Invalid {
            path: path.to_string(),
            message,
        })?;
        Ok(pkg)
    }
}

/// Traces every resolution. Never changes the outcome.
pub struct LoggedResolver<R> {
    inner: R,
}

impl<R: Resolver> LoggedResolver<R> {
    pub fn new(inner: R) -> Self {
        Self { inner }
    }
}

impl<R: Resolver> Resolver for LoggedResolver<R> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn resolve(&self, path: &str) -> ResolveResult {
        let start = Instant::now();
        let res = self.inner.resolve(path);
        let took = start.elapsed();
        let resolver = self.inner.name();

        match &res {
            Ok(pkg) => debug!(resolver, path, dir = %pkg.dir.display(), ?took, "path resolved"),
            Err(ResolveError::NotFound(_)) => debug!(resolver, path, ?took, "package not found"),
            Err(ResolveError::Skip { reason, .. }) => {
                trace!(resolver, path, %reason, "package skipped")
            }
            Err(e) => warn!(resolver, path, error = %e, "unable to resolve package"),
        }
        res
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::package::{MemFile, PackageKind};
    use crate::reader::PackageReader;
    use crate::resolver::{MockResolver, ResolverExt};

    fn mem_pkg(path: &str, files: &[(&str, &str)]) -> Package {
        PackageReader::default().read_mem(
            path,
            files.iter().map(|(n, b)| MemFile::new(*n, *b)).collect(),
            PackageKind::Remote,
        )
    }

    #[test]
    fn cache_returns_same_package_and_skips_inner() {
        let mock = Arc::new(MockResolver::new().with(mem_pkg("a.b/x", &[("x.gno", "package x")])));
        let cached = mock.clone().cached();

        let first = cached.resolve("a.b/x").unwrap();
        let second = cached.resolve("a.b/x").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(mock.resolve_calls("a.b/x"), 1);
    }

    #[test]
    fn cache_never_stores_failures() {
        let mock = Arc::new(MockResolver::new());
        let cached = mock.clone().cached();

        assert!(cached.resolve("a.b/x").is_err());
        assert!(cached.resolve("a.b/x").is_err());
        assert_eq!(mock.resolve_calls("a.b/x"), 2);
        assert!(cached.handle().is_empty());
    }

    #[test]
    fn cache_predicate_opts_out() {
        let mock = Arc::new(
            MockResolver::new()
                .with(mem_pkg("a.b/keep", &[("k.gno", "package k")]))
                .with(mem_pkg("a.b/skip", &[("s.gno", "package s")])),
        );
        let cached = mock.clone().cached_if(|p| p.import_path != "a.b/skip");

        for _ in 0..2 {
            cached.resolve("a.b/keep").unwrap();
            cached.resolve("a.b/skip").unwrap();
        }
        assert_eq!(mock.resolve_calls("a.b/keep"), 1);
        assert_eq!(mock.resolve_calls("a.b/skip"), 2);
    }

    #[test]
    fn cache_invalidate_forces_reresolve() {
        let mock = Arc::new(MockResolver::new().with(mem_pkg("a.b/x", &[("x.gno", "package x")])));
        let cached = mock.clone().cached();
        let handle = cached.handle();

        cached.resolve("a.b/x").unwrap();
        assert!(handle.invalidate("a.b/x"));
        assert!(!handle.invalidate("a.b/x"));
        cached.resolve("a.b/x").unwrap();
        assert_eq!(mock.resolve_calls("a.b/x"), 2);
    }

    #[test]
    fn stdlib_filter_short_circuits() {
        let mock = Arc::new(MockResolver::new().with(mem_pkg("strings", &[("s.gno", "package strings")])));
        let filtered = mock.clone().filter_stdlibs();

        let err = filtered.resolve("strings").unwrap_err();
        assert_eq!(err.skip_reason(), Some(SkipReason::Stdlib));
        assert_eq!(mock.resolve_calls("strings"), 0);
        assert!(filtered.resolve("gno.land/p/x").unwrap_err().is_not_found());
    }

    #[test]
    fn draft_filter_skips_drafts_and_empty() {
        let mock = MockResolver::new()
            .with(mem_pkg(
                "a.b/draft",
                &[
                    ("d.gno", "package d"),
                    ("gnomod.toml", "module = \"a.b/draft\"\ndraft = true\n"),
                ],
            ))
            .with(mem_pkg("a.b/empty", &[("e_test.gno", "package e")]))
            .with(mem_pkg("a.b/ok", &[("ok.gno", "package ok")]));
        let filtered = mock.filter_drafts();

        assert_eq!(
            filtered.resolve("a.b/draft").unwrap_err().skip_reason(),
            Some(SkipReason::Draft)
        );
        assert_eq!(
            filtered.resolve("a.b/empty").unwrap_err().skip_reason(),
            Some(SkipReason::Empty)
        );
        assert!(filtered.resolve("a.b/ok").is_ok());
    }

    #[test]
    fn checker_rejects_invalid_files() {
        let mock = MockResolver::new()
            .with(mem_pkg(
                "a.b/bad",
                &[("valid.gno", "package bad"), ("invalid.gno", "package bad\nfunc F( {")],
            ))
            .with(mem_pkg("a.b/mixed", &[("a.gno", "package a"), ("b.gno", "package b")]))
            .with(mem_pkg("a.b/good", &[("g.gno", "package good\nfunc F() {}\n")]));
        let checked = mock.checked();

        let err = checked.resolve("a.b/bad").unwrap_err();
        assert!(err.to_string().contains("file \"invalid.gno\" have error(s)"));

        let err = checked.resolve("a.b/mixed").unwrap_err();
        assert!(err.to_string().contains("found packages a (a.gno) and b (b.gno)"));

        assert!(checked.resolve("a.b/good").is_ok());
    }

    #[test]
    fn checker_reuses_verdict_for_the_same_package() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("x.gno");
        std::fs::write(&file, "package x\n").unwrap();
        let pkg = PackageReader::default().read_dir(dir.path(), "a.b/x").unwrap();

        let mock = Arc::new(MockResolver::new().with(pkg));
        let checked = mock.clone().checked();
        assert!(checked.resolve("a.b/x").is_ok());

        // Same Arc from below: the broken file is not read again.
        std::fs::write(&file, "package x\nfunc F( {\n").unwrap();
        assert!(checked.resolve("a.b/x").is_ok());
        assert_eq!(mock.resolve_calls("a.b/x"), 2);

        // A fresh checker does read it.
        let err = mock.clone().checked().resolve("a.b/x").unwrap_err();
        assert!(err.to_string().contains("have error(s)"));
    }

    #[test]
    fn checker_rechecks_a_replaced_package() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("x.gno");
        std::fs::write(&file, "package x\n").unwrap();

        let cached = crate::resolver::LocalResolver::new("a.b/x", dir.path()).cached();
        let handle = cached.handle();
        let checked = cached.checked();
        assert!(checked.resolve("a.b/x").is_ok());

        std::fs::write(&file, "package x\nfunc F( {\n").unwrap();
        assert!(checked.resolve("a.b/x").is_ok());

        handle.invalidate("a.b/x");
        assert!(checked.resolve("a.b/x").is_err());
    }

    #[test]
    fn default_stack_order() {
        let mock = Arc::new(
            MockResolver::new()
                .with(mem_pkg(
                    "a.b/draft",
                    &[
                        ("d.gno", "package d\nfunc F( {"),
                        ("gnomod.toml", "module = \"a.b/draft\"\ndraft = true\n"),
                    ],
                ))
                .with(mem_pkg("a.b/ok", &[("ok.gno", "package ok")])),
        );
        let (stack, cache) = crate::resolver::default_stack_with_cache(mock.clone());

        // Drafts are skipped before the checker would reject the broken file.
        let err = stack.resolve("a.b/draft").unwrap_err();
        assert_eq!(err.skip_reason(), Some(SkipReason::Draft));

        let err = stack.resolve("strings").unwrap_err();
        assert_eq!(err.skip_reason(), Some(SkipReason::Stdlib));
        assert_eq!(mock.resolve_calls("strings"), 0);

        stack.resolve("a.b/ok").unwrap();
        stack.resolve("a.b/ok").unwrap();
        assert_eq!(mock.resolve_calls("a.b/ok"), 1);
        assert!(cache.contains("a.b/ok"));
    }
}
