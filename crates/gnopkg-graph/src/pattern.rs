//! Command-line pattern classification and expansion.
//!
//! A pattern names a directory (`./foo`, `/abs/bar`), a single source file
//! (`main.gno`), an import path (`gno.land/p/demo/avl`, `strings`), or a
//! recursive local walk (`./...`, `foo/...`). The recursive marker must be
//! the whole last segment.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::package::SOURCE_EXT;
use gnopkg_mod::{LEGACY_FILE_NAME, MODULE_FILE_NAME};

const RECURSIVE: &str = "...";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatternKind {
    SingleFile,
    Directory,
    RecursiveLocal,
    Remote,
    RecursiveRemote,
}

impl PatternKind {
    pub fn is_literal(self) -> bool {
        !matches!(self, PatternKind::RecursiveLocal | PatternKind::RecursiveRemote)
    }
}

#[derive(Debug, Error)]
pub enum PatternError {
    #[error("{0}: partial globs are not supported")]
    PartialGlob(String),

    #[error("{0}: recursive remote patterns are not supported")]
    RecursiveRemote(String),

    #[error("{pattern}: no such directory {}", .dir.display())]
    MissingBase { pattern: String, dir: PathBuf },

    #[error("{pattern}: {source}")]
    Walk {
        pattern: String,
        #[source]
        source: walkdir::Error,
    },
}

/// Classify a pattern. Bare words are checked against `cwd` so that a local
/// directory named like a standard-library package wins.
pub fn classify(pattern: &str, cwd: &Path) -> Result<PatternKind, PatternError> {
    if pattern.contains(RECURSIVE) {
        let base = recursive_base(pattern)?;
        return Ok(if is_remote_like(base) {
            PatternKind::RecursiveRemote
        } else {
            PatternKind::RecursiveLocal
        });
    }

    if pattern.ends_with(SOURCE_EXT) {
        return Ok(PatternKind::SingleFile);
    }
    if is_explicitly_local(pattern) {
        return Ok(PatternKind::Directory);
    }
    if is_remote_like(pattern) {
        return Ok(PatternKind::Remote);
    }

    match fs::metadata(cwd.join(pattern)) {
        Ok(meta) if meta.is_dir() => Ok(PatternKind::Directory),
        Ok(_) => Ok(PatternKind::SingleFile),
        Err(_) => Ok(PatternKind::Remote),
    }
}

/// Base of a recursive pattern: `.` for `...`, `foo` for `foo/...`.
fn recursive_base(pattern: &str) -> Result<&str, PatternError> {
    if pattern == RECURSIVE {
        return Ok(".");
    }
    match pattern.strip_suffix("/...") {
        Some(base) if !base.contains(RECURSIVE) => Ok(if base.is_empty() { "/" } else { base }),
        _ => Err(PatternError::PartialGlob(pattern.to_string())),
    }
}

fn is_explicitly_local(pattern: &str) -> bool {
    pattern == "." || pattern == ".." || pattern.starts_with("./") || pattern.starts_with("../")
        || Path::new(pattern).is_absolute()
}

fn is_remote_like(pattern: &str) -> bool {
    if is_explicitly_local(pattern) {
        return false;
    }
    let first = pattern.split('/').next().unwrap_or_default();
    first.contains('.')
}

/// What a set of patterns resolved to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "lowercase")]
pub enum MatchTarget {
    Dir(PathBuf),
    Remote(String),
    /// The synthetic package built from every single-file pattern
    Files,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternMatch {
    pub target: MatchTarget,
    /// Patterns that produced this target, in command-line order
    pub patterns: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Expansion {
    pub matches: Vec<PatternMatch>,
    /// Absolute paths of single-file patterns
    pub files: Vec<PathBuf>,
    pub warnings: Vec<String>,
}

/// Expand patterns into de-duplicated targets, in first-seen order.
pub fn expand<S: AsRef<str>>(cwd: &Path, patterns: &[S]) -> Result<Expansion, PatternError> {
    let mut targets: IndexMap<MatchTarget, Vec<String>> = IndexMap::new();
    let mut files: Vec<PathBuf> = Vec::new();
    let mut warnings = Vec::new();

    let mut add = |target: MatchTarget, pattern: &str| {
        let patterns = targets.entry(target).or_default();
        if !patterns.iter().any(|p| p == pattern) {
            patterns.push(pattern.to_string());
        }
    };

    for pattern in patterns {
        let pattern = pattern.as_ref();
        match classify(pattern, cwd)? {
            PatternKind::SingleFile => {
                let file = path_clean::clean(cwd.join(pattern));
                if !files.contains(&file) {
                    files.push(file);
                }
                add(MatchTarget::Files, pattern);
            }
            PatternKind::Directory => {
                add(MatchTarget::Dir(path_clean::clean(cwd.join(pattern))), pattern);
            }
            PatternKind::Remote => add(MatchTarget::Remote(pattern.to_string()), pattern),
            PatternKind::RecursiveRemote => {
                return Err(PatternError::RecursiveRemote(pattern.to_string()));
            }
            PatternKind::RecursiveLocal => {
                let base = path_clean::clean(cwd.join(recursive_base(pattern)?));
                let dirs = walk_packages(pattern, &base)?;
                if dirs.is_empty() {
                    warn!(pattern, "pattern matched no packages");
                    warnings.push(format!("{pattern}: matched no packages"));
                }
                for dir in dirs {
                    add(MatchTarget::Dir(dir), pattern);
                }
            }
        }
    }

    debug!(patterns = patterns.len(), targets = targets.len(), "expanded patterns");
    Ok(Expansion {
        matches: targets
            .into_iter()
            .map(|(target, patterns)| PatternMatch { target, patterns })
            .collect(),
        files,
        warnings,
    })
}

/// Directories under `base` holding a source or module file.
fn walk_packages(pattern: &str, base: &Path) -> Result<Vec<PathBuf>, PatternError> {
    if !base.is_dir() {
        return Err(PatternError::MissingBase {
            pattern: pattern.to_string(),
            dir: base.to_path_buf(),
        });
    }

    let walker = WalkDir::new(base)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !is_hidden(e.file_name()));

    let mut dirs = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|source| PatternError::Walk {
            pattern: pattern.to_string(),
            source,
        })?;
        if entry.file_type().is_dir() && holds_package(entry.path()) {
            dirs.push(entry.into_path());
        }
    }
    Ok(dirs)
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || name.starts_with('_')
}

fn holds_package(dir: &Path) -> bool {
    let Ok(entries) = fs::read_dir(dir) else {
        return false;
    };
    entries.flatten().any(|e| {
        let name = e.file_name();
        let name = name.to_string_lossy();
        let is_file = e.file_type().is_ok_and(|t| t.is_file());
        is_file && (name.ends_with(SOURCE_EXT) || name == MODULE_FILE_NAME || name == LEGACY_FILE_NAME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree(files: &[&str]) -> TempDir {
        let tmp = TempDir::new().unwrap();
        for f in files {
            let path = tmp.path().join(f);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, "package x\n").unwrap();
        }
        tmp
    }

    #[test]
    fn classify_shapes() {
        let tmp = tree(&["local/a.gno"]);
        let cwd = tmp.path();
        let kind = |p: &str| classify(p, cwd).unwrap();

        assert_eq!(kind("./foo"), PatternKind::Directory);
        assert_eq!(kind("../foo"), PatternKind::Directory);
        assert_eq!(kind("."), PatternKind::Directory);
        assert_eq!(kind("/abs/dir"), PatternKind::Directory);
        assert_eq!(kind("main.gno"), PatternKind::SingleFile);
        assert_eq!(kind("gno.land/p/demo/avl"), PatternKind::Remote);
        assert_eq!(kind("strings"), PatternKind::Remote);
        assert_eq!(kind("local"), PatternKind::Directory);
        assert_eq!(kind("..."), PatternKind::RecursiveLocal);
        assert_eq!(kind("./..."), PatternKind::RecursiveLocal);
        assert_eq!(kind("foo/..."), PatternKind::RecursiveLocal);
        assert_eq!(kind("gno.land/p/..."), PatternKind::RecursiveRemote);
        assert!(!PatternKind::RecursiveLocal.is_literal());
        assert!(PatternKind::Remote.is_literal());
    }

    #[test]
    fn partial_globs_are_rejected() {
        let cwd = Path::new("/");
        for p in [".../bar", "foo...bar", "a/.../b", "foo..."] {
            let err = classify(p, cwd).unwrap_err();
            assert_eq!(err.to_string(), format!("{p}: partial globs are not supported"));
        }
    }

    #[test]
    fn recursive_remote_fails_expansion() {
        let err = expand(Path::new("/"), &["gno.land/r/..."]).unwrap_err();
        assert!(matches!(err, PatternError::RecursiveRemote(_)));
    }

    #[test]
    fn recursive_walk_collects_package_dirs() {
        let tmp = tree(&[
            "a/a.gno",
            "b/b.gno",
            "b/nested/n.gno",
            "c/gnomod.toml",
            "docs/README.md",
            ".hidden/h.gno",
            "_skip/s.gno",
        ]);

        let exp = expand(tmp.path(), &["./..."]).unwrap();
        let dirs: Vec<_> = exp
            .matches
            .iter()
            .map(|m| match &m.target {
                MatchTarget::Dir(d) => d.strip_prefix(tmp.path()).unwrap().to_path_buf(),
                other => panic!("unexpected {other:?}"),
            })
            .collect();
        assert_eq!(
            dirs,
            ["a", "b", "b/nested", "c"].map(PathBuf::from).to_vec()
        );
        assert!(exp.warnings.is_empty());
    }

    #[test]
    fn empty_walk_warns() {
        let tmp = tree(&["docs/README.md"]);
        let exp = expand(tmp.path(), &["docs/..."]).unwrap();
        assert!(exp.matches.is_empty());
        assert_eq!(exp.warnings, ["docs/...: matched no packages"]);
    }

    #[test]
    fn missing_walk_base_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let err = expand(tmp.path(), &["nope/..."]).unwrap_err();
        assert!(matches!(err, PatternError::MissingBase { .. }));
    }

    #[test]
    fn single_files_group_together() {
        let tmp = tree(&["x/a.gno", "x/b.gno"]);
        let exp = expand(tmp.path(), &["x/a.gno", "x/b.gno", "x/a.gno"]).unwrap();

        assert_eq!(exp.matches.len(), 1);
        assert_eq!(exp.matches[0].target, MatchTarget::Files);
        assert_eq!(exp.matches[0].patterns, ["x/a.gno", "x/b.gno"]);
        assert_eq!(exp.files.len(), 2);
    }

    #[test]
    fn duplicate_targets_merge_patterns() {
        let tmp = tree(&["a/a.gno"]);
        let exp = expand(tmp.path(), &["./a", "./...", "a"]).unwrap();

        assert_eq!(exp.matches.len(), 1);
        assert_eq!(exp.matches[0].target, MatchTarget::Dir(tmp.path().join("a")));
        assert_eq!(exp.matches[0].patterns, ["./a", "./...", "a"]);
    }
}
