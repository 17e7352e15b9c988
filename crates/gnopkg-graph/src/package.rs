//! The package model shared by readers, resolvers and the graph builder.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gnopkg_mod::ModuleDescriptor;
use serde::Serialize;

/// Extension of source files.
pub const SOURCE_EXT: &str = ".gno";

/// Import path of the synthetic package built from files named on the
/// command line.
pub const COMMAND_LINE_PACKAGE: &str = "command-line-arguments";

/// Role of a file within its package.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FileKind {
    PackageSource,
    /// `*_test.gno` declaring the package itself
    Test,
    /// `*_test.gno` declaring `<name>_test`
    XTest,
    /// `*_filetest.gno`
    Filetest,
    Other,
}

impl FileKind {
    pub const ALL: [FileKind; 5] = [
        FileKind::PackageSource,
        FileKind::Test,
        FileKind::XTest,
        FileKind::Filetest,
        FileKind::Other,
    ];

    /// Classify a file from its name and, for test files, its package clause.
    pub fn classify(file_name: &str, package_name: Option<&str>) -> FileKind {
        if !file_name.ends_with(SOURCE_EXT) {
            return FileKind::Other;
        }
        if file_name.ends_with("_filetest.gno") {
            return FileKind::Filetest;
        }
        if file_name.ends_with("_test.gno") {
            return match package_name {
                Some(name) if name.ends_with("_test") => FileKind::XTest,
                _ => FileKind::Test,
            };
        }
        FileKind::PackageSource
    }

    pub fn is_source(self) -> bool {
        self != FileKind::Other
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    Fs,
    Remote,
    Stdlib,
}

/// Standard-library paths have no dot in their first segment. Local
/// directory paths (`_/...`) and the command-line package are not stdlib.
pub fn is_stdlib_path(import_path: &str) -> bool {
    if import_path == COMMAND_LINE_PACKAGE {
        return false;
    }
    let first = import_path.split('/').next().unwrap_or_default();
    !first.is_empty() && !first.contains('.') && !first.starts_with('_')
}

/// A position inside a package file. Line and column are 1-based; zero means
/// unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Position {
    pub file: String,
    pub line: usize,
    pub column: usize,
}

impl Position {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: 0,
            column: 0,
        }
    }

    pub fn new(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.line, self.column) {
            (0, _) => write!(f, "{}", self.file),
            (l, 0) => write!(f, "{}:{}", self.file, l),
            (l, c) => write!(f, "{}:{}:{}", self.file, l, c),
        }
    }
}

/// A problem found while reading a package. Reading continues past these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageError {
    pub position: Option<Position>,
    pub message: String,
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.position {
            Some(pos) => write!(f, "{}: {}", pos, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// A file held in memory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemFile {
    pub name: String,
    pub body: String,
}

impl MemFile {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

/// In-memory package handed to the compiler and VM.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MemPackage {
    pub name: String,
    pub path: String,
    /// Sorted by file name
    pub files: Vec<MemFile>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Package {
    pub import_path: String,
    /// Absolute directory; empty for packages that only exist remotely
    pub dir: PathBuf,
    pub name: String,
    pub kind: PackageKind,
    pub files: BTreeMap<FileKind, Vec<String>>,
    /// Sorted and de-duplicated per kind
    pub imports: BTreeMap<FileKind, Vec<String>>,
    pub module: Option<ModuleDescriptor>,
    pub draft: bool,
    pub ignore: bool,
    pub errors: Vec<PackageError>,
    #[serde(skip)]
    pub(crate) mem_files: Vec<MemFile>,
}

impl Package {
    pub fn new(import_path: impl Into<String>, dir: impl Into<PathBuf>, kind: PackageKind) -> Self {
        Self {
            import_path: import_path.into(),
            dir: dir.into(),
            name: String::new(),
            kind,
            files: BTreeMap::new(),
            imports: BTreeMap::new(),
            module: None,
            draft: false,
            ignore: false,
            errors: Vec::new(),
            mem_files: Vec::new(),
        }
    }

    pub fn files_of(&self, kind: FileKind) -> &[String] {
        self.files.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn imports_of(&self, kind: FileKind) -> &[String] {
        self.imports.get(&kind).map(Vec::as_slice).unwrap_or_default()
    }

    /// Union of the imports of several kinds, sorted and de-duplicated.
    pub fn imports_for(&self, kinds: &[FileKind]) -> Vec<String> {
        let mut out: Vec<String> = kinds
            .iter()
            .flat_map(|k| self.imports_of(*k).iter().cloned())
            .collect();
        out.sort();
        out.dedup();
        out
    }

    /// Every file name across all kinds, sorted.
    pub fn all_files(&self) -> Vec<&str> {
        let mut out: Vec<&str> = self
            .files
            .values()
            .flat_map(|v| v.iter().map(String::as_str))
            .collect();
        out.sort_unstable();
        out
    }

    pub fn source_file_count(&self) -> usize {
        self.files_of(FileKind::PackageSource).len()
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn is_in_memory(&self) -> bool {
        !self.mem_files.is_empty()
    }

    pub(crate) fn push_error(&mut self, position: Option<Position>, message: impl Into<String>) {
        self.errors.push(PackageError {
            position,
            message: message.into(),
        });
    }

    /// Read the body of one of the package's files.
    pub fn read_file(&self, name: &str) -> io::Result<String> {
        if let Some(f) = self.mem_files.iter().find(|f| f.name == name) {
            return Ok(f.body.clone());
        }
        if self.dir.as_os_str().is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{}: no such file in {}", name, self.import_path),
            ));
        }
        fs::read_to_string(self.dir.join(name))
    }

    /// Absolute path of one of the package's files, when it lives on disk.
    pub fn file_path(&self, name: &str) -> Option<PathBuf> {
        if self.dir.as_os_str().is_empty() {
            None
        } else {
            Some(self.dir.join(name))
        }
    }

    pub fn contains_dir(&self, dir: &Path) -> bool {
        !self.dir.as_os_str().is_empty() && self.dir == dir
    }

    /// Convert to the in-memory form consumed by the VM.
    ///
    /// Every classified file is included; bodies come from memory for remote
    /// packages and from disk otherwise.
    pub fn to_mem_package(&self) -> io::Result<MemPackage> {
        let mut files = Vec::new();
        for name in self.all_files() {
            files.push(MemFile::new(name, self.read_file(name)?));
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(MemPackage {
            name: self.name.clone(),
            path: self.import_path.clone(),
            files,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_by_name_and_clause() {
        assert_eq!(FileKind::classify("a.gno", Some("a")), FileKind::PackageSource);
        assert_eq!(FileKind::classify("a_test.gno", Some("a")), FileKind::Test);
        assert_eq!(FileKind::classify("a_test.gno", Some("a_test")), FileKind::XTest);
        assert_eq!(FileKind::classify("a_test.gno", None), FileKind::Test);
        assert_eq!(FileKind::classify("z_filetest.gno", Some("main")), FileKind::Filetest);
        assert_eq!(FileKind::classify("README.md", None), FileKind::Other);
        assert_eq!(FileKind::classify("gnomod.toml", None), FileKind::Other);
    }

    #[test]
    fn stdlib_paths() {
        assert!(is_stdlib_path("strings"));
        assert!(is_stdlib_path("crypto/sha256"));
        assert!(!is_stdlib_path("gno.land/p/demo/avl"));
        assert!(!is_stdlib_path(""));
        assert!(!is_stdlib_path("_/home/u/pkg"));
        assert!(!is_stdlib_path(COMMAND_LINE_PACKAGE));
    }

    #[test]
    fn position_display() {
        assert_eq!(Position::file("a.gno").to_string(), "a.gno");
        assert_eq!(Position::new("a.gno", 3, 0).to_string(), "a.gno:3");
        assert_eq!(Position::new("a.gno", 3, 7).to_string(), "a.gno:3:7");
    }

    #[test]
    fn imports_for_merges_kinds() {
        let mut pkg = Package::new("a.b/x", "", PackageKind::Remote);
        pkg.imports.insert(FileKind::PackageSource, vec!["b".into(), "c".into()]);
        pkg.imports.insert(FileKind::Test, vec!["a".into(), "c".into()]);
        assert_eq!(
            pkg.imports_for(&[FileKind::PackageSource, FileKind::Test]),
            vec!["a", "b", "c"]
        );
    }

    #[test]
    fn mem_package_reads_memory_files() {
        let mut pkg = Package::new("a.b/x", "", PackageKind::Remote);
        pkg.name = "x".to_string();
        pkg.files.insert(FileKind::PackageSource, vec!["z.gno".into(), "a.gno".into()]);
        pkg.mem_files = vec![
            MemFile::new("z.gno", "package x"),
            MemFile::new("a.gno", "package x // a"),
        ];

        let mem = pkg.to_mem_package().unwrap();
        assert_eq!(mem.path, "a.b/x");
        assert_eq!(mem.files[0].name, "a.gno");
        assert_eq!(mem.files[1].body, "package x");
    }

    #[test]
    fn read_file_without_dir_fails() {
        let pkg = Package::new("a.b/x", "", PackageKind::Remote);
        assert!(pkg.read_file("missing.gno").is_err());
    }
}
