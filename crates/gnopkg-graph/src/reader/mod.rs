//! Reading directories and file sets into classified [`Package`]s.
//!
//! Files are scanned only far enough to learn their package clause and
//! imports. Per-file problems are recorded on [`Package::errors`] and never
//! abort the read; callers that need a valid package must check them.

pub mod scanner;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gnopkg_mod::{LEGACY_FILE_NAME, MODULE_FILE_NAME, ModuleDescriptor, ModuleDiscovery};
use rustc_hash::FxHashMap;
use thiserror::Error;
use tracing::trace;

use crate::package::{FileKind, MemFile, Package, PackageKind, Position, SOURCE_EXT};
use scanner::{ScanError, scan_header};

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),

    #[error("named files must all be in one directory; have {} and {}", .0.display(), .1.display())]
    MixedDirectories(PathBuf, PathBuf),

    #[error("no files named")]
    NoFiles,
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ReadError + '_ {
    move |source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Keep non-source files as [`FileKind::Other`]
    pub keep_other_files: bool,
}

struct Entry {
    name: String,
    body: Option<Result<String, ScanError>>,
}

/// Decode a source file, pointing at the first byte that is not UTF-8.
fn decode(bytes: Vec<u8>) -> Result<String, ScanError> {
    String::from_utf8(bytes).map_err(|e| {
        let valid = &e.as_bytes()[..e.utf8_error().valid_up_to()];
        // the prefix is valid by construction
        let prefix = std::str::from_utf8(valid).unwrap_or_default();
        let line = prefix.matches('\n').count() + 1;
        let column = prefix.rsplit('\n').next().map_or(0, |l| l.chars().count()) + 1;
        ScanError {
            line,
            column,
            message: "invalid UTF-8 encoding".to_string(),
        }
    })
}

#[derive(Debug, Clone, Default)]
pub struct PackageReader {
    options: ReadOptions,
}

impl PackageReader {
    pub fn new(options: ReadOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ReadOptions {
        &self.options
    }

    /// Read every candidate file of `dir` (non-recursive).
    pub fn read_dir(&self, dir: &Path, import_path: &str) -> Result<Package, ReadError> {
        if !dir.is_dir() {
            if dir.exists() {
                return Err(ReadError::NotADirectory(dir.to_path_buf()));
            }
            return Err(ReadError::Io {
                path: dir.to_path_buf(),
                source: io::Error::new(io::ErrorKind::NotFound, "directory does not exist"),
            });
        }

        let mut entries = Vec::new();
        for dent in fs::read_dir(dir).map_err(io_err(dir))? {
            let dent = dent.map_err(io_err(dir))?;
            if !dent.file_type().map_err(io_err(dir))?.is_file() {
                continue;
            }
            let name = dent.file_name().to_string_lossy().into_owned();
            if let Some(entry) = self.entry(&dir.join(&name), name)? {
                entries.push(entry);
            }
        }

        let mut pkg = Package::new(import_path, dir, kind_for(import_path, PackageKind::Fs));
        self.assemble(&mut pkg, entries);
        if let Some(module_file) = ModuleDiscovery::new(dir).find() {
            attach_module(&mut pkg, gnopkg_mod::load_from(&module_file), &module_file);
        }
        trace!(path = %pkg.import_path, dir = %dir.display(), "read package");
        Ok(pkg)
    }

    /// Read an explicit list of files that must share one directory.
    pub fn read_files(&self, files: &[PathBuf], import_path: &str) -> Result<Package, ReadError> {
        let first = files.first().ok_or(ReadError::NoFiles)?;
        let dir = first.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut entries = Vec::new();
        for file in files {
            let parent = file.parent().map(Path::to_path_buf).unwrap_or_default();
            if parent != dir {
                return Err(ReadError::MixedDirectories(dir, parent));
            }
            let name = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            // Named files are read even when their name would normally hide them.
            let body = fs::read(file).map_err(io_err(file))?;
            entries.push(Entry {
                name,
                body: Some(decode(body)),
            });
        }

        let mut pkg = Package::new(import_path, dir, PackageKind::Fs);
        self.assemble(&mut pkg, entries);
        Ok(pkg)
    }

    /// Build a package from files held in memory.
    pub fn read_mem(&self, import_path: &str, files: Vec<MemFile>, kind: PackageKind) -> Package {
        let module_file = files
            .iter()
            .find(|f| f.name == MODULE_FILE_NAME)
            .or_else(|| files.iter().find(|f| f.name == LEGACY_FILE_NAME))
            .map(|f| (f.name.clone(), f.body.clone()));

        let entries = files
            .iter()
            .filter(|f| !is_hidden(&f.name))
            .map(|f| Entry {
                name: f.name.clone(),
                body: Some(Ok(f.body.clone())),
            })
            .collect();

        let mut pkg = Package::new(import_path, PathBuf::new(), kind);
        self.assemble(&mut pkg, entries);

        let kept = pkg.all_files().into_iter().map(str::to_string).collect::<Vec<_>>();
        pkg.mem_files = files.into_iter().filter(|f| kept.contains(&f.name)).collect();

        if let Some((name, body)) = module_file {
            let parsed = if name == LEGACY_FILE_NAME {
                gnopkg_mod::parse_legacy(&name, &body)
            } else {
                gnopkg_mod::parse_toml(&name, &body)
            };
            let parsed = parsed.map(|mut m| {
                m.sanitize();
                m
            });
            attach_module(&mut pkg, parsed, Path::new(&name));
        }
        pkg
    }

    fn entry(&self, path: &Path, name: String) -> Result<Option<Entry>, ReadError> {
        if is_hidden(&name) {
            return Ok(None);
        }
        if name.ends_with(SOURCE_EXT) {
            let body = fs::read(path).map_err(io_err(path))?;
            return Ok(Some(Entry {
                name,
                body: Some(decode(body)),
            }));
        }
        if self.options.keep_other_files {
            return Ok(Some(Entry { name, body: None }));
        }
        Ok(None)
    }

    fn assemble(&self, pkg: &mut Package, mut entries: Vec<Entry>) {
        entries.sort_by(|a, b| a.name.cmp(&b.name));

        // (package clause, file) per kind, in file order
        let mut clauses: FxHashMap<FileKind, Vec<(String, String)>> = FxHashMap::default();

        for entry in entries {
            let scanned = match entry.body {
                Some(body) if entry.name.ends_with(SOURCE_EXT) => {
                    body.and_then(|body| scan_header(&body))
                }
                _ => {
                    if self.options.keep_other_files {
                        pkg.files.entry(FileKind::Other).or_default().push(entry.name);
                    }
                    continue;
                }
            };

            match scanned {
                Ok(header) => {
                    let kind = FileKind::classify(&entry.name, Some(&header.package_name));
                    let imports = pkg.imports.entry(kind).or_default();
                    imports.extend(header.imports.into_iter().map(|i| i.path));
                    clauses
                        .entry(kind)
                        .or_default()
                        .push((header.package_name, entry.name.clone()));
                    pkg.files.entry(kind).or_default().push(entry.name);
                }
                Err(e) => {
                    let kind = FileKind::classify(&entry.name, None);
                    pkg.push_error(
                        Some(Position::new(entry.name.as_str(), e.line, e.column)),
                        e.message,
                    );
                    pkg.files.entry(kind).or_default().push(entry.name);
                }
            }
        }

        for imports in pkg.imports.values_mut() {
            imports.sort();
            imports.dedup();
        }
        pkg.imports.retain(|_, v| !v.is_empty());

        let name = derive_name(pkg, &clauses);
        pkg.name = name;
    }
}

/// Dot- and underscore-prefixed names are never part of a package.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

fn kind_for(import_path: &str, default: PackageKind) -> PackageKind {
    if crate::package::is_stdlib_path(import_path) {
        PackageKind::Stdlib
    } else {
        default
    }
}

fn derive_name(pkg: &mut Package, clauses: &FxHashMap<FileKind, Vec<(String, String)>>) -> String {
    if let Some(sources) = clauses.get(&FileKind::PackageSource) {
        if let Some((first_name, first_file)) = sources.first() {
            if let Some((other_name, other_file)) = sources.iter().find(|(n, _)| n != first_name) {
                let message = format!(
                    "found packages {first_name} ({first_file}) and {other_name} ({other_file})"
                );
                pkg.push_error(Some(Position::file(other_file.as_str())), message);
            }
            return majority(sources);
        }
    }
    if let Some(tests) = clauses.get(&FileKind::Test).filter(|v| !v.is_empty()) {
        return majority(tests);
    }
    if let Some(xtests) = clauses.get(&FileKind::XTest).filter(|v| !v.is_empty()) {
        let name = majority(xtests);
        return name.strip_suffix("_test").unwrap_or(&name).to_string();
    }
    String::new()
}

/// Most frequent clause; ties go to the earliest file.
fn majority(clauses: &[(String, String)]) -> String {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for (name, _) in clauses {
        match counts.iter_mut().find(|(n, _)| *n == name.as_str()) {
            Some((_, c)) => *c += 1,
            None => counts.push((name.as_str(), 1)),
        }
    }
    let mut best: Option<(&str, usize)> = None;
    for (name, count) in counts {
        if best.is_none_or(|(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    best.map(|(n, _)| n.to_string()).unwrap_or_default()
}

fn attach_module(pkg: &mut Package, module: gnopkg_mod::Result<ModuleDescriptor>, file: &Path) {
    match module {
        Ok(m) => {
            pkg.draft = m.draft;
            pkg.ignore = m.ignore;
            pkg.module = Some(m);
        }
        Err(e) => {
            let file = file
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| MODULE_FILE_NAME.to_string());
            pkg.push_error(Some(Position::file(file)), e.to_string());
        }
    }
}
