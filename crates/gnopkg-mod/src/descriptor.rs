//! The canonical module descriptor.
//!
//! Both on-disk syntaxes (`gnomod.toml` and the legacy `gno.mod`) are parsed
//! by independent parsers that converge on [`ModuleDescriptor`]. Only the
//! module path, `draft`, `ignore` and `replace` are consumed by graph
//! construction; everything else is carried for tooling.

use serde::Serialize;
use tracing::debug;

use crate::error::{ModFileError, Result};

/// Which syntax a descriptor was read from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleFormat {
    #[default]
    Toml,
    Legacy,
}

/// A single `replace` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    pub old: String,
    pub new: String,
}

impl Replacement {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Returns true when the target names a directory on disk rather than
    /// another import path.
    pub fn is_local_dir(&self) -> bool {
        is_local_target(&self.new)
    }

    /// An entry with an empty side, or one that maps a path onto itself.
    pub fn is_noop(&self) -> bool {
        self.old.is_empty() || self.new.is_empty() || self.old == self.new
    }
}

/// Returns true for `.`, `..` and paths starting with `./`, `../` or `/`.
pub fn is_local_target(target: &str) -> bool {
    target == "."
        || target == ".."
        || target.starts_with("./")
        || target.starts_with("../")
        || target.starts_with('/')
}

/// A `require` line from a legacy module file. Informational only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Requirement {
    pub path: String,
    pub version: String,
}

/// Metadata stamped onto a module once it has been published.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublishMetadata {
    pub creator: Option<String>,
    pub height: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleDescriptor {
    /// Module import path (`gno.land/p/demo/foo`)
    pub path: String,
    /// Tool version tag (`gno = "0.9"`)
    pub version: Option<String>,
    pub draft: bool,
    pub private: bool,
    pub ignore: bool,
    /// Ordered; the first entry whose `old` matches wins.
    pub replace: Vec<Replacement>,
    pub require: Vec<Requirement>,
    pub metadata: Option<PublishMetadata>,
    pub format: ModuleFormat,
}

impl ModuleDescriptor {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    /// Return the first replacement whose `old` equals `target`.
    pub fn replacement_for(&self, target: &str) -> Option<&Replacement> {
        self.replace.iter().find(|r| r.old == target)
    }

    /// Apply the replace directives to `target`.
    ///
    /// Rewriting is single-hop: the returned path is never fed back through
    /// the replace list.
    pub fn resolve<'a>(&'a self, target: &'a str) -> &'a str {
        match self.replacement_for(target) {
            Some(r) => &r.new,
            None => target,
        }
    }

    /// Drop unusable replace entries and collapse duplicates.
    ///
    /// Entries with an empty side or with `old == new` are removed. When
    /// several entries share the same `old`, only the first one is kept.
    pub fn sanitize(&mut self) {
        let mut seen: Vec<String> = Vec::with_capacity(self.replace.len());
        self.replace.retain(|r| {
            if r.is_noop() {
                debug!(old = %r.old, new = %r.new, "dropping no-op replace");
                return false;
            }
            if seen.iter().any(|s| s == &r.old) {
                debug!(old = %r.old, new = %r.new, "dropping duplicate replace");
                return false;
            }
            seen.push(r.old.clone());
            true
        });
    }

    /// Check that the descriptor carries a well-formed module path.
    pub fn validate(&self, file: &str) -> Result<()> {
        if self.path.is_empty() {
            return Err(ModFileError::MissingModule {
                file: file.to_string(),
            });
        }
        validate_module_path(&self.path)?;
        // Only the entries `sanitize` keeps.
        let mut seen: Vec<&str> = Vec::new();
        for r in &self.replace {
            if r.is_noop() || seen.contains(&r.old.as_str()) {
                continue;
            }
            seen.push(&r.old);
            validate_module_path(&r.old)?;
            if !r.is_local_dir() {
                validate_module_path(&r.new)?;
            }
        }
        Ok(())
    }
}

/// Validate a hierarchical, slash-separated module path.
pub fn validate_module_path(path: &str) -> Result<()> {
    let invalid = |reason: &str| ModFileError::InvalidModulePath {
        path: path.to_string(),
        reason: reason.to_string(),
    };

    if path.is_empty() {
        return Err(invalid("empty path"));
    }
    if !path.is_ascii() {
        return Err(invalid("non-ASCII character"));
    }
    if let Some(c) = path.chars().find(|c| c.is_ascii_whitespace() || c.is_ascii_control()) {
        return Err(invalid(&format!("invalid character {c:?}")));
    }
    if path.starts_with('/') || path.ends_with('/') {
        return Err(invalid("leading or trailing slash"));
    }

    for segment in path.split('/') {
        if segment.is_empty() {
            return Err(invalid("empty path segment"));
        }
        if segment == "." || segment == ".." {
            return Err(invalid("relative path segment"));
        }
        if let Some(c) = segment
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-')))
        {
            return Err(invalid(&format!("invalid character {c:?}")));
        }
    }

    Ok(())
}
