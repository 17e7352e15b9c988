//! `gnomod.toml` parsing and rendering.

use serde::{Deserialize, Serialize};

use crate::descriptor::{ModuleDescriptor, ModuleFormat, PublishMetadata, Replacement};
use crate::error::{ModFileError, Result};

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawModfile {
    #[serde(default)]
    module: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    gno: Option<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    draft: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    private: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    ignore: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    replace: Vec<RawReplace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    addpkg: Option<RawAddPkg>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawReplace {
    old: String,
    new: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
struct RawAddPkg {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    creator: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    height: Option<u64>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

/// Parse the contents of a `gnomod.toml` file.
///
/// `file` is only used in error messages. The result is validated but not
/// sanitized.
pub fn parse_toml(file: &str, src: &str) -> Result<ModuleDescriptor> {
    let raw: RawModfile = toml::from_str(src).map_err(|e| match e.span() {
        Some(span) => ModFileError::parse(file, line_at(src, span.start), e.message()),
        None => ModFileError::Toml {
            file: file.to_string(),
            message: e.message().to_string(),
        },
    })?;

    let desc = ModuleDescriptor {
        path: raw.module.trim().to_string(),
        version: raw.gno,
        draft: raw.draft,
        private: raw.private,
        ignore: raw.ignore,
        replace: raw
            .replace
            .into_iter()
            .map(|r| Replacement::new(r.old, r.new))
            .collect(),
        require: Vec::new(),
        metadata: raw.addpkg.map(|a| PublishMetadata {
            creator: a.creator,
            height: a.height,
        }),
        format: ModuleFormat::Toml,
    };
    desc.validate(file)?;
    Ok(desc)
}

/// Render a descriptor in `gnomod.toml` syntax.
///
/// `require` entries have no structured counterpart and are not written.
pub fn to_toml_string(desc: &ModuleDescriptor) -> Result<String> {
    let raw = RawModfile {
        module: desc.path.clone(),
        gno: desc.version.clone(),
        draft: desc.draft,
        private: desc.private,
        ignore: desc.ignore,
        replace: desc
            .replace
            .iter()
            .map(|r| RawReplace {
                old: r.old.clone(),
                new: r.new.clone(),
            })
            .collect(),
        addpkg: desc.metadata.as_ref().map(|m| RawAddPkg {
            creator: m.creator.clone(),
            height: m.height,
        }),
    };
    toml::to_string(&raw).map_err(|e| ModFileError::Toml {
        file: "gnomod.toml".to_string(),
        message: e.to_string(),
    })
}

fn line_at(src: &str, offset: usize) -> usize {
    let end = offset.min(src.len());
    src.as_bytes()[..end].iter().filter(|b| **b == b'\n').count() + 1
}
