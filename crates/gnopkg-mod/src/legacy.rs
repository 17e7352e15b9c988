//! Legacy `gno.mod` parsing.
//!
//! The legacy format is a line-oriented DSL:
//!
//! ```text
//! // Draft
//!
//! module gno.land/p/demo/foo
//!
//! gno 0.9
//!
//! require (
//!     gno.land/p/demo/avl v0.0.0-latest
//! )
//!
//! replace gno.land/p/demo/bar => ../bar
//! ```
//!
//! A `// Draft` (or `// Ignore`) line in the comment block at the top of the
//! file marks the module draft (or ignored).

use winnow::{
    Parser, Result as WResult,
    ascii::{digit1, space0, space1},
    combinator::{alt, delimited, not, opt, preceded, repeat, terminated},
    token::{any, none_of, rest, take_till, take_while},
};

use crate::descriptor::{ModuleDescriptor, ModuleFormat, Replacement, Requirement};
use crate::error::{ModFileError, Result};

/// Parse the contents of a legacy `gno.mod` file.
///
/// `file` is only used in error messages. The result is validated but not
/// sanitized.
pub fn parse_legacy(file: &str, src: &str) -> Result<ModuleDescriptor> {
    let mut state = State {
        file,
        desc: ModuleDescriptor {
            format: ModuleFormat::Legacy,
            ..Default::default()
        },
        seen_module: false,
        seen_gno: false,
    };

    let mut header = true;
    let mut block: Option<(&str, usize)> = None;

    for (idx, raw_line) in src.lines().enumerate() {
        let lineno = idx + 1;
        let (code, comment) = split_comment(raw_line)
            .map_err(|message| ModFileError::parse(file, lineno, message))?;

        if code.is_empty() {
            if header {
                if let Some(marker) = comment {
                    state.header_marker(marker.trim());
                }
            }
            continue;
        }
        header = false;

        if let Some((verb, _)) = block {
            if code == ")" {
                block = None;
            } else {
                state.directive(lineno, verb, code)?;
            }
            continue;
        }

        let (verb, args) = directive_line
            .parse(code)
            .map_err(|_| ModFileError::parse(file, lineno, format!("malformed line: {code}")))?;
        if args == "(" {
            match verb {
                "require" | "replace" | "module" => block = Some((verb, lineno)),
                _ => {
                    return Err(ModFileError::parse(
                        file,
                        lineno,
                        format!("unknown block type: {verb}"),
                    ));
                }
            }
            continue;
        }
        state.directive(lineno, verb, args)?;
    }

    if let Some((verb, start)) = block {
        return Err(ModFileError::parse(
            file,
            start,
            format!("unterminated {verb} block"),
        ));
    }

    let desc = state.desc;
    desc.validate(file)?;
    Ok(desc)
}

struct State<'a> {
    file: &'a str,
    desc: ModuleDescriptor,
    seen_module: bool,
    seen_gno: bool,
}

impl State<'_> {
    fn header_marker(&mut self, marker: &str) {
        match marker {
            "Draft" => self.desc.draft = true,
            "Ignore" => self.desc.ignore = true,
            _ => {}
        }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> ModFileError {
        ModFileError::parse(self.file, line, message)
    }

    fn directive(&mut self, line: usize, verb: &str, args: &str) -> Result<()> {
        match verb {
            "module" => {
                if self.seen_module {
                    return Err(self.error(line, "repeated module statement"));
                }
                let path = single_token
                    .parse(args)
                    .map_err(|_| self.error(line, "usage: module module/path"))?;
                self.seen_module = true;
                self.desc.path = path;
            }
            "gno" => {
                if self.seen_gno {
                    return Err(self.error(line, "repeated gno statement"));
                }
                let version = single_token
                    .parse(args)
                    .map_err(|_| self.error(line, "gno directive expects exactly one argument"))?;
                if gno_version.parse(version.as_str()).is_err() {
                    return Err(self.error(
                        line,
                        format!("invalid gno version {version}: must match format 1.23"),
                    ));
                }
                self.seen_gno = true;
                self.desc.version = Some(version);
            }
            "require" => {
                let requirement = require_spec
                    .parse(args)
                    .map_err(|_| self.error(line, "usage: require module/path v1.2.3"))?;
                self.desc.require.push(requirement);
            }
            "replace" => {
                let replacement = replace_spec.parse(args).map_err(|_| {
                    self.error(
                        line,
                        "usage: replace module/path [v1.2.3] => other/module [v1.4.5] or local/dir",
                    )
                })?;
                self.desc.replace.push(replacement);
            }
            other => return Err(self.error(line, format!("unknown directive: {other}"))),
        }
        Ok(())
    }
}

/// Split a line into its trimmed code and an optional `//` comment body.
/// `//` inside a quoted token does not start a comment.
fn split_comment(line: &str) -> std::result::Result<(&str, Option<&str>), String> {
    let mut input = line;
    let parsed: WResult<(&str, Option<&str>)> = (
        repeat::<_, _, (), _, _>(
            0..,
            alt((
                quoted.void(),
                take_till(1.., ['"', '/']).void(),
                ('/', not('/')).void(),
            )),
        )
        .take(),
        opt(preceded("//", rest)),
    )
        .parse_next(&mut input);

    match parsed {
        Ok((code, comment)) if input.is_empty() => Ok((code.trim(), comment)),
        _ => Err("unterminated quoted string".to_string()),
    }
}

// "..." with backslash escapes
fn quoted(input: &mut &str) -> WResult<String> {
    delimited(
        '"',
        repeat(0.., alt((preceded('\\', any), none_of(['"', '\\'])))),
        '"',
    )
    .parse_next(input)
}

fn bare(input: &mut &str) -> WResult<String> {
    take_while(1.., |c: char| !c.is_whitespace() && !matches!(c, '"' | '(' | ')'))
        .map(str::to_string)
        .parse_next(input)
}

fn token(input: &mut &str) -> WResult<String> {
    alt((quoted, bare)).parse_next(input)
}

fn single_token(input: &mut &str) -> WResult<String> {
    terminated(token, space0).parse_next(input)
}

// verb followed by the rest of the line
fn directive_line<'s>(input: &mut &'s str) -> WResult<(&'s str, &'s str)> {
    (
        take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '_'),
        preceded(space0, rest.map(str::trim)),
    )
        .parse_next(input)
}

// major.minor
fn gno_version(input: &mut &str) -> WResult<()> {
    (digit1, '.', digit1).void().parse_next(input)
}

// path version
fn require_spec(input: &mut &str) -> WResult<Requirement> {
    (token, space1, single_token)
        .map(|(path, _, version)| Requirement { path, version })
        .parse_next(input)
}

// old [version] => new [version]
fn replace_spec(input: &mut &str) -> WResult<Replacement> {
    let old = token.parse_next(input)?;
    let _ = opt(preceded(space1, preceded(not("=>"), token))).parse_next(input)?;
    let _ = (space0, "=>", space0).parse_next(input)?;
    let new = token.parse_next(input)?;
    let _ = opt(preceded(space1, token)).parse_next(input)?;
    let _ = space0.parse_next(input)?;
    Ok(Replacement::new(old, new))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_module_and_version() {
        let m = parse_legacy("gno.mod", "module gno.land/p/demo/foo\n\ngno 0.9\n").unwrap();
        assert_eq!(m.path, "gno.land/p/demo/foo");
        assert_eq!(m.version.as_deref(), Some("0.9"));
        assert_eq!(m.format, ModuleFormat::Legacy);
        assert!(!m.draft);
    }

    #[test]
    fn leading_comment_marks_draft() {
        let src = "// Draft\n\nmodule gno.land/p/demo/foo\n";
        assert!(parse_legacy("gno.mod", src).unwrap().draft);

        let src = "// Ignore\nmodule gno.land/p/demo/foo\n";
        assert!(parse_legacy("gno.mod", src).unwrap().ignore);
    }

    #[test]
    fn draft_marker_after_module_is_plain_comment() {
        let src = "module gno.land/p/demo/foo\n// Draft\n";
        assert!(!parse_legacy("gno.mod", src).unwrap().draft);
    }

    #[test]
    fn parses_require_and_replace_blocks() {
        let src = r#"module gno.land/r/demo/app

require (
    gno.land/p/demo/avl v0.0.0-latest
    "gno.land/p/demo/ufmt" v0.0.0-latest // formatting
)

replace gno.land/p/demo/avl => ../avl

replace (
    gno.land/p/demo/ufmt v0.0.0-latest => gno.land/p/demo/ufmt2 v0.0.0-latest
)
"#;
        let m = parse_legacy("gno.mod", src).unwrap();
        assert_eq!(m.require.len(), 2);
        assert_eq!(m.require[1].path, "gno.land/p/demo/ufmt");
        assert_eq!(
            m.replace,
            vec![
                Replacement::new("gno.land/p/demo/avl", "../avl"),
                Replacement::new("gno.land/p/demo/ufmt", "gno.land/p/demo/ufmt2"),
            ]
        );
    }

    #[test]
    fn errors_carry_line_numbers() {
        let err = parse_legacy("gno.mod", "module gno.land/p/x\n\nfoo bar\n").unwrap_err();
        assert_eq!(err.to_string(), "gno.mod:3: unknown directive: foo");

        let err = parse_legacy("gno.mod", "module a.b/c\nmodule a.b/d\n").unwrap_err();
        assert!(err.to_string().contains("repeated module statement"));

        let err = parse_legacy("gno.mod", "module a.b/c\ngno 1\n").unwrap_err();
        assert!(err.to_string().contains("must match format 1.23"));
    }

    #[test]
    fn self_replace_is_dropped_by_sanitize() {
        let src = "module a.b/app\nreplace a.b/dep => a.b/dep\nreplace a.b/other v1 => ../other v2\n";
        let mut m = parse_legacy("gno.mod", src).unwrap();
        m.sanitize();
        assert_eq!(m.replace, vec![Replacement::new("a.b/other", "../other")]);
    }

    #[test]
    fn quoted_tokens_keep_comment_markers() {
        let src = "module \"a.b/app\" // the app\nreplace \"a.b/x\" => \"../x//y\"\n";
        let m = parse_legacy("gno.mod", src).unwrap();
        assert_eq!(m.path, "a.b/app");
        assert_eq!(m.replace[0].new, "../x//y");
    }

    #[test]
    fn malformed_directives_report_usage() {
        let err = parse_legacy("gno.mod", "module a.b/c\nreplace a.b/d\n").unwrap_err();
        assert!(err.to_string().starts_with("gno.mod:2: usage: replace"));

        let err = parse_legacy("gno.mod", "module a.b/c\nrequire a.b/d\n").unwrap_err();
        assert_eq!(err.to_string(), "gno.mod:2: usage: require module/path v1.2.3");

        let err = parse_legacy("gno.mod", "module \"a.b/c\n").unwrap_err();
        assert_eq!(err.to_string(), "gno.mod:1: unterminated quoted string");
    }

    #[test]
    fn unterminated_block_is_an_error() {
        let err = parse_legacy("gno.mod", "module a.b/c\nrequire (\n a.b/d v1\n").unwrap_err();
        assert_eq!(err.to_string(), "gno.mod:2: unterminated require block");
    }

    #[test]
    fn missing_module_is_an_error() {
        let err = parse_legacy("gno.mod", "gno 0.9\n").unwrap_err();
        assert!(matches!(err, ModFileError::MissingModule { .. }));
    }
}
