//! Header scanner for source files.
//!
//! Only the package clause and the import declarations are extracted; the
//! body of the file is not parsed. [`check_syntax`] performs a lexical pass
//! over the whole file (balanced delimiters, terminated literals and
//! comments).

use std::fmt;

use winnow::{
    Parser, Result as WResult,
    ascii::multispace1,
    combinator::{alt, delimited, preceded, repeat},
    error::ContextError,
    token::{any, none_of, one_of, take_till, take_until, take_while},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanError {
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

impl std::error::Error for ScanError {}

/// An import declaration with the position of its path literal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub path: String,
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub package_name: String,
    pub imports: Vec<ImportSpec>,
}

/// Maps the unparsed remainder of a file back to a line and column.
struct Source<'s> {
    src: &'s str,
}

impl<'s> Source<'s> {
    fn position(&self, rest: &str) -> (usize, usize) {
        let consumed = &self.src[..self.src.len() - rest.len()];
        let line = consumed.matches('\n').count() + 1;
        let line_start = consumed.rfind('\n').map_or(0, |i| i + 1);
        (line, consumed[line_start..].chars().count() + 1)
    }

    fn error(&self, rest: &str, message: impl Into<String>) -> ScanError {
        let (line, column) = self.position(rest);
        ScanError {
            line,
            column,
            message: message.into(),
        }
    }

    fn expected(&self, rest: &str, what: &str) -> ScanError {
        self.error(rest, format!("expected {what}, found {}", describe(rest)))
    }
}

/// Run `parser`, rewinding the input when it fails.
fn attempt<'s, O>(
    input: &mut &'s str,
    mut parser: impl Parser<&'s str, O, ContextError>,
) -> Option<O> {
    let start = *input;
    match parser.parse_next(input) {
        Ok(out) => Some(out),
        Err(_) => {
            *input = start;
            None
        }
    }
}

// Whitespace, newlines, comments and semicolons. None of them matter
// before the first declaration.
fn trivia(input: &mut &str) -> WResult<()> {
    repeat(
        0..,
        alt((
            multispace1.void(),
            ("//", take_till(0.., '\n')).void(),
            ("/*", take_until(0.., "*/"), "*/").void(),
            ';'.void(),
        )),
    )
    .parse_next(input)
}

fn skip_trivia(input: &mut &str) {
    let _ = attempt(input, trivia);
}

fn ident<'s>(input: &mut &'s str) -> WResult<&'s str> {
    (
        one_of(|c: char| c == '_' || c.is_alphabetic()),
        take_while(0.., |c: char| c == '_' || c.is_alphanumeric()),
    )
        .take()
        .parse_next(input)
}

fn keyword<'s>(kw: &'static str) -> impl Parser<&'s str, &'s str, ContextError> {
    ident.verify(move |word: &str| word == kw)
}

fn escaped(input: &mut &str) -> WResult<()> {
    preceded('\\', any).void().parse_next(input)
}

// "..." on a single line; the body is returned unescaped as written
fn interpreted_string<'s>(input: &mut &'s str) -> WResult<&'s str> {
    delimited(
        '"',
        repeat::<_, _, (), _, _>(0.., alt((escaped, none_of(['"', '\\', '\n']).void()))).take(),
        '"',
    )
    .parse_next(input)
}

fn raw_string<'s>(input: &mut &'s str) -> WResult<&'s str> {
    delimited('`', take_until(0.., '`'), '`').parse_next(input)
}

fn rune(input: &mut &str) -> WResult<()> {
    delimited(
        '\'',
        repeat::<_, _, (), _, _>(1.., alt((escaped, none_of(['\'', '\\', '\n']).void()))),
        '\'',
    )
    .parse_next(input)
}

fn string_lit<'s>(input: &mut &'s str) -> WResult<&'s str> {
    alt((interpreted_string, raw_string)).parse_next(input)
}

/// A short rendering of the token at the start of `rest`, for messages.
fn describe(rest: &str) -> String {
    let mut probe = rest;
    if probe.is_empty() {
        return "EOF".to_string();
    }
    if probe.starts_with("/*") {
        return "unterminated comment".to_string();
    }
    if let Some(word) = attempt(&mut probe, ident) {
        return format!("'{word}'");
    }
    if let Some(lit) = attempt(&mut probe, string_lit) {
        return format!("{lit:?}");
    }
    let number: WResult<&str> = take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '.' || c == '_')
        .parse_next(&mut probe);
    match number {
        Ok(n) if n.starts_with(|c: char| c.is_ascii_digit()) => n.to_string(),
        _ => rest.chars().next().map(|c| format!("'{c}'")).unwrap_or_default(),
    }
}

/// Extract the package clause and imports of a file.
///
/// Scanning stops at the first declaration that is not an import.
pub fn scan_header(src: &str) -> Result<FileHeader, ScanError> {
    let source = Source { src };
    let mut input = src;

    skip_trivia(&mut input);
    if attempt(&mut input, keyword("package")).is_none() {
        return Err(source.expected(input, "'package'"));
    }
    skip_trivia(&mut input);
    let package_name = attempt(&mut input, ident)
        .ok_or_else(|| source.expected(input, "package name"))?
        .to_string();

    let mut imports = Vec::new();
    loop {
        skip_trivia(&mut input);
        if attempt(&mut input, keyword("import")).is_none() {
            break;
        }
        skip_trivia(&mut input);
        if attempt(&mut input, '(').is_none() {
            imports.push(import_spec(&source, &mut input)?);
            continue;
        }
        loop {
            skip_trivia(&mut input);
            if attempt(&mut input, ')').is_some() {
                break;
            }
            if input.is_empty() {
                return Err(source.error(input, "unterminated import block"));
            }
            imports.push(import_spec(&source, &mut input)?);
        }
    }

    Ok(FileHeader {
        package_name,
        imports,
    })
}

// [alias | . | _] "path"
fn import_spec(source: &Source<'_>, input: &mut &str) -> Result<ImportSpec, ScanError> {
    if attempt(input, alt((ident, "."))).is_some() {
        skip_trivia(input);
    }
    let at = *input;
    match attempt(input, string_lit) {
        Some(path) if !path.is_empty() => {
            let (line, column) = source.position(at);
            Ok(ImportSpec {
                path: path.to_string(),
                line,
                column,
            })
        }
        Some(_) => Err(source.error(at, "invalid import path: \"\"")),
        None => Err(source.expected(at, "import path")),
    }
}

/// Lexically check a whole file: literals and comments must be terminated
/// and brackets balanced.
pub fn check_syntax(src: &str) -> Result<(), ScanError> {
    let source = Source { src };
    let mut input = src;
    let mut stack: Vec<(char, &str)> = Vec::new();

    loop {
        skip_trivia(&mut input);
        let at = input;
        let Some(c) = input.chars().next() else {
            break;
        };
        match c {
            '"' => {
                attempt(&mut input, interpreted_string)
                    .ok_or_else(|| source.error(at, "string literal not terminated"))?;
            }
            '`' => {
                attempt(&mut input, raw_string)
                    .ok_or_else(|| source.error(at, "raw string literal not terminated"))?;
            }
            '\'' => {
                attempt(&mut input, rune)
                    .ok_or_else(|| source.error(at, "rune literal not terminated"))?;
            }
            '/' if input.starts_with("/*") => {
                return Err(source.error(at, "comment not terminated"));
            }
            '(' | '[' | '{' => {
                stack.push((c, at));
                input = &input[c.len_utf8()..];
            }
            ')' | ']' | '}' => {
                let expected = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                match stack.pop() {
                    Some((open, _)) if open == expected => {}
                    Some((open, open_at)) => {
                        let (ol, oc) = source.position(open_at);
                        return Err(source.error(
                            at,
                            format!("unexpected '{c}', expected closing for '{open}' at {ol}:{oc}"),
                        ));
                    }
                    None => return Err(source.error(at, format!("unexpected '{c}'"))),
                }
                input = &input[c.len_utf8()..];
            }
            _ => input = &input[c.len_utf8()..],
        }
    }

    if let Some((open, at)) = stack.pop() {
        return Err(source.error(at, format!("unclosed '{open}'")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(h: &FileHeader) -> Vec<&str> {
        h.imports.iter().map(|i| i.path.as_str()).collect()
    }

    #[test]
    fn scans_package_and_grouped_imports() {
        let src = r#"// Package foo does things.
package foo

import (
	"strings"
	ufmt "gno.land/p/demo/ufmt"
	. "gno.land/p/demo/dot"
	_ "gno.land/p/demo/blank"
)

import "std"

func Foo() {}
"#;
        let h = scan_header(src).unwrap();
        assert_eq!(h.package_name, "foo");
        assert_eq!(
            paths(&h),
            vec![
                "strings",
                "gno.land/p/demo/ufmt",
                "gno.land/p/demo/dot",
                "gno.land/p/demo/blank",
                "std"
            ]
        );
        assert_eq!(h.imports[0].line, 5);
        assert_eq!(h.imports[0].column, 2);
    }

    #[test]
    fn scans_semicolon_separated_imports() {
        let h = scan_header("package a; import (\"b\"; \"c\"); import `d`").unwrap();
        assert_eq!(paths(&h), vec!["b", "c", "d"]);
    }

    #[test]
    fn stops_at_first_declaration() {
        let h = scan_header("package a\nvar x = 1\nimport \"late\"\n").unwrap();
        assert!(h.imports.is_empty());
    }

    #[test]
    fn block_comment_before_package() {
        let h = scan_header("/* header\n comment */\npackage a_test\n").unwrap();
        assert_eq!(h.package_name, "a_test");
    }

    #[test]
    fn missing_package_clause() {
        let err = scan_header("import \"x\"\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("expected 'package'"));

        let err = scan_header("").unwrap_err();
        assert_eq!(err.message, "expected 'package', found EOF");
    }

    #[test]
    fn bad_import_is_positioned() {
        let err = scan_header("package a\n\nimport (\n\t42\n)\n").unwrap_err();
        assert_eq!((err.line, err.column), (4, 2));
    }

    #[test]
    fn syntax_check_accepts_balanced_file() {
        let src = "package a\n\nfunc F() { x := []int{1, 2}; _ = \"}\"; _ = '{'; _ = `(` }\n";
        assert!(check_syntax(src).is_ok());
    }

    #[test]
    fn syntax_check_rejects_unbalanced_file() {
        let err = check_syntax("package a\n\nfunc F() {\n").unwrap_err();
        assert_eq!(err.message, "unclosed '{'");
        assert_eq!(err.line, 3);

        let err = check_syntax("package a\nfunc F() { ) }\n").unwrap_err();
        assert!(err.message.starts_with("unexpected ')'"));

        assert!(check_syntax("package a\nvar s = \"oops\n").is_err());
        assert!(check_syntax("package a\n/* never closed").is_err());
    }
}
