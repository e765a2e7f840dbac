//! Dummy literal stripping
//!
//! Two-way SQL keeps a literal right after each directive so the raw file
//! runs as plain SQL: `id = /** param .ID **/1234`. Before compilation that
//! literal has to go, leaving the directive and everything after the
//! literal untouched.

use regex::Regex;
use std::sync::LazyLock;

use sqlgen_core::{Diagnostic, DiagnosticCode, Location, Severity};

use crate::directive::{scan, Position};

/// Shapes of dummy literal, most specific first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DummyShape {
    /// `(1, 2, 3)` or `('a', 'b')`, for `in` and `multi`
    List,

    /// `'foo bar'`
    QuotedString,

    /// `1234`, `1.5`, `-7`
    Number,

    /// A driver placeholder `?` used as the stand-in
    Placeholder,
}

/// Dummy literal patterns in priority order
///
/// A parenthesized list is tried before a quoted string so `('a', 'b')` is
/// removed whole, and a quoted string before a number so `'12 monkeys'` is
/// not cut after `12`.
pub const DUMMY_PATTERNS: [(DummyShape, &str); 4] = [
    (DummyShape::List, r"^\([^)]*\)"),
    (DummyShape::QuotedString, r"^'[^']*'"),
    (DummyShape::Number, r"^-?\d+(?:\.\d+)?"),
    (DummyShape::Placeholder, r"^\?"),
];

static DUMMY_REGEXES: LazyLock<Vec<(DummyShape, Regex)>> = LazyLock::new(|| {
    DUMMY_PATTERNS
        .iter()
        .filter_map(|(shape, pattern)| Regex::new(pattern).ok().map(|regex| (*shape, regex)))
        .collect()
});

/// Literal-shaped text after a directive that could not be stripped
///
/// `VALUES (/** int .A **/1, ...)` keeps its `1` because the literal runs
/// straight into `,`; after compilation it reads `?1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnstrippedLiteral {
    pub shape: DummyShape,
    pub text: String,

    /// Where the literal starts
    pub position: Position,
}

impl UnstrippedLiteral {
    /// Non-fatal diagnostic for a template file
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::DummyNotStripped,
            Severity::Warn,
            format!(
                "`{}` after a directive was not stripped; put whitespace after the dummy literal",
                self.text
            ),
        )
        .with_location(Location::with_position(file, self.position.line, self.position.column))
    }
}

/// Removes dummy literals that follow directives
pub struct DummyStripper;

impl DummyStripper {
    /// Strip the dummy literal after every directive in `source`
    ///
    /// Idempotent: stripped text is left unchanged by a second pass.
    pub fn strip(source: &str) -> String {
        Self::strip_with_report(source).0
    }

    /// Strip like [`DummyStripper::strip`], also returning the literals
    /// that were left in place because they lack a trailing boundary
    pub fn strip_with_report(source: &str) -> (String, Vec<UnstrippedLiteral>) {
        let result = scan(source);
        let mut out = String::with_capacity(source.len());
        let mut unstripped = Vec::new();
        let mut cursor = 0;

        for (i, span) in result.spans.iter().enumerate() {
            out.push_str(&source[cursor..span.range.end]);
            cursor = span.range.end;

            let limit = result
                .spans
                .get(i + 1)
                .map_or(source.len(), |next| next.range.start);
            let rest = &source[cursor..limit];

            if let Some((shape, len)) = Self::match_dummy(rest) {
                tracing::trace!(?shape, literal = &rest[..len], "stripped dummy literal");
                cursor += len;
            } else if let Some((shape, len)) = Self::literal_prefix(rest) {
                let literal = UnstrippedLiteral {
                    shape,
                    text: rest[..len].to_string(),
                    position: Position::at(source, cursor),
                };
                tracing::warn!(
                    ?shape,
                    literal = %literal.text,
                    position = %literal.position,
                    "dummy literal not followed by whitespace, left in place"
                );
                unstripped.push(literal);
            }
        }
        out.push_str(&source[cursor..]);

        (out, unstripped)
    }

    /// Match a dummy literal at the start of `rest`
    ///
    /// Returns the shape and byte length of the literal. The literal must
    /// be followed by whitespace or the end of `rest`; the whitespace itself
    /// is not part of the match.
    pub fn match_dummy(rest: &str) -> Option<(DummyShape, usize)> {
        DUMMY_REGEXES.iter().find_map(|(shape, regex)| {
            let len = regex.find(rest)?.end();
            let at_boundary = rest[len..].chars().next().map_or(true, char::is_whitespace);
            at_boundary.then_some((*shape, len))
        })
    }

    /// First literal shape at the start of `rest`, ignoring what follows it
    fn literal_prefix(rest: &str) -> Option<(DummyShape, usize)> {
        DUMMY_REGEXES
            .iter()
            .find_map(|(shape, regex)| regex.find(rest).map(|m| (*shape, m.end())))
    }
}
