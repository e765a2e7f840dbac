//! Directive scanning and the directive catalog
//!
//! A directive is the body of a `/** ... **/` comment. [`scan`] locates every
//! occurrence in a template; [`DirectiveKind`] is the closed set of keywords
//! with their argument signatures. Extraction, stripping and compilation all
//! go through the same scanner so they agree on what a directive is.

use serde::{Deserialize, Serialize};
use std::ops::Range;

use crate::extract::FieldType;
use crate::token::{tokenize, Arg};

/// Opening delimiter of a directive
pub const OPEN_DELIMITER: &str = "/**";

/// Closing delimiter of a directive
pub const CLOSE_DELIMITER: &str = "**/";

/// Placed just inside a delimiter, trims whitespace on that side
pub const TRIM_MARKER: char = '-';

/// Location of a directive in its source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// Byte offset of the opening delimiter
    pub offset: usize,

    /// Line number (1-indexed)
    pub line: usize,

    /// Column number in characters (1-indexed)
    pub column: usize,
}

impl Position {
    /// Compute line and column for a byte offset into `source`
    pub fn at(source: &str, offset: usize) -> Self {
        let before = &source[..offset];
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);

        Self {
            offset,
            line: before.matches('\n').count() + 1,
            column: before[line_start..].chars().count() + 1,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// One `/** ... **/` occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveSpan {
    /// Byte range of the whole occurrence, delimiters included
    pub range: Range<usize>,

    /// Byte range of the body, trim markers excluded
    pub body: Range<usize>,

    /// `/**-` trims whitespace before the directive
    pub trim_left: bool,

    /// `-**/` trims whitespace after the directive
    pub trim_right: bool,
}

impl DirectiveSpan {
    /// Body text of this span within `source`
    pub fn body_text<'a>(&self, source: &'a str) -> &'a str {
        &source[self.body.clone()]
    }
}

/// Result of scanning a template for directives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
    /// All terminated occurrences, in source order
    pub spans: Vec<DirectiveSpan>,

    /// Offset of an opening delimiter that is never closed
    pub unterminated: Option<usize>,
}

/// Locate every directive occurrence in `source`
///
/// A directive runs from `/**` to the first following `**/`. Scanning stops
/// at an opening delimiter without a closing one.
pub fn scan(source: &str) -> Scan {
    let mut result = Scan::default();
    let mut cursor = 0;

    while let Some(found) = source[cursor..].find(OPEN_DELIMITER) {
        let start = cursor + found;
        let after_open = start + OPEN_DELIMITER.len();

        let Some(close) = source[after_open..].find(CLOSE_DELIMITER) else {
            result.unterminated = Some(start);
            break;
        };
        let close_start = after_open + close;
        let end = close_start + CLOSE_DELIMITER.len();

        let mut body = after_open..close_start;
        let trim_left = source[body.clone()].starts_with(TRIM_MARKER);
        if trim_left {
            body.start += TRIM_MARKER.len_utf8();
        }
        let trim_right = !body.is_empty() && source[body.clone()].ends_with(TRIM_MARKER);
        if trim_right {
            body.end -= TRIM_MARKER.len_utf8();
        }

        result.spans.push(DirectiveSpan {
            range: start..end,
            body,
            trim_left,
            trim_right,
        });
        cursor = end;
    }

    result
}

/// What a directive argument is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgRole {
    /// Opaque value bound as a single placeholder
    Value,

    /// Boolean deciding whether a block is rendered
    Condition,

    /// List bound as one placeholder per element
    List,

    /// SQL fragment repeated once per list element
    SubTemplate,

    /// Text joining the repeated fragments
    Separator,
}

/// The directive catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveKind {
    Param,
    Int,
    Float,
    String,
    If,
    In,
    Multi,
    End,
}

impl DirectiveKind {
    pub const ALL: [DirectiveKind; 8] = [
        Self::Param,
        Self::Int,
        Self::Float,
        Self::String,
        Self::If,
        Self::In,
        Self::Multi,
        Self::End,
    ];

    /// Look up a keyword; `None` for anything outside the catalog
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == keyword)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Param => "param",
            Self::Int => "int",
            Self::Float => "float",
            Self::String => "string",
            Self::If => "if",
            Self::In => "in",
            Self::Multi => "multi",
            Self::End => "end",
        }
    }

    /// Role and inferred field type of each argument, in order
    pub fn signature(&self) -> &'static [(ArgRole, FieldType)] {
        match self {
            Self::Param => &[(ArgRole::Value, FieldType::Scalar)],
            Self::Int => &[(ArgRole::Value, FieldType::Integer)],
            Self::Float => &[(ArgRole::Value, FieldType::Float)],
            Self::String => &[(ArgRole::Value, FieldType::String)],
            Self::If => &[(ArgRole::Condition, FieldType::Boolean)],
            Self::In => &[(ArgRole::List, FieldType::List)],
            Self::Multi => &[
                (ArgRole::SubTemplate, FieldType::String),
                (ArgRole::Separator, FieldType::String),
                (ArgRole::List, FieldType::List),
            ],
            Self::End => &[],
        }
    }

    /// Number of arguments the directive takes
    pub fn arity(&self) -> usize {
        self.signature().len()
    }
}

impl std::fmt::Display for DirectiveKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parsed directive occurrence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Keyword as written
    pub keyword: String,

    /// Catalog entry; `None` for unknown keywords, which are inert
    pub kind: Option<DirectiveKind>,

    /// Arguments after the keyword
    pub args: Vec<Arg>,

    /// Where the occurrence starts
    pub position: Position,

    pub trim_left: bool,
    pub trim_right: bool,
}

impl Directive {
    /// Parse the occurrence at `span`; `None` if its body is blank
    pub fn parse(source: &str, span: &DirectiveSpan) -> Option<Self> {
        let mut tokens = tokenize(span.body_text(source)).into_iter();
        let keyword = tokens.next()?;

        Some(Self {
            kind: DirectiveKind::from_keyword(&keyword),
            keyword,
            args: tokens.map(|token| Arg::classify(&token)).collect(),
            position: Position::at(source, span.range.start),
            trim_left: span.trim_left,
            trim_right: span.trim_right,
        })
    }

    /// Parse every non-blank directive in `source`, in source order
    pub fn parse_all(source: &str) -> Vec<Self> {
        scan(source)
            .spans
            .iter()
            .filter_map(|span| Self::parse(source, span))
            .collect()
    }
}
