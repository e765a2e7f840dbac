//! Directive body tokenizer
//!
//! Splits `multi "(name LIKE ? OR kana LIKE ?)" "AND" .Names` into
//! keyword and argument tokens. Whitespace inside double quotes is kept and
//! the quotes stay in the token text.

/// Marker that turns a token into a field reference (`.Name`)
pub const FIELD_MARKER: char = '.';

/// Split a directive body into tokens
///
/// Whitespace outside double quotes separates tokens; runs of it collapse.
/// An escaped quote (`\"`) does not open or close a quoted segment. An
/// unterminated quote runs to the end of the input.
pub fn tokenize(body: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut prev = None;

    for ch in body.chars() {
        if ch == '"' && prev != Some('\\') {
            in_quotes = !in_quotes;
            current.push(ch);
        } else if ch.is_whitespace() && !in_quotes {
            flush(&mut tokens, &mut current);
        } else {
            current.push(ch);
        }
        prev = Some(ch);
    }
    flush(&mut tokens, &mut current);

    tokens
}

fn flush(tokens: &mut Vec<String>, current: &mut String) {
    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_string());
    }
    current.clear();
}

/// A classified directive argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Arg {
    /// `.Name` - read `Name` from the data record
    Field(String),

    /// `"..."` - string literal, escapes decoded
    Quoted(String),

    /// Anything else: `true`, `false`, `42`, `1.5`
    Bare(String),
}

impl Arg {
    /// Classify a token produced by [`tokenize`]
    pub fn classify(token: &str) -> Self {
        if let Some(name) = token.strip_prefix(FIELD_MARKER) {
            if !name.is_empty() {
                return Arg::Field(name.to_string());
            }
        }

        if token.len() >= 2 && token.starts_with('"') && token.ends_with('"') {
            return Arg::Quoted(unescape(&token[1..token.len() - 1]));
        }

        Arg::Bare(token.to_string())
    }

    /// Field name, if this argument is a field reference
    pub fn field_name(&self) -> Option<&str> {
        match self {
            Arg::Field(name) => Some(name),
            _ => None,
        }
    }
}

impl std::fmt::Display for Arg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Arg::Field(name) => write!(f, "{}{}", FIELD_MARKER, name),
            Arg::Quoted(text) => write!(f, "{:?}", text),
            Arg::Bare(text) => write!(f, "{}", text),
        }
    }
}

fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }

    out
}
