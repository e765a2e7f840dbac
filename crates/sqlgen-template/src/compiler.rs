//! Template compilation
//!
//! Expands a cleaned template (dummy literals already stripped) against a
//! data record in one left-to-right pass, producing SQL text with
//! placeholders and the matching argument list.
//!
//! The grammar is deliberately small: value directives, `in`, `multi` and
//! `if` ... `end` blocks with whitespace trim markers. There is no expression
//! language and no looping besides `multi`.

use sqlgen_core::{Diagnostic, DiagnosticCode, Location, Severity};

use crate::directive::{scan, Directive, DirectiveKind, Position};
use crate::query::{PlaceholderStyle, Query};
use crate::strip::DummyStripper;
use crate::token::Arg;
use crate::value::{TemplateData, Value};

/// Error during template compilation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    #[error("field `{name}` not found in template data ({position})")]
    UnresolvedField {
        name: String,
        position: Position,
    },

    #[error("directive `{directive}` expects {expected} for argument {index}, found {found} ({position})")]
    TypeMismatch {
        directive: DirectiveKind,
        /// 1-indexed argument
        index: usize,
        expected: &'static str,
        found: &'static str,
        position: Position,
    },

    #[error("directive `{directive}` expects {expected} arguments, found {found} ({position})")]
    Arity {
        directive: DirectiveKind,
        expected: usize,
        found: usize,
        position: Position,
    },

    #[error("unbalanced block: {message} ({position})")]
    UnbalancedBlock {
        message: &'static str,
        position: Position,
    },

    #[error("malformed template: {message} ({position})")]
    Malformed {
        message: String,
        position: Position,
    },
}

impl CompileError {
    pub fn position(&self) -> Position {
        match self {
            CompileError::UnresolvedField { position, .. }
            | CompileError::TypeMismatch { position, .. }
            | CompileError::Arity { position, .. }
            | CompileError::UnbalancedBlock { position, .. }
            | CompileError::Malformed { position, .. } => *position,
        }
    }

    /// Convert to a diagnostic for a template file
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        let code = match self {
            CompileError::UnresolvedField { .. } => DiagnosticCode::TemplateUnresolvedField,
            CompileError::TypeMismatch { .. } => DiagnosticCode::TemplateTypeMismatch,
            CompileError::Arity { .. } => DiagnosticCode::DirectiveArity,
            CompileError::UnbalancedBlock { .. } => DiagnosticCode::TemplateUnbalancedBlock,
            CompileError::Malformed { .. } => DiagnosticCode::TemplateMalformed,
        };
        let position = self.position();

        let diag = Diagnostic::new(code, Severity::Error, self.to_string())
            .with_location(Location::with_position(file, position.line, position.column));

        match self {
            CompileError::TypeMismatch { expected, found, .. } => diag.with_comparison(*expected, *found),
            CompileError::Arity { expected, found, .. } => {
                diag.with_comparison(expected.to_string(), found.to_string())
            }
            _ => diag,
        }
    }
}

/// Directives that emit SQL; `if` and `end` become blocks instead
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ActionKind {
    Param,
    Int,
    Float,
    String,
    In,
    Multi,
}

impl ActionKind {
    fn from_directive(kind: DirectiveKind) -> Option<Self> {
        match kind {
            DirectiveKind::Param => Some(Self::Param),
            DirectiveKind::Int => Some(Self::Int),
            DirectiveKind::Float => Some(Self::Float),
            DirectiveKind::String => Some(Self::String),
            DirectiveKind::In => Some(Self::In),
            DirectiveKind::Multi => Some(Self::Multi),
            DirectiveKind::If | DirectiveKind::End => None,
        }
    }

    fn directive(self) -> DirectiveKind {
        match self {
            Self::Param => DirectiveKind::Param,
            Self::Int => DirectiveKind::Int,
            Self::Float => DirectiveKind::Float,
            Self::String => DirectiveKind::String,
            Self::In => DirectiveKind::In,
            Self::Multi => DirectiveKind::Multi,
        }
    }
}

/// A value, list or repeat directive with its arguments
#[derive(Debug, Clone, PartialEq)]
struct Action {
    kind: ActionKind,
    args: Vec<Arg>,
    position: Position,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Text(String),
    Action(Action),
    Block {
        condition: Arg,
        body: Vec<Node>,
        position: Position,
    },
}

/// An `if` waiting for its `end`
struct OpenBlock {
    condition: Arg,
    position: Position,
    parent: Vec<Node>,
}

/// Parse cleaned template text into a node tree
///
/// Trim markers are applied here, so rendering never touches whitespace.
fn parse(source: &str) -> Result<Vec<Node>, CompileError> {
    let result = scan(source);
    if let Some(offset) = result.unterminated {
        return Err(CompileError::Malformed {
            message: "directive opened with `/**` is never closed".to_string(),
            position: Position::at(source, offset),
        });
    }

    let mut nodes = Vec::new();
    let mut open: Vec<OpenBlock> = Vec::new();
    let mut cursor = 0;
    let mut trim_next = false;

    for span in &result.spans {
        push_text(&mut nodes, &source[cursor..span.range.start], trim_next, span.trim_left);
        cursor = span.range.end;
        trim_next = span.trim_right;

        let Some(directive) = Directive::parse(source, span) else {
            return Err(CompileError::Malformed {
                message: "empty directive".to_string(),
                position: Position::at(source, span.range.start),
            });
        };

        let Some(kind) = directive.kind else {
            tracing::debug!(keyword = %directive.keyword, "skipping unknown directive");
            continue;
        };
        check_arity(kind, &directive)?;

        if let Some(action) = ActionKind::from_directive(kind) {
            nodes.push(Node::Action(Action {
                kind: action,
                args: directive.args,
                position: directive.position,
            }));
            continue;
        }

        match kind {
            DirectiveKind::If => {
                let condition = directive.args.into_iter().next().unwrap_or(Arg::Bare(String::new()));
                open.push(OpenBlock {
                    condition,
                    position: directive.position,
                    parent: std::mem::take(&mut nodes),
                });
            }
            DirectiveKind::End => {
                let Some(block) = open.pop() else {
                    return Err(CompileError::UnbalancedBlock {
                        message: "`end` without matching `if`",
                        position: directive.position,
                    });
                };
                let body = std::mem::replace(&mut nodes, block.parent);
                nodes.push(Node::Block {
                    condition: block.condition,
                    body,
                    position: block.position,
                });
            }
            // actions were pushed above
            _ => {}
        }
    }
    push_text(&mut nodes, &source[cursor..], trim_next, false);

    if let Some(block) = open.pop() {
        return Err(CompileError::UnbalancedBlock {
            message: "`if` without matching `end`",
            position: block.position,
        });
    }

    Ok(nodes)
}

fn push_text(nodes: &mut Vec<Node>, text: &str, trim_start: bool, trim_end: bool) {
    let mut text = text;
    if trim_start {
        text = text.trim_start();
    }
    if trim_end {
        text = text.trim_end();
    }
    if !text.is_empty() {
        nodes.push(Node::Text(text.to_string()));
    }
}

fn check_arity(kind: DirectiveKind, directive: &Directive) -> Result<(), CompileError> {
    if directive.args.len() != kind.arity() {
        return Err(CompileError::Arity {
            directive: kind,
            expected: kind.arity(),
            found: directive.args.len(),
            position: directive.position,
        });
    }
    Ok(())
}

/// Accumulates output for one compilation
struct Expansion<'d, D: ?Sized> {
    data: &'d D,
    style: PlaceholderStyle,
    sql: String,
    args: Vec<Value>,
}

impl<'d, D: TemplateData + ?Sized> Expansion<'d, D> {
    fn render(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.sql.push_str(text),
                Node::Action(action) => self.execute(action)?,
                Node::Block { condition, body, position } => {
                    match self.resolve(condition, *position)? {
                        Value::Bool(true) => self.render(body)?,
                        Value::Bool(false) => {}
                        other => {
                            return Err(CompileError::TypeMismatch {
                                directive: DirectiveKind::If,
                                index: 1,
                                expected: "boolean",
                                found: other.type_name(),
                                position: *position,
                            })
                        }
                    }
                }
            }
        }
        Ok(())
    }

    fn execute(&mut self, action: &Action) -> Result<(), CompileError> {
        let position = action.position;
        let mismatch = |index: usize, expected: &'static str, found: &Value| CompileError::TypeMismatch {
            directive: action.kind.directive(),
            index,
            expected,
            found: found.type_name(),
            position,
        };

        match action.kind {
            ActionKind::Param => match self.resolve(&action.args[0], position)? {
                other @ Value::List(_) => return Err(mismatch(1, "scalar", &other)),
                value => self.bind(value),
            },
            ActionKind::Int => match self.resolve(&action.args[0], position)? {
                value @ Value::Int(_) => self.bind(value),
                other => return Err(mismatch(1, "integer", &other)),
            },
            ActionKind::Float => match self.resolve(&action.args[0], position)? {
                value @ Value::Float(_) => self.bind(value),
                Value::Int(i) => self.bind(Value::Float(i as f64)),
                other => return Err(mismatch(1, "float", &other)),
            },
            ActionKind::String => match self.resolve(&action.args[0], position)? {
                value @ Value::String(_) => self.bind(value),
                other => return Err(mismatch(1, "string", &other)),
            },
            ActionKind::In => {
                let items = match self.resolve(&action.args[0], position)? {
                    Value::List(items) => items,
                    other => return Err(mismatch(1, "list", &other)),
                };
                self.sql.push('(');
                for (i, item) in items.into_iter().enumerate() {
                    if i > 0 {
                        self.sql.push_str(", ");
                    }
                    self.bind(item);
                }
                self.sql.push(')');
            }
            ActionKind::Multi => {
                let sub_template = match self.resolve(&action.args[0], position)? {
                    Value::String(s) => s,
                    other => return Err(mismatch(1, "string", &other)),
                };
                let separator = match self.resolve(&action.args[1], position)? {
                    Value::String(s) => s,
                    other => return Err(mismatch(2, "string", &other)),
                };
                let items = match self.resolve(&action.args[2], position)? {
                    Value::List(items) => items,
                    other => return Err(mismatch(3, "list", &other)),
                };
                self.repeat(&sub_template, &separator, items);
            }
        }

        tracing::trace!(directive = %action.kind.directive(), args = self.args.len(), "executed directive");
        Ok(())
    }

    /// One copy of `sub_template` per item, each `?` in it bound to that item
    fn repeat(&mut self, sub_template: &str, separator: &str, items: Vec<Value>) {
        let joiner = joiner(separator);

        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.sql.push_str(&joiner);
            }
            for ch in sub_template.chars() {
                if ch == '?' {
                    self.bind(item.clone());
                } else {
                    self.sql.push(ch);
                }
            }
        }
    }

    /// Append `value` to the arguments and emit its placeholder
    fn bind(&mut self, value: Value) {
        self.args.push(value);
        let placeholder = self.style.placeholder(self.args.len());
        self.sql.push_str(&placeholder);
    }

    fn resolve(&self, arg: &Arg, position: Position) -> Result<Value, CompileError> {
        match arg {
            Arg::Field(name) => self.data.field(name).ok_or_else(|| CompileError::UnresolvedField {
                name: name.clone(),
                position,
            }),
            Arg::Quoted(text) => Ok(Value::String(text.clone())),
            Arg::Bare(text) => parse_literal(text).ok_or_else(|| CompileError::Malformed {
                message: format!("`{}` is neither a field reference nor a literal", text),
                position,
            }),
        }
    }
}

/// Text placed between `multi` copies
///
/// Keyword separators such as `AND` get one space on each side however they
/// were written. Punctuation such as `,` is used exactly as given.
fn joiner(separator: &str) -> String {
    let word = separator.trim();
    if word.is_empty() {
        " ".to_string()
    } else if word.chars().any(char::is_alphanumeric) {
        format!(" {} ", word)
    } else {
        separator.to_string()
    }
}

/// `true`, `false`, integers and decimals
fn parse_literal(text: &str) -> Option<Value> {
    match text {
        "true" => return Some(Value::Bool(true)),
        "false" => return Some(Value::Bool(false)),
        _ => {}
    }

    let digits = text.strip_prefix('-').unwrap_or(text);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
        return None;
    }

    text.parse::<i64>()
        .map(Value::Int)
        .ok()
        .or_else(|| text.parse::<f64>().ok().map(Value::Float))
}

/// Compiles two-way SQL templates
#[derive(Debug, Clone, Copy, Default)]
pub struct Compiler {
    style: PlaceholderStyle,
}

impl Compiler {
    pub fn new(style: PlaceholderStyle) -> Self {
        Self { style }
    }

    pub fn style(&self) -> PlaceholderStyle {
        self.style
    }

    /// Compile cleaned template text against `data`
    ///
    /// Either the complete query is returned or an error; partial SQL never
    /// escapes.
    pub fn compile<D: TemplateData + ?Sized>(&self, cleaned: &str, data: &D) -> Result<Query, CompileError> {
        let nodes = parse(cleaned)?;

        let mut expansion = Expansion {
            data,
            style: self.style,
            sql: String::with_capacity(cleaned.len()),
            args: Vec::new(),
        };
        expansion.render(&nodes)?;

        tracing::debug!(args = expansion.args.len(), "compiled template");
        Ok(Query {
            sql: expansion.sql,
            args: expansion.args,
        })
    }

    /// Strip dummy literals from raw two-way SQL, then compile it
    pub fn build<D: TemplateData + ?Sized>(&self, template: &str, data: &D) -> Result<Query, CompileError> {
        let cleaned = DummyStripper::strip(template);
        self.compile(&cleaned, data)
    }
}

/// Compile cleaned template text with `?` placeholders
pub fn compile<D: TemplateData + ?Sized>(cleaned: &str, data: &D) -> Result<Query, CompileError> {
    Compiler::default().compile(cleaned, data)
}

/// Strip and compile raw two-way SQL with `?` placeholders
pub fn build_query<D: TemplateData + ?Sized>(template: &str, data: &D) -> Result<Query, CompileError> {
    Compiler::default().build(template, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn text_without_directives_is_unchanged() {
        let sql = "SELECT * FROM users WHERE id = 1\n";
        let query = compile(sql, &json!({})).unwrap();
        assert_eq!(query.sql, sql);
        assert!(query.args.is_empty());
    }

    #[test]
    fn value_directives_bind_in_order() {
        let sql = "a = /** param .A **/ AND b = /** int .B **/ AND c = /** float .C **/ AND d = /** string .D **/";
        let query = compile(sql, &json!({"A": null, "B": 2, "C": 1.5, "D": "x"})).unwrap();

        assert_eq!(query.sql, "a = ? AND b = ? AND c = ? AND d = ?");
        assert_eq!(
            query.args,
            vec![Value::Null, Value::Int(2), Value::Float(1.5), Value::from("x")]
        );
    }

    #[test]
    fn float_accepts_integer() {
        let query = compile("/** float .Price **/", &json!({"Price": 3})).unwrap();
        assert_eq!(query.args, vec![Value::Float(3.0)]);
    }

    #[test]
    fn literal_arguments() {
        let query = compile(r#"/** int 42 **/ /** string "a b" **/ /** param -1.5 **/"#, &json!({})).unwrap();
        assert_eq!(query.sql, "? ? ?");
        assert_eq!(query.args, vec![Value::Int(42), Value::from("a b"), Value::Float(-1.5)]);
    }

    #[test]
    fn in_expands_list() {
        let query = compile("id IN /** in .IDs **/", &json!({"IDs": [1, 2, 3]})).unwrap();
        assert_eq!(query.sql, "id IN (?, ?, ?)");
        assert_eq!(query.args, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
    }

    #[test]
    fn in_with_empty_list() {
        let query = compile("id IN /** in .IDs **/", &json!({"IDs": []})).unwrap();
        assert_eq!(query.sql, "id IN ()");
        assert!(query.args.is_empty());
    }

    #[test]
    fn multi_repeats_sub_template() {
        let sql = r#"/** multi "(name LIKE ? OR kana LIKE ?)" "AND" .Names **/"#;
        let query = compile(sql, &json!({"Names": ["foo", "bar", "var"]})).unwrap();

        assert_eq!(
            query.sql,
            "(name LIKE ? OR kana LIKE ?) AND (name LIKE ? OR kana LIKE ?) AND (name LIKE ? OR kana LIKE ?)"
        );
        assert_eq!(
            query.args,
            vec![
                Value::from("foo"),
                Value::from("foo"),
                Value::from("bar"),
                Value::from("bar"),
                Value::from("var"),
                Value::from("var"),
            ]
        );
    }

    #[test]
    fn multi_separator_is_normalised() {
        let data = json!({"Xs": [1, 2]});
        let bare = compile(r#"/** multi "a = ?" "OR" .Xs **/"#, &data).unwrap();
        let padded = compile(r#"/** multi "a = ?" " OR " .Xs **/"#, &data).unwrap();
        assert_eq!(bare, padded);
        assert_eq!(bare.sql, "a = ? OR a = ?");
    }

    #[test]
    fn multi_punctuation_separator_is_kept() {
        let data = json!({"Xs": [1, 2]});
        assert_eq!(compile(r#"/** multi "(?)" "," .Xs **/"#, &data).unwrap().sql, "(?),(?)");
        assert_eq!(compile(r#"/** multi "(?)" ", " .Xs **/"#, &data).unwrap().sql, "(?), (?)");
    }

    #[test]
    fn separator_joiners() {
        assert_eq!(joiner("AND"), " AND ");
        assert_eq!(joiner("  UNION ALL "), " UNION ALL ");
        assert_eq!(joiner(","), ",");
        assert_eq!(joiner(""), " ");
    }

    #[test]
    fn multi_with_dollar_placeholders() {
        let compiler = Compiler::new(PlaceholderStyle::Dollar);
        let query = compiler
            .compile(r#"x = /** int .X **/ AND /** multi "(a = ? OR b = ?)" "OR" .Xs **/"#, &json!({"X": 0, "Xs": [1, 2]}))
            .unwrap();

        assert_eq!(query.sql, "x = $1 AND (a = $2 OR b = $3) OR (a = $4 OR b = $5)");
        assert_eq!(query.args.len(), 5);
    }

    #[test]
    fn multi_with_two_arguments_is_arity_error() {
        let err = compile("/** multi .Where .Sep **/", &json!({"Where": "a = ?", "Sep": "AND"})).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Arity { directive: DirectiveKind::Multi, expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn unresolved_field() {
        let err = compile("SELECT 1\nWHERE a = /** param .Missing **/", &json!({})).unwrap_err();
        match err {
            CompileError::UnresolvedField { name, position } => {
                assert_eq!(name, "Missing");
                assert_eq!(position.line, 2);
                assert_eq!(position.column, 11);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn type_mismatches() {
        let data = json!({"S": "x", "I": 1, "L": [1]});
        for sql in ["/** int .S **/", "/** string .I **/", "/** in .I **/", "/** param .L **/", "/** if .I **/ /** end **/"] {
            let err = compile(sql, &data).unwrap_err();
            assert!(matches!(err, CompileError::TypeMismatch { .. }), "{sql}: {err}");
        }
    }

    #[test]
    fn conditional_blocks() {
        let sql = "a /** if .On **/b /** end **/c";
        assert_eq!(compile(sql, &json!({"On": true})).unwrap().sql, "a b c");
        assert_eq!(compile(sql, &json!({"On": false})).unwrap().sql, "a c");
    }

    #[test]
    fn if_false_literal_always_excludes() {
        let query = compile("a /** if false **/OR b = /** param .Missing **//** end **/", &json!({})).unwrap();
        assert_eq!(query.sql, "a ");
        assert!(query.args.is_empty());
    }

    #[test]
    fn nested_blocks() {
        let sql = "/** if .A **/a/** if .B **/b/** end **/c/** end **/";
        assert_eq!(compile(sql, &json!({"A": true, "B": false})).unwrap().sql, "ac");
        assert_eq!(compile(sql, &json!({"A": true, "B": true})).unwrap().sql, "abc");
        assert_eq!(compile(sql, &json!({"A": false, "B": true})).unwrap().sql, "");
    }

    #[test]
    fn trim_markers() {
        let sql = "WHERE\n  /** if .A -**/\n  a = 1\n  /**- end **/\n  /**- if .B -**/\n  b = 2\n  /**- end **/";
        let query = compile(sql, &json!({"A": false, "B": true})).unwrap();
        assert_eq!(query.sql, "WHERE\n  b = 2");
    }

    #[test]
    fn end_without_if() {
        let err = compile("a /** end **/", &json!({})).unwrap_err();
        assert!(matches!(err, CompileError::UnbalancedBlock { .. }));
        assert_eq!(err.position().column, 3);
    }

    #[test]
    fn if_without_end() {
        let err = compile("/** if true **/ a /** if .X **/ b /** end **/", &json!({"X": true})).unwrap_err();
        match err {
            CompileError::UnbalancedBlock { message, position } => {
                assert!(message.contains("`if` without"));
                assert_eq!(position.offset, 0);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_templates() {
        assert!(matches!(compile("a /** param .X", &json!({"X": 1})), Err(CompileError::Malformed { .. })));
        assert!(matches!(compile("a /** **/", &json!({})), Err(CompileError::Malformed { .. })));
        assert!(matches!(compile("/** param foo **/", &json!({})), Err(CompileError::Malformed { .. })));
    }

    #[test]
    fn unknown_directives_are_inert() {
        let query = compile("a /** note this is ornamental **/b", &json!({})).unwrap();
        assert_eq!(query.sql, "a b");
        assert!(query.args.is_empty());
    }

    #[test]
    fn errors_in_skipped_branches_are_not_evaluated() {
        let query = compile("/** if .Off **//** int .Missing **//** end **/", &json!({"Off": false})).unwrap();
        assert_eq!(query.sql, "");
    }

    #[test]
    fn arity_is_checked_even_in_skipped_branches() {
        let err = compile("/** if false **//** param .A .B **//** end **/", &json!({})).unwrap_err();
        assert!(matches!(err, CompileError::Arity { directive: DirectiveKind::Param, .. }));
    }

    #[test]
    fn error_diagnostics() {
        let err = compile("/** int .S **/", &json!({"S": "x"})).unwrap_err();
        let diag = err.to_diagnostic("q.sql");
        assert_eq!(diag.code, DiagnosticCode::TemplateTypeMismatch);
        assert_eq!(diag.expected.as_deref(), Some("integer"));
        assert_eq!(diag.actual.as_deref(), Some("string"));
    }

    #[test]
    fn block_directives_are_not_actions() {
        assert_eq!(ActionKind::from_directive(DirectiveKind::If), None);
        assert_eq!(ActionKind::from_directive(DirectiveKind::End), None);
        assert_eq!(
            ActionKind::from_directive(DirectiveKind::Multi).map(ActionKind::directive),
            Some(DirectiveKind::Multi)
        );
    }

    #[test]
    fn parse_literals() {
        assert_eq!(parse_literal("true"), Some(Value::Bool(true)));
        assert_eq!(parse_literal("12"), Some(Value::Int(12)));
        assert_eq!(parse_literal("-0.5"), Some(Value::Float(-0.5)));
        assert_eq!(parse_literal("NaN"), None);
        assert_eq!(parse_literal("-"), None);
        assert_eq!(parse_literal("1.2.3"), None);
    }
}
