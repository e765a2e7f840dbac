//! Field extraction
//!
//! Turns the directives of a template into the ordered list of typed fields
//! its caller must supply. Runs at generation time, before any data exists.

use serde::{Deserialize, Serialize};
use sqlgen_core::{Diagnostic, DiagnosticCode, Location, Severity};

use crate::directive::{Directive, DirectiveKind, Position};
use crate::token::Arg;

/// Inferred type of an extracted field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    /// Any single value the driver can bind
    Scalar,
    /// List of opaque scalars
    List,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Scalar => "scalar",
            Self::List => "list",
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A named, typed value a template needs from its caller
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Name as referenced in the directive, without the `.` marker
    pub name: String,

    #[serde(rename = "type")]
    pub field_type: FieldType,
}

impl Field {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// A directive whose keyword is not in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirective {
    pub keyword: String,
    pub position: Position,
}

impl UnknownDirective {
    /// Non-fatal diagnostic for a template file
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        Diagnostic::new(
            DiagnosticCode::DirectiveUnknown,
            Severity::Warn,
            format!("unknown directive `{}` ignored", self.keyword),
        )
        .with_location(Location::with_position(file, self.position.line, self.position.column))
    }
}

/// Everything extraction learned about one template
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Fields in first-seen order, duplicates preserved
    pub fields: Vec<Field>,

    /// Directives that were skipped because their keyword is unknown
    pub unknown: Vec<UnknownDirective>,
}

/// Error during field extraction
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExtractError {
    #[error("directive `{directive}` expects {expected} arguments, found {found} ({position})")]
    Arity {
        directive: DirectiveKind,
        expected: usize,
        found: usize,
        position: Position,
    },
}

impl ExtractError {
    /// Convert to a diagnostic for a template file
    pub fn to_diagnostic(&self, file: &str) -> Diagnostic {
        match self {
            ExtractError::Arity { expected, found, position, .. } => Diagnostic::new(
                DiagnosticCode::DirectiveArity,
                Severity::Error,
                self.to_string(),
            )
            .with_location(Location::with_position(file, position.line, position.column))
            .with_comparison(expected.to_string(), found.to_string()),
        }
    }
}

/// Extracts typed fields from directive-bearing SQL
pub struct FieldExtractor;

impl FieldExtractor {
    /// Scan a whole template
    ///
    /// Fields of every directive are concatenated in source order. No
    /// deduplication or type unification happens here.
    pub fn extract(source: &str) -> Result<Extraction, ExtractError> {
        let mut extraction = Extraction::default();

        for directive in Directive::parse_all(source) {
            if directive.kind.is_none() {
                tracing::warn!(
                    keyword = %directive.keyword,
                    line = directive.position.line,
                    column = directive.position.column,
                    "unknown directive ignored"
                );
                extraction.unknown.push(UnknownDirective {
                    keyword: directive.keyword,
                    position: directive.position,
                });
                continue;
            }

            let fields = Self::directive_fields(&directive)?;
            tracing::debug!(keyword = %directive.keyword, fields = fields.len(), "extracted directive");
            extraction.fields.extend(fields);
        }

        Ok(extraction)
    }

    /// Fields contributed by a single directive
    ///
    /// Only field-reference arguments yield fields. `multi` must have exactly
    /// three arguments; other directives use their first argument and ignore
    /// the rest.
    pub fn directive_fields(directive: &Directive) -> Result<Vec<Field>, ExtractError> {
        let Some(kind) = directive.kind else {
            return Ok(Vec::new());
        };

        let args: &[Arg] = match kind {
            DirectiveKind::Multi => {
                if directive.args.len() != kind.arity() {
                    return Err(ExtractError::Arity {
                        directive: kind,
                        expected: kind.arity(),
                        found: directive.args.len(),
                        position: directive.position,
                    });
                }
                &directive.args[..]
            }
            DirectiveKind::Param
            | DirectiveKind::Int
            | DirectiveKind::Float
            | DirectiveKind::String
            | DirectiveKind::If
            | DirectiveKind::In => &directive.args[..directive.args.len().min(1)],
            DirectiveKind::End => &[],
        };

        Ok(Self::typed_fields(kind, args))
    }

    fn typed_fields(kind: DirectiveKind, args: &[Arg]) -> Vec<Field> {
        kind.signature()
            .iter()
            .zip(args)
            .filter_map(|((_, field_type), arg)| {
                arg.field_name().map(|name| Field::new(name, *field_type))
            })
            .collect()
    }
}

/// Fields of a template, in source order
pub fn extract_fields(source: &str) -> Result<Vec<Field>, ExtractError> {
    FieldExtractor::extract(source).map(|extraction| extraction.fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn fields_of(body: &str) -> Result<Vec<Field>, ExtractError> {
        extract_fields(&format!("/** {} **/", body))
    }

    #[test]
    fn single_value_directives() {
        let cases = [
            ("param .Filed", FieldType::Scalar),
            ("int .Filed", FieldType::Integer),
            ("float .Filed", FieldType::Float),
            ("string .Filed", FieldType::String),
            ("if .Filed", FieldType::Boolean),
            ("in .Filed", FieldType::List),
        ];

        for (body, field_type) in cases {
            assert_eq!(fields_of(body).unwrap(), vec![Field::new("Filed", field_type)], "{}", body);
        }
    }

    #[test]
    fn literals_yield_no_fields() {
        assert!(fields_of("param 12345").unwrap().is_empty());
        assert!(fields_of("if false").unwrap().is_empty());
        assert!(fields_of(r#"string "fixed""#).unwrap().is_empty());
        assert!(fields_of("end").unwrap().is_empty());
    }

    #[test]
    fn multi_with_field_references() {
        assert_eq!(
            fields_of("multi .Where .Sep .Slice").unwrap(),
            vec![
                Field::new("Where", FieldType::String),
                Field::new("Sep", FieldType::String),
                Field::new("Slice", FieldType::List),
            ]
        );
    }

    #[test]
    fn multi_with_literal_template_and_separator() {
        assert_eq!(
            fields_of(r#"multi "(name LIKE ? OR kana LIKE ?)" " AND " .Slice"#).unwrap(),
            vec![Field::new("Slice", FieldType::List)]
        );
    }

    #[test]
    fn multi_missing_argument() {
        let err = fields_of("multi .Where .Sep").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Arity { directive: DirectiveKind::Multi, expected: 3, found: 2, .. }
        ));
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn multi_arity_error_fails_whole_template() {
        let sql = "SELECT /** string .Name **/'x' /** multi .A .B .C .D **/(1)";
        assert!(extract_fields(sql).is_err());
    }

    #[test]
    fn source_order_not_alphabetical() {
        let sql = "SELECT * FROM t WHERE name = /** string .Name **/'a' AND id = /** int .ID **/1";
        assert_eq!(
            extract_fields(sql).unwrap(),
            vec![Field::new("Name", FieldType::String), Field::new("ID", FieldType::Integer)]
        );
    }

    #[test]
    fn duplicates_are_preserved() {
        let sql = "/** param .ID **/1 /** int .ID **/2 /** param .ID **/3";
        assert_eq!(
            extract_fields(sql).unwrap(),
            vec![
                Field::new("ID", FieldType::Scalar),
                Field::new("ID", FieldType::Integer),
                Field::new("ID", FieldType::Scalar),
            ]
        );
    }

    #[test]
    fn unknown_directives_are_reported_not_fatal() {
        let sql = "SELECT 1\n/** parm .ID **/1 /** param .Name **/'x'";
        let extraction = FieldExtractor::extract(sql).unwrap();

        assert_eq!(extraction.fields, vec![Field::new("Name", FieldType::Scalar)]);
        assert_eq!(extraction.unknown.len(), 1);
        assert_eq!(extraction.unknown[0].keyword, "parm");
        assert_eq!(extraction.unknown[0].position.line, 2);

        let diag = extraction.unknown[0].to_diagnostic("q.sql");
        assert_eq!(diag.code, DiagnosticCode::DirectiveUnknown);
        assert_eq!(diag.severity, Severity::Warn);
    }

    #[test]
    fn arity_error_diagnostic() {
        let err = fields_of("multi .A").unwrap_err();
        let diag = err.to_diagnostic("q.sql");
        assert_eq!(diag.code, DiagnosticCode::DirectiveArity);
        assert_eq!(diag.expected.as_deref(), Some("3"));
        assert_eq!(diag.actual.as_deref(), Some("1"));
    }
}
