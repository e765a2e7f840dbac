//! Diagnostic codes and error reporting
//!
//! IMPORTANT: Diagnostic codes are versioned and stable.
//! NEVER rename or remove codes - they are part of the public API.
//! Add new codes with new names only.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry (v1)
///
/// These codes are STABLE and VERSIONED.
/// Do NOT rename or remove codes - only add new ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // Directive extraction (1xxx)
    /// Directive keyword is not in the catalog and was ignored
    DirectiveUnknown,

    /// Directive received the wrong number of arguments
    DirectiveArity,

    /// Literal-shaped text right after a directive was left in the SQL
    /// because nothing separates it from the following text
    DummyNotStripped,

    /// The same field is referenced with incompatible directive kinds
    FieldTypeConflict,

    /// Field name cannot be turned into a Rust identifier, or two field
    /// names map to the same identifier
    FieldInvalidName,

    /// Template file name cannot be turned into a record name
    RecordInvalidName,

    /// Two templates map to the same record name
    RecordDuplicateName,

    // Template compilation (2xxx)
    /// Field reference does not exist on the data record
    TemplateUnresolvedField,

    /// Field value has the wrong type for its directive
    TemplateTypeMismatch,

    /// `if` without `end`, or `end` without `if`
    TemplateUnbalancedBlock,

    /// Template text could not be parsed
    TemplateMalformed,

    // I/O (8xxx)
    /// Failed to read a template or write generated output
    IoError,

    /// Generated file on disk differs from what would be generated
    OutputOutOfDate,

    // General warnings (9xxx)
    /// General informational message
    Info,

    /// General warning message
    Warning,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DirectiveUnknown => "DIRECTIVE_UNKNOWN",
            Self::DirectiveArity => "DIRECTIVE_ARITY",
            Self::DummyNotStripped => "DUMMY_NOT_STRIPPED",
            Self::FieldTypeConflict => "FIELD_TYPE_CONFLICT",
            Self::FieldInvalidName => "FIELD_INVALID_NAME",
            Self::RecordInvalidName => "RECORD_INVALID_NAME",
            Self::RecordDuplicateName => "RECORD_DUPLICATE_NAME",
            Self::TemplateUnresolvedField => "TEMPLATE_UNRESOLVED_FIELD",
            Self::TemplateTypeMismatch => "TEMPLATE_TYPE_MISMATCH",
            Self::TemplateUnbalancedBlock => "TEMPLATE_UNBALANCED_BLOCK",
            Self::TemplateMalformed => "TEMPLATE_MALFORMED",
            Self::IoError => "IO_ERROR",
            Self::OutputOutOfDate => "OUTPUT_OUT_OF_DATE",
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - should be reviewed but not blocking
    Warn,

    /// Error - generation fails
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Source location in a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// File path as given to the generator
    pub file: String,

    /// Optional line number (1-indexed)
    pub line: Option<usize>,

    /// Optional column number (1-indexed)
    pub column: Option<usize>,
}

impl Location {
    /// Create a new location with just a file path
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line: None,
            column: None,
        }
    }

    /// Create a location with file and line number
    pub fn with_line(file: impl Into<String>, line: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: None,
        }
    }

    /// Create a location with file, line, and column
    pub fn with_position(file: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line: Some(line),
            column: Some(column),
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.file)?;
        if let Some(line) = self.line {
            write!(f, ":{}", line)?;
            if let Some(column) = self.column {
                write!(f, ":{}", column)?;
            }
        }
        Ok(())
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Source location (best-effort)
    pub location: Option<Location>,

    /// Expected value (for comparison diagnostics)
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    pub actual: Option<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            location: None,
            expected: None,
            actual: None,
        }
    }

    /// Set the location
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diagnostic_code_stability() {
        // Ensure codes are stable strings
        assert_eq!(DiagnosticCode::DirectiveUnknown.as_str(), "DIRECTIVE_UNKNOWN");
        assert_eq!(DiagnosticCode::TemplateUnbalancedBlock.as_str(), "TEMPLATE_UNBALANCED_BLOCK");
        assert_eq!(DiagnosticCode::DummyNotStripped.as_str(), "DUMMY_NOT_STRIPPED");
    }

    #[test]
    fn serde_name_matches_as_str() {
        let json = serde_json::to_string(&DiagnosticCode::FieldTypeConflict).unwrap();
        assert_eq!(json, format!("\"{}\"", DiagnosticCode::FieldTypeConflict.as_str()));
    }

    #[test]
    fn diagnostic_serialization() {
        let diag = Diagnostic::new(
            DiagnosticCode::DirectiveArity,
            Severity::Error,
            "directive `multi` expects 3 arguments, found 2",
        )
        .with_location(Location::with_line("queries/select_items.sql", 4));

        let json = serde_json::to_string(&diag).unwrap();
        assert!(json.contains("DIRECTIVE_ARITY"));
        assert!(json.contains("error"));
        assert!(diag.is_error());
    }

    #[test]
    fn location_display() {
        assert_eq!(Location::new("a.sql").to_string(), "a.sql");
        assert_eq!(Location::with_line("a.sql", 3).to_string(), "a.sql:3");
        assert_eq!(Location::with_position("a.sql", 3, 7).to_string(), "a.sql:3:7");
    }
}
