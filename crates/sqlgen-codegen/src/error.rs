//! Record generation errors

use sqlgen_core::{Diagnostic, DiagnosticCode, Location, Severity};
use sqlgen_template::{ExtractError, FieldType};
use std::path::PathBuf;

/// Error while generating records for a template directory
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to list templates: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("{file}: {source}")]
    Extract {
        file: String,
        #[source]
        source: ExtractError,
    },

    #[error("{file}: field `{name}` is used as {first} and as {second}")]
    ConflictingFieldType {
        file: String,
        name: String,
        first: FieldType,
        second: FieldType,
    },

    #[error("{file}: field `{name}` cannot be used as a Rust identifier")]
    InvalidFieldName { file: String, name: String },

    #[error("{file}: fields `{first}` and `{second}` both map to `{ident}`")]
    FieldNameCollision {
        file: String,
        ident: String,
        first: String,
        second: String,
    },

    #[error("{file}: file name does not form a valid record name")]
    InvalidRecordName { file: String },

    #[error("{second}: record `{name}` is already generated from {first}")]
    DuplicateRecord {
        name: String,
        first: String,
        second: String,
    },
}

impl CodegenError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Convert to a diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CodegenError::Io { path, .. } => {
                Diagnostic::new(DiagnosticCode::IoError, Severity::Error, self.to_string())
                    .with_location(Location::new(path.display().to_string()))
            }
            CodegenError::Walk(_) => {
                Diagnostic::new(DiagnosticCode::IoError, Severity::Error, self.to_string())
            }
            CodegenError::Extract { file, source } => source.to_diagnostic(file),
            CodegenError::ConflictingFieldType { file, first, second, .. } => {
                Diagnostic::new(DiagnosticCode::FieldTypeConflict, Severity::Error, self.to_string())
                    .with_location(Location::new(file.clone()))
                    .with_comparison(first.as_str(), second.as_str())
            }
            CodegenError::InvalidFieldName { file, .. }
            | CodegenError::FieldNameCollision { file, .. } => {
                Diagnostic::new(DiagnosticCode::FieldInvalidName, Severity::Error, self.to_string())
                    .with_location(Location::new(file.clone()))
            }
            CodegenError::InvalidRecordName { file } => {
                Diagnostic::new(DiagnosticCode::RecordInvalidName, Severity::Error, self.to_string())
                    .with_location(Location::new(file.clone()))
            }
            CodegenError::DuplicateRecord { second, .. } => {
                Diagnostic::new(DiagnosticCode::RecordDuplicateName, Severity::Error, self.to_string())
                    .with_location(Location::new(second.clone()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_diagnostic_carries_both_types() {
        let err = CodegenError::ConflictingFieldType {
            file: "find.sql".to_string(),
            name: "ID".to_string(),
            first: FieldType::Integer,
            second: FieldType::String,
        };
        let diag = err.to_diagnostic();

        assert_eq!(diag.code, DiagnosticCode::FieldTypeConflict);
        assert_eq!(diag.expected.as_deref(), Some("integer"));
        assert_eq!(diag.actual.as_deref(), Some("string"));
        assert_eq!(err.to_string(), "find.sql: field `ID` is used as integer and as string");
    }
}
