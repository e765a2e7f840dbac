//! Record model
//!
//! A record is the Rust struct generated for one template: its name, the
//! template file it embeds and one field per distinct directive field.

use sqlgen_core::RecordSummary;
use sqlgen_template::{Field, FieldExtractor, FieldType, UnknownDirective};

use crate::error::CodegenError;
use crate::naming;

/// Rust type of a generated field
pub fn rust_type(field_type: FieldType) -> &'static str {
    match field_type {
        FieldType::String => "String",
        FieldType::Integer => "i64",
        FieldType::Float => "f64",
        FieldType::Boolean => "bool",
        FieldType::Scalar => "Value",
        FieldType::List => "Vec<Value>",
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordField {
    /// Name as referenced by the template (`IsSelectID`)
    pub name: String,

    /// Rust identifier (`is_select_id`, `r#where`)
    pub ident: String,

    pub field_type: FieldType,
}

impl RecordField {
    pub fn rust_type(&self) -> &'static str {
        rust_type(self.field_type)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Struct name
    pub name: String,

    /// Template file name, relative to the template directory
    pub template_file: String,

    /// Name of the constant holding the embedded template
    pub const_name: String,

    pub fields: Vec<RecordField>,
}

impl Record {
    /// Build a record from a template's source
    ///
    /// Returns the record together with the unknown directives found while
    /// extracting, so the caller can report them.
    pub fn from_template(
        template_file: &str,
        stem: &str,
        source: &str,
        suffix: &str,
    ) -> Result<(Self, Vec<UnknownDirective>), CodegenError> {
        let name = naming::record_name(stem, suffix).ok_or_else(|| CodegenError::InvalidRecordName {
            file: template_file.to_string(),
        })?;

        let extraction = FieldExtractor::extract(source).map_err(|source| CodegenError::Extract {
            file: template_file.to_string(),
            source,
        })?;

        let record = Self::from_fields(name, template_file, &extraction.fields)?;
        Ok((record, extraction.unknown))
    }

    /// Build a record from extracted fields
    ///
    /// Repeated fields of the same type collapse to their first occurrence.
    /// A field used with two different types is an error, as is a field
    /// whose name has no valid identifier.
    pub fn from_fields(name: String, template_file: &str, fields: &[Field]) -> Result<Self, CodegenError> {
        let mut record_fields: Vec<RecordField> = Vec::new();

        for field in fields {
            if let Some(existing) = record_fields.iter().find(|f| f.name == field.name) {
                if existing.field_type != field.field_type {
                    return Err(CodegenError::ConflictingFieldType {
                        file: template_file.to_string(),
                        name: field.name.clone(),
                        first: existing.field_type,
                        second: field.field_type,
                    });
                }
                continue;
            }

            let ident = naming::field_ident(&field.name).ok_or_else(|| CodegenError::InvalidFieldName {
                file: template_file.to_string(),
                name: field.name.clone(),
            })?;

            if let Some(existing) = record_fields.iter().find(|f| f.ident == ident) {
                return Err(CodegenError::FieldNameCollision {
                    file: template_file.to_string(),
                    ident,
                    first: existing.name.clone(),
                    second: field.name.clone(),
                });
            }

            record_fields.push(RecordField {
                name: field.name.clone(),
                ident,
                field_type: field.field_type,
            });
        }

        Ok(Self {
            const_name: naming::template_const_name(&name),
            name,
            template_file: template_file.to_string(),
            fields: record_fields,
        })
    }

    pub fn summary(&self) -> RecordSummary {
        RecordSummary {
            name: self.name.clone(),
            template: self.template_file.clone(),
            fields: self
                .fields
                .iter()
                .map(|f| format!("{}: {}", f.name, f.field_type))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn field(name: &str, field_type: FieldType) -> Field {
        Field::new(name, field_type)
    }

    #[test]
    fn record_from_template() {
        let sql = "SELECT * FROM users WHERE /** if .IsSelectID -**/ id = /** int .ID **/1 /**- end **/";
        let (record, unknown) = Record::from_template("select_users.sql", "select_users", sql, "QueryElem").unwrap();

        assert_eq!(record.name, "SelectUsersQueryElem");
        assert_eq!(record.const_name, "SELECT_USERS_QUERY_ELEM_SQL");
        assert_eq!(
            record.fields,
            vec![
                RecordField {
                    name: "IsSelectID".to_string(),
                    ident: "is_select_id".to_string(),
                    field_type: FieldType::Boolean,
                },
                RecordField {
                    name: "ID".to_string(),
                    ident: "id".to_string(),
                    field_type: FieldType::Integer,
                },
            ]
        );
        assert!(unknown.is_empty());
    }

    #[test]
    fn repeated_field_collapses() {
        let fields = [field("ID", FieldType::Integer), field("Name", FieldType::String), field("ID", FieldType::Integer)];
        let record = Record::from_fields("R".to_string(), "r.sql", &fields).unwrap();
        let names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["ID", "Name"]);
    }

    #[test]
    fn conflicting_types_fail() {
        let fields = [field("ID", FieldType::Scalar), field("ID", FieldType::Integer)];
        let err = Record::from_fields("R".to_string(), "r.sql", &fields).unwrap_err();
        assert!(matches!(
            err,
            CodegenError::ConflictingFieldType { first: FieldType::Scalar, second: FieldType::Integer, .. }
        ));
    }

    #[test]
    fn identifier_collision_fails() {
        let fields = [field("UserID", FieldType::Integer), field("UserId", FieldType::Integer)];
        let err = Record::from_fields("R".to_string(), "r.sql", &fields).unwrap_err();
        assert!(matches!(err, CodegenError::FieldNameCollision { ref ident, .. } if ident == "user_id"));
    }

    #[test]
    fn invalid_record_name() {
        let err = Record::from_template("1.sql", "1", "SELECT 1", "QueryElem").unwrap_err();
        assert!(matches!(err, CodegenError::InvalidRecordName { .. }));
    }

    #[test]
    fn extraction_error_names_file() {
        let err = Record::from_template("m.sql", "m", "/** multi .A **/", "QueryElem").unwrap_err();
        assert!(err.to_string().starts_with("m.sql: directive `multi`"));
    }

    #[test]
    fn rust_types() {
        assert_eq!(rust_type(FieldType::Scalar), "Value");
        assert_eq!(rust_type(FieldType::List), "Vec<Value>");
        assert_eq!(rust_type(FieldType::Float), "f64");
    }

    #[test]
    fn summary_lists_fields_with_types() {
        let record = Record::from_fields("R".to_string(), "r.sql", &[field("Where", FieldType::String)]).unwrap();
        let summary = record.summary();
        assert_eq!(summary.fields, vec!["Where: string".to_string()]);
        assert_eq!(summary.template, "r.sql");
    }
}
