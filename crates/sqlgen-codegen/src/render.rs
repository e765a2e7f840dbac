//! Rust source rendering for generated records

use sqlgen_template::{FieldType, PlaceholderStyle};

use crate::record::{Record, RecordField};

/// First line of every generated file
pub const GENERATED_HEADER: &str = "// Code generated by sqlgen. DO NOT EDIT.";

/// How generated code refers to its surroundings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Crate path the runtime types are imported from
    pub runtime_crate: String,

    pub style: PlaceholderStyle,

    /// Path prefix from the generated file to the template directory,
    /// empty when they share a directory
    pub template_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            runtime_crate: "sqlgen_template".to_string(),
            style: PlaceholderStyle::Question,
            template_prefix: String::new(),
        }
    }
}

/// Render the complete generated file for `records`
pub fn render_file(records: &[Record], options: &RenderOptions) -> String {
    let mut out = String::new();
    out.push_str(GENERATED_HEADER);
    out.push('\n');

    if records.is_empty() {
        return out;
    }

    let mut imports = vec!["QueryElem", "TemplateData", "Value"];
    if options.style != PlaceholderStyle::Question {
        imports.insert(0, "PlaceholderStyle");
    }
    out.push_str(&format!("\nuse {}::{{{}}};\n", options.runtime_crate, imports.join(", ")));

    for record in records {
        out.push('\n');
        out.push_str(&render_record(record, options));
    }

    out
}

/// Render the constant, struct and trait impls for one record
pub fn render_record(record: &Record, options: &RenderOptions) -> String {
    let name = &record.name;
    let const_name = &record.const_name;
    let include_path = format!("{}{}", options.template_prefix, record.template_file);

    format!(
        "const {const_name}: &str = include_str!({include_path:?});\n\
         \n\
         {struct_def}\
         \n\
         impl TemplateData for {name} {{\n\
         {field_fn}\
         }}\n\
         \n\
         impl QueryElem for {name} {{\n\
         \x20   fn sql_template(&self) -> &str {{\n\
         \x20       {const_name}\n\
         \x20   }}\n\
         {style_fn}\
         }}\n",
        struct_def = render_struct(record),
        field_fn = render_field_fn(&record.fields),
        style_fn = render_style_fn(options.style),
    )
}

fn render_struct(record: &Record) -> String {
    let derive = "#[derive(Debug, Clone, Default, PartialEq)]";
    if record.fields.is_empty() {
        return format!("{derive}\npub struct {};\n", record.name);
    }

    let mut out = format!("{derive}\npub struct {} {{\n", record.name);
    for field in &record.fields {
        out.push_str(&format!("    pub {}: {},\n", field.ident, field.rust_type()));
    }
    out.push_str("}\n");
    out
}

fn render_field_fn(fields: &[RecordField]) -> String {
    if fields.is_empty() {
        return "    fn field(&self, _name: &str) -> Option<Value> {\n        None\n    }\n".to_string();
    }

    let mut out = String::from("    fn field(&self, name: &str) -> Option<Value> {\n        match name {\n");
    for field in fields {
        out.push_str(&format!("            {:?} => Some({}),\n", field.name, value_expr(field)));
    }
    out.push_str("            _ => None,\n        }\n    }\n");
    out
}

/// Expression converting a struct field into a `Value`
fn value_expr(field: &RecordField) -> String {
    let access = format!("self.{}", field.ident);
    match field.field_type {
        FieldType::String => format!("Value::String({access}.clone())"),
        FieldType::Integer => format!("Value::Int({access})"),
        FieldType::Float => format!("Value::Float({access})"),
        FieldType::Boolean => format!("Value::Bool({access})"),
        FieldType::Scalar => format!("{access}.clone()"),
        FieldType::List => format!("Value::List({access}.clone())"),
    }
}

fn render_style_fn(style: PlaceholderStyle) -> String {
    match style {
        PlaceholderStyle::Question => String::new(),
        PlaceholderStyle::Dollar => "\n    fn placeholder_style(&self) -> PlaceholderStyle {\n        PlaceholderStyle::Dollar\n    }\n".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_record() -> Record {
        Record {
            name: "FindUserQueryElem".to_string(),
            template_file: "find_user.sql".to_string(),
            const_name: "FIND_USER_QUERY_ELEM_SQL".to_string(),
            fields: vec![
                RecordField {
                    name: "ID".to_string(),
                    ident: "id".to_string(),
                    field_type: FieldType::Integer,
                },
                RecordField {
                    name: "Where".to_string(),
                    ident: "r#where".to_string(),
                    field_type: FieldType::String,
                },
                RecordField {
                    name: "Names".to_string(),
                    ident: "names".to_string(),
                    field_type: FieldType::List,
                },
            ],
        }
    }

    #[test]
    fn renders_record() {
        let expected = r#"const FIND_USER_QUERY_ELEM_SQL: &str = include_str!("find_user.sql");

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindUserQueryElem {
    pub id: i64,
    pub r#where: String,
    pub names: Vec<Value>,
}

impl TemplateData for FindUserQueryElem {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "ID" => Some(Value::Int(self.id)),
            "Where" => Some(Value::String(self.r#where.clone())),
            "Names" => Some(Value::List(self.names.clone())),
            _ => None,
        }
    }
}

impl QueryElem for FindUserQueryElem {
    fn sql_template(&self) -> &str {
        FIND_USER_QUERY_ELEM_SQL
    }
}
"#;
        assert_eq!(render_record(&sample_record(), &RenderOptions::default()), expected);
    }

    #[test]
    fn renders_empty_record_as_unit_struct() {
        let record = Record {
            name: "CountQueryElem".to_string(),
            template_file: "count.sql".to_string(),
            const_name: "COUNT_QUERY_ELEM_SQL".to_string(),
            fields: Vec::new(),
        };
        let source = render_record(&record, &RenderOptions::default());

        assert!(source.contains("pub struct CountQueryElem;\n"));
        assert!(source.contains("fn field(&self, _name: &str) -> Option<Value> {\n        None\n    }"));
    }

    #[test]
    fn dollar_style_overrides_placeholders() {
        let options = RenderOptions {
            style: PlaceholderStyle::Dollar,
            ..RenderOptions::default()
        };
        let source = render_file(&[sample_record()], &options);

        assert!(source.contains("use sqlgen_template::{PlaceholderStyle, QueryElem, TemplateData, Value};"));
        assert!(source.contains("fn placeholder_style(&self) -> PlaceholderStyle {\n        PlaceholderStyle::Dollar\n    }"));
    }

    #[test]
    fn file_header_and_imports() {
        let options = RenderOptions {
            runtime_crate: "crate::sql".to_string(),
            template_prefix: "../queries/".to_string(),
            ..RenderOptions::default()
        };
        let source = render_file(&[sample_record()], &options);

        assert!(source.starts_with(GENERATED_HEADER));
        assert!(source.contains("\nuse crate::sql::{QueryElem, TemplateData, Value};\n"));
        assert!(source.contains(r#"include_str!("../queries/find_user.sql")"#));
    }

    #[test]
    fn empty_directory_renders_header_only() {
        assert_eq!(render_file(&[], &RenderOptions::default()), format!("{}\n", GENERATED_HEADER));
    }
}
