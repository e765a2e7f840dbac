//! sqlgen record generator
//!
//! Turns a directory of two-way SQL templates into Rust records. Each
//! `name.sql` becomes a `NameQueryElem` struct with one field per directive
//! field, implementing `TemplateData` and `QueryElem` from the template
//! runtime so that `record.query()` yields the final SQL and arguments.

pub mod error;
pub mod naming;
pub mod record;
pub mod render;
pub mod generator;

pub use error::CodegenError;
pub use record::{rust_type, Record, RecordField};
pub use render::{render_file, render_record, RenderOptions, GENERATED_HEADER};
pub use generator::{CodeGen, Generation, TEMPLATE_EXTENSION};
