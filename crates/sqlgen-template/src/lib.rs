//! Two-way SQL templates
//!
//! This crate handles:
//! - Tokenizing directive bodies found in `/** ... **/` comments
//! - The directive catalog (`param`, `int`, `float`, `string`, `if`, `in`, `multi`, `end`)
//! - Extracting the typed fields a template needs from its caller
//! - Stripping the dummy literals that keep the raw file valid SQL
//! - Compiling a template against a data record into SQL text and bound arguments

pub mod token;
pub mod directive;
pub mod extract;
pub mod strip;
pub mod value;
pub mod query;
pub mod compiler;

pub use token::{tokenize, Arg};
pub use directive::{scan, Directive, DirectiveKind, DirectiveSpan, ArgRole, Position, Scan};
pub use extract::{extract_fields, Extraction, ExtractError, Field, FieldExtractor, FieldType, UnknownDirective};
pub use strip::{DummyShape, DummyStripper, UnstrippedLiteral, DUMMY_PATTERNS};
pub use value::{TemplateData, Value};
pub use query::{PlaceholderStyle, Query, QueryElem};
pub use compiler::{build_query, compile, CompileError, Compiler};
