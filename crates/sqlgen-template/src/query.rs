//! Compiled queries and the generated-record contract

use serde::{Deserialize, Serialize};

use crate::compiler::{CompileError, Compiler};
use crate::value::{TemplateData, Value};

/// Final SQL text with its bound arguments
///
/// `args[i]` belongs to the i-th placeholder in `sql`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Query {
    pub sql: String,
    pub args: Vec<Value>,
}

/// Placeholder syntax of the target driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `?` for every argument
    #[default]
    Question,

    /// `$1`, `$2`, ... numbered by argument position
    Dollar,
}

impl PlaceholderStyle {
    /// Placeholder text for the argument at 1-indexed `position`
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Self::Question => "?".to_string(),
            Self::Dollar => format!("${}", position),
        }
    }
}

/// Implemented by generated records
///
/// A record owns its template text and its field values; `query` compiles
/// the one against the other.
pub trait QueryElem: TemplateData {
    /// Raw two-way SQL, dummy literals included
    fn sql_template(&self) -> &str;

    fn placeholder_style(&self) -> PlaceholderStyle {
        PlaceholderStyle::Question
    }

    /// Compile the template using this record as data
    fn query(&self) -> Result<Query, CompileError>
    where
        Self: Sized,
    {
        Compiler::new(self.placeholder_style()).build(self.sql_template(), self)
    }
}
