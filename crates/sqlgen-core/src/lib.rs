//! sqlgen core
//!
//! Stable, versioned types shared by the template compiler, the record
//! generator and the CLI. Never rename diagnostic codes - they are part of
//! the public API.

pub mod diagnostic;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use report::{Report, ReportSummary, ReportVersion, RecordSummary};
pub use config::{Config, ConfigError, DialectConfig, CONFIG_FILE_NAME};
