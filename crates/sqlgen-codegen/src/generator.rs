//! Directory-level generation
//!
//! Reads every `.sql` file directly inside a directory, builds one record
//! per template and renders them into a single Rust file. Nothing is written
//! unless every template succeeds.

use sqlgen_core::{Config, Diagnostic, Report};
use sqlgen_template::{DummyStripper, PlaceholderStyle};
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::error::CodegenError;
use crate::record::Record;
use crate::render::{render_file, RenderOptions};

/// Extension of template files, compared case-insensitively
pub const TEMPLATE_EXTENSION: &str = "sql";

/// Result of generating a directory, not yet written
#[derive(Debug, Clone)]
pub struct Generation {
    /// Where the generated file goes
    pub output_path: PathBuf,

    /// Rendered Rust source
    pub source: String,

    /// Template files that were read
    pub templates: Vec<PathBuf>,

    /// Records in template file name order
    pub records: Vec<Record>,

    /// Non-fatal diagnostics: unknown directives and unstripped dummies
    pub diagnostics: Vec<Diagnostic>,
}

impl Generation {
    /// Write the generated file, creating its directory if needed
    pub fn write(&self) -> Result<(), CodegenError> {
        if let Some(parent) = self.output_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| CodegenError::io(parent, e))?;
        }
        std::fs::write(&self.output_path, &self.source).map_err(|e| CodegenError::io(&self.output_path, e))?;

        tracing::info!(path = %self.output_path.display(), records = self.records.len(), "wrote generated records");
        Ok(())
    }

    /// Whether the file on disk already matches the generated source
    pub fn is_up_to_date(&self) -> Result<bool, CodegenError> {
        match std::fs::read_to_string(&self.output_path) {
            Ok(existing) => Ok(existing == self.source),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(CodegenError::io(&self.output_path, e)),
        }
    }

    pub fn report(&self) -> Report {
        let mut report = Report::from_diagnostics(self.diagnostics.clone());
        report.summary.templates = self.templates.len();
        for record in &self.records {
            report.add_record(record.summary());
        }
        report
    }
}

/// Generates records for one template directory
pub struct CodeGen {
    dir: PathBuf,
    config: Config,
}

impl CodeGen {
    /// Generator with default configuration
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let config = Config {
            project_root: dir.clone(),
            ..Config::default()
        };
        Self { dir, config }
    }

    /// Generator with explicit configuration
    ///
    /// Relative output paths in `config` are resolved against `dir`.
    pub fn with_config(dir: impl Into<PathBuf>, mut config: Config) -> Self {
        let dir = dir.into();
        config.project_root = dir.clone();
        Self { dir, config }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn output_path(&self) -> PathBuf {
        self.config.output_path()
    }

    pub fn placeholder_style(&self) -> PlaceholderStyle {
        if self.config.dialect.uses_numbered_placeholders() {
            PlaceholderStyle::Dollar
        } else {
            PlaceholderStyle::Question
        }
    }

    /// Template files directly inside the directory, sorted by file name
    pub fn discover_templates(&self) -> Result<Vec<PathBuf>, CodegenError> {
        let mut templates = Vec::new();

        for entry in WalkDir::new(&self.dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let is_template = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(TEMPLATE_EXTENSION));
            if is_template {
                templates.push(entry.into_path());
            }
        }

        tracing::debug!(dir = %self.dir.display(), count = templates.len(), "discovered templates");
        Ok(templates)
    }

    /// Build records and render the output without touching the disk
    pub fn generate(&self) -> Result<Generation, CodegenError> {
        let templates = self.discover_templates()?;
        let mut records: Vec<Record> = Vec::with_capacity(templates.len());
        let mut diagnostics = Vec::new();

        for path in &templates {
            let file_name = file_name(path);
            let stem = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let source = std::fs::read_to_string(path).map_err(|e| CodegenError::io(path, e))?;

            let (record, unknown) = Record::from_template(&file_name, &stem, &source, &self.config.struct_suffix)?;

            if let Some(existing) = records.iter().find(|r| r.name == record.name) {
                return Err(CodegenError::DuplicateRecord {
                    name: record.name,
                    first: existing.template_file.clone(),
                    second: file_name,
                });
            }

            if self.config.warn_unknown_directives {
                diagnostics.extend(unknown.iter().map(|u| u.to_diagnostic(&file_name)));
            }
            let (_, unstripped) = DummyStripper::strip_with_report(&source);
            diagnostics.extend(unstripped.iter().map(|u| u.to_diagnostic(&file_name)));

            tracing::debug!(record = %record.name, fields = record.fields.len(), "built record");
            records.push(record);
        }

        let output_path = self.output_path();
        let options = RenderOptions {
            runtime_crate: self.config.runtime_crate.clone(),
            style: self.placeholder_style(),
            template_prefix: template_prefix(&self.dir, &output_path),
        };
        let source = render_file(&records, &options);

        Ok(Generation {
            output_path,
            source,
            templates,
            records,
            diagnostics,
        })
    }

    /// Generate and write the output file
    pub fn run(&self) -> Result<Generation, CodegenError> {
        let generation = self.generate()?;
        generation.write()?;
        Ok(generation)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Path from the generated file's directory back to the template directory
///
/// Always relative when both paths share a root, so the generated file
/// stays valid in any checkout. Paths on different roots (another drive)
/// fall back to the absolute template directory.
fn template_prefix(dir: &Path, output_path: &Path) -> String {
    let output_dir = output_path.parent().unwrap_or(dir);

    if let (Ok(from), Ok(to)) = (std::path::absolute(output_dir), std::path::absolute(dir)) {
        if let Some(relative) = relative_dir(&from, &to) {
            return relative;
        }
    }

    let absolute = std::path::absolute(dir).unwrap_or_else(|_| dir.to_path_buf());
    format!("{}/", absolute.display().to_string().replace('\\', "/").trim_end_matches('/'))
}

/// `../` steps out of `from` followed by the remaining parts of `to`,
/// each ending in `/`
fn relative_dir(from: &Path, to: &Path) -> Option<String> {
    let from = normalize(from);
    let to = normalize(to);

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();
    if common == 0 {
        return None;
    }

    let mut prefix = "../".repeat(from.len() - common);
    for component in &to[common..] {
        prefix.push_str(&component.as_os_str().to_string_lossy());
        prefix.push('/');
    }
    Some(prefix)
}

/// Components with `.` dropped and `..` applied lexically
fn normalize(path: &Path) -> Vec<Component<'_>> {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(components.last(), Some(Component::Normal(_))) {
                    components.pop();
                }
            }
            other => components.push(other),
        }
    }
    components
}
