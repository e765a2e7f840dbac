//! Configuration schema (sqlgen.toml)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the template directory when no config path is given
pub const CONFIG_FILE_NAME: &str = "sqlgen.toml";

/// SQL dialect the generated queries are executed against
///
/// Only the placeholder syntax depends on it; SQL text is never parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectConfig {
    /// SQLite (`?` placeholders)
    Sqlite,

    /// MySQL / MariaDB (`?` placeholders)
    Mysql,

    /// PostgreSQL (`$1`, `$2`, ... placeholders)
    Postgres,

    /// Generic driver with `?` placeholders
    #[default]
    Ansi,
}

impl DialectConfig {
    /// Whether placeholders are numbered (`$n`) rather than positional (`?`)
    pub fn uses_numbered_placeholders(&self) -> bool {
        matches!(self, Self::Postgres)
    }

    /// Parse a dialect name as accepted on the command line
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sqlite" => Some(Self::Sqlite),
            "mysql" | "mariadb" => Some(Self::Mysql),
            "postgres" | "postgresql" => Some(Self::Postgres),
            "ansi" => Some(Self::Ansi),
            _ => None,
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// SQL dialect
    #[serde(default)]
    pub dialect: DialectConfig,

    /// Generated file name, relative to the template directory
    #[serde(default = "default_output")]
    pub output: PathBuf,

    /// Suffix appended to every generated record name
    #[serde(default = "default_struct_suffix")]
    pub struct_suffix: String,

    /// Crate path generated code imports the runtime from
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,

    /// Report unknown directive keywords as warnings
    #[serde(default = "default_true")]
    pub warn_unknown_directives: bool,

    /// Directory the config was loaded from
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_output() -> PathBuf {
    PathBuf::from("query_elements_gen.rs")
}

fn default_struct_suffix() -> String {
    "QueryElem".to_string()
}

fn default_runtime_crate() -> String {
    "sqlgen_template".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dialect: DialectConfig::default(),
            output: default_output(),
            struct_suffix: default_struct_suffix(),
            runtime_crate: default_runtime_crate(),
            warn_unknown_directives: true,
            project_root: PathBuf::new(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

        let mut config = Self::from_toml(&contents)?;

        // Set project root to parent of config file
        if let Some(parent) = path.parent() {
            config.project_root = parent.to_path_buf();
        }

        Ok(config)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))
    }

    /// Load `sqlgen.toml` from a template directory, or defaults if absent
    pub fn for_dir(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE_NAME);
        if path.is_file() {
            return Self::from_file(&path);
        }

        Ok(Self {
            project_root: dir.to_path_buf(),
            ..Self::default()
        })
    }

    /// Absolute location of the generated file
    pub fn output_path(&self) -> PathBuf {
        if self.output.is_absolute() {
            self.output.clone()
        } else {
            self.project_root.join(&self.output)
        }
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.dialect, DialectConfig::Ansi);
        assert_eq!(config.output, PathBuf::from("query_elements_gen.rs"));
        assert_eq!(config.struct_suffix, "QueryElem");
        assert!(config.warn_unknown_directives);
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_toml() {
        let config = Config::from_toml(
            r#"
            dialect = "postgres"
            struct_suffix = "Query"
            "#,
        )
        .unwrap();

        assert_eq!(config.dialect, DialectConfig::Postgres);
        assert_eq!(config.struct_suffix, "Query");
        assert_eq!(config.runtime_crate, "sqlgen_template");
    }

    #[test]
    fn invalid_dialect_is_parse_error() {
        let err = Config::from_toml(r#"dialect = "oracle""#).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError(_)));
    }

    #[test]
    fn dialect_names() {
        assert_eq!(DialectConfig::from_name("PostgreSQL"), Some(DialectConfig::Postgres));
        assert_eq!(DialectConfig::from_name("mariadb"), Some(DialectConfig::Mysql));
        assert_eq!(DialectConfig::from_name("db2"), None);
        assert!(DialectConfig::Postgres.uses_numbered_placeholders());
        assert!(!DialectConfig::Sqlite.uses_numbered_placeholders());
    }

    #[test]
    fn for_dir_reads_config_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "output = \"gen/queries.rs\"\n").unwrap();

        let config = Config::for_dir(dir.path()).unwrap();
        assert_eq!(config.project_root, dir.path().to_path_buf());
        assert_eq!(config.output_path(), dir.path().join("gen/queries.rs"));
    }

    #[test]
    fn for_dir_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::for_dir(dir.path()).unwrap();
        assert_eq!(config.output_path(), dir.path().join("query_elements_gen.rs"));
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml).unwrap();
        assert_eq!(config.dialect, parsed.dialect);
        assert_eq!(config.output, parsed.output);
    }
}
