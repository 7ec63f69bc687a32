//! Compiler configuration.
//!
//! ```toml
//! default_dialect = "sqlite"
//! union_dialect = "postgresql"
//! run_prechecks = true
//! insert_column_guesses = false
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Target SQL flavor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[default]
    #[serde(alias = "postgres")]
    PostgreSql,
    #[serde(alias = "mssql")]
    SqlServer,
}

impl Dialect {
    pub const ALL: [Dialect; 3] = [Dialect::Sqlite, Dialect::PostgreSql, Dialect::SqlServer];

    pub fn as_str(self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::PostgreSql => "postgresql",
            Dialect::SqlServer => "sqlserver",
        }
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "postgresql" | "postgres" | "pg" => Ok(Dialect::PostgreSql),
            "sqlserver" | "mssql" | "tsql" => Ok(Dialect::SqlServer),
            other => Err(format!("Unknown SQL dialect: {}", other)),
        }
    }
}

/// Settings for [`crate::LqlCompiler`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LqlConfig {
    /// Dialect used by `compile_default`
    pub default_dialect: Dialect,

    /// Dialect used to pre-render `union`, `union_all`, `exists` and
    /// `in (...)` sub-pipelines while lowering. These are bound before the
    /// outer dialect is known.
    pub union_dialect: Dialect,

    /// Run the heuristic semantic checks before parsing
    pub run_prechecks: bool,

    /// Fall back to the built-in INSERT column table when neither explicit
    /// columns nor a projection are available
    pub insert_column_guesses: bool,
}

impl Default for LqlConfig {
    fn default() -> Self {
        Self {
            default_dialect: Dialect::PostgreSql,
            union_dialect: Dialect::PostgreSql,
            run_prechecks: true,
            insert_column_guesses: true,
        }
    }
}

impl LqlConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)?;
        debug!(path = %path.display(), dialect = %config.default_dialect, "Loaded LQL config");
        Ok(config)
    }
}
