//! # LQL
//!
//! Compiler for LQL, a pipeline query language (`table |> op(...) |> op(...)`),
//! into SQL for SQLite, PostgreSQL and SQL Server.
//!
//! ## Stages
//!
//! - `syntax`: chumsky lexer, recursive-descent parser and semantic pre-checks
//! - `ast`: lowering into pipelines of typed steps
//! - `pipeline`: replays steps into a dialect accumulator
//! - `render`: per-dialect SQL generation
//! - `statement`: the dialect-agnostic `SelectStatement` model shared by all stages
//! - `expression`: builds the same model from typed expression trees
//!
//! ## Usage
//!
//! ```
//! use lql::{compile, Dialect};
//!
//! let query = compile("users |> select(users.id, users.name)", Dialect::Sqlite).unwrap();
//! assert_eq!(query.sql, "SELECT users.id, users.name FROM users");
//! ```

pub mod ast;
pub mod collaborator;
pub mod config;
pub mod error;
pub mod expression;
pub mod pipeline;
pub mod render;
pub mod statement;
pub mod syntax;

pub use ast::AstNode;
pub use config::{Dialect, LqlConfig};
pub use error::{ConfigError, LqlError, Result, SourceLocation};
pub use statement::{ParameterInfo, SelectStatement};

use render::RenderOptions;
use tracing::debug;

/// Outcome of parsing: an AST or the first error found, never both.
#[derive(Debug, Clone, PartialEq)]
pub struct LqlStatement {
    outcome: std::result::Result<AstNode, LqlError>,
}

impl LqlStatement {
    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn ast(&self) -> Option<&AstNode> {
        self.outcome.as_ref().ok()
    }

    pub fn error(&self) -> Option<&LqlError> {
        self.outcome.as_ref().err()
    }

    pub fn into_result(self) -> Result<AstNode> {
        self.outcome
    }
}

/// SQL text plus the metadata used to produce it
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub sql: String,
    pub dialect: Dialect,
    pub statement: SelectStatement,
    pub parameters: Vec<ParameterInfo>,
}

/// Compiler holding an [`LqlConfig`].
#[derive(Debug, Clone, Default)]
pub struct LqlCompiler {
    config: LqlConfig,
}

impl LqlCompiler {
    pub fn new(config: LqlConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LqlConfig {
        &self.config
    }

    /// Parse and lower `source` without rendering
    pub fn parse(&self, source: &str) -> LqlStatement {
        LqlStatement {
            outcome: self.lower(source),
        }
    }

    fn lower(&self, source: &str) -> Result<AstNode> {
        let program = syntax::parse_source(source, self.config.run_prechecks)?;
        ast::lower_program(source, &program, self.config.union_dialect)
    }

    /// Compile `source` to SQL for `dialect`
    pub fn compile(&self, source: &str, dialect: Dialect) -> Result<CompiledQuery> {
        let ast = self.lower(source)?;
        let options = RenderOptions {
            insert_column_guesses: self.config.insert_column_guesses,
        };
        let (sql, statement) = pipeline::render_ast(&ast, dialect, options);
        debug!(dialect = %dialect, parameters = ast.parameters.len(), "Compiled LQL query");

        Ok(CompiledQuery {
            sql,
            dialect,
            statement,
            parameters: ast.parameters,
        })
    }

    /// Compile with the configured default dialect
    pub fn compile_default(&self, source: &str) -> Result<CompiledQuery> {
        self.compile(source, self.config.default_dialect)
    }
}

/// Parse with the default configuration
pub fn parse(source: &str) -> LqlStatement {
    LqlCompiler::default().parse(source)
}

/// Compile with the default configuration
pub fn compile(source: &str, dialect: Dialect) -> Result<CompiledQuery> {
    LqlCompiler::default().compile(source, dialect)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_success_has_no_error() {
        let stmt = parse("users |> select(users.id)");
        assert!(stmt.is_ok());
        assert!(stmt.ast().is_some());
        assert!(stmt.error().is_none());
    }

    #[test]
    fn test_parse_failure_has_no_ast() {
        let stmt = parse("users |> select(");
        assert!(!stmt.is_ok());
        assert!(stmt.ast().is_none());
        assert!(matches!(stmt.error(), Some(LqlError::Syntax { .. })));
    }

    #[test]
    fn test_compile_default_uses_config_dialect() {
        let compiler = LqlCompiler::new(LqlConfig {
            default_dialect: Dialect::SqlServer,
            ..LqlConfig::default()
        });
        let query = compiler.compile_default("users |> limit(5)").unwrap();
        assert_eq!(query.dialect, Dialect::SqlServer);
        assert_eq!(query.sql, "SELECT TOP 5 * FROM users");
    }

    #[test]
    fn test_statement_carries_parameters() {
        let query = compile("users |> filter(fn(u) => u.users.id = @id)", Dialect::PostgreSql).unwrap();
        assert_eq!(query.parameters, vec![ParameterInfo::new("id", "TEXT")]);
        assert_eq!(query.statement.parameters(), query.parameters.as_slice());
    }
}
