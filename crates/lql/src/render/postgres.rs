//! PostgreSQL dialect.

use super::SqlDialect;
use crate::config::Dialect;
use crate::statement::{InsertTarget, SelectStatement};
use once_cell::sync::Lazy;
use std::collections::HashMap;

static FUNCTION_RENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("IFNULL", "COALESCE"),
        ("SUBSTR", "SUBSTRING"),
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresDialect;

impl SqlDialect for PostgresDialect {
    fn dialect(&self) -> Dialect {
        Dialect::PostgreSql
    }

    fn rename_function(&self, name: &str) -> Option<&'static str> {
        FUNCTION_RENAMES.get(name).copied()
    }

    /// A SELECT body with UNION branches is parenthesized
    fn wrap_insert(
        &self,
        target: &InsertTarget,
        columns: &str,
        statement: &SelectStatement,
        select_sql: &str,
    ) -> String {
        if !statement.unions().is_empty() {
            format!("INSERT INTO {} ({})\n({})", target.table, columns, select_sql)
        } else {
            format!("INSERT INTO {} ({})\n{}", target.table, columns, select_sql)
        }
    }
}
