//! SQL Server (T-SQL) dialect.
//!
//! Row limiting uses `SELECT TOP n` (or `TOP (@p)` for a parameter) when
//! there is no offset. With an offset it switches to
//! `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`, which T-SQL only accepts
//! after an ORDER BY, so `ORDER BY (SELECT NULL)` is added when the query
//! is unordered.

use super::{RenderOptions, SqlDialect};
use crate::config::Dialect;
use crate::statement::SelectStatement;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static FUNCTION_RENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("LENGTH", "LEN"),
        ("NOW", "GETDATE"),
        ("IFNULL", "ISNULL"),
        ("SUBSTR", "SUBSTRING"),
        ("CEIL", "CEILING"),
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct SqlServerDialect;

impl SqlDialect for SqlServerDialect {
    fn dialect(&self) -> Dialect {
        Dialect::SqlServer
    }

    fn rename_function(&self, name: &str) -> Option<&'static str> {
        FUNCTION_RENAMES.get(name).copied()
    }

    fn concat_operator(&self) -> &'static str {
        "+"
    }

    fn select_clause(&self, statement: &SelectStatement, options: &RenderOptions) -> String {
        let distinct = if statement.is_distinct() { "DISTINCT " } else { "" };
        let top = match (statement.limit(), statement.offset()) {
            (Some(limit), None) if limit.bytes().all(|b| b.is_ascii_digit()) => {
                format!("TOP {} ", limit)
            }
            // Non-constant TOP needs parentheses
            (Some(limit), None) => format!("TOP ({}) ", limit),
            _ => String::new(),
        };
        format!(
            "SELECT {}{}{}",
            distinct,
            top,
            self.select_list(statement, options)
        )
    }

    fn order_by_clause(&self, statement: &SelectStatement) -> Option<String> {
        let items = statement.order_by_items();
        if items.is_empty() {
            return statement
                .offset()
                .map(|_| "ORDER BY (SELECT NULL)".to_string());
        }
        let parts = items
            .iter()
            .map(|i| format!("{} {}", self.translate(&i.column), i.direction.as_sql()))
            .collect::<Vec<_>>();
        Some(format!("ORDER BY {}", parts.join(", ")))
    }

    fn limit_clause(&self, statement: &SelectStatement) -> Option<String> {
        let offset = statement.offset()?;
        let mut sql = format!("OFFSET {} ROWS", offset);
        if let Some(limit) = statement.limit() {
            sql.push_str(&format!(" FETCH NEXT {} ROWS ONLY", limit));
        }
        Some(sql)
    }
}
