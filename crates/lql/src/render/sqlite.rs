//! SQLite dialect.
//!
//! - `LIMIT n OFFSET m`, with `LIMIT -1` when only an offset is given
//! - `SUBSTRING` is spelled `SUBSTR`

use super::SqlDialect;
use crate::config::Dialect;
use crate::statement::SelectStatement;
use once_cell::sync::Lazy;
use std::collections::HashMap;

static FUNCTION_RENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("SUBSTRING", "SUBSTR"),
        ("CEILING", "CEIL"),
        ("NOW", "CURRENT_TIMESTAMP"),
    ])
});

#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteDialect;

impl SqlDialect for SqliteDialect {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    fn rename_function(&self, name: &str) -> Option<&'static str> {
        FUNCTION_RENAMES.get(name).copied()
    }

    fn limit_clause(&self, statement: &SelectStatement) -> Option<String> {
        match (statement.limit(), statement.offset()) {
            (Some(limit), Some(offset)) => Some(format!("LIMIT {} OFFSET {}", limit, offset)),
            (Some(limit), None) => Some(format!("LIMIT {}", limit)),
            (None, Some(offset)) => Some(format!("LIMIT -1 OFFSET {}", offset)),
            (None, None) => None,
        }
    }
}
