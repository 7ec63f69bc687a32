//! Projection columns.

use super::SelectStatement;
use serde::{Deserialize, Serialize};

/// A column in a SELECT list, GROUP BY list or the left side of a comparison.
///
/// The variant set is closed; renderers match on it exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ColumnInfo {
    /// `[table.]name [AS alias]`
    Named {
        name: String,
        table: Option<String>,
        alias: Option<String>,
    },
    /// Pre-rendered SQL expression such as `COUNT(*)` or a CASE block
    Expression {
        expression: String,
        alias: Option<String>,
    },
    /// `*` or `table.*`
    Wildcard { table: Option<String> },
    /// Nested SELECT used as a column
    SubQuery {
        query: Box<SelectStatement>,
        alias: Option<String>,
    },
}

impl ColumnInfo {
    /// Unqualified column
    pub fn named(name: impl Into<String>) -> Self {
        ColumnInfo::Named {
            name: name.into(),
            table: None,
            alias: None,
        }
    }

    /// Column qualified with a table name or alias
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        ColumnInfo::Named {
            name: name.into(),
            table: Some(table.into()),
            alias: None,
        }
    }

    pub fn expression(expression: impl Into<String>) -> Self {
        ColumnInfo::Expression {
            expression: expression.into(),
            alias: None,
        }
    }

    pub fn wildcard() -> Self {
        ColumnInfo::Wildcard { table: None }
    }

    pub fn table_wildcard(table: impl Into<String>) -> Self {
        ColumnInfo::Wildcard {
            table: Some(table.into()),
        }
    }

    pub fn sub_query(query: SelectStatement) -> Self {
        ColumnInfo::SubQuery {
            query: Box::new(query),
            alias: None,
        }
    }

    /// Attach an alias. Wildcards cannot be aliased and are returned unchanged.
    pub fn with_alias(mut self, new_alias: impl Into<String>) -> Self {
        match &mut self {
            ColumnInfo::Named { alias, .. }
            | ColumnInfo::Expression { alias, .. }
            | ColumnInfo::SubQuery { alias, .. } => *alias = Some(new_alias.into()),
            ColumnInfo::Wildcard { .. } => {}
        }
        self
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            ColumnInfo::Named { alias, .. }
            | ColumnInfo::Expression { alias, .. }
            | ColumnInfo::SubQuery { alias, .. } => alias.as_deref(),
            ColumnInfo::Wildcard { .. } => None,
        }
    }

    /// Name of the column in the result set, when it can be known statically.
    ///
    /// Used to infer INSERT column lists from a paired projection.
    pub fn output_name(&self) -> Option<&str> {
        match self {
            ColumnInfo::Named { name, alias, .. } => Some(alias.as_deref().unwrap_or(name)),
            ColumnInfo::Expression { alias, .. } | ColumnInfo::SubQuery { alias, .. } => {
                alias.as_deref()
            }
            ColumnInfo::Wildcard { .. } => None,
        }
    }
}
