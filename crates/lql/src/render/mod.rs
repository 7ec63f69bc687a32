//! Dialect renderers.
//!
//! The pipeline processor drives a [`SqlContext`] (an accumulator over a
//! [`SelectStatementBuilder`]); rendering turns the accumulated
//! [`SelectStatement`] into SQL text through a [`SqlDialect`].
//!
//! Rendering never fails. Constructs that cannot be resolved produce an
//! inline `/*UNKNOWN_...*/` marker and a warning instead.

mod postgres;
mod sqlite;
mod sqlserver;

pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use crate::config::Dialect;
use crate::statement::{
    is_balanced, ColumnInfo, InsertTarget, JoinRelationship, OrderByItem, ParameterInfo,
    SelectStatement, SelectStatementBuilder, TableInfo, UnionOperation, WhereCondition,
};
use once_cell::sync::Lazy;
use std::collections::HashMap;
use tracing::warn;

/// Marker for a statement with no FROM table
pub const UNKNOWN_TABLE: &str = "/*UNKNOWN_TABLE*/";
/// Marker for an INSERT whose column list could not be determined
pub const UNKNOWN_COLUMNS: &str = "/*UNKNOWN_COLUMNS*/";

/// Hard-coded INSERT column guesses, used only when neither explicit
/// columns nor a projection are available.
static GUESSED_INSERT_COLUMNS: Lazy<HashMap<&'static str, &'static [&'static str]>> =
    Lazy::new(|| {
        HashMap::from([
            ("users", &["id", "name", "email"][..]),
            ("customers", &["id", "name", "email"][..]),
            ("orders", &["id", "user_id", "total", "status"][..]),
            ("products", &["id", "name", "price"][..]),
            ("employees", &["id", "name", "salary"][..]),
        ])
    });

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub insert_column_guesses: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            insert_column_guesses: true,
        }
    }
}

/// Accumulator contract consumed by the pipeline processor.
pub trait SqlContext {
    fn set_base_table(&mut self, table: TableInfo);
    fn add_join(&mut self, table: TableInfo, relationship: JoinRelationship);
    fn set_projection(&mut self, columns: Vec<ColumnInfo>, distinct: bool);
    fn add_where_condition(&mut self, condition: WhereCondition);
    fn has_where_conditions(&self) -> bool;
    fn add_group_by(&mut self, column: ColumnInfo);
    fn add_order_by(&mut self, item: OrderByItem);
    fn set_having(&mut self, condition: String);
    fn set_limit(&mut self, count: String);
    fn set_offset(&mut self, count: String);
    fn add_union(&mut self, union: UnionOperation);
    fn set_insert(&mut self, target: InsertTarget);
    fn add_parameter(&mut self, parameter: ParameterInfo);

    /// Statement accumulated so far
    fn statement(&self) -> SelectStatement;

    /// Final SQL text
    fn render(&self) -> String;
}

/// [`SqlContext`] backed by a statement builder and one dialect.
pub struct DialectContext<D: SqlDialect> {
    builder: SelectStatementBuilder,
    dialect: D,
    options: RenderOptions,
}

impl<D: SqlDialect> DialectContext<D> {
    pub fn new(dialect: D, options: RenderOptions) -> Self {
        Self {
            builder: SelectStatementBuilder::new(),
            dialect,
            options,
        }
    }
}

impl<D: SqlDialect> SqlContext for DialectContext<D> {
    fn set_base_table(&mut self, table: TableInfo) {
        self.builder.base_table(table);
    }

    fn add_join(&mut self, table: TableInfo, relationship: JoinRelationship) {
        self.builder.join(table, relationship);
    }

    fn set_projection(&mut self, columns: Vec<ColumnInfo>, distinct: bool) {
        self.builder.select_list(columns).distinct(distinct);
    }

    fn add_where_condition(&mut self, condition: WhereCondition) {
        self.builder.where_condition(condition);
    }

    fn has_where_conditions(&self) -> bool {
        self.builder.has_where_conditions()
    }

    fn add_group_by(&mut self, column: ColumnInfo) {
        self.builder.group_by(column);
    }

    fn add_order_by(&mut self, item: OrderByItem) {
        self.builder.order_by(item);
    }

    fn set_having(&mut self, condition: String) {
        self.builder.having(condition);
    }

    fn set_limit(&mut self, count: String) {
        self.builder.limit(count);
    }

    fn set_offset(&mut self, count: String) {
        self.builder.offset(count);
    }

    fn add_union(&mut self, union: UnionOperation) {
        self.builder.union(union);
    }

    fn set_insert(&mut self, target: InsertTarget) {
        self.builder.insert_into(target);
    }

    fn add_parameter(&mut self, parameter: ParameterInfo) {
        self.builder.parameter(parameter);
    }

    fn statement(&self) -> SelectStatement {
        self.builder.snapshot()
    }

    fn render(&self) -> String {
        self.dialect.render(&self.builder.snapshot(), &self.options)
    }
}

/// Create an accumulator for `dialect`
pub fn context_for(dialect: Dialect, options: RenderOptions) -> Box<dyn SqlContext> {
    match dialect {
        Dialect::Sqlite => Box::new(DialectContext::new(SqliteDialect, options)),
        Dialect::PostgreSql => Box::new(DialectContext::new(PostgresDialect, options)),
        Dialect::SqlServer => Box::new(DialectContext::new(SqlServerDialect, options)),
    }
}

/// Render an already-built statement
pub fn render_statement(statement: &SelectStatement, dialect: Dialect) -> String {
    let options = RenderOptions::default();
    match dialect {
        Dialect::Sqlite => SqliteDialect.render(statement, &options),
        Dialect::PostgreSql => PostgresDialect.render(statement, &options),
        Dialect::SqlServer => SqlServerDialect.render(statement, &options),
    }
}

/// Clause-level rendering rules for one SQL flavor.
///
/// Defaults produce ANSI-style SQL. Dialects override only the clauses
/// that differ.
pub trait SqlDialect: Send + Sync {
    fn dialect(&self) -> Dialect;

    /// Dialect-specific spelling of an upper-case SQL function name
    fn rename_function(&self, _name: &str) -> Option<&'static str> {
        None
    }

    /// String concatenation operator
    fn concat_operator(&self) -> &'static str {
        "||"
    }

    /// Apply function renames and the concat operator to expression text
    fn translate(&self, text: &str) -> String {
        translate_expression(text, |name| self.rename_function(name), self.concat_operator())
    }

    fn column_sql(&self, column: &ColumnInfo, options: &RenderOptions) -> String {
        let (body, alias) = match column {
            ColumnInfo::Named { name, table, alias } => (
                match table {
                    Some(table) => format!("{}.{}", table, name),
                    None => name.clone(),
                },
                alias,
            ),
            ColumnInfo::Expression { expression, alias } => (self.translate(expression), alias),
            ColumnInfo::Wildcard { table } => {
                return match table {
                    Some(table) => format!("{}.*", table),
                    None => "*".to_string(),
                }
            }
            ColumnInfo::SubQuery { query, alias } => {
                (format!("({})", self.render(query, options)), alias)
            }
        };
        match alias {
            Some(alias) => format!("{} AS {}", body, alias),
            None => body,
        }
    }

    /// `SELECT [DISTINCT] columns`
    fn select_clause(&self, statement: &SelectStatement, options: &RenderOptions) -> String {
        let distinct = if statement.is_distinct() { "DISTINCT " } else { "" };
        format!("SELECT {}{}", distinct, self.select_list(statement, options))
    }

    fn select_list(&self, statement: &SelectStatement, options: &RenderOptions) -> String {
        if statement.select_list().is_empty() {
            return "*".to_string();
        }
        statement
            .select_list()
            .iter()
            .map(|c| self.column_sql(c, options))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn from_clause(&self, statement: &SelectStatement) -> String {
        let mut tables = statement.tables().iter();
        let Some(base) = tables.next() else {
            warn!("Statement has no base table");
            return format!("FROM {}", UNKNOWN_TABLE);
        };

        let mut sql = format!("FROM {}", table_sql(base));
        for table in tables {
            let relationship = statement.join_graph().find_by_right_table(&table.name);
            let join_type = match relationship {
                Some(rel) => normalize_join_type(&rel.join_type),
                None => {
                    warn!(table = %table.name, "No join relationship found, defaulting to INNER");
                    "INNER JOIN".to_string()
                }
            };
            sql.push_str(&format!(" {} {}", join_type, table_sql(table)));
            if let Some(condition) = relationship.and_then(|r| r.condition.as_deref()) {
                sql.push_str(&format!(" ON {}", self.translate(condition)));
            }
        }
        sql
    }

    fn where_clause(&self, statement: &SelectStatement) -> Option<String> {
        let conditions = statement.where_conditions();
        if conditions.is_empty() {
            return None;
        }
        debug_assert!(is_balanced(conditions), "unbalanced WHERE parentheses");
        let tokens = conditions
            .iter()
            .map(|c| self.condition_sql(c))
            .collect::<Vec<_>>();
        Some(format!("WHERE {}", join_where_tokens(&tokens)))
    }

    fn condition_sql(&self, condition: &WhereCondition) -> String {
        match condition {
            WhereCondition::Comparison {
                left,
                operator,
                right,
            } => {
                let left = match left {
                    ColumnInfo::Named {
                        name,
                        table: Some(table),
                        ..
                    } => format!("{}.{}", table, name),
                    ColumnInfo::Named { name, .. } => name.clone(),
                    ColumnInfo::Expression { expression, .. } => self.translate(expression),
                    other => self.column_sql(other, &RenderOptions::default()),
                };
                if operator.is_unary() {
                    format!("{} {}", left, operator.as_sql())
                } else {
                    format!("{} {} {}", left, operator.as_sql(), self.translate(right))
                }
            }
            WhereCondition::Logical { operator } => operator.as_sql().to_string(),
            WhereCondition::Parenthesis { is_opening: true } => "(".to_string(),
            WhereCondition::Parenthesis { is_opening: false } => ")".to_string(),
            WhereCondition::Expression { text } => self.translate(text),
        }
    }

    fn group_by_clause(&self, statement: &SelectStatement, options: &RenderOptions) -> Option<String> {
        let columns = statement.group_by_columns();
        if columns.is_empty() {
            return None;
        }
        let cols = columns
            .iter()
            .map(|c| self.column_sql(c, options))
            .collect::<Vec<_>>();
        Some(format!("GROUP BY {}", cols.join(", ")))
    }

    fn having_clause(&self, statement: &SelectStatement) -> Option<String> {
        statement
            .having_condition()
            .map(|h| format!("HAVING {}", self.translate(h)))
    }

    fn union_clause(&self, statement: &SelectStatement) -> Option<String> {
        if statement.unions().is_empty() {
            return None;
        }
        let parts = statement
            .unions()
            .iter()
            .map(|u| {
                let keyword = if u.is_union_all { "UNION ALL" } else { "UNION" };
                format!("{} {}", keyword, u.query)
            })
            .collect::<Vec<_>>();
        Some(parts.join(" "))
    }

    fn order_by_clause(&self, statement: &SelectStatement) -> Option<String> {
        let items = statement.order_by_items();
        if items.is_empty() {
            return None;
        }
        let parts = items
            .iter()
            .map(|i| format!("{} {}", self.translate(&i.column), i.direction.as_sql()))
            .collect::<Vec<_>>();
        Some(format!("ORDER BY {}", parts.join(", ")))
    }

    /// Row limiting; `LIMIT n` and `OFFSET m` independently
    fn limit_clause(&self, statement: &SelectStatement) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(limit) = statement.limit() {
            parts.push(format!("LIMIT {}", limit));
        }
        if let Some(offset) = statement.offset() {
            parts.push(format!("OFFSET {}", offset));
        }
        (!parts.is_empty()).then(|| parts.join(" "))
    }

    /// SELECT body without any INSERT wrapper
    fn render_select(&self, statement: &SelectStatement, options: &RenderOptions) -> String {
        let clauses = [
            Some(self.select_clause(statement, options)),
            Some(self.from_clause(statement)),
            self.where_clause(statement),
            self.group_by_clause(statement, options),
            self.having_clause(statement),
            self.union_clause(statement),
            self.order_by_clause(statement),
            self.limit_clause(statement),
        ];
        clauses.into_iter().flatten().collect::<Vec<_>>().join(" ")
    }

    fn guessed_insert_columns(&self, table: &str) -> Option<&'static [&'static str]> {
        GUESSED_INSERT_COLUMNS
            .get(table.to_ascii_lowercase().as_str())
            .copied()
    }

    /// Column list for `INSERT INTO table (...)`
    fn insert_columns(
        &self,
        target: &InsertTarget,
        statement: &SelectStatement,
        options: &RenderOptions,
    ) -> String {
        if !target.columns.is_empty() {
            return target.columns.join(", ");
        }

        let projected: Option<Vec<&str>> = if statement.select_list().is_empty() {
            None
        } else {
            statement
                .select_list()
                .iter()
                .map(ColumnInfo::output_name)
                .collect()
        };
        if let Some(names) = projected {
            return names.join(", ");
        }

        if options.insert_column_guesses {
            if let Some(guess) = self.guessed_insert_columns(&target.table) {
                warn!(table = %target.table, "Using guessed INSERT column list");
                return guess.join(", ");
            }
        }

        warn!(table = %target.table, "Could not determine INSERT columns");
        UNKNOWN_COLUMNS.to_string()
    }

    fn wrap_insert(
        &self,
        target: &InsertTarget,
        columns: &str,
        _statement: &SelectStatement,
        select_sql: &str,
    ) -> String {
        format!("INSERT INTO {} ({})\n{}", target.table, columns, select_sql)
    }

    /// Full statement text, including the INSERT wrapper when present
    fn render(&self, statement: &SelectStatement, options: &RenderOptions) -> String {
        let select_sql = self.render_select(statement, options);
        match statement.insert_target() {
            Some(target) => {
                let columns = self.insert_columns(target, statement, options);
                self.wrap_insert(target, &columns, statement, &select_sql)
            }
            None => select_sql,
        }
    }
}

fn table_sql(table: &TableInfo) -> String {
    match &table.alias {
        Some(alias) => format!("{} {}", table.name, alias),
        None => table.name.clone(),
    }
}

/// `left` -> `LEFT JOIN`, `LEFT OUTER JOIN` stays as is
pub fn normalize_join_type(join_type: &str) -> String {
    let upper = join_type.trim().to_ascii_uppercase();
    if upper.is_empty() {
        "INNER JOIN".to_string()
    } else if upper.ends_with("JOIN") {
        upper
    } else {
        format!("{} JOIN", upper)
    }
}

/// Join rendered WHERE tokens with single spaces, except directly inside
/// parentheses.
pub fn join_where_tokens(tokens: &[String]) -> String {
    let mut out = String::new();
    let mut previous: Option<&str> = None;
    for token in tokens {
        if let Some(prev) = previous {
            if prev != "(" && token != ")" {
                out.push(' ');
            }
        }
        out.push_str(token);
        previous = Some(token.as_str());
    }
    out
}

/// SQL functions that are written without an argument list
const BARE_FUNCTIONS: &[&str] = &["CURRENT_TIMESTAMP", "CURRENT_DATE", "CURRENT_TIME"];

/// Rewrite function names and `||` outside of string literals.
pub fn translate_expression(
    text: &str,
    rename: impl Fn(&str) -> Option<&'static str>,
    concat_operator: &str,
) -> String {
    let mut out = String::with_capacity(text.len());
    let chars: Vec<char> = text.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '\'' {
            // Copy the literal verbatim, honouring '' escapes
            out.push(c);
            i += 1;
            while i < chars.len() {
                out.push(chars[i]);
                if chars[i] == '\'' {
                    if chars.get(i + 1) == Some(&'\'') {
                        out.push('\'');
                        i += 2;
                        continue;
                    }
                    i += 1;
                    break;
                }
                i += 1;
            }
        } else if c == '|' && chars.get(i + 1) == Some(&'|') {
            out.push_str(concat_operator);
            i += 2;
        } else if c.is_ascii_alphabetic() || c == '_' {
            let start = i;
            while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                i += 1;
            }
            let word: String = chars[start..i].iter().collect();
            let qualified = start > 0 && chars[start - 1] == '.';
            let is_call = chars.get(i) == Some(&'(');
            match rename(&word.to_ascii_uppercase()) {
                Some(renamed) if is_call && !qualified => {
                    out.push_str(renamed);
                    // CURRENT_TIMESTAMP() -> CURRENT_TIMESTAMP
                    if BARE_FUNCTIONS.contains(&renamed) && chars.get(i + 1) == Some(&')') {
                        i += 2;
                    }
                }
                _ => out.push_str(&word),
            }
        } else {
            out.push(c);
            i += 1;
        }
    }
    out
}
