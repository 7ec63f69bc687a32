//! Dialect-agnostic statement model.
//!
//! Both the LQL pipeline processor and the expression-tree translator
//! produce a [`SelectStatement`]; every dialect renderer consumes one.
//! Statements are assembled with [`SelectStatementBuilder`] and frozen on
//! [`SelectStatementBuilder::build`].

mod column;
mod condition;
mod join;

pub use column::ColumnInfo;
pub use condition::{
    has_top_level_or, is_balanced, ComparisonOperator, LogicalOperator, WhereCondition,
};
pub use join::{JoinGraph, JoinRelationship};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableInfo {
    pub name: String,
    pub alias: Option<String>,
}

impl TableInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            alias: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }
}

/// A bind parameter and its declared SQL type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterInfo {
    pub name: String,
    pub sql_type: String,
}

impl ParameterInfo {
    pub fn new(name: impl Into<String>, sql_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            sql_type: sql_type.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderByItem {
    /// Pre-rendered column or expression text
    pub column: String,
    pub direction: SortDirection,
}

impl OrderByItem {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }
}

/// A query appended with UNION / UNION ALL.
///
/// `query` is already-rendered SQL text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnionOperation {
    pub query: String,
    pub is_union_all: bool,
}

/// Target of an `INSERT INTO ... SELECT` wrapper.
///
/// An empty column list means "take the names from the projection".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertTarget {
    pub table: String,
    pub columns: Vec<String>,
}

/// Immutable SELECT statement.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SelectStatement {
    select_list: Vec<ColumnInfo>,
    tables: Vec<TableInfo>,
    parameters: Vec<ParameterInfo>,
    join_graph: JoinGraph,
    where_conditions: Vec<WhereCondition>,
    group_by_columns: Vec<ColumnInfo>,
    order_by_items: Vec<OrderByItem>,
    having_condition: Option<String>,
    limit: Option<String>,
    offset: Option<String>,
    is_distinct: bool,
    unions: Vec<UnionOperation>,
    insert_target: Option<InsertTarget>,
}

impl SelectStatement {
    pub fn builder() -> SelectStatementBuilder {
        SelectStatementBuilder::new()
    }

    pub fn select_list(&self) -> &[ColumnInfo] {
        &self.select_list
    }

    /// Base table first, then joined tables in join order
    pub fn tables(&self) -> &[TableInfo] {
        &self.tables
    }

    pub fn base_table(&self) -> Option<&TableInfo> {
        self.tables.first()
    }

    pub fn parameters(&self) -> &[ParameterInfo] {
        &self.parameters
    }

    pub fn join_graph(&self) -> &JoinGraph {
        &self.join_graph
    }

    pub fn where_conditions(&self) -> &[WhereCondition] {
        &self.where_conditions
    }

    pub fn group_by_columns(&self) -> &[ColumnInfo] {
        &self.group_by_columns
    }

    pub fn order_by_items(&self) -> &[OrderByItem] {
        &self.order_by_items
    }

    pub fn having_condition(&self) -> Option<&str> {
        self.having_condition.as_deref()
    }

    pub fn limit(&self) -> Option<&str> {
        self.limit.as_deref()
    }

    pub fn offset(&self) -> Option<&str> {
        self.offset.as_deref()
    }

    pub fn is_distinct(&self) -> bool {
        self.is_distinct
    }

    pub fn unions(&self) -> &[UnionOperation] {
        &self.unions
    }

    pub fn insert_target(&self) -> Option<&InsertTarget> {
        self.insert_target.as_ref()
    }
}

/// Accumulating builder for [`SelectStatement`].
#[derive(Debug, Clone, Default)]
pub struct SelectStatementBuilder {
    inner: SelectStatement,
}

impl SelectStatementBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or replace) the FROM table
    pub fn base_table(&mut self, table: TableInfo) -> &mut Self {
        if self.inner.tables.is_empty() {
            self.inner.tables.push(table);
        } else {
            self.inner.tables[0] = table;
        }
        self
    }

    pub fn has_base_table(&self) -> bool {
        !self.inner.tables.is_empty()
    }

    /// Register a joined table together with its relationship
    pub fn join(&mut self, table: TableInfo, relationship: JoinRelationship) -> &mut Self {
        self.inner.tables.push(table);
        self.inner.join_graph.add(relationship);
        self
    }

    pub fn select_list(&mut self, columns: Vec<ColumnInfo>) -> &mut Self {
        self.inner.select_list = columns;
        self
    }

    pub fn distinct(&mut self, distinct: bool) -> &mut Self {
        self.inner.is_distinct = distinct;
        self
    }

    pub fn where_condition(&mut self, condition: WhereCondition) -> &mut Self {
        self.inner.where_conditions.push(condition);
        self
    }

    pub fn has_where_conditions(&self) -> bool {
        !self.inner.where_conditions.is_empty()
    }

    pub fn group_by(&mut self, column: ColumnInfo) -> &mut Self {
        self.inner.group_by_columns.push(column);
        self
    }

    pub fn order_by(&mut self, item: OrderByItem) -> &mut Self {
        self.inner.order_by_items.push(item);
        self
    }

    pub fn having(&mut self, condition: impl Into<String>) -> &mut Self {
        self.inner.having_condition = Some(condition.into());
        self
    }

    pub fn limit(&mut self, limit: impl Into<String>) -> &mut Self {
        self.inner.limit = Some(limit.into());
        self
    }

    pub fn offset(&mut self, offset: impl Into<String>) -> &mut Self {
        self.inner.offset = Some(offset.into());
        self
    }

    pub fn union(&mut self, union: UnionOperation) -> &mut Self {
        self.inner.unions.push(union);
        self
    }

    pub fn insert_into(&mut self, target: InsertTarget) -> &mut Self {
        self.inner.insert_target = Some(target);
        self
    }

    /// Add a parameter; a second parameter with the same name is ignored
    pub fn parameter(&mut self, parameter: ParameterInfo) -> &mut Self {
        if !self
            .inner
            .parameters
            .iter()
            .any(|p| p.name == parameter.name)
        {
            self.inner.parameters.push(parameter);
        }
        self
    }

    /// Snapshot of the statement built so far
    pub fn snapshot(&self) -> SelectStatement {
        self.inner.clone()
    }

    pub fn build(self) -> SelectStatement {
        self.inner
    }
}
