//! Fluent query builder over an [`Entity`].

use super::visitor::ExpressionVisitor;
use super::{Entity, Expr, Lambda, Predicate};
use crate::config::Dialect;
use crate::error::Result;
use crate::render;
use crate::statement::{OrderByItem, SelectStatement, SortDirection, TableInfo, WhereCondition};
use std::marker::PhantomData;
use tracing::debug;

/// One recorded call of the fluent chain
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOp {
    Where(Lambda),
    Select(Vec<Lambda>),
    OrderBy(Lambda),
    OrderByDescending(Lambda),
    ThenBy(Lambda),
    ThenByDescending(Lambda),
    Take(u64),
    Skip(u64),
    Distinct,
    GroupBy(Vec<Lambda>),
}

/// Query over the table of `T`, recorded as a chain of [`QueryOp`]s.
pub struct Query<T> {
    ops: Vec<QueryOp>,
    _entity: PhantomData<fn(&T)>,
}

impl<T: Entity> Default for Query<T> {
    fn default() -> Self {
        Self::new()
    }
}

const KEY_PARAMETER: &str = "x";

impl<T: Entity> Query<T> {
    pub fn new() -> Self {
        Self {
            ops: Vec::new(),
            _entity: PhantomData,
        }
    }

    fn push(mut self, op: QueryOp) -> Self {
        self.ops.push(op);
        self
    }

    fn key(build: impl FnOnce(Expr) -> Expr) -> Lambda {
        Lambda::new(KEY_PARAMETER, build)
    }

    pub fn filter(self, predicate: Predicate<T>) -> Self {
        self.push(QueryOp::Where(predicate.into_lambda()))
    }

    /// Projection; each closure receives the row parameter
    pub fn select<F>(self, columns: impl IntoIterator<Item = F>) -> Self
    where
        F: FnOnce(Expr) -> Expr,
    {
        let columns = columns.into_iter().map(Self::key).collect();
        self.push(QueryOp::Select(columns))
    }

    pub fn order_by(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.push(QueryOp::OrderBy(Self::key(key)))
    }

    pub fn order_by_descending(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.push(QueryOp::OrderByDescending(Self::key(key)))
    }

    pub fn then_by(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.push(QueryOp::ThenBy(Self::key(key)))
    }

    pub fn then_by_descending(self, key: impl FnOnce(Expr) -> Expr) -> Self {
        self.push(QueryOp::ThenByDescending(Self::key(key)))
    }

    pub fn take(self, count: u64) -> Self {
        self.push(QueryOp::Take(count))
    }

    pub fn skip(self, count: u64) -> Self {
        self.push(QueryOp::Skip(count))
    }

    pub fn distinct(self) -> Self {
        self.push(QueryOp::Distinct)
    }

    pub fn group_by<F>(self, keys: impl IntoIterator<Item = F>) -> Self
    where
        F: FnOnce(Expr) -> Expr,
    {
        let keys = keys.into_iter().map(Self::key).collect();
        self.push(QueryOp::GroupBy(keys))
    }

    pub fn ops(&self) -> &[QueryOp] {
        &self.ops
    }

    /// Walk the recorded chain into a statement.
    ///
    /// Several `Where`s are ANDed. `OrderBy` restarts the ordering while
    /// `ThenBy` extends it.
    pub fn to_statement(&self) -> Result<SelectStatement> {
        let visitor = ExpressionVisitor;
        let mut builder = SelectStatement::builder();
        builder.base_table(TableInfo::new(T::table_name()));

        let mut ordering: Vec<OrderByItem> = Vec::new();
        let mut distinct = false;
        let mut projection = Vec::new();

        for op in &self.ops {
            match op {
                QueryOp::Where(lambda) => {
                    let sql = visitor.predicate(lambda)?;
                    if builder.has_where_conditions() {
                        builder.where_condition(WhereCondition::and());
                    }
                    if is_top_level_or(&lambda.body) {
                        builder
                            .where_condition(WhereCondition::open())
                            .where_condition(WhereCondition::expression(sql))
                            .where_condition(WhereCondition::close());
                    } else {
                        builder.where_condition(WhereCondition::expression(sql));
                    }
                }
                QueryOp::Select(columns) => {
                    projection = columns
                        .iter()
                        .map(|c| visitor.column(c))
                        .collect::<Result<Vec<_>>>()?;
                }
                QueryOp::OrderBy(key) | QueryOp::OrderByDescending(key) => {
                    ordering.clear();
                    ordering.push(OrderByItem::new(visitor.sort_key(key)?, direction_of(op)));
                }
                QueryOp::ThenBy(key) | QueryOp::ThenByDescending(key) => {
                    ordering.push(OrderByItem::new(visitor.sort_key(key)?, direction_of(op)));
                }
                QueryOp::Take(count) => {
                    builder.limit(count.to_string());
                }
                QueryOp::Skip(count) => {
                    builder.offset(count.to_string());
                }
                QueryOp::Distinct => distinct = true,
                QueryOp::GroupBy(keys) => {
                    for key in keys {
                        builder.group_by(visitor.column(key)?);
                    }
                }
            }
        }

        builder.select_list(projection).distinct(distinct);
        for item in ordering {
            builder.order_by(item);
        }

        debug!(table = T::table_name(), ops = self.ops.len(), "Translated expression query");
        Ok(builder.build())
    }

    pub fn to_sql(&self, dialect: Dialect) -> Result<String> {
        let statement = self.to_statement()?;
        Ok(render::render_statement(&statement, dialect))
    }
}

fn direction_of(op: &QueryOp) -> SortDirection {
    match op {
        QueryOp::OrderByDescending(_) | QueryOp::ThenByDescending(_) => SortDirection::Desc,
        _ => SortDirection::Asc,
    }
}

fn is_top_level_or(expr: &Expr) -> bool {
    matches!(
        expr,
        Expr::Binary {
            op: super::BinaryOperator::OrElse,
            left,
            right,
        } if left.as_bool_constant().is_none() || right.as_bool_constant().is_none()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use insta::assert_snapshot;

    struct Product;
    impl Entity for Product {
        fn table_name() -> &'static str {
            "products"
        }
    }

    #[test]
    fn test_full_chain_sqlite() {
        let sql = Query::<Product>::new()
            .filter(Predicate::lambda("p", |p| p.member("Price").gt(10)))
            .filter(Predicate::lambda("p", |p| p.member("Name").starts_with("Pro")))
            .select([|p: Expr| p.member("Id"), |p: Expr| p.member("Name")])
            .order_by_descending(|p| p.member("Price"))
            .then_by(|p| p.member("Name"))
            .skip(5)
            .take(10)
            .to_sql(Dialect::Sqlite)
            .unwrap();
        assert_snapshot!(sql, @"SELECT Id, Name FROM products WHERE Price > 10 AND Name LIKE 'Pro%' ORDER BY Price DESC, Name ASC LIMIT 10 OFFSET 5");
    }

    #[test]
    fn test_or_predicate_is_wrapped_when_combined() {
        let either = Predicate::<Product>::lambda("p", |p| p.member("Id").eq(1))
            .or(Predicate::lambda("q", |q| q.member("Id").eq(2)));
        let sql = Query::<Product>::new()
            .filter(Predicate::lambda("p", |p| p.member("Active").eq(true)))
            .filter(either)
            .to_sql(Dialect::PostgreSql)
            .unwrap();
        assert_snapshot!(sql, @"SELECT * FROM products WHERE Active = 1 AND ((Id = 1) OR (Id = 2))");
    }

    #[test]
    fn test_order_by_restarts_ordering() {
        let stmt = Query::<Product>::new()
            .order_by(|p| p.member("Name"))
            .order_by(|p| p.member("Price"))
            .to_statement()
            .unwrap();
        assert_eq!(
            stmt.order_by_items(),
            &[OrderByItem::new("Price", SortDirection::Asc)]
        );
    }

    #[test]
    fn test_distinct_take_on_sql_server() {
        let sql = Query::<Product>::new()
            .select([|p: Expr| p.member("Category")])
            .distinct()
            .take(3)
            .to_sql(Dialect::SqlServer)
            .unwrap();
        assert_snapshot!(sql, @"SELECT DISTINCT TOP 3 Category FROM products");
    }

    #[test]
    fn test_group_by() {
        let stmt = Query::<Product>::new()
            .group_by([|p: Expr| p.member("Category")])
            .to_statement()
            .unwrap();
        assert_eq!(stmt.group_by_columns().len(), 1);
    }
}
