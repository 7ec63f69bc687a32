//! Pipeline processor.
//!
//! Replays the steps of a [`Pipeline`] in source order into one
//! [`SqlContext`]. The processor knows nothing about dialects; it only maps
//! step variants onto accumulator calls.

use crate::ast::{AstNode, Node, Pipeline, StepKind};
use crate::config::Dialect;
use crate::render::{self, RenderOptions, SqlContext};
use crate::statement::{InsertTarget, SelectStatement, TableInfo, UnionOperation, WhereCondition};
use tracing::{debug, trace};

/// Feed a node into `context`.
///
/// A bare identifier becomes the base table. Nested pipelines are flattened
/// into the same context.
pub fn process_node(node: &Node, context: &mut dyn SqlContext) {
    match node {
        Node::Identifier(name) => context.set_base_table(TableInfo::new(name.clone())),
        Node::Pipeline(pipeline) => process(pipeline, context),
    }
}

/// Replay every step of `pipeline` into `context`
pub fn process(pipeline: &Pipeline, context: &mut dyn SqlContext) {
    for step in pipeline.steps() {
        trace!(
            step = step.kind.name(),
            base = pipeline.base_of(step).map(|base| base.kind.name()),
            "Processing pipeline step"
        );
        match &step.kind {
            StepKind::Identity { source } => process_node(source, context),
            StepKind::Join {
                table,
                relationship,
            } => context.add_join(table.clone(), relationship.clone()),
            StepKind::Filter { conditions } => {
                if context.has_where_conditions() {
                    context.add_where_condition(WhereCondition::and());
                }
                for condition in conditions {
                    context.add_where_condition(condition.clone());
                }
            }
            StepKind::Select { columns } => context.set_projection(columns.clone(), false),
            StepKind::SelectDistinct { columns } => context.set_projection(columns.clone(), true),
            StepKind::GroupBy { columns } => {
                for column in columns {
                    context.add_group_by(column.clone());
                }
            }
            StepKind::OrderBy { items } => {
                for item in items {
                    context.add_order_by(item.clone());
                }
            }
            StepKind::Having { condition } => context.set_having(condition.clone()),
            StepKind::Limit { count } => context.set_limit(count.clone()),
            StepKind::Offset { count } => context.set_offset(count.clone()),
            StepKind::Union { query } => context.add_union(UnionOperation {
                query: query.clone(),
                is_union_all: false,
            }),
            StepKind::UnionAll { query } => context.add_union(UnionOperation {
                query: query.clone(),
                is_union_all: true,
            }),
            StepKind::Insert { table, columns } => context.set_insert(InsertTarget {
                table: table.clone(),
                columns: columns.clone(),
            }),
        }
    }
}

/// Render a node with default options. Used for nested queries.
pub fn render_node(node: &Node, dialect: Dialect) -> String {
    let mut context = render::context_for(dialect, RenderOptions::default());
    process_node(node, context.as_mut());
    context.render()
}

/// Render a lowered program, returning the SQL and the statement behind it
pub fn render_ast(ast: &AstNode, dialect: Dialect, options: RenderOptions) -> (String, SelectStatement) {
    let mut context = render::context_for(dialect, options);
    process_node(&ast.root, context.as_mut());
    for parameter in &ast.parameters {
        context.add_parameter(parameter.clone());
    }

    let sql = context.render();
    debug!(dialect = %dialect, sql_len = sql.len(), "Rendered SQL");
    (sql, context.statement())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::{ColumnInfo, ComparisonOperator, JoinRelationship, OrderByItem, SortDirection};

    fn identity(name: &str) -> StepKind {
        StepKind::Identity {
            source: Box::new(Node::Identifier(name.to_string())),
        }
    }

    fn filter(column: &str, value: &str) -> StepKind {
        StepKind::Filter {
            conditions: vec![WhereCondition::comparison(
                ColumnInfo::qualified("t", column),
                ComparisonOperator::Eq,
                value,
            )],
        }
    }

    #[test]
    fn test_bare_identifier_selects_everything() {
        let sql = render_node(&Node::Identifier("users".to_string()), Dialect::Sqlite);
        assert_eq!(sql, "SELECT * FROM users");
    }

    #[test]
    fn test_consecutive_filters_are_anded() {
        let mut pipeline = Pipeline::new();
        pipeline.push(identity("t"));
        pipeline.push(filter("a", "1"));
        pipeline.push(filter("b", "2"));

        let sql = render_node(&Node::Pipeline(pipeline), Dialect::PostgreSql);
        assert_eq!(sql, "SELECT * FROM t WHERE t.a = 1 AND t.b = 2");
    }

    #[test]
    fn test_nested_pipeline_is_flattened() {
        let mut inner = Pipeline::new();
        inner.push(identity("t"));
        inner.push(filter("a", "1"));

        let mut outer = Pipeline::new();
        outer.push(StepKind::Identity {
            source: Box::new(Node::Pipeline(inner)),
        });
        outer.push(filter("b", "2"));
        outer.push(StepKind::OrderBy {
            items: vec![OrderByItem::new("t.a", SortDirection::Desc)],
        });

        let sql = render_node(&Node::Pipeline(outer), Dialect::PostgreSql);
        assert_eq!(sql, "SELECT * FROM t WHERE t.a = 1 AND t.b = 2 ORDER BY t.a DESC");
    }

    #[test]
    fn test_steps_replay_in_source_order() {
        let mut pipeline = Pipeline::new();
        pipeline.push(identity("a"));
        pipeline.push(StepKind::Join {
            table: TableInfo::new("b"),
            relationship: JoinRelationship::new("a", "b", Some("a.id = b.a_id".to_string()), "LEFT"),
        });
        pipeline.push(StepKind::Select {
            columns: vec![ColumnInfo::qualified("a", "id"), ColumnInfo::qualified("b", "v")],
        });
        pipeline.push(StepKind::Limit {
            count: "3".to_string(),
        });

        let sql = render_node(&Node::Pipeline(pipeline), Dialect::Sqlite);
        assert_eq!(
            sql,
            "SELECT a.id, b.v FROM a LEFT JOIN b ON a.id = b.a_id LIMIT 3"
        );
    }
}
