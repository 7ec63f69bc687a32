//! Lowering from syntax tree to [`Node`]s.

use super::{AstNode, Node, Pipeline, StepKind};
use crate::config::Dialect;
use crate::error::{LqlError, Result, SourceLocation};
use crate::pipeline;
use crate::statement::{
    has_top_level_or, ColumnInfo, ComparisonOperator, JoinRelationship, OrderByItem,
    ParameterInfo, SortDirection, TableInfo, WhereCondition,
};
use crate::syntax::lexer::Span;
use crate::syntax::tree::{
    BinaryOp, Call, Direction, Expr, ExprKind, PipeExpr, Program, Statement,
};
use std::collections::HashMap;
use tracing::debug;

/// Lower a parsed program.
///
/// `let` bindings are visible to every later statement, including nested
/// `union` arguments. The result is the node of the last statement.
/// Sub-pipelines referenced by `union`, `union_all`, `exists` and `in`
/// are rendered to SQL immediately using `union_dialect`.
pub fn lower_program(source: &str, program: &Program, union_dialect: Dialect) -> Result<AstNode> {
    let mut lowerer = Lowerer::new(source, union_dialect);
    let mut root = None;

    for statement in &program.statements {
        match statement {
            Statement::Let { name, value, .. } => {
                let node = lowerer.lower_pipe(value)?;
                lowerer.scope.insert(name.clone(), node.clone());
                root = Some(node);
            }
            Statement::Pipe(pipe) => root = Some(lowerer.lower_pipe(pipe)?),
        }
    }

    let root = root.ok_or_else(|| LqlError::Syntax {
        message: "Empty query: expected a statement".to_string(),
        location: SourceLocation::start_of(source),
    })?;

    if let Node::Pipeline(pipeline) = &root {
        debug!(steps = pipeline.len(), parameters = lowerer.parameters.len(), "Lowered LQL pipeline");
    }

    Ok(AstNode {
        root,
        parameters: lowerer.parameters,
    })
}

pub(super) struct Lowerer<'a> {
    source: &'a str,
    union_dialect: Dialect,
    scope: HashMap<String, Node>,
    parameters: Vec<ParameterInfo>,
    /// Lambda parameter names of the enclosing filter/having
    lambda_params: Vec<String>,
}

impl<'a> Lowerer<'a> {
    fn new(source: &'a str, union_dialect: Dialect) -> Self {
        Self {
            source,
            union_dialect,
            scope: HashMap::new(),
            parameters: Vec::new(),
            lambda_params: Vec::new(),
        }
    }

    pub(super) fn location(&self, span: Span) -> SourceLocation {
        SourceLocation::from_byte_range(self.source, span.start, span.end)
    }

    /// Record a bind parameter; the first recorded type wins
    pub(super) fn record_parameter(&mut self, name: &str, sql_type: &str) {
        if !self.parameters.iter().any(|p| p.name == name) {
            self.parameters.push(ParameterInfo::new(name, sql_type));
        }
    }

    /// Drop a leading lambda parameter from `row.table.column`
    pub(super) fn strip_lambda_prefix<'p>(&self, parts: &'p [String]) -> &'p [String] {
        match parts.split_first() {
            Some((first, rest))
                if !rest.is_empty()
                    && self
                        .lambda_params
                        .iter()
                        .any(|p| p.eq_ignore_ascii_case(first)) =>
            {
                rest
            }
            _ => parts,
        }
    }

    /// Lower a nested pipe expression and render it with the union dialect
    ///
    /// Enclosing lambda parameters stay in scope so correlated references
    /// such as `u.users.id` lose their prefix too.
    pub(super) fn render_sub_pipeline(&mut self, pipe: &PipeExpr) -> Result<String> {
        let node = self.lower_pipe(pipe)?;
        Ok(pipeline::render_node(&node, self.union_dialect))
    }

    /// Run `f` with `params` stacked on top of the enclosing lambda parameters
    fn with_lambda_params<T>(
        &mut self,
        params: &[String],
        f: impl FnOnce(&mut Self) -> Result<T>,
    ) -> Result<T> {
        let depth = self.lambda_params.len();
        self.lambda_params.extend_from_slice(params);
        let result = f(self);
        self.lambda_params.truncate(depth);
        result
    }

    // ========================================================================
    // Pipelines
    // ========================================================================

    fn lower_pipe(&mut self, pipe: &PipeExpr) -> Result<Node> {
        let Some((first, rest)) = pipe.terms.split_first() else {
            return Err(LqlError::Syntax {
                message: "Empty pipe expression".to_string(),
                location: self.location(pipe.span),
            });
        };

        let base = self.lower_source(first)?;
        if rest.is_empty() {
            return Ok(base);
        }

        let mut current_table = base.last_table().map(str::to_string);
        let mut pipeline = Pipeline::new();
        pipeline.push(StepKind::Identity {
            source: Box::new(base),
        });

        for term in rest {
            let ExprKind::Call(call) = &term.kind else {
                return Err(LqlError::unsupported(
                    "Expected a pipeline operation such as select(...) after '|>'",
                    Some(self.location(term.span)),
                ));
            };
            let step = self.lower_operation(call, term.span, current_table.as_deref())?;
            if let StepKind::Join { table, .. } = &step {
                current_table = Some(table.name.clone());
            }
            pipeline.push(step);
        }

        Ok(Node::Pipeline(pipeline))
    }

    /// Lower the first term of a pipe: a table, a bound name or a nested pipe
    fn lower_source(&mut self, expr: &Expr) -> Result<Node> {
        match &expr.kind {
            ExprKind::Ident(name) => Ok(self
                .scope
                .get(name)
                .cloned()
                .unwrap_or_else(|| Node::Identifier(name.clone()))),
            ExprKind::Pipe(pipe) => self.lower_pipe(pipe),
            ExprKind::Paren(inner) => self.lower_source(inner),
            _ => Err(LqlError::unsupported(
                "Expected a table name, variable or parenthesized pipeline",
                Some(self.location(expr.span)),
            )),
        }
    }

    fn lower_operation(
        &mut self,
        call: &Call,
        span: Span,
        current_table: Option<&str>,
    ) -> Result<StepKind> {
        let name = call.name.to_ascii_lowercase();
        let step = match name.as_str() {
            "join" => self.join(call, span, current_table, "INNER")?,
            "left_join" => self.join(call, span, current_table, "LEFT")?,
            "cross_join" => self.join(call, span, current_table, "CROSS")?,
            "filter" => StepKind::Filter {
                conditions: self.filter(call, span)?,
            },
            "having" => StepKind::Having {
                condition: self.having(call, span)?,
            },
            "select" => StepKind::Select {
                columns: self.columns(&call.args)?,
            },
            "select_distinct" => StepKind::SelectDistinct {
                columns: self.columns(&call.args)?,
            },
            "group_by" => StepKind::GroupBy {
                columns: self.columns(&call.args)?,
            },
            "order_by" => StepKind::OrderBy {
                items: self.order_items(&call.args)?,
            },
            "limit" => StepKind::Limit {
                count: self.count_argument(call, span)?,
            },
            "offset" => StepKind::Offset {
                count: self.count_argument(call, span)?,
            },
            "union" => StepKind::Union {
                query: self.union_query(call, span)?,
            },
            "union_all" => StepKind::UnionAll {
                query: self.union_query(call, span)?,
            },
            "insert" => StepKind::Insert {
                table: self.table_argument(call, span)?.name,
                columns: Vec::new(),
            },
            _ => {
                return Err(LqlError::unsupported(
                    format!("Unknown pipeline operation '{}'", call.name),
                    Some(self.location(call.name_span)),
                ))
            }
        };
        Ok(step)
    }

    fn positional_args<'c>(call: &'c Call) -> impl Iterator<Item = &'c Expr> {
        call.args
            .iter()
            .filter(|arg| !matches!(arg.kind, ExprKind::Named { .. }))
    }

    fn named_arg<'c>(call: &'c Call, wanted: &str) -> Option<&'c Expr> {
        call.args.iter().find_map(|arg| match &arg.kind {
            ExprKind::Named { name, value } if name.eq_ignore_ascii_case(wanted) => Some(&**value),
            _ => None,
        })
    }

    // ========================================================================
    // Operations
    // ========================================================================

    fn table_argument(&self, call: &Call, span: Span) -> Result<TableInfo> {
        let table = Self::positional_args(call).next().and_then(|arg| match &arg.kind {
            ExprKind::Ident(name) => Some(TableInfo::new(name.clone())),
            ExprKind::Qualified(parts) => Some(TableInfo::new(parts.join("."))),
            ExprKind::Aliased { expr, alias } => match &expr.kind {
                ExprKind::Ident(name) => Some(TableInfo::new(name.clone()).with_alias(alias.clone())),
                _ => None,
            },
            _ => None,
        });
        table.ok_or_else(|| {
            LqlError::unsupported(
                format!("{}() requires a table argument", call.name),
                Some(self.location(span)),
            )
        })
    }

    fn join(
        &mut self,
        call: &Call,
        span: Span,
        current_table: Option<&str>,
        join_type: &str,
    ) -> Result<StepKind> {
        let table = self.table_argument(call, span)?;

        let condition = match Self::named_arg(call, "on") {
            Some(on) => Some(self.lambda_or_expr_text(on)?),
            None if join_type == "CROSS" => None,
            None => {
                return Err(LqlError::unsupported(
                    format!("{}() requires an 'on' condition argument", call.name),
                    Some(self.location(span)),
                ))
            }
        };

        let relationship = JoinRelationship::new(
            current_table.unwrap_or_default(),
            table.name.clone(),
            condition,
            join_type,
        );
        Ok(StepKind::Join {
            table,
            relationship,
        })
    }

    /// Body text of `fn(..) => body`, or the text of a plain expression
    fn lambda_or_expr_text(&mut self, expr: &Expr) -> Result<String> {
        match &expr.kind {
            ExprKind::Lambda { params, body } => {
                self.with_lambda_params(params, |lowerer| lowerer.sql_text(body))
            }
            _ => self.sql_text(expr),
        }
    }

    fn single_argument<'c>(&self, call: &'c Call, span: Span) -> Result<&'c Expr> {
        match call.args.as_slice() {
            [arg] => Ok(arg),
            _ => Err(LqlError::unsupported(
                format!("{}() expects exactly one argument", call.name),
                Some(self.location(span)),
            )),
        }
    }

    fn filter(&mut self, call: &Call, span: Span) -> Result<Vec<WhereCondition>> {
        let arg = self.single_argument(call, span)?;
        let (params, body) = match &arg.kind {
            ExprKind::Lambda { params, body } => (params.as_slice(), &**body),
            _ => (&[][..], arg),
        };

        let mut conditions = self.with_lambda_params(params, |lowerer| lowerer.conditions(body))?;

        if has_top_level_or(&conditions) {
            conditions.insert(0, WhereCondition::open());
            conditions.push(WhereCondition::close());
        }
        Ok(conditions)
    }

    fn having(&mut self, call: &Call, span: Span) -> Result<String> {
        let arg = self.single_argument(call, span)?;
        self.lambda_or_expr_text(arg)
    }

    fn count_argument(&mut self, call: &Call, span: Span) -> Result<String> {
        let arg = self.single_argument(call, span)?;
        if let ExprKind::Param(name) = &arg.kind {
            self.record_parameter(name, "INTEGER");
        }
        self.sql_text(arg)
    }

    fn union_query(&mut self, call: &Call, span: Span) -> Result<String> {
        let arg = self.single_argument(call, span)?;
        let node = match &arg.kind {
            ExprKind::Ident(_) | ExprKind::Paren(_) | ExprKind::Pipe(_) => self.lower_source(arg)?,
            _ => {
                return Err(LqlError::unsupported(
                    format!("{}() expects a variable or a pipeline", call.name),
                    Some(self.location(arg.span)),
                ))
            }
        };
        Ok(pipeline::render_node(&node, self.union_dialect))
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// Flatten a boolean expression into an ordered WHERE token sequence
    fn conditions(&mut self, expr: &Expr) -> Result<Vec<WhereCondition>> {
        match &expr.kind {
            ExprKind::Binary {
                op: op @ (BinaryOp::And | BinaryOp::Or),
                left,
                right,
            } => {
                let mut out = self.conditions(left)?;
                out.push(if *op == BinaryOp::And {
                    WhereCondition::and()
                } else {
                    WhereCondition::or()
                });
                out.extend(self.conditions(right)?);
                Ok(out)
            }
            ExprKind::Paren(inner) => {
                let mut out = vec![WhereCondition::open()];
                out.extend(self.conditions(inner)?);
                out.push(WhereCondition::close());
                Ok(out)
            }
            ExprKind::Binary { op, left, right } if op.is_comparison() => {
                self.infer_comparison_parameter(left, right);
                let operator = comparison_operator(*op);
                let column = self.condition_column(left)?;
                let right = self.sql_text(right)?;
                Ok(vec![WhereCondition::comparison(column, operator, right)])
            }
            ExprKind::IsNull { operand, negated } => {
                let operator = if *negated {
                    ComparisonOperator::IsNotNull
                } else {
                    ComparisonOperator::IsNull
                };
                let column = self.condition_column(operand)?;
                Ok(vec![WhereCondition::comparison(column, operator, "")])
            }
            ExprKind::InList {
                operand,
                items,
                negated: false,
            } => {
                let column = self.condition_column(operand)?;
                let list = self.in_list_text(items)?;
                Ok(vec![WhereCondition::comparison(
                    column,
                    ComparisonOperator::In,
                    list,
                )])
            }
            ExprKind::Like {
                operand,
                pattern,
                negated: false,
            } => {
                let column = self.condition_column(operand)?;
                let pattern = self.sql_text(pattern)?;
                Ok(vec![WhereCondition::comparison(
                    column,
                    ComparisonOperator::Like,
                    pattern,
                )])
            }
            _ => Ok(vec![WhereCondition::expression(self.sql_text(expr)?)]),
        }
    }

    /// Left side of a comparison: a named column when possible
    fn condition_column(&mut self, expr: &Expr) -> Result<ColumnInfo> {
        match &expr.kind {
            ExprKind::Ident(name) => Ok(ColumnInfo::named(name.clone())),
            ExprKind::Qualified(parts) => Ok(named_column(self.strip_lambda_prefix(parts))),
            _ => Ok(ColumnInfo::expression(self.sql_text(expr)?)),
        }
    }

    // ========================================================================
    // Columns
    // ========================================================================

    fn columns(&mut self, args: &[Expr]) -> Result<Vec<ColumnInfo>> {
        args.iter().map(|arg| self.column(arg)).collect()
    }

    fn column(&mut self, expr: &Expr) -> Result<ColumnInfo> {
        match &expr.kind {
            ExprKind::Aliased { expr: inner, alias } => Ok(self.column(inner)?.with_alias(alias.clone())),
            ExprKind::Wildcard(None) => Ok(ColumnInfo::wildcard()),
            ExprKind::Wildcard(Some(table)) => Ok(ColumnInfo::table_wildcard(table.clone())),
            ExprKind::Ident(name) => Ok(ColumnInfo::named(name.clone())),
            ExprKind::Qualified(parts) => Ok(named_column(parts)),
            ExprKind::Pipe(_) => Err(LqlError::unsupported(
                "Sub-query cannot be used as a column",
                Some(self.location(expr.span)),
            )),
            ExprKind::Lambda { .. } | ExprKind::Named { .. } | ExprKind::Ordered { .. } => {
                Err(LqlError::unsupported(
                    "Expected a column expression",
                    Some(self.location(expr.span)),
                ))
            }
            _ => Ok(ColumnInfo::expression(self.sql_text(expr)?)),
        }
    }

    fn order_items(&mut self, args: &[Expr]) -> Result<Vec<OrderByItem>> {
        args.iter()
            .map(|arg| {
                let (expr, direction) = match &arg.kind {
                    ExprKind::Ordered { expr, direction } => (&**expr, *direction),
                    _ => (arg, Direction::Asc),
                };
                let column = self.lambda_or_expr_text(expr)?;
                let direction = match direction {
                    Direction::Asc => SortDirection::Asc,
                    Direction::Desc => SortDirection::Desc,
                };
                Ok(OrderByItem::new(column, direction))
            })
            .collect()
    }
}

/// `a.b.c` becomes column `c` of table `a.b`
fn named_column(parts: &[String]) -> ColumnInfo {
    match parts.split_last() {
        Some((name, [])) => ColumnInfo::named(name.clone()),
        Some((name, table)) => ColumnInfo::qualified(table.join("."), name.clone()),
        None => ColumnInfo::wildcard(),
    }
}

fn comparison_operator(op: BinaryOp) -> ComparisonOperator {
    match op {
        BinaryOp::NotEq => ComparisonOperator::NotEq,
        BinaryOp::Lt => ComparisonOperator::LessThan,
        BinaryOp::Gt => ComparisonOperator::GreaterThan,
        BinaryOp::LtEq => ComparisonOperator::LessOrEq,
        BinaryOp::GtEq => ComparisonOperator::GreaterOrEq,
        _ => ComparisonOperator::Eq,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statement::LogicalOperator;
    use crate::syntax::parse_source;

    fn lower(source: &str) -> Result<AstNode> {
        let program = parse_source(source, true)?;
        lower_program(source, &program, Dialect::PostgreSql)
    }

    fn steps(source: &str) -> Vec<StepKind> {
        match lower(source).unwrap().root {
            Node::Pipeline(p) => p.steps().iter().map(|s| s.kind.clone()).collect(),
            other => panic!("Expected pipeline, got {:?}", other),
        }
    }

    // =========================================================================
    // Pipelines and scope
    // =========================================================================

    #[test]
    fn test_single_term_is_unwrapped() {
        let ast = lower("users").unwrap();
        assert_eq!(ast.root, Node::Identifier("users".to_string()));
    }

    #[test]
    fn test_let_binding_resolves_to_pipeline() {
        let steps = steps("let adults = users |> filter(fn(r) => r.users.age >= 18)\nadults |> limit(5)");
        assert_eq!(steps.len(), 2);
        match &steps[0] {
            StepKind::Identity { source } => assert!(matches!(**source, Node::Pipeline(_))),
            other => panic!("Expected identity, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_operation_fails_with_position() {
        let err = lower("users |> frobnicate(users.id)").unwrap_err();
        assert_eq!(err.message(), "Unknown pipeline operation 'frobnicate'");
        let loc = err.location().unwrap();
        assert_eq!((loc.line, loc.column), (1, 9));
    }

    // =========================================================================
    // Joins
    // =========================================================================

    #[test]
    fn test_join_types_and_left_table() {
        let steps = steps(
            "a |> join(b, on = a.k = b.k) |> left_join(c, on = b.k2 = c.k2) |> cross_join(d)",
        );
        let rels: Vec<_> = steps
            .iter()
            .filter_map(|s| match s {
                StepKind::Join { relationship, .. } => Some(relationship.clone()),
                _ => None,
            })
            .collect();

        assert_eq!(rels.len(), 3);
        assert_eq!(
            (rels[0].left_table.as_str(), rels[0].right_table.as_str(), rels[0].join_type.as_str()),
            ("a", "b", "INNER")
        );
        assert_eq!(rels[0].condition.as_deref(), Some("a.k = b.k"));
        assert_eq!(rels[1].left_table, "b");
        assert_eq!(rels[1].join_type, "LEFT");
        assert_eq!(rels[2].condition, None);
    }

    #[test]
    fn test_join_without_on_fails() {
        let err = lower("a |> join(b)").unwrap_err();
        assert!(matches!(err, LqlError::UnsupportedConstruct { .. }));
        assert!(err.message().contains("'on'"));
    }

    #[test]
    fn test_join_without_table_fails() {
        let err = lower("a |> left_join(on = a.id = b.id)").unwrap_err();
        assert!(err.message().contains("requires a table"));
    }

    // =========================================================================
    // Filters
    // =========================================================================

    #[test]
    fn test_filter_strips_lambda_prefix() {
        let steps = steps("users |> filter(fn(Row) => row.users.age > 18 and row.users.name = 'x')");
        let StepKind::Filter { conditions } = &steps[1] else {
            panic!("Expected filter");
        };
        assert_eq!(
            conditions,
            &vec![
                WhereCondition::comparison(
                    ColumnInfo::qualified("users", "age"),
                    ComparisonOperator::GreaterThan,
                    "18"
                ),
                WhereCondition::and(),
                WhereCondition::comparison(
                    ColumnInfo::qualified("users", "name"),
                    ComparisonOperator::Eq,
                    "'x'"
                ),
            ]
        );
    }

    #[test]
    fn test_top_level_or_is_wrapped() {
        let steps = steps("t |> filter(fn(r) => r.t.a = 1 or r.t.b = 2)");
        let StepKind::Filter { conditions } = &steps[1] else {
            panic!("Expected filter");
        };
        assert!(conditions.first().unwrap().is_opening());
        assert!(conditions.last().unwrap().is_closing());
        assert!(conditions.contains(&WhereCondition::Logical {
            operator: LogicalOperator::Or
        }));
    }

    #[test]
    fn test_in_and_is_null_conditions() {
        let steps = steps("t |> filter(fn(r) => r.t.id in (1, 2) and r.t.deleted is null)");
        let StepKind::Filter { conditions } = &steps[1] else {
            panic!("Expected filter");
        };
        assert_eq!(
            conditions[0],
            WhereCondition::comparison(ColumnInfo::qualified("t", "id"), ComparisonOperator::In, "(1, 2)")
        );
        assert_eq!(
            conditions[2],
            WhereCondition::comparison(ColumnInfo::qualified("t", "deleted"), ComparisonOperator::IsNull, "")
        );
    }

    #[test]
    fn test_correlated_exists_strips_outer_lambda_prefix() {
        let steps = steps(
            "users |> filter(fn(u) => exists(orders |> filter(fn(o) => o.orders.user_id = u.users.id)))",
        );
        let StepKind::Filter { conditions } = &steps[1] else {
            panic!("Expected filter");
        };
        assert_eq!(
            conditions,
            &vec![WhereCondition::expression(
                "EXISTS (SELECT * FROM orders WHERE orders.user_id = users.id)"
            )]
        );
    }

    #[test]
    fn test_lambda_params_do_not_outlive_their_filter() {
        let steps = steps("t |> filter(fn(r) => r.t.a = 1) |> filter(r.t.b = 2)");
        let StepKind::Filter { conditions } = &steps[2] else {
            panic!("Expected filter");
        };
        assert_eq!(
            conditions[0],
            WhereCondition::comparison(
                ColumnInfo::qualified("r.t", "b"),
                ComparisonOperator::Eq,
                "2"
            )
        );
    }

    #[test]
    fn test_plain_equality_argument_is_condition() {
        let steps = steps("users |> filter(id = 1)");
        let StepKind::Filter { conditions } = &steps[1] else {
            panic!("Expected filter");
        };
        assert_eq!(
            conditions,
            &vec![WhereCondition::comparison(
                ColumnInfo::named("id"),
                ComparisonOperator::Eq,
                "1"
            )]
        );
    }

    #[test]
    fn test_arithmetic_left_side_is_expression_column() {
        let steps = steps("t |> filter(fn(r) => (r.t.a + r.t.b) * 2 > 10)");
        let StepKind::Filter { conditions } = &steps[1] else {
            panic!("Expected filter");
        };
        assert_eq!(
            conditions[0],
            WhereCondition::comparison(
                ColumnInfo::expression("(t.a + t.b) * 2"),
                ComparisonOperator::GreaterThan,
                "10"
            )
        );
    }

    // =========================================================================
    // Columns
    // =========================================================================

    #[test]
    fn test_select_column_variants() {
        let steps = steps(
            "t |> select(t.id, t.name as label, count(*) as total, *, t.*, t.a * (t.b + 1))",
        );
        let StepKind::Select { columns } = &steps[1] else {
            panic!("Expected select");
        };
        assert_eq!(
            columns,
            &vec![
                ColumnInfo::qualified("t", "id"),
                ColumnInfo::qualified("t", "name").with_alias("label"),
                ColumnInfo::expression("COUNT(*)").with_alias("total"),
                ColumnInfo::wildcard(),
                ColumnInfo::table_wildcard("t"),
                ColumnInfo::expression("t.a * (t.b + 1)"),
            ]
        );
    }

    #[test]
    fn test_window_and_case_columns() {
        let steps = steps(
            "t |> select(row_number() over (partition by t.dept order by t.salary desc) as rn, case when t.age < 18 then 'minor' else 'adult' end as bracket)",
        );
        let StepKind::Select { columns } = &steps[1] else {
            panic!("Expected select");
        };
        assert_eq!(
            columns[0],
            ColumnInfo::expression("ROW_NUMBER() OVER (PARTITION BY t.dept ORDER BY t.salary DESC)")
                .with_alias("rn")
        );
        assert_eq!(
            columns[1],
            ColumnInfo::expression("CASE WHEN t.age < 18 THEN 'minor' ELSE 'adult' END")
                .with_alias("bracket")
        );
    }

    #[test]
    fn test_subquery_column_is_unsupported() {
        let err = lower("t |> select((u |> select(u.id)))").unwrap_err();
        assert!(matches!(err, LqlError::UnsupportedConstruct { .. }));
        assert!(err.location().is_some());
    }

    #[test]
    fn test_insert_has_empty_columns() {
        let steps = steps("t |> select(t.id) |> insert(archive)");
        assert_eq!(
            steps[2],
            StepKind::Insert {
                table: "archive".to_string(),
                columns: vec![]
            }
        );
    }

    // =========================================================================
    // Parameters
    // =========================================================================

    #[test]
    fn test_parameter_types_are_inferred() {
        let ast = lower("t |> filter(fn(r) => r.t.age > @min_age and r.t.name = @name) |> limit(@n)").unwrap();
        assert_eq!(
            ast.parameters,
            vec![
                ParameterInfo::new("min_age", "TEXT"),
                ParameterInfo::new("name", "TEXT"),
                ParameterInfo::new("n", "INTEGER"),
            ]
        );
    }

    #[test]
    fn test_numeric_comparison_parameter() {
        let ast = lower("t |> filter(fn(r) => @threshold < 100)").unwrap();
        assert_eq!(ast.parameters, vec![ParameterInfo::new("threshold", "NUMERIC")]);
    }

    // =========================================================================
    // Unions
    // =========================================================================

    #[test]
    fn test_union_renders_bound_variable() {
        let steps = steps("let archived = old |> select(old.id)\ncurrent |> select(current.id) |> union(archived)");
        assert_eq!(
            steps[2],
            StepKind::Union {
                query: "SELECT old.id FROM old".to_string()
            }
        );
    }
}
