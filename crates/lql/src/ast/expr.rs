//! Text lowering for scalar expressions.
//!
//! Arithmetic, CASE, calls and window functions end up as SQL text inside
//! `ColumnInfo::Expression`, `WhereCondition::Expression`, HAVING and
//! ORDER BY items. Nested binary groups are parenthesized whenever SQL
//! precedence would otherwise change their meaning.

use super::builder::Lowerer;
use crate::error::{LqlError, Result};
use crate::syntax::tree::{BinaryOp, Call, CaseExpr, Direction, Expr, ExprKind, Literal, UnaryOp};
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// LQL function names and their SQL spelling.
static FUNCTION_NAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        // Aggregates
        ("count", "COUNT"),
        ("sum", "SUM"),
        ("avg", "AVG"),
        ("min", "MIN"),
        ("max", "MAX"),
        // Strings
        ("upper", "UPPER"),
        ("lower", "LOWER"),
        ("length", "LENGTH"),
        ("trim", "TRIM"),
        ("ltrim", "LTRIM"),
        ("rtrim", "RTRIM"),
        ("substring", "SUBSTRING"),
        ("substr", "SUBSTRING"),
        ("concat", "CONCAT"),
        ("replace", "REPLACE"),
        // Null handling
        ("coalesce", "COALESCE"),
        ("ifnull", "IFNULL"),
        ("nullif", "NULLIF"),
        // Numeric
        ("round", "ROUND"),
        ("abs", "ABS"),
        ("floor", "FLOOR"),
        ("ceiling", "CEILING"),
        // Date/time
        ("now", "NOW"),
        ("date", "DATE"),
        // Window
        ("row_number", "ROW_NUMBER"),
        ("rank", "RANK"),
        ("dense_rank", "DENSE_RANK"),
        ("ntile", "NTILE"),
        ("lag", "LAG"),
        ("lead", "LEAD"),
        ("first_value", "FIRST_VALUE"),
        ("last_value", "LAST_VALUE"),
    ])
});

/// SQL spelling of an LQL function; unknown names pass through unchanged.
pub fn function_name(name: &str) -> &str {
    match FUNCTION_NAMES.get(name.to_ascii_lowercase().as_str()) {
        Some(mapped) => *mapped,
        None => name,
    }
}

/// Whether `child` must be wrapped when it appears under `parent`.
///
/// `right` marks the right operand, where equal precedence still needs
/// parentheses for non-associative operators (`a - (b - c)`).
fn needs_parens(parent: BinaryOp, child: &Expr, right: bool) -> bool {
    let ExprKind::Binary { op: child_op, .. } = &child.kind else {
        return false;
    };
    let (p, c) = (parent.precedence(), child_op.precedence());
    if c < p {
        return true;
    }
    right
        && c == p
        && matches!(
            parent,
            BinaryOp::Sub | BinaryOp::Div | BinaryOp::Mod
        )
}

fn quote_string(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

fn is_numeric_literal(expr: &Expr) -> bool {
    match &expr.kind {
        ExprKind::Literal(Literal::Int(_)) | ExprKind::Literal(Literal::Decimal(_)) => true,
        ExprKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => is_numeric_literal(operand),
        _ => false,
    }
}

impl Lowerer<'_> {
    /// Lower an expression to SQL text.
    pub(super) fn sql_text(&mut self, expr: &Expr) -> Result<String> {
        let text = match &expr.kind {
            ExprKind::Ident(name) => name.clone(),
            ExprKind::Qualified(parts) => self.strip_lambda_prefix(parts).join("."),
            ExprKind::Wildcard(None) => "*".to_string(),
            ExprKind::Wildcard(Some(table)) => format!("{}.*", table),
            ExprKind::Param(name) => {
                self.record_parameter(name, "TEXT");
                format!("@{}", name)
            }
            ExprKind::Literal(Literal::Str(value)) => quote_string(value),
            ExprKind::Literal(Literal::Int(value)) | ExprKind::Literal(Literal::Decimal(value)) => {
                value.clone()
            }
            ExprKind::Literal(Literal::Null) => "NULL".to_string(),
            ExprKind::Call(call) => self.call_text(call)?,
            ExprKind::Case(case) => self.case_text(case)?,
            ExprKind::Binary { op, left, right } => {
                if op.is_comparison() {
                    self.infer_comparison_parameter(left, right);
                }
                let l = self.operand_text(*op, left, false)?;
                let r = self.operand_text(*op, right, true)?;
                format!("{} {} {}", l, op.as_sql(), r)
            }
            ExprKind::Unary { op, operand } => {
                let inner = self.sql_text(operand)?;
                let wrap = matches!(operand.kind, ExprKind::Binary { .. });
                let inner = if wrap { format!("({})", inner) } else { inner };
                match op {
                    UnaryOp::Neg => format!("-{}", inner),
                    UnaryOp::Not => format!("NOT {}", inner),
                }
            }
            ExprKind::IsNull { operand, negated } => {
                let inner = self.sql_text(operand)?;
                let not = if *negated { "NOT " } else { "" };
                format!("{} IS {}NULL", inner, not)
            }
            ExprKind::InList {
                operand,
                items,
                negated,
            } => {
                let inner = self.sql_text(operand)?;
                let list = self.in_list_text(items)?;
                let not = if *negated { "NOT " } else { "" };
                format!("{} {}IN {}", inner, not, list)
            }
            ExprKind::Like {
                operand,
                pattern,
                negated,
            } => {
                let inner = self.sql_text(operand)?;
                let pattern = self.sql_text(pattern)?;
                let not = if *negated { "NOT " } else { "" };
                format!("{} {}LIKE {}", inner, not, pattern)
            }
            ExprKind::Exists(pipe) => format!("EXISTS ({})", self.render_sub_pipeline(pipe)?),
            ExprKind::Paren(inner) => format!("({})", self.sql_text(inner)?),
            ExprKind::Pipe(pipe) => format!("({})", self.render_sub_pipeline(pipe)?),
            ExprKind::Aliased { expr, alias } => format!("{} AS {}", self.sql_text(expr)?, alias),
            ExprKind::Ordered { expr, direction } => {
                format!("{} {}", self.sql_text(expr)?, direction_sql(*direction))
            }
            ExprKind::Lambda { .. } => {
                return Err(LqlError::unsupported(
                    "Lambda expressions are only allowed as filter or having arguments",
                    Some(self.location(expr.span)),
                ))
            }
            ExprKind::Named { name, .. } => {
                return Err(LqlError::unsupported(
                    format!("Named argument '{}' is not allowed here", name),
                    Some(self.location(expr.span)),
                ))
            }
        };
        Ok(text)
    }

    fn operand_text(&mut self, parent: BinaryOp, operand: &Expr, right: bool) -> Result<String> {
        let text = self.sql_text(operand)?;
        if needs_parens(parent, operand, right) {
            Ok(format!("({})", text))
        } else {
            Ok(text)
        }
    }

    /// `(a, b, c)` or `(SELECT ...)` for a single sub-pipeline
    pub(super) fn in_list_text(&mut self, items: &[Expr]) -> Result<String> {
        if let [Expr {
            kind: ExprKind::Pipe(pipe),
            ..
        }] = items
        {
            return Ok(format!("({})", self.render_sub_pipeline(pipe)?));
        }
        let parts = items
            .iter()
            .map(|item| self.sql_text(item))
            .collect::<Result<Vec<_>>>()?;
        Ok(format!("({})", parts.join(", ")))
    }

    fn call_text(&mut self, call: &Call) -> Result<String> {
        let args = call
            .args
            .iter()
            .map(|arg| self.sql_text(arg))
            .collect::<Result<Vec<_>>>()?;
        let distinct = if call.distinct { "DISTINCT " } else { "" };
        let mut text = format!(
            "{}({}{})",
            function_name(&call.name),
            distinct,
            args.join(", ")
        );

        if let Some(over) = &call.over {
            let mut clauses = Vec::new();
            if !over.partition_by.is_empty() {
                let cols = over
                    .partition_by
                    .iter()
                    .map(|e| self.sql_text(e))
                    .collect::<Result<Vec<_>>>()?;
                clauses.push(format!("PARTITION BY {}", cols.join(", ")));
            }
            if !over.order_by.is_empty() {
                let cols = over
                    .order_by
                    .iter()
                    .map(|e| self.sql_text(e))
                    .collect::<Result<Vec<_>>>()?;
                clauses.push(format!("ORDER BY {}", cols.join(", ")));
            }
            text.push_str(&format!(" OVER ({})", clauses.join(" ")));
        }
        Ok(text)
    }

    fn case_text(&mut self, case: &CaseExpr) -> Result<String> {
        let mut text = String::from("CASE");
        if let Some(operand) = &case.operand {
            text.push(' ');
            text.push_str(&self.sql_text(operand)?);
        }
        for (condition, value) in &case.branches {
            let condition = self.sql_text(condition)?;
            let value = self.sql_text(value)?;
            text.push_str(&format!(" WHEN {} THEN {}", condition, value));
        }
        if let Some(otherwise) = &case.otherwise {
            text.push_str(&format!(" ELSE {}", self.sql_text(otherwise)?));
        }
        text.push_str(" END");
        Ok(text)
    }

    /// `@p > 5` declares `p` as NUMERIC before the generic TEXT fallback
    pub(super) fn infer_comparison_parameter(&mut self, left: &Expr, right: &Expr) {
        for (param, other) in [(left, right), (right, left)] {
            if let ExprKind::Param(name) = &param.kind {
                if is_numeric_literal(other) {
                    self.record_parameter(name, "NUMERIC");
                }
            }
        }
    }
}

fn direction_sql(direction: Direction) -> &'static str {
    match direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    }
}
