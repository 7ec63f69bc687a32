//! Expression-tree to SQL text.

use super::{BinaryOperator, Expr, Lambda, SqlValue, StringMethod};
use crate::error::{LqlError, Result};
use crate::statement::ColumnInfo;

const TAUTOLOGY: &str = "1=1";
const CONTRADICTION: &str = "1=0";

/// Render an expression in boolean position (a WHERE predicate).
pub fn predicate_sql(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Constant(SqlValue::Bool(b)) => Ok(bool_marker(*b).to_string()),
        Expr::Binary { op, left, right } if op.is_logical() => {
            if let (Some(l), Some(r)) = (left.as_bool_constant(), right.as_bool_constant()) {
                let folded = match op {
                    BinaryOperator::AndAlso => l && r,
                    _ => l || r,
                };
                return Ok(bool_marker(folded).to_string());
            }
            let l = predicate_sql(left)?;
            let r = predicate_sql(right)?;
            if *op == BinaryOperator::OrElse {
                Ok(format!("({}) OR ({})", l, r))
            } else {
                Ok(format!("{} AND {}", and_operand(left, l), and_operand(right, r)))
            }
        }
        Expr::Binary { op, left, right } => comparison_sql(*op, left, right),
        Expr::Not(inner) => Ok(format!("NOT ({})", predicate_sql(inner)?)),
        Expr::Call {
            method,
            target,
            argument,
        } => like_sql(*method, target, argument),
        // Bare boolean member
        Expr::Member { .. } => Ok(format!("{} = 1", value_sql(expr)?)),
        Expr::Parameter(name) => Err(LqlError::unsupported(
            format!("Parameter '{}' cannot be used as a predicate", name),
            None,
        )),
        Expr::Constant(value) => Err(LqlError::unsupported(
            format!("Constant {:?} cannot be used as a predicate", value),
            None,
        )),
    }
}

/// Render an expression in value position (operand, projection, sort key).
pub fn value_sql(expr: &Expr) -> Result<String> {
    match expr {
        Expr::Member { name, .. } => Ok(name.clone()),
        Expr::Constant(value) => Ok(literal_sql(value)),
        Expr::Parameter(name) => Err(LqlError::unsupported(
            format!("Parameter '{}' cannot be used as a value", name),
            None,
        )),
        _ => predicate_sql(expr),
    }
}

fn bool_marker(value: bool) -> &'static str {
    if value {
        TAUTOLOGY
    } else {
        CONTRADICTION
    }
}

/// OR groups inside an AND keep their own parentheses
fn and_operand(expr: &Expr, sql: String) -> String {
    match expr {
        Expr::Binary {
            op: BinaryOperator::OrElse,
            ..
        } if !sql.starts_with("1=") => format!("({})", sql),
        _ => sql,
    }
}

fn comparison_sql(op: BinaryOperator, left: &Expr, right: &Expr) -> Result<String> {
    let (column, value) = match (left, right) {
        (_, Expr::Constant(SqlValue::Null)) => (left, None),
        (Expr::Constant(SqlValue::Null), _) => (right, None),
        _ => (left, Some(right)),
    };

    let Some(value) = value else {
        let column = value_sql(column)?;
        return match op {
            BinaryOperator::Equal => Ok(format!("{} IS NULL", column)),
            BinaryOperator::NotEqual => Ok(format!("{} IS NOT NULL", column)),
            other => Err(LqlError::unsupported(
                format!("Operator '{}' cannot compare against NULL", other.as_sql()),
                None,
            )),
        };
    };

    Ok(format!(
        "{} {} {}",
        value_sql(column)?,
        op.as_sql(),
        value_sql(value)?
    ))
}

fn like_sql(method: StringMethod, target: &Expr, argument: &Expr) -> Result<String> {
    let Expr::Constant(SqlValue::String(value)) = argument else {
        return Err(LqlError::unsupported(
            "String method argument must be a string constant",
            None,
        ));
    };
    let escaped = value.replace('\'', "''");
    let pattern = match method {
        StringMethod::Contains => format!("'%{}%'", escaped),
        StringMethod::StartsWith => format!("'{}%'", escaped),
    };
    Ok(format!("{} LIKE {}", value_sql(target)?, pattern))
}

/// Literal text for a constant
pub fn literal_sql(value: &SqlValue) -> String {
    match value {
        SqlValue::String(s) => format!("'{}'", s.replace('\'', "''")),
        SqlValue::Bool(b) => if *b { "1" } else { "0" }.to_string(),
        SqlValue::DateTime(dt) => format!("'{}'", dt.format("%Y-%m-%d %H:%M:%S")),
        SqlValue::Int(i) => i.to_string(),
        SqlValue::Float(f) => f.to_string(),
        SqlValue::Null => "NULL".to_string(),
    }
}

/// Stateless walker turning lambdas into statement pieces
#[derive(Debug, Default, Clone, Copy)]
pub struct ExpressionVisitor;

impl ExpressionVisitor {
    pub fn predicate(&self, lambda: &Lambda) -> Result<String> {
        predicate_sql(&lambda.body)
    }

    /// A member becomes a named column, anything else an expression column
    pub fn column(&self, lambda: &Lambda) -> Result<ColumnInfo> {
        match &lambda.body {
            Expr::Member { name, .. } => Ok(ColumnInfo::named(name.clone())),
            other => Ok(ColumnInfo::expression(value_sql(other)?)),
        }
    }

    pub fn sort_key(&self, lambda: &Lambda) -> Result<String> {
        value_sql(&lambda.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use test_case::test_case;

    fn x() -> Expr {
        Expr::param("x")
    }

    // =========================================================================
    // Boolean structure
    // =========================================================================

    #[test]
    fn test_or_branches_are_parenthesized() {
        let expr = x().member("Id").eq(1).or_else(x().member("Id").eq(2));
        assert_eq!(predicate_sql(&expr).unwrap(), "(Id = 1) OR (Id = 2)");
    }

    #[test]
    fn test_or_inside_and_keeps_grouping() {
        let expr = x()
            .member("Active")
            .eq(true)
            .and_also(x().member("Id").eq(1).or_else(x().member("Id").eq(2)));
        assert_eq!(
            predicate_sql(&expr).unwrap(),
            "Active = 1 AND ((Id = 1) OR (Id = 2))"
        );
    }

    #[test_case(true, true, BinaryOperator::AndAlso, "1=1")]
    #[test_case(true, false, BinaryOperator::AndAlso, "1=0")]
    #[test_case(false, true, BinaryOperator::OrElse, "1=1")]
    #[test_case(false, false, BinaryOperator::OrElse, "1=0")]
    fn test_constant_folding(l: bool, r: bool, op: BinaryOperator, expected: &str) {
        let expr = Expr::constant(l).compare(op, Expr::constant(r));
        assert_eq!(predicate_sql(&expr).unwrap(), expected);
    }

    #[test]
    fn test_false_or_predicate() {
        let expr = Expr::constant(false).or_else(x().member("Id").eq(1));
        assert_eq!(predicate_sql(&expr).unwrap(), "(1=0) OR (Id = 1)");
    }

    #[test]
    fn test_not() {
        let expr = x().member("Deleted").eq(true).negate();
        assert_eq!(predicate_sql(&expr).unwrap(), "NOT (Deleted = 1)");
    }

    // =========================================================================
    // Comparisons and literals
    // =========================================================================

    #[test]
    fn test_null_comparisons() {
        assert_eq!(
            predicate_sql(&x().member("Email").eq(SqlValue::Null)).unwrap(),
            "Email IS NULL"
        );
        assert_eq!(
            predicate_sql(&x().member("Email").ne(None::<String>)).unwrap(),
            "Email IS NOT NULL"
        );
    }

    #[test]
    fn test_like_rewrites_escape_quotes() {
        assert_eq!(
            predicate_sql(&x().member("Name").contains("O'Br")).unwrap(),
            "Name LIKE '%O''Br%'"
        );
        assert_eq!(
            predicate_sql(&x().member("Name").starts_with("Jo")).unwrap(),
            "Name LIKE 'Jo%'"
        );
    }

    #[test]
    fn test_literals() {
        let dt = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(literal_sql(&SqlValue::DateTime(dt)), "'2024-03-01 12:30:00'");
        assert_eq!(literal_sql(&SqlValue::Bool(false)), "0");
        assert_eq!(literal_sql(&SqlValue::Float(2.5)), "2.5");
        assert_eq!(literal_sql(&SqlValue::from("it's")), "'it''s'");
    }

    #[test]
    fn test_bare_parameter_is_unsupported() {
        let err = predicate_sql(&x()).unwrap_err();
        assert!(matches!(err, LqlError::UnsupportedConstruct { .. }));
    }
}
