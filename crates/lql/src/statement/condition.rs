//! WHERE-clause building blocks.
//!
//! A WHERE clause is a flat, ordered sequence of [`WhereCondition`] tokens.
//! Grouping is encoded only by the order of the parenthesis tokens, never by
//! nesting.

use super::ColumnInfo;
use serde::{Deserialize, Serialize};

/// Comparison operators. Each maps to exactly one SQL token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComparisonOperator {
    Eq,
    NotEq,
    GreaterThan,
    LessThan,
    GreaterOrEq,
    LessOrEq,
    Like,
    In,
    IsNull,
    IsNotNull,
}

impl ComparisonOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            ComparisonOperator::Eq => "=",
            ComparisonOperator::NotEq => "<>",
            ComparisonOperator::GreaterThan => ">",
            ComparisonOperator::LessThan => "<",
            ComparisonOperator::GreaterOrEq => ">=",
            ComparisonOperator::LessOrEq => "<=",
            ComparisonOperator::Like => "LIKE",
            ComparisonOperator::In => "IN",
            ComparisonOperator::IsNull => "IS NULL",
            ComparisonOperator::IsNotNull => "IS NOT NULL",
        }
    }

    /// Operators that take no right-hand operand
    pub fn is_unary(self) -> bool {
        matches!(
            self,
            ComparisonOperator::IsNull | ComparisonOperator::IsNotNull
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOperator {
    And,
    Or,
}

impl LogicalOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            LogicalOperator::And => "AND",
            LogicalOperator::Or => "OR",
        }
    }
}

/// One token of a WHERE sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WhereCondition {
    Comparison {
        left: ColumnInfo,
        operator: ComparisonOperator,
        right: String,
    },
    Logical { operator: LogicalOperator },
    Parenthesis { is_opening: bool },
    /// Raw SQL predicate text
    Expression { text: String },
}

impl WhereCondition {
    pub fn comparison(left: ColumnInfo, operator: ComparisonOperator, right: impl Into<String>) -> Self {
        WhereCondition::Comparison {
            left,
            operator,
            right: right.into(),
        }
    }

    pub fn and() -> Self {
        WhereCondition::Logical {
            operator: LogicalOperator::And,
        }
    }

    pub fn or() -> Self {
        WhereCondition::Logical {
            operator: LogicalOperator::Or,
        }
    }

    pub fn open() -> Self {
        WhereCondition::Parenthesis { is_opening: true }
    }

    pub fn close() -> Self {
        WhereCondition::Parenthesis { is_opening: false }
    }

    pub fn expression(text: impl Into<String>) -> Self {
        WhereCondition::Expression { text: text.into() }
    }

    pub fn is_opening(&self) -> bool {
        matches!(self, WhereCondition::Parenthesis { is_opening: true })
    }

    pub fn is_closing(&self) -> bool {
        matches!(self, WhereCondition::Parenthesis { is_opening: false })
    }
}

/// True when every closing parenthesis matches an earlier opening one.
pub fn is_balanced(conditions: &[WhereCondition]) -> bool {
    let mut depth: usize = 0;
    for condition in conditions {
        if condition.is_opening() {
            depth += 1;
        } else if condition.is_closing() {
            if depth == 0 {
                return false;
            }
            depth -= 1;
        }
    }
    depth == 0
}

/// True when the sequence contains an OR outside of any parenthesis pair.
pub fn has_top_level_or(conditions: &[WhereCondition]) -> bool {
    let mut depth: usize = 0;
    for condition in conditions {
        match condition {
            WhereCondition::Parenthesis { is_opening: true } => depth += 1,
            WhereCondition::Parenthesis { is_opening: false } => depth = depth.saturating_sub(1),
            WhereCondition::Logical {
                operator: LogicalOperator::Or,
            } if depth == 0 => return true,
            _ => {}
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_tokens() {
        assert_eq!(ComparisonOperator::Eq.as_sql(), "=");
        assert_eq!(ComparisonOperator::NotEq.as_sql(), "<>");
        assert_eq!(ComparisonOperator::IsNotNull.as_sql(), "IS NOT NULL");
        assert!(ComparisonOperator::IsNull.is_unary());
        assert!(!ComparisonOperator::Like.is_unary());
    }

    #[test]
    fn test_balanced_sequences() {
        let seq = vec![
            WhereCondition::open(),
            WhereCondition::expression("a = 1"),
            WhereCondition::or(),
            WhereCondition::expression("b = 2"),
            WhereCondition::close(),
        ];
        assert!(is_balanced(&seq));
        assert!(!has_top_level_or(&seq));
        assert!(!is_balanced(&[WhereCondition::close(), WhereCondition::open()]));
    }

    #[test]
    fn test_top_level_or_detected() {
        let seq = vec![
            WhereCondition::expression("a = 1"),
            WhereCondition::or(),
            WhereCondition::expression("b = 2"),
        ];
        assert!(has_top_level_or(&seq));
    }
}
