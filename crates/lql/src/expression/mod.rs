//! Expression-tree translator.
//!
//! A second front end that builds the same [`SelectStatement`] as the LQL
//! pipeline, but from typed expression trees instead of DSL text:
//!
//! ```
//! use lql::expression::{Entity, Expr, Predicate, Query};
//! use lql::Dialect;
//!
//! struct User;
//! impl Entity for User {
//!     fn table_name() -> &'static str {
//!         "users"
//!     }
//! }
//!
//! let adults = Predicate::<User>::lambda("u", |u| u.member("Age").ge(18));
//! let sql = Query::<User>::new()
//!     .filter(adults)
//!     .take(10)
//!     .to_sql(Dialect::Sqlite)
//!     .unwrap();
//! assert_eq!(sql, "SELECT * FROM users WHERE Age >= 18 LIMIT 10");
//! ```
//!
//! [`SelectStatement`]: crate::statement::SelectStatement

mod predicate;
mod query;
mod visitor;

pub use predicate::Predicate;
pub use query::{Query, QueryOp};
pub use visitor::{predicate_sql, value_sql, ExpressionVisitor};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// A type mapped onto one table.
pub trait Entity {
    fn table_name() -> &'static str;
}

/// Constant value inside an expression tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SqlValue {
    String(String),
    Bool(bool),
    DateTime(NaiveDateTime),
    Int(i64),
    Float(f64),
    Null,
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::String(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::String(value)
    }
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value.into())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<NaiveDateTime> for SqlValue {
    fn from(value: NaiveDateTime) -> Self {
        SqlValue::DateTime(value)
    }
}

impl<T: Into<SqlValue>> From<Option<T>> for SqlValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(SqlValue::Null, Into::into)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOperator {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
}

impl BinaryOperator {
    pub fn as_sql(self) -> &'static str {
        match self {
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessThanOrEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterThanOrEqual => ">=",
            BinaryOperator::AndAlso => "AND",
            BinaryOperator::OrElse => "OR",
        }
    }

    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOperator::AndAlso | BinaryOperator::OrElse)
    }
}

/// String methods with a LIKE translation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StringMethod {
    Contains,
    StartsWith,
}

/// Boolean or projection expression over one lambda parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Parameter(String),
    Member {
        target: Box<Expr>,
        name: String,
    },
    Constant(SqlValue),
    Binary {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Not(Box<Expr>),
    Call {
        method: StringMethod,
        target: Box<Expr>,
        argument: Box<Expr>,
    },
}

impl Expr {
    pub fn param(name: impl Into<String>) -> Self {
        Expr::Parameter(name.into())
    }

    pub fn constant(value: impl Into<SqlValue>) -> Self {
        Expr::Constant(value.into())
    }

    /// `self.name`
    pub fn member(&self, name: impl Into<String>) -> Self {
        Expr::Member {
            target: Box::new(self.clone()),
            name: name.into(),
        }
    }

    fn binary(self, op: BinaryOperator, right: Expr) -> Self {
        Expr::Binary {
            op,
            left: Box::new(self),
            right: Box::new(right),
        }
    }

    pub fn eq(self, value: impl Into<SqlValue>) -> Self {
        self.binary(BinaryOperator::Equal, Expr::constant(value))
    }

    pub fn ne(self, value: impl Into<SqlValue>) -> Self {
        self.binary(BinaryOperator::NotEqual, Expr::constant(value))
    }

    pub fn lt(self, value: impl Into<SqlValue>) -> Self {
        self.binary(BinaryOperator::LessThan, Expr::constant(value))
    }

    pub fn le(self, value: impl Into<SqlValue>) -> Self {
        self.binary(BinaryOperator::LessThanOrEqual, Expr::constant(value))
    }

    pub fn gt(self, value: impl Into<SqlValue>) -> Self {
        self.binary(BinaryOperator::GreaterThan, Expr::constant(value))
    }

    pub fn ge(self, value: impl Into<SqlValue>) -> Self {
        self.binary(BinaryOperator::GreaterThanOrEqual, Expr::constant(value))
    }

    /// Comparison against another expression rather than a constant
    pub fn compare(self, op: BinaryOperator, right: Expr) -> Self {
        self.binary(op, right)
    }

    pub fn and_also(self, right: Expr) -> Self {
        self.binary(BinaryOperator::AndAlso, right)
    }

    pub fn or_else(self, right: Expr) -> Self {
        self.binary(BinaryOperator::OrElse, right)
    }

    pub fn negate(self) -> Self {
        Expr::Not(Box::new(self))
    }

    pub fn contains(self, value: impl Into<SqlValue>) -> Self {
        Expr::Call {
            method: StringMethod::Contains,
            target: Box::new(self),
            argument: Box::new(Expr::constant(value)),
        }
    }

    pub fn starts_with(self, value: impl Into<SqlValue>) -> Self {
        Expr::Call {
            method: StringMethod::StartsWith,
            target: Box::new(self),
            argument: Box::new(Expr::constant(value)),
        }
    }

    /// Replace every reference to parameter `from` with `to`
    pub fn rebind(&self, from: &str, to: &str) -> Expr {
        match self {
            Expr::Parameter(name) if name == from => Expr::Parameter(to.to_string()),
            Expr::Parameter(_) | Expr::Constant(_) => self.clone(),
            Expr::Member { target, name } => Expr::Member {
                target: Box::new(target.rebind(from, to)),
                name: name.clone(),
            },
            Expr::Binary { op, left, right } => Expr::Binary {
                op: *op,
                left: Box::new(left.rebind(from, to)),
                right: Box::new(right.rebind(from, to)),
            },
            Expr::Not(inner) => Expr::Not(Box::new(inner.rebind(from, to))),
            Expr::Call {
                method,
                target,
                argument,
            } => Expr::Call {
                method: *method,
                target: Box::new(target.rebind(from, to)),
                argument: Box::new(argument.rebind(from, to)),
            },
        }
    }

    /// The boolean value of a constant, if this is one
    pub fn as_bool_constant(&self) -> Option<bool> {
        match self {
            Expr::Constant(SqlValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }
}

/// Single-parameter expression used for projections and sort keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lambda {
    pub parameter: String,
    pub body: Expr,
}

impl Lambda {
    pub fn new(parameter: impl Into<String>, build: impl FnOnce(Expr) -> Expr) -> Self {
        let parameter = parameter.into();
        let body = build(Expr::param(parameter.clone()));
        Self { parameter, body }
    }
}
