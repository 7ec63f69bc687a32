//! Concrete syntax tree produced by the parser.
//!
//! These nodes mirror the grammar one-to-one and keep byte spans so the
//! lowering pass can report positions. They live only for one parse call.

use crate::syntax::lexer::Span;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// `let name = pipeExpr`
    Let {
        name: String,
        name_span: Span,
        value: PipeExpr,
    },
    Pipe(PipeExpr),
}

/// `expr ('|>' expr)*`
#[derive(Debug, Clone, PartialEq)]
pub struct PipeExpr {
    pub terms: Vec<Expr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Str(String),
    Int(String),
    Decimal(String),
    Null,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Or,
    And,
    Eq,
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Concat,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq => 3,
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Concat => 4,
            BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => 5,
        }
    }

    pub fn is_comparison(self) -> bool {
        self.precedence() == 3
    }

    pub fn as_sql(self) -> &'static str {
        match self {
            BinaryOp::Or => "OR",
            BinaryOp::And => "AND",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Mod => "%",
            BinaryOp::Concat => "||",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Neg,
    Not,
}

/// Function call with optional `DISTINCT` argument prefix and `OVER (...)`
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub name: String,
    pub name_span: Span,
    pub distinct: bool,
    pub args: Vec<Expr>,
    pub over: Option<WindowSpec>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub partition_by: Vec<Expr>,
    /// Entries are plain expressions or [`ExprKind::Ordered`]
    pub order_by: Vec<Expr>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseExpr {
    /// `CASE operand WHEN ...` form
    pub operand: Option<Box<Expr>>,
    pub branches: Vec<(Expr, Expr)>,
    pub otherwise: Option<Box<Expr>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Ident(String),
    Qualified(Vec<String>),
    /// `*` or `table.*`
    Wildcard(Option<String>),
    Param(String),
    Literal(Literal),
    Call(Call),
    /// `fn(p1, p2) => body`
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
    Case(CaseExpr),
    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    IsNull {
        operand: Box<Expr>,
        negated: bool,
    },
    InList {
        operand: Box<Expr>,
        items: Vec<Expr>,
        negated: bool,
    },
    Like {
        operand: Box<Expr>,
        pattern: Box<Expr>,
        negated: bool,
    },
    Exists(Box<PipeExpr>),
    /// Parenthesized expression
    Paren(Box<Expr>),
    /// Parenthesized pipe expression with more than one term
    Pipe(Box<PipeExpr>),
    /// `expr AS alias`
    Aliased {
        expr: Box<Expr>,
        alias: String,
    },
    /// `expr ASC|DESC`
    Ordered {
        expr: Box<Expr>,
        direction: Direction,
    },
    /// `on = value` join argument, e.g. `on = a.id = b.id`
    Named {
        name: String,
        value: Box<Expr>,
    },
}
