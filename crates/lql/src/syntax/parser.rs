//! Chumsky parser from tokens to the syntax tree.
//!
//! Grammar:
//! ```text
//! program   := statement+ EOF
//! statement := 'let' IDENT '=' pipeExpr | pipeExpr
//! pipeExpr  := expr ('|>' expr)*
//! expr      := or
//! or        := and ('or' and)*
//! and       := not ('and' not)*
//! not       := 'not' not | compare
//! compare   := additive (cmpOp additive | 'is' 'not'? 'null'
//!              | 'not'? 'in' '(' list ')' | 'not'? 'like' additive)?
//! additive  := mul (('+' | '-' | '||') mul)*
//! mul       := unary (('*' | '/' | '%') unary)*
//! unary     := '-' unary | primary
//! primary   := literal | param | '*' | table.* | ident | qualified
//!            | call | lambda | case | 'exists' '(' pipeExpr ')'
//!            | '(' pipeExpr ')'
//! ```
//! Function arguments additionally accept `on = expr`, `expr AS alias`
//! and `expr ASC|DESC`.

use crate::error::{LqlError, Result, SourceLocation};
use crate::syntax::lexer::{Span, Spanned};
use crate::syntax::token::{Keyword, Token};
use crate::syntax::tree::{
    BinaryOp, Call, CaseExpr, Direction, Expr, ExprKind, Literal, PipeExpr, Program, Statement,
    UnaryOp, WindowSpec,
};
use chumsky::error::RichReason;
use chumsky::input::ValueInput;
use chumsky::prelude::*;
use tracing::debug;

type Extra<'tokens> = extra::Err<Rich<'tokens, Token>>;

/// Parse a token stream into a [`Program`].
///
/// Stops at the first grammar violation.
pub fn parse_program(source: &str, tokens: &[Spanned<Token>]) -> Result<Program> {
    if tokens.is_empty() {
        return Err(LqlError::Syntax {
            message: "Empty query: expected a statement".to_string(),
            location: SourceLocation::from_byte_range(source, 0, 0),
        });
    }

    let input: Vec<(Token, SimpleSpan)> = tokens
        .iter()
        .map(|(tok, span)| (tok.clone(), SimpleSpan::from(span.start..span.end)))
        .collect();
    let eoi = SimpleSpan::from(source.len()..source.len());

    let program = program_parser()
        .parse(input.as_slice().split_token_span(eoi))
        .into_result()
        .map_err(|errs| syntax_error(&errs, source))?;

    debug!(statements = program.statements.len(), "Parsed LQL program");
    Ok(program)
}

fn syntax_error(errs: &[Rich<'_, Token>], source: &str) -> LqlError {
    let Some(err) = errs.first() else {
        return LqlError::Syntax {
            message: "Invalid query".to_string(),
            location: SourceLocation::start_of(source),
        };
    };

    let span = err.span();
    let found = err
        .found()
        .map_or_else(|| "end of input".to_string(), |tok| format!("'{}'", tok));

    let mut expected: Vec<String> = err.expected().map(ToString::to_string).collect();
    expected.sort();
    expected.dedup();

    let message = match err.reason() {
        RichReason::Custom(msg) => msg.clone(),
        _ if expected.is_empty() => format!("Unexpected {}", found),
        _ => format!("Expected {} but found {}", expected.join(" or "), found),
    };

    LqlError::Syntax {
        message,
        location: SourceLocation::from_byte_range(source, span.start, span.end),
    }
}

fn to_span(span: SimpleSpan) -> Span {
    Span::new(span.start, span.end)
}

fn binary(op: BinaryOp, left: Expr, right: Expr) -> Expr {
    let span = left.span.to(right.span);
    Expr::new(
        ExprKind::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        },
        span,
    )
}

fn unary(op: UnaryOp, start: Span, operand: Expr) -> Expr {
    let span = start.to(operand.span);
    Expr::new(
        ExprKind::Unary {
            op,
            operand: Box::new(operand),
        },
        span,
    )
}

fn ordered(expr: Expr, direction: Option<Direction>, span: SimpleSpan) -> Expr {
    match direction {
        Some(direction) => Expr::new(
            ExprKind::Ordered {
                expr: Box::new(expr),
                direction,
            },
            to_span(span),
        ),
        None => expr,
    }
}

/// Single-term pipes collapse to their term
fn unwrap_pipe(mut pipe: PipeExpr, wrap: impl FnOnce(Expr) -> ExprKind, span: Span) -> Expr {
    if pipe.terms.len() == 1 {
        let term = pipe.terms.remove(0);
        Expr::new(wrap(term), span)
    } else {
        Expr::new(ExprKind::Pipe(Box::new(pipe)), span)
    }
}

/// Trailing part of a comparison-level expression
enum CompareTail {
    Binary(BinaryOp, Expr),
    IsNull(bool),
    InList(bool, Vec<Expr>),
    Like(bool, Expr),
}

// ============================================================================
// Terminals
// ============================================================================

fn kw<'tokens, I>(keyword: Keyword) -> impl Parser<'tokens, I, Token, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    just(Token::Keyword(keyword))
}

fn ident<'tokens, I>() -> impl Parser<'tokens, I, (String, Span), Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    select! { Token::Ident(name) = e => (name, to_span(e.span())) }.labelled("identifier")
}

// ============================================================================
// Statements
// ============================================================================

fn program_parser<'tokens, I>() -> impl Parser<'tokens, I, Program, Extra<'tokens>>
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    let pipe = pipe_parser(expr_parser());

    let let_statement = kw(Keyword::Let)
        .ignore_then(ident().labelled("variable name after 'let'"))
        .then_ignore(just(Token::Eq).labelled("'=' after variable name"))
        .then(pipe.clone())
        .map(|((name, name_span), value)| Statement::Let {
            name,
            name_span,
            value,
        });

    let statement = let_statement.or(pipe.map(Statement::Pipe));

    statement
        .repeated()
        .at_least(1)
        .collect::<Vec<_>>()
        .then_ignore(end())
        .map(|statements| Program { statements })
}

/// `expr ('|>' expr)*`
fn pipe_parser<'tokens, I, P>(expr: P) -> impl Parser<'tokens, I, PipeExpr, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
    P: Parser<'tokens, I, Expr, Extra<'tokens>> + Clone,
{
    expr.separated_by(just(Token::Pipe))
        .at_least(1)
        .collect::<Vec<_>>()
        .map_with(|terms, e| PipeExpr {
            terms,
            span: to_span(e.span()),
        })
}

// ============================================================================
// Expressions
// ============================================================================

fn expr_parser<'tokens, I>() -> impl Parser<'tokens, I, Expr, Extra<'tokens>> + Clone
where
    I: ValueInput<'tokens, Token = Token, Span = SimpleSpan>,
{
    recursive(|expr| {
        let pipe = pipe_parser(expr.clone());
        let comma = just(Token::Comma);

        let direction = choice((
            kw(Keyword::Asc).to(Direction::Asc),
            kw(Keyword::Desc).to(Direction::Desc),
        ));

        let ordered_expr = expr
            .clone()
            .then(direction.clone().or_not())
            .map_with(|(expr, direction), e| ordered(expr, direction, e.span()));

        // on = a.id = b.id
        let named = kw(Keyword::On)
            .ignore_then(just(Token::Eq))
            .ignore_then(expr.clone())
            .map_with(|value, e| {
                Expr::new(
                    ExprKind::Named {
                        name: "on".to_string(),
                        value: Box::new(value),
                    },
                    to_span(e.span()),
                )
            });

        // expr [AS alias] [ASC|DESC]
        let aliased = expr
            .clone()
            .then(
                kw(Keyword::As)
                    .ignore_then(ident().labelled("alias after AS"))
                    .or_not(),
            )
            .map_with(|(expr, alias), e| match alias {
                Some((alias, _)) => Expr::new(
                    ExprKind::Aliased {
                        expr: Box::new(expr),
                        alias,
                    },
                    to_span(e.span()),
                ),
                None => expr,
            });
        let argument = named.or(aliased
            .then(direction.or_not())
            .map_with(|(expr, direction), e| ordered(expr, direction, e.span())));

        let window = kw(Keyword::Partition)
            .ignore_then(kw(Keyword::By))
            .ignore_then(
                expr.clone()
                    .separated_by(comma.clone())
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .or_not()
            .then(
                kw(Keyword::Order)
                    .ignore_then(kw(Keyword::By))
                    .ignore_then(
                        ordered_expr
                            .separated_by(comma.clone())
                            .at_least(1)
                            .collect::<Vec<_>>(),
                    )
                    .or_not(),
            )
            .delimited_by(
                just(Token::LParen).labelled("'(' after OVER"),
                just(Token::RParen).labelled("')' to close OVER clause"),
            )
            .map(|(partition_by, order_by)| WindowSpec {
                partition_by: partition_by.unwrap_or_default(),
                order_by: order_by.unwrap_or_default(),
            });

        let call = ident()
            .then_ignore(just(Token::LParen))
            .then(kw(Keyword::Distinct).or_not().map(|d| d.is_some()))
            .then(
                argument
                    .separated_by(comma.clone())
                    .collect::<Vec<_>>(),
            )
            .then_ignore(just(Token::RParen).labelled("')' to close call"))
            .then(kw(Keyword::Over).ignore_then(window).or_not())
            .map_with(|((((name, name_span), distinct), args), over), e| {
                Expr::new(
                    ExprKind::Call(Call {
                        name,
                        name_span,
                        distinct,
                        args,
                        over,
                    }),
                    to_span(e.span()),
                )
            });

        // fn(a, b) => body
        let lambda = kw(Keyword::Fn)
            .ignore_then(
                ident()
                    .map(|(name, _)| name)
                    .labelled("lambda parameter name")
                    .separated_by(comma.clone())
                    .at_least(1)
                    .collect::<Vec<_>>()
                    .delimited_by(
                        just(Token::LParen).labelled("'(' after fn"),
                        just(Token::RParen),
                    ),
            )
            .then_ignore(just(Token::Arrow).labelled("'=>' after lambda parameters"))
            .then(expr.clone())
            .map_with(|(params, body), e| {
                Expr::new(
                    ExprKind::Lambda {
                        params,
                        body: Box::new(body),
                    },
                    to_span(e.span()),
                )
            });

        let case = kw(Keyword::Case)
            .ignore_then(expr.clone().or_not())
            .then(
                kw(Keyword::When)
                    .ignore_then(expr.clone())
                    .then_ignore(kw(Keyword::Then))
                    .then(expr.clone())
                    .repeated()
                    .at_least(1)
                    .collect::<Vec<_>>(),
            )
            .then(kw(Keyword::Else).ignore_then(expr.clone()).or_not())
            .then_ignore(kw(Keyword::End))
            .map_with(|((operand, branches), otherwise), e| {
                Expr::new(
                    ExprKind::Case(CaseExpr {
                        operand: operand.map(Box::new),
                        branches,
                        otherwise: otherwise.map(Box::new),
                    }),
                    to_span(e.span()),
                )
            });

        let exists = kw(Keyword::Exists)
            .ignore_then(pipe.clone().delimited_by(
                just(Token::LParen).labelled("'(' after EXISTS"),
                just(Token::RParen).labelled("')' to close EXISTS"),
            ))
            .map_with(|inner, e| Expr::new(ExprKind::Exists(Box::new(inner)), to_span(e.span())));

        let paren = pipe
            .clone()
            .delimited_by(just(Token::LParen), just(Token::RParen))
            .map_with(|inner, e| {
                unwrap_pipe(inner, |term| ExprKind::Paren(Box::new(term)), to_span(e.span()))
            });

        let terminal = select! {
            Token::Int(value) => ExprKind::Literal(Literal::Int(value)),
            Token::Decimal(value) => ExprKind::Literal(Literal::Decimal(value)),
            Token::Str(value) => ExprKind::Literal(Literal::Str(value)),
            Token::Keyword(Keyword::Null) => ExprKind::Literal(Literal::Null),
            Token::Param(name) => ExprKind::Param(name),
            Token::Star => ExprKind::Wildcard(None),
            Token::TableWildcard(table) => ExprKind::Wildcard(Some(table)),
            Token::Qualified(parts) => ExprKind::Qualified(parts),
        }
        .map_with(|kind, e| Expr::new(kind, to_span(e.span())));

        let name = ident().map(|(name, span)| Expr::new(ExprKind::Ident(name), span));

        let primary = choice((terminal, call, name, lambda, case, exists, paren))
            .labelled("an expression")
            .boxed();

        let neg = just(Token::Minus)
            .map_with(|_, e| to_span(e.span()))
            .repeated()
            .foldr(primary, |start, operand| unary(UnaryOp::Neg, start, operand));

        let product = neg.clone().foldl(
            select! {
                Token::Star => BinaryOp::Mul,
                Token::Slash => BinaryOp::Div,
                Token::Percent => BinaryOp::Mod,
            }
            .then(neg)
            .repeated(),
            |left, (op, right)| binary(op, left, right),
        );

        let sum = product.clone().foldl(
            select! {
                Token::Plus => BinaryOp::Add,
                Token::Minus => BinaryOp::Sub,
                Token::Concat => BinaryOp::Concat,
            }
            .then(product)
            .repeated(),
            |left, (op, right)| binary(op, left, right),
        );

        let comparison = select! {
            Token::Eq => BinaryOp::Eq,
            Token::EqEq => BinaryOp::Eq,
            Token::NotEq => BinaryOp::NotEq,
            Token::Lt => BinaryOp::Lt,
            Token::Gt => BinaryOp::Gt,
            Token::LtEq => BinaryOp::LtEq,
            Token::GtEq => BinaryOp::GtEq,
        };
        let negated = kw(Keyword::Not).or_not().map(|n| n.is_some());

        // IN list entries may be values or sub-pipelines
        let in_item =
            pipe.map_with(|inner, e| unwrap_pipe(inner, |term| term.kind, to_span(e.span())));

        let tail = choice((
            comparison
                .then(sum.clone())
                .map(|(op, right)| CompareTail::Binary(op, right)),
            kw(Keyword::Is)
                .ignore_then(negated.clone())
                .then_ignore(kw(Keyword::Null))
                .map(CompareTail::IsNull),
            negated
                .clone()
                .then_ignore(kw(Keyword::In))
                .then(
                    in_item
                        .separated_by(comma)
                        .collect::<Vec<_>>()
                        .delimited_by(
                            just(Token::LParen).labelled("'(' after IN"),
                            just(Token::RParen).labelled("')' to close IN list"),
                        ),
                )
                .map(|(negated, items)| CompareTail::InList(negated, items)),
            negated
                .then_ignore(kw(Keyword::Like))
                .then(sum.clone())
                .map(|(negated, pattern)| CompareTail::Like(negated, pattern)),
        ));

        let compare = sum
            .then(tail.or_not())
            .map_with(|(left, tail), e| {
                let span = to_span(e.span());
                let operand = Box::new(left);
                let kind = match tail {
                    None => return *operand,
                    Some(CompareTail::Binary(op, right)) => return binary(op, *operand, right),
                    Some(CompareTail::IsNull(negated)) => ExprKind::IsNull { operand, negated },
                    Some(CompareTail::InList(negated, items)) => ExprKind::InList {
                        operand,
                        items,
                        negated,
                    },
                    Some(CompareTail::Like(negated, pattern)) => ExprKind::Like {
                        operand,
                        pattern: Box::new(pattern),
                        negated,
                    },
                };
                Expr::new(kind, span)
            });

        let not = kw(Keyword::Not)
            .map_with(|_, e| to_span(e.span()))
            .repeated()
            .foldr(compare, |start, operand| unary(UnaryOp::Not, start, operand));

        let and = not.clone().foldl(
            kw(Keyword::And).ignore_then(not).repeated(),
            |left, right| binary(BinaryOp::And, left, right),
        );

        and.clone()
            .foldl(kw(Keyword::Or).ignore_then(and).repeated(), |left, right| {
                binary(BinaryOp::Or, left, right)
            })
            .boxed()
    })
}
