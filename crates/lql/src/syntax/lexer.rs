//! LQL lexer built with chumsky.
//!
//! Produces a flat token stream with byte spans. Whitespace and `--` line
//! comments are skipped.

use crate::error::{LqlError, Result, SourceLocation};
use crate::syntax::token::{Keyword, Token};
use chumsky::prelude::*;
use tracing::debug;

/// Byte span into the source text, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering `self` through `other`
    pub fn to(self, other: Span) -> Span {
        Span::new(self.start.min(other.start), self.end.max(other.end))
    }
}

/// A value paired with its source span
pub type Spanned<T> = (T, Span);

type Extra<'src> = extra::Err<Rich<'src, char>>;

/// Tokenize LQL source.
///
/// The first unrecognized character is reported as a [`LqlError::Lexical`].
pub fn tokenize(source: &str) -> Result<Vec<Spanned<Token>>> {
    let tokens = lexer()
        .parse(source)
        .into_result()
        .map_err(|errs| lexical_error(&errs, source))?;

    debug!(tokens = tokens.len(), "Lexed LQL source");
    Ok(tokens)
}

fn lexical_error(errs: &[Rich<'_, char>], source: &str) -> LqlError {
    let Some(err) = errs.first() else {
        return LqlError::Lexical {
            message: "Unrecognized input".to_string(),
            location: SourceLocation::start_of(source),
        };
    };

    let span = err.span();
    let message = match err.found() {
        Some(c) => format!("Unrecognized token '{}'", c),
        None => "Unexpected end of input".to_string(),
    };

    LqlError::Lexical {
        message,
        location: SourceLocation::from_byte_range(source, span.start, span.end),
    }
}

fn lexer<'src>() -> impl Parser<'src, &'src str, Vec<Spanned<Token>>, Extra<'src>> {
    // [A-Za-z_][A-Za-z0-9_]*
    let word = any()
        .filter(|c: &char| c.is_ascii_alphabetic() || *c == '_')
        .then(
            any()
                .filter(|c: &char| c.is_ascii_alphanumeric() || *c == '_')
                .repeated(),
        )
        .to_slice();

    // word ('.' word)*
    let path = word
        .clone()
        .then(just('.').then(word.clone()).repeated())
        .to_slice();

    // table.*
    let table_wildcard = path
        .clone()
        .then_ignore(just(".*"))
        .map(|table: &str| Token::TableWildcard(table.to_string()));

    let name = path.map(|s: &str| {
        if s.contains('.') {
            Token::Qualified(s.split('.').map(str::to_string).collect())
        } else if let Some(kw) = Keyword::from_word(s) {
            Token::Keyword(kw)
        } else {
            Token::Ident(s.to_string())
        }
    });

    let digits = any()
        .filter(|c: &char| c.is_ascii_digit())
        .repeated()
        .at_least(1);

    let number = digits
        .clone()
        .then(just('.').then(digits).or_not())
        .to_slice()
        .map(|s: &str| {
            if s.contains('.') {
                Token::Decimal(s.to_string())
            } else {
                Token::Int(s.to_string())
            }
        });

    // 'it''s' -> it's
    let string = just('\'')
        .ignore_then(
            none_of("'")
                .or(just("''").to('\''))
                .repeated()
                .collect::<String>(),
        )
        .then_ignore(just('\''))
        .map(Token::Str);

    let param = just('@')
        .ignore_then(word)
        .map(|s: &str| Token::Param(s.to_string()));

    // Longer operators first
    let op = choice((
        just("|>").to(Token::Pipe),
        just("=>").to(Token::Arrow),
        just("==").to(Token::EqEq),
        just("!=").to(Token::NotEq),
        just("<>").to(Token::NotEq),
        just("<=").to(Token::LtEq),
        just(">=").to(Token::GtEq),
        just("||").to(Token::Concat),
        just('=').to(Token::Eq),
        just('<').to(Token::Lt),
        just('>').to(Token::Gt),
        just('+').to(Token::Plus),
        just('-').to(Token::Minus),
        just('*').to(Token::Star),
        just('/').to(Token::Slash),
        just('%').to(Token::Percent),
        just('(').to(Token::LParen),
        just(')').to(Token::RParen),
        just(',').to(Token::Comma),
    ));

    let token = choice((table_wildcard, name, number, string, param, op));

    let comment = just("--")
        .then(none_of("\n").repeated())
        .padded()
        .ignored();

    token
        .map_with(|tok, e| {
            let span: SimpleSpan = e.span();
            (tok, Span::new(span.start, span.end))
        })
        .padded_by(comment.clone().repeated())
        .padded()
        .repeated()
        .collect::<Vec<_>>()
        .padded_by(comment.repeated())
        .padded()
}
