//! Token definitions for LQL source text.

use std::fmt;

/// Case-insensitive reserved words.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Let,
    Fn,
    Asc,
    Desc,
    And,
    Or,
    Distinct,
    Exists,
    Null,
    Is,
    Not,
    In,
    As,
    Like,
    Case,
    When,
    Then,
    Else,
    End,
    Over,
    Partition,
    By,
    Order,
    On,
}

impl Keyword {
    /// Classify a bare word, ignoring case
    pub fn from_word(word: &str) -> Option<Self> {
        let kw = match word.to_ascii_lowercase().as_str() {
            "let" => Keyword::Let,
            "fn" => Keyword::Fn,
            "asc" => Keyword::Asc,
            "desc" => Keyword::Desc,
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "distinct" => Keyword::Distinct,
            "exists" => Keyword::Exists,
            "null" => Keyword::Null,
            "is" => Keyword::Is,
            "not" => Keyword::Not,
            "in" => Keyword::In,
            "as" => Keyword::As,
            "like" => Keyword::Like,
            "case" => Keyword::Case,
            "when" => Keyword::When,
            "then" => Keyword::Then,
            "else" => Keyword::Else,
            "end" => Keyword::End,
            "over" => Keyword::Over,
            "partition" => Keyword::Partition,
            "by" => Keyword::By,
            "order" => Keyword::Order,
            "on" => Keyword::On,
            _ => return None,
        };
        Some(kw)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Let => "let",
            Keyword::Fn => "fn",
            Keyword::Asc => "ASC",
            Keyword::Desc => "DESC",
            Keyword::And => "AND",
            Keyword::Or => "OR",
            Keyword::Distinct => "DISTINCT",
            Keyword::Exists => "EXISTS",
            Keyword::Null => "NULL",
            Keyword::Is => "IS",
            Keyword::Not => "NOT",
            Keyword::In => "IN",
            Keyword::As => "AS",
            Keyword::Like => "LIKE",
            Keyword::Case => "CASE",
            Keyword::When => "WHEN",
            Keyword::Then => "THEN",
            Keyword::Else => "ELSE",
            Keyword::End => "END",
            Keyword::Over => "OVER",
            Keyword::Partition => "PARTITION",
            Keyword::By => "BY",
            Keyword::Order => "ORDER",
            Keyword::On => "ON",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Token {
    Keyword(Keyword),
    /// Plain identifier
    Ident(String),
    /// Dotted identifier with two or more parts: `table.column`
    Qualified(Vec<String>),
    /// `table.*`
    TableWildcard(String),
    /// Bind parameter without the leading `@`
    Param(String),
    /// String literal with quotes removed and `''` unescaped
    Str(String),
    Int(String),
    Decimal(String),
    /// `|>`
    Pipe,
    /// `=>`
    Arrow,
    /// `=` (also used for named arguments)
    Eq,
    /// `==`
    EqEq,
    /// `!=` or `<>`
    NotEq,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    /// `||`
    Concat,
    LParen,
    RParen,
    Comma,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Keyword(kw) => write!(f, "{}", kw.as_str()),
            Token::Ident(s) => write!(f, "{}", s),
            Token::Qualified(parts) => write!(f, "{}", parts.join(".")),
            Token::TableWildcard(t) => write!(f, "{}.*", t),
            Token::Param(p) => write!(f, "@{}", p),
            Token::Str(s) => write!(f, "'{}'", s),
            Token::Int(s) | Token::Decimal(s) => write!(f, "{}", s),
            Token::Pipe => write!(f, "|>"),
            Token::Arrow => write!(f, "=>"),
            Token::Eq => write!(f, "="),
            Token::EqEq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Star => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Percent => write!(f, "%"),
            Token::Concat => write!(f, "||"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::Comma => write!(f, ","),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_are_case_insensitive() {
        assert_eq!(Keyword::from_word("DESC"), Some(Keyword::Desc));
        assert_eq!(Keyword::from_word("desc"), Some(Keyword::Desc));
        assert_eq!(Keyword::from_word("Partition"), Some(Keyword::Partition));
        assert_eq!(Keyword::from_word("order_by"), None);
    }
}
