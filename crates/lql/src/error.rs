//! Error types for the LQL compiler.
//!
//! Every failure that can be traced back to the source text carries a
//! [`SourceLocation`], so callers can point at the offending fragment.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type alias for compiler operations
pub type Result<T> = std::result::Result<T, LqlError>;

/// Position of a fragment inside the original source text.
///
/// `line` is 1-based, `column` is 0-based. `start`/`stop` are character
/// offsets into the source; `stop` is exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
    pub start: usize,
    pub stop: usize,
    /// The offending source line with a caret underline, when available
    pub snippet: Option<String>,
}

impl SourceLocation {
    /// Locate a byte range inside `source`.
    ///
    /// Byte offsets are converted to character offsets so multi-byte input
    /// reports the same positions an editor would.
    pub fn from_byte_range(source: &str, start: usize, end: usize) -> Self {
        let start = clamp_to_boundary(source, start);
        let end = clamp_to_boundary(source, end.max(start));

        let before = &source[..start];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map_or(0, |i| i + 1);
        let column = source[line_start..start].chars().count();

        let char_start = before.chars().count();
        let char_stop = char_start + source[start..end].chars().count();

        Self {
            line,
            column,
            start: char_start,
            stop: char_stop,
            snippet: Some(render_snippet(source, line_start, column, char_stop - char_start)),
        }
    }

    /// Location of the very beginning of the source
    pub fn start_of(source: &str) -> Self {
        Self::from_byte_range(source, 0, 0)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Line {}, column {}", self.line, self.column)
    }
}

fn clamp_to_boundary(source: &str, mut idx: usize) -> usize {
    idx = idx.min(source.len());
    while !source.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

fn render_snippet(source: &str, line_start: usize, column: usize, width: usize) -> String {
    let line = source[line_start..].lines().next().unwrap_or("");
    let underline = "^".repeat(width.max(1));
    format!("{}\n{}{}", line, " ".repeat(column), underline)
}

/// Errors produced while parsing, lowering or rendering LQL.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LqlError {
    /// Unrecognized token
    #[error("{location}: {message}")]
    Lexical {
        message: String,
        location: SourceLocation,
    },

    /// Grammar violation
    #[error("{location}: {message}")]
    Syntax {
        message: String,
        location: SourceLocation,
    },

    /// Undefined variable, circular `let`, invalid identifier or missing pipe
    #[error("{location}: {message}")]
    Semantic {
        message: String,
        location: SourceLocation,
    },

    /// Grammar-valid construct with no lowering rule
    #[error("Unsupported construct: {message}")]
    UnsupportedConstruct {
        message: String,
        location: Option<SourceLocation>,
    },

    /// Unexpected renderer fault
    #[error("Dialect render error ({dialect}): {message}")]
    DialectRender { dialect: String, message: String },
}

impl LqlError {
    /// Short, position-free message
    pub fn message(&self) -> &str {
        match self {
            LqlError::Lexical { message, .. }
            | LqlError::Syntax { message, .. }
            | LqlError::Semantic { message, .. }
            | LqlError::UnsupportedConstruct { message, .. }
            | LqlError::DialectRender { message, .. } => message,
        }
    }

    /// Source position, when one could be derived
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            LqlError::Lexical { location, .. }
            | LqlError::Syntax { location, .. }
            | LqlError::Semantic { location, .. } => Some(location),
            LqlError::UnsupportedConstruct { location, .. } => location.as_ref(),
            LqlError::DialectRender { .. } => None,
        }
    }

    pub(crate) fn unsupported(message: impl Into<String>, location: Option<SourceLocation>) -> Self {
        LqlError::UnsupportedConstruct {
            message: message.into(),
            location,
        }
    }
}

/// Errors raised while loading [`crate::LqlConfig`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
