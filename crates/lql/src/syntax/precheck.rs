//! Heuristic semantic checks over raw source text.
//!
//! These run after lexing and before parsing. Each check scans a copy of
//! the source with comments and string literals blanked out, so byte
//! offsets still line up with the original text. The first violation wins.

use crate::error::{LqlError, Result, SourceLocation};
use crate::syntax::token::Keyword;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// `word word(`: a table followed directly by a call
static MISSING_PIPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b([A-Za-z_]\w*)\s+([A-Za-z_]\w*)\s*\(").unwrap());

/// `let name = first_ident`
static LET_BINDING_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\blet\s+([A-Za-z_]\w*)\s*=\s*([A-Za-z_]\w*)").unwrap());

/// Identifier starting with a digit and containing an underscore
static DIGIT_IDENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d[A-Za-z0-9]*_\w*)").unwrap());

/// Bare name used as the base of a pipeline
static PIPE_BASE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)(?:^|=|\()\s*([A-Za-z_]\w*)\s*\|>").unwrap());

/// Run every check in order, stopping at the first failure.
pub fn run(source: &str) -> Result<()> {
    let text = blank_comments_and_strings(source);

    check_missing_pipe(source, &text)?;
    check_let_cycles(source, &text)?;
    check_digit_identifiers(source, &text)?;
    check_undefined_bases(source, &text)?;

    debug!("Semantic pre-checks passed");
    Ok(())
}

fn semantic(source: &str, message: String, start: usize, end: usize) -> LqlError {
    LqlError::Semantic {
        message,
        location: SourceLocation::from_byte_range(source, start, end),
    }
}

fn is_keyword(word: &str) -> bool {
    Keyword::from_word(word).is_some()
}

// ============================================================================
// Checks
// ============================================================================

fn check_missing_pipe(source: &str, text: &str) -> Result<()> {
    for caps in MISSING_PIPE_RE.captures_iter(text) {
        let (Some(table), Some(func)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        if is_keyword(table.as_str()) || is_keyword(func.as_str()) {
            continue;
        }
        return Err(semantic(
            source,
            format!(
                "Missing pipe operator '|>' between '{}' and '{}'",
                table.as_str(),
                func.as_str()
            ),
            func.start(),
            func.end(),
        ));
    }
    Ok(())
}

fn check_let_cycles(source: &str, text: &str) -> Result<()> {
    let mut bindings: Vec<(String, String, usize, usize)> = Vec::new();
    for caps in LET_BINDING_RE.captures_iter(text) {
        let (Some(name), Some(first)) = (caps.get(1), caps.get(2)) else {
            continue;
        };
        bindings.push((
            name.as_str().to_string(),
            first.as_str().to_string(),
            name.start(),
            name.end(),
        ));
    }

    let refs: HashMap<&str, &str> = bindings
        .iter()
        .map(|(name, first, _, _)| (name.as_str(), first.as_str()))
        .collect();

    for (name, _, _, _) in &bindings {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(name.as_str());
        let mut current = name.as_str();

        while let Some(&next) = refs.get(current) {
            if !visited.insert(next) {
                let (start, end) = bindings
                    .iter()
                    .find(|(n, _, _, _)| n == next)
                    .map(|(_, _, s, e)| (*s, *e))
                    .unwrap_or((0, 0));
                return Err(semantic(
                    source,
                    format!("Circular reference detected in variable '{}'", next),
                    start,
                    end,
                ));
            }
            current = next;
        }
    }
    Ok(())
}

fn check_digit_identifiers(source: &str, text: &str) -> Result<()> {
    if let Some(m) = DIGIT_IDENT_RE.find(text) {
        return Err(semantic(
            source,
            format!(
                "Invalid identifier '{}': identifiers cannot start with a number",
                m.as_str()
            ),
            m.start(),
            m.end(),
        ));
    }
    Ok(())
}

fn check_undefined_bases(source: &str, text: &str) -> Result<()> {
    let lets: Vec<(&str, usize)> = LET_BINDING_RE
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| (m.as_str(), m.start()))
        .collect();

    for caps in PIPE_BASE_RE.captures_iter(text) {
        let Some(base) = caps.get(1) else {
            continue;
        };
        let name = base.as_str();
        if !name.contains('_') || is_keyword(name) {
            continue;
        }
        let bound = lets
            .iter()
            .any(|(bound, offset)| *bound == name && *offset < base.start());
        if !bound {
            return Err(semantic(
                source,
                format!("Undefined variable '{}'", name),
                base.start(),
                base.end(),
            ));
        }
    }
    Ok(())
}

// ============================================================================
// Blanking
// ============================================================================

/// Replace comment and string-literal bytes with spaces, keeping newlines.
fn blank_comments_and_strings(source: &str) -> String {
    let mut out = String::with_capacity(source.len());
    let mut chars = source.chars().peekable();

    let blank = |out: &mut String, c: char| {
        if c == '\n' {
            out.push('\n');
        } else {
            out.extend(std::iter::repeat(' ').take(c.len_utf8()));
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '-' if chars.peek() == Some(&'-') => {
                blank(&mut out, c);
                while let Some(&next) = chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    blank(&mut out, next);
                    chars.next();
                }
            }
            '\'' => {
                blank(&mut out, c);
                while let Some(next) = chars.next() {
                    blank(&mut out, next);
                    if next == '\'' {
                        if chars.peek() == Some(&'\'') {
                            if let Some(escaped) = chars.next() {
                                blank(&mut out, escaped);
                            }
                        } else {
                            break;
                        }
                    }
                }
            }
            _ => out.push(c),
        }
    }
    out
}
