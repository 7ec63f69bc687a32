//! Error taxonomy and positions reported through the public entry points.

use lql::{compile, parse, Dialect, LqlCompiler, LqlConfig, LqlError};

fn error_of(source: &str) -> LqlError {
    match parse(source).into_result() {
        Ok(ast) => panic!("Expected an error for {:?}, got {:?}", source, ast),
        Err(err) => err,
    }
}

// =============================================================================
// Semantic pre-checks
// =============================================================================

#[test]
fn test_undefined_variable() {
    let err = error_of("recent_orders |> select(recent_orders.id)");
    assert!(matches!(err, LqlError::Semantic { .. }));
    assert_eq!(err.message(), "Undefined variable 'recent_orders'");

    let loc = err.location().unwrap();
    assert_eq!((loc.line, loc.column), (1, 0));
    assert_eq!((loc.start, loc.stop), (0, 13));
}

#[test]
fn test_identifier_starting_with_digit() {
    let err = error_of("2nd_table |> select(x)");
    assert!(matches!(err, LqlError::Semantic { .. }));
    assert!(err.message().ends_with("cannot start with a number"));
}

#[test]
fn test_missing_pipe_points_at_operation() {
    let err = error_of("users\n  select(users.id)");
    assert!(err.message().starts_with("Missing pipe operator"));
    let loc = err.location().unwrap();
    assert_eq!((loc.line, loc.column), (2, 2));
}

#[test]
fn test_prechecks_disabled_by_config() {
    let compiler = LqlCompiler::new(LqlConfig {
        run_prechecks: false,
        ..LqlConfig::default()
    });
    let query = compiler
        .compile("recent_orders |> select(recent_orders.id)", Dialect::Sqlite)
        .unwrap();
    assert_eq!(query.sql, "SELECT recent_orders.id FROM recent_orders");
}

// =============================================================================
// Lexical and syntax errors
// =============================================================================

#[test]
fn test_lexical_error_location() {
    let err = error_of("users\n|> filter(fn(u) => u.users.id # 1)");
    assert!(matches!(err, LqlError::Lexical { .. }));
    let loc = err.location().unwrap();
    assert_eq!(loc.line, 2);
    assert_eq!(loc.column, 30);
    let snippet = loc.snippet.as_deref().unwrap();
    assert!(snippet.contains('^'));
}

#[test]
fn test_unbalanced_call_is_syntax_error() {
    let err = error_of("users |> select(users.id");
    assert!(matches!(err, LqlError::Syntax { .. }));
    assert!(err.message().contains("end of input"));
}

#[test]
fn test_empty_source() {
    let err = error_of("   ");
    assert!(matches!(err, LqlError::Syntax { .. }));
}

#[test]
fn test_display_includes_position() {
    let err = error_of("users |> select(users.id");
    let text = err.to_string();
    assert!(text.starts_with("Line 1, column "), "got {}", text);
}

// =============================================================================
// Unsupported constructs
// =============================================================================

#[test]
fn test_unknown_operation() {
    let err = compile("users |> explode(users.id)", Dialect::Sqlite).unwrap_err();
    assert!(matches!(err, LqlError::UnsupportedConstruct { .. }));
    assert_eq!(err.message(), "Unknown pipeline operation 'explode'");
    assert_eq!(err.location().unwrap().column, 9);
}

#[test]
fn test_subquery_as_column() {
    let err = compile("users |> select((orders |> select(orders.id)))", Dialect::Sqlite).unwrap_err();
    assert_eq!(err.message(), "Sub-query cannot be used as a column");
    assert!(err.location().is_some());
}

#[test]
fn test_join_requires_condition() {
    let err = compile("users |> join(orders)", Dialect::PostgreSql).unwrap_err();
    assert!(matches!(err, LqlError::UnsupportedConstruct { .. }));
}
