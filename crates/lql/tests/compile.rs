//! End-to-end LQL to SQL across all dialects.

use insta::assert_snapshot;
use lql::render::render_statement;
use lql::{compile, Dialect, LqlCompiler, LqlConfig, ParameterInfo};
use test_case::test_case;

fn sql(source: &str, dialect: Dialect) -> String {
    compile(source, dialect)
        .unwrap_or_else(|e| panic!("Failed to compile {:?}: {}", source, e))
        .sql
}

// =============================================================================
// Projections and filters
// =============================================================================

#[test_case(Dialect::Sqlite ; "sqlite")]
#[test_case(Dialect::PostgreSql ; "postgres")]
#[test_case(Dialect::SqlServer ; "sqlserver")]
fn test_simple_select_is_dialect_neutral(dialect: Dialect) {
    assert_eq!(
        sql("users |> select(users.id, users.name, users.email)", dialect),
        "SELECT users.id, users.name, users.email FROM users"
    );
}

#[test]
fn test_select_then_range_filter() {
    let source = "employees |> select(employees.id, employees.name, employees.salary) |> filter(fn(row) => row.employees.salary > 50000 and row.employees.salary < 100000)";
    assert_snapshot!(sql(source, Dialect::PostgreSql), @"SELECT employees.id, employees.name, employees.salary FROM employees WHERE employees.salary > 50000 AND employees.salary < 100000");
}

#[test]
fn test_or_filter_keeps_grouping_when_combined() {
    let source = "products |> filter(fn(p) => p.products.price < 10 or p.products.stock = 0) |> filter(fn(p) => p.products.active = 1)";
    assert_snapshot!(sql(source, Dialect::Sqlite), @"SELECT * FROM products WHERE (products.price < 10 OR products.stock = 0) AND products.active = 1");
}

#[test]
fn test_correlated_exists_drops_both_lambda_prefixes() {
    let source = "users |> filter(fn(u) => exists(orders |> filter(fn(o) => o.orders.user_id = u.users.id)))";
    assert_snapshot!(sql(source, Dialect::Sqlite), @"SELECT * FROM users WHERE EXISTS (SELECT * FROM orders WHERE orders.user_id = users.id)");
}

#[test]
fn test_filter_without_lambda() {
    assert_eq!(
        sql("users |> filter(id = 1)", Dialect::Sqlite),
        "SELECT * FROM users WHERE id = 1"
    );
}

#[test]
fn test_bare_table() {
    assert_eq!(sql("users", Dialect::Sqlite), "SELECT * FROM users");
}

// =============================================================================
// Joins
// =============================================================================

#[test]
fn test_join_chain_keeps_declaration_order() {
    let source = "customers |> join(orders, on = customers.id = orders.customer_id) |> left_join(payments, on = orders.id = payments.order_id) |> select(customers.name, payments.amount)";
    let sql = sql(source, Dialect::PostgreSql);
    assert_snapshot!(sql, @"SELECT customers.name, payments.amount FROM customers INNER JOIN orders ON customers.id = orders.customer_id LEFT JOIN payments ON orders.id = payments.order_id");

    let customers = sql.find("FROM customers").unwrap();
    let orders = sql.find("JOIN orders").unwrap();
    let payments = sql.find("JOIN payments").unwrap();
    assert!(customers < orders && orders < payments);
}

// =============================================================================
// Row limiting
// =============================================================================

#[test_case(Dialect::Sqlite, "SELECT * FROM orders ORDER BY orders.created DESC LIMIT 10 OFFSET 20" ; "sqlite")]
#[test_case(Dialect::PostgreSql, "SELECT * FROM orders ORDER BY orders.created DESC LIMIT 10 OFFSET 20" ; "postgres")]
#[test_case(Dialect::SqlServer, "SELECT * FROM orders ORDER BY orders.created DESC OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY" ; "sqlserver")]
fn test_paging(dialect: Dialect, expected: &str) {
    let source = "orders |> order_by(orders.created desc) |> offset(20) |> limit(10)";
    assert_eq!(sql(source, dialect), expected);
}

#[test_case(Dialect::Sqlite, "SELECT * FROM orders LIMIT 5" ; "sqlite")]
#[test_case(Dialect::PostgreSql, "SELECT * FROM orders LIMIT 5" ; "postgres")]
#[test_case(Dialect::SqlServer, "SELECT TOP 5 * FROM orders" ; "sqlserver")]
fn test_limit_only(dialect: Dialect, expected: &str) {
    assert_eq!(sql("orders |> limit(5)", dialect), expected);
}

#[test_case(Dialect::Sqlite, "SELECT * FROM users LIMIT @take" ; "sqlite")]
#[test_case(Dialect::PostgreSql, "SELECT * FROM users LIMIT @take" ; "postgres")]
#[test_case(Dialect::SqlServer, "SELECT TOP (@take) * FROM users" ; "sqlserver")]
fn test_parameter_limit(dialect: Dialect, expected: &str) {
    assert_eq!(sql("users |> limit(@take)", dialect), expected);
}

// =============================================================================
// Functions
// =============================================================================

#[test_case(Dialect::Sqlite, "SELECT LENGTH(users.name) AS len FROM users" ; "sqlite")]
#[test_case(Dialect::PostgreSql, "SELECT LENGTH(users.name) AS len FROM users" ; "postgres")]
#[test_case(Dialect::SqlServer, "SELECT LEN(users.name) AS len FROM users" ; "sqlserver")]
fn test_function_renames(dialect: Dialect, expected: &str) {
    assert_eq!(sql("users |> select(length(users.name) as len)", dialect), expected);
}

#[test]
fn test_grouping_with_having() {
    let source = "orders |> group_by(orders.customer) |> select(orders.customer, sum(orders.total) as revenue) |> having(fn(g) => sum(g.orders.total) > 1000) |> order_by(orders.customer)";
    assert_snapshot!(sql(source, Dialect::Sqlite), @"SELECT orders.customer, SUM(orders.total) AS revenue FROM orders GROUP BY orders.customer HAVING SUM(orders.total) > 1000 ORDER BY orders.customer ASC");
}

// =============================================================================
// Unions and inserts
// =============================================================================

#[test]
fn test_union_all_of_bound_pipeline() {
    let source = "let archived = archive |> select(archive.id)\norders |> select(orders.id) |> union_all(archived)";
    assert_snapshot!(sql(source, Dialect::Sqlite), @"SELECT orders.id FROM orders UNION ALL SELECT archive.id FROM archive");
}

#[test]
fn test_insert_takes_columns_from_projection() {
    let source = "users |> select(users.id, users.name as full_name) |> insert(archive)";
    assert_snapshot!(sql(source, Dialect::PostgreSql), @r"
    INSERT INTO archive (id, full_name)
    SELECT users.id, users.name AS full_name FROM users
    ");
}

#[test]
fn test_insert_with_union_is_parenthesized_on_postgres() {
    let source = "let old = archive |> select(archive.id)\nusers |> select(users.id) |> union(old) |> insert(backup)";
    assert_eq!(
        sql(source, Dialect::PostgreSql),
        "INSERT INTO backup (id)\n(SELECT users.id FROM users UNION SELECT archive.id FROM archive)"
    );
    assert_eq!(
        sql(source, Dialect::Sqlite),
        "INSERT INTO backup (id)\nSELECT users.id FROM users UNION SELECT archive.id FROM archive"
    );
}

#[test]
fn test_insert_with_union_text_in_literal_stays_flat() {
    let source = "users |> filter(fn(u) => u.users.note = ' UNION ') |> select(users.id) |> insert(backup)";
    assert_eq!(
        sql(source, Dialect::PostgreSql),
        "INSERT INTO backup (id)\nSELECT users.id FROM users WHERE users.note = ' UNION '"
    );
}

#[test]
fn test_now_renamed_outside_literals_only() {
    let source = "events |> select(now() as ts, 'NOW()' as label)";
    assert_eq!(
        sql(source, Dialect::Sqlite),
        "SELECT CURRENT_TIMESTAMP AS ts, 'NOW()' AS label FROM events"
    );
}

#[test]
fn test_insert_guesses_and_markers() {
    assert_eq!(
        sql("people |> insert(customers)", Dialect::Sqlite),
        "INSERT INTO customers (id, name, email)\nSELECT * FROM people"
    );
    assert_eq!(
        sql("people |> insert(audit)", Dialect::Sqlite),
        "INSERT INTO audit (/*UNKNOWN_COLUMNS*/)\nSELECT * FROM people"
    );

    let strict = LqlCompiler::new(LqlConfig {
        insert_column_guesses: false,
        ..LqlConfig::default()
    });
    let query = strict.compile("people |> insert(customers)", Dialect::Sqlite).unwrap();
    assert!(query.sql.contains("/*UNKNOWN_COLUMNS*/"));
}

// =============================================================================
// Parameters and metadata
// =============================================================================

#[test]
fn test_parameters_are_reported_in_order() {
    let query = compile(
        "users |> filter(fn(u) => u.users.age >= 18 and u.users.city = @city) |> offset(@skip) |> limit(@take)",
        Dialect::Sqlite,
    )
    .unwrap();
    assert_eq!(
        query.parameters,
        vec![
            ParameterInfo::new("city", "TEXT"),
            ParameterInfo::new("skip", "INTEGER"),
            ParameterInfo::new("take", "INTEGER"),
        ]
    );
    assert_snapshot!(query.sql, @"SELECT * FROM users WHERE users.age >= 18 AND users.city = @city LIMIT @take OFFSET @skip");
}

#[test_case(Dialect::Sqlite ; "sqlite")]
#[test_case(Dialect::PostgreSql ; "postgres")]
#[test_case(Dialect::SqlServer ; "sqlserver")]
fn test_rendering_statement_again_is_identical(dialect: Dialect) {
    let query = compile(
        "orders |> join(users, on = orders.user_id = users.id) |> filter(fn(o) => (o.orders.total > 10 or o.orders.vip = 1) and o.users.active = 1) |> select(orders.id) |> order_by(orders.id desc) |> offset(5) |> limit(5)",
        dialect,
    )
    .unwrap();
    let first = render_statement(&query.statement, dialect);
    let second = render_statement(&query.statement, dialect);
    assert_eq!(first, second);
    assert_eq!(first, query.sql);
}

#[test]
fn test_config_file_selects_default_dialect() {
    let config = LqlConfig::from_toml_str("default_dialect = \"sqlite\"\n").unwrap();
    let query = LqlCompiler::new(config).compile_default("orders |> offset(5)").unwrap();
    assert_eq!(query.sql, "SELECT * FROM orders LIMIT -1 OFFSET 5");
}
