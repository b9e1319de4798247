//! Shared PostgreSQL fixtures for the integration tests
//!
//! Tests connect through `TEST_DATABASE_URL` (or `DATABASE_URL`) and are
//! skipped when neither is set. Every test runs inside a transaction that is
//! rolled back, so fixtures never leak between tests.

#![allow(dead_code)]

use std::sync::Once;

use sqlx::{Connection, Executor, PgConnection};
use tracing_subscriber::EnvFilter;

static LOGGING: Once = Once::new();

pub fn init_logging() {
    LOGGING.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("enum_migration=debug"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

/// Connect to the test database, or `None` when no URL is configured
pub async fn connect() -> Option<PgConnection> {
    init_logging();

    let url = std::env::var("TEST_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()?;

    Some(
        PgConnection::connect(&url)
            .await
            .expect("failed to connect to the test database"),
    )
}

/// Run a statement with the simple query protocol
pub async fn exec(conn: &mut PgConnection, sql: &str) {
    conn.execute(sql)
        .await
        .unwrap_or_else(|e| panic!("statement failed: {}\n{}", sql, e));
}

/// Run a statement inside a savepoint and report whether it failed
///
/// The savepoint is rolled back either way so the surrounding transaction
/// stays usable.
pub async fn fails(conn: &mut PgConnection, sql: &str) -> bool {
    let mut savepoint = conn.begin().await.expect("failed to open savepoint");
    let failed = (&mut *savepoint).execute(sql).await.is_err();
    savepoint.rollback().await.expect("failed to roll back savepoint");
    failed
}

/// `state_enum ('on', 'off')` and `resources (state state_enum NOT NULL)`
pub async fn create_resources_table(conn: &mut PgConnection) {
    exec(conn, "CREATE TYPE state_enum AS ENUM ('on', 'off')").await;
    exec(conn, "CREATE TABLE resources (state state_enum NOT NULL)").await;
}

/// Same as [`create_resources_table`] with `DEFAULT 'on'`
pub async fn create_resources_table_with_default(conn: &mut PgConnection) {
    exec(conn, "CREATE TYPE state_enum AS ENUM ('on', 'off')").await;
    exec(
        conn,
        "CREATE TABLE resources (state state_enum NOT NULL DEFAULT 'on')",
    )
    .await;
}

/// Mixed-case variant: `"stateEnum"` and `"resourcesWithCamelCase"."stateColumn"`
pub async fn create_camel_case_table(conn: &mut PgConnection) {
    exec(
        conn,
        "CREATE TYPE \"stateEnum\" AS ENUM ('onState', 'offState')",
    )
    .await;
    exec(
        conn,
        "CREATE TABLE \"resourcesWithCamelCase\" (\"stateColumn\" \"stateEnum\" NOT NULL)",
    )
    .await;
}

/// Labels of an enum type in sort order
pub async fn enum_labels(conn: &mut PgConnection, quoted_type: &str) -> Vec<String> {
    sqlx::query_scalar::<_, String>(
        "SELECT enumlabel::text FROM pg_enum WHERE enumtypid = to_regtype($1) ORDER BY enumsortorder",
    )
    .bind(quoted_type)
    .fetch_all(&mut *conn)
    .await
    .expect("failed to read enum labels")
}

/// Whether a type name resolves
pub async fn type_exists(conn: &mut PgConnection, quoted_type: &str) -> bool {
    sqlx::query_scalar::<_, bool>("SELECT to_regtype($1) IS NOT NULL")
        .bind(quoted_type)
        .fetch_one(&mut *conn)
        .await
        .expect("failed to resolve type")
}

/// Declared type name and default expression of a column
pub async fn column_definition(
    conn: &mut PgConnection,
    table: &str,
    column: &str,
) -> (String, Option<String>) {
    sqlx::query_as::<_, (String, Option<String>)>(
        "SELECT udt_name::text, column_default::text FROM information_schema.columns \
         WHERE table_name = $1 AND column_name = $2",
    )
    .bind(table)
    .bind(column)
    .fetch_one(&mut *conn)
    .await
    .expect("failed to read column definition")
}

/// Current values of `resources.state`, sorted
pub async fn resource_states(conn: &mut PgConnection) -> Vec<String> {
    sqlx::query_scalar::<_, String>("SELECT state::text FROM resources ORDER BY state::text")
        .fetch_all(&mut *conn)
        .await
        .expect("failed to read resource states")
}
