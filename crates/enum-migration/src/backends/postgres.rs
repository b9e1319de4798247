//! PostgreSQL executor
//!
//! Runs migration statements through sqlx on a connection owned by the
//! caller. Pass `&mut *transaction` so every statement joins the caller's
//! transaction.

use async_trait::async_trait;
use sqlx::{Executor, PgConnection};
use tracing::debug;

use super::core::SqlExecutor;
use crate::error::ExecutorError;

/// Executor over a borrowed PostgreSQL connection
pub struct PgExecutor<'c> {
    conn: &'c mut PgConnection,
}

impl<'c> PgExecutor<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self { conn }
    }

    /// Get the underlying connection
    pub fn connection(&mut self) -> &mut PgConnection {
        &mut *self.conn
    }
}

#[async_trait]
impl<'c> SqlExecutor for PgExecutor<'c> {
    async fn execute(&mut self, statement: &str) -> Result<u64, ExecutorError> {
        // Simple query protocol: DDL is not worth caching as a prepared statement
        let result = (&mut *self.conn).execute(statement).await.map_err(|e| {
            debug!("Statement failed: {}", e);
            ExecutorError::from(e)
        })?;

        Ok(result.rows_affected())
    }
}
