//! Core SQL executor trait
//!
//! The executor is the only boundary between a migration and the database.
//! Implementations run statements inside the caller's transaction; only
//! [`SqlExecutor::execute`] is required, the type and quoting primitives have
//! PostgreSQL defaults built on top of it.

use async_trait::async_trait;

use crate::error::ExecutorError;
use crate::quoting;
use crate::statements;

/// Runs SQL statements inside the caller's transaction
#[async_trait]
pub trait SqlExecutor: Send {
    /// Execute a single statement and return the number of affected rows
    async fn execute(&mut self, statement: &str) -> Result<u64, ExecutorError>;

    /// Create an enum type with the given labels
    ///
    /// With `check_exists` the type is only created when no type of that name
    /// resolves; otherwise an existing type is reported by the database.
    async fn create_enum_type(
        &mut self,
        name: &str,
        values: &[String],
        check_exists: bool,
    ) -> Result<(), ExecutorError> {
        let type_name = self.quote_identifier(name);
        let labels: Vec<String> = values.iter().map(|value| self.quote_literal(value)).collect();

        let statement = if check_exists {
            statements::create_enum_type_if_missing(&self.quote_literal(&type_name), &type_name, &labels)
        } else {
            statements::create_enum_type(&type_name, &labels)
        };

        self.execute(&statement).await.map(|_| ())
    }

    /// Drop an enum type
    async fn drop_enum_type(&mut self, name: &str, check_exists: bool) -> Result<(), ExecutorError> {
        let statement = statements::drop_enum_type(&self.quote_identifier(name), check_exists);
        self.execute(&statement).await.map(|_| ())
    }

    /// Quote a value for embedding as a string literal
    fn quote_literal(&self, value: &str) -> String {
        quoting::quote_literal(value)
    }

    /// Quote a table, column or type name, preserving its case
    fn quote_identifier(&self, name: &str) -> String {
        quoting::quote_identifier(name)
    }
}

#[async_trait]
impl<E: SqlExecutor + ?Sized> SqlExecutor for &mut E {
    async fn execute(&mut self, statement: &str) -> Result<u64, ExecutorError> {
        (**self).execute(statement).await
    }

    async fn create_enum_type(
        &mut self,
        name: &str,
        values: &[String],
        check_exists: bool,
    ) -> Result<(), ExecutorError> {
        (**self).create_enum_type(name, values, check_exists).await
    }

    async fn drop_enum_type(&mut self, name: &str, check_exists: bool) -> Result<(), ExecutorError> {
        (**self).drop_enum_type(name, check_exists).await
    }

    fn quote_literal(&self, value: &str) -> String {
        (**self).quote_literal(value)
    }

    fn quote_identifier(&self, name: &str) -> String {
        (**self).quote_identifier(name)
    }
}
