//! Enum Migration - widen/narrow orchestration for enum-typed columns
//!
//! PostgreSQL cannot drop or rename enum labels, and labels added with
//! `ALTER TYPE ... ADD VALUE` are unusable until the transaction commits.
//! [`EnumMigration`] sidesteps both by moving every dependent column onto a
//! temporary type holding the union of old and new labels, recreating the
//! enum with its target labels, and moving the columns back.
//!
//! All statements run through the caller's executor and therefore inside the
//! caller's transaction. A failure leaves the schema half-migrated; rolling
//! back the transaction is the only recovery.

use std::collections::BTreeSet;

use futures::future::BoxFuture;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::backends::SqlExecutor;
use crate::definition::{Column, EnumMigrationDefinition, MigrationDirection, MigrationStep};
use crate::error::{EnumMigrationError, EnumMigrationResult};
use crate::quoting::temp_type_name;
use crate::statements;

/// Largest temporary type suffix
pub const MAX_TEMP_SUFFIX: u16 = 9999;

/// Where a migration is in the widen/narrow protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationState {
    /// Columns are declared as the enum type
    Idle,
    /// Columns are declared as the temporary type
    Widened(MigrationDirection),
}

/// Migrates an enum type and its dependent columns between two label sets
///
/// The same instance runs in either direction. `upgrade` moves columns from
/// the old labels to the new ones and `downgrade` mirrors it.
pub struct EnumMigration<E> {
    executor: E,
    enum_name: String,
    old_values: Vec<String>,
    new_values: Vec<String>,
    temp_enum_name: String,
    temp_values: Vec<String>,
    columns: Vec<Column>,
    state: MigrationState,
}

impl<E: SqlExecutor> EnumMigration<E> {
    /// Create a migration for `enum_name` with a random temporary type suffix
    pub fn new<O, N>(
        executor: E,
        enum_name: impl Into<String>,
        old_values: O,
        new_values: N,
    ) -> EnumMigrationResult<Self>
    where
        O: IntoIterator,
        O::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self::from_definition(
            executor,
            EnumMigrationDefinition::new(enum_name, old_values, new_values),
        )
    }

    /// Create a migration from a declarative definition
    pub fn from_definition(executor: E, definition: EnumMigrationDefinition) -> EnumMigrationResult<Self> {
        let definition = definition.normalized()?;

        let suffix = rand::thread_rng().gen_range(0..=MAX_TEMP_SUFFIX);
        let temp_values: Vec<String> = definition
            .old_values
            .iter()
            .chain(definition.new_values.iter())
            .cloned()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        Ok(Self {
            executor,
            temp_enum_name: temp_type_name(&definition.enum_name, suffix),
            enum_name: definition.enum_name,
            old_values: definition.old_values,
            new_values: definition.new_values,
            temp_values,
            columns: definition.columns,
            state: MigrationState::Idle,
        })
    }

    /// Set the columns that are declared as the enum type
    ///
    /// The list must be exhaustive, otherwise dropping the enum type fails.
    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    pub fn with_column(mut self, column: Column) -> Self {
        self.columns.push(column);
        self
    }

    /// Use a fixed temporary type suffix instead of a random one
    pub fn with_temp_suffix(mut self, suffix: u16) -> EnumMigrationResult<Self> {
        if suffix > MAX_TEMP_SUFFIX {
            return Err(EnumMigrationError::Definition(format!(
                "Temporary type suffix {} exceeds {}",
                suffix, MAX_TEMP_SUFFIX
            )));
        }
        self.temp_enum_name = temp_type_name(&self.enum_name, suffix);
        Ok(self)
    }

    pub fn enum_name(&self) -> &str {
        &self.enum_name
    }

    pub fn old_values(&self) -> &[String] {
        &self.old_values
    }

    pub fn new_values(&self) -> &[String] {
        &self.new_values
    }

    /// Name of the temporary supertype
    pub fn temp_enum_name(&self) -> &str {
        &self.temp_enum_name
    }

    /// Sorted union of old and new labels
    pub fn temp_values(&self) -> &[String] {
        &self.temp_values
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn state(&self) -> MigrationState {
        self.state
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn executor_mut(&mut self) -> &mut E {
        &mut self.executor
    }

    pub fn into_executor(self) -> E {
        self.executor
    }

    /// Move every column from the old labels to the new labels
    pub async fn upgrade(&mut self) -> EnumMigrationResult<()> {
        self.widen(MigrationDirection::Upgrade).await?;
        self.narrow(MigrationDirection::Upgrade).await
    }

    /// Move every column from the new labels back to the old labels
    pub async fn downgrade(&mut self) -> EnumMigrationResult<()> {
        self.widen(MigrationDirection::Downgrade).await?;
        self.narrow(MigrationDirection::Downgrade).await
    }

    /// Upgrade, running `block` while columns are on the temporary type
    ///
    /// `block` may remap rows with [`update_value`](Self::update_value) from
    /// old labels to new ones. Narrowing runs after `block` whatever it
    /// returns; when `block` fails its error is returned.
    ///
    /// ```ignore
    /// migration
    ///     .upgrade_scope(|m| {
    ///         Box::pin(async move {
    ///             m.update_value(&column, "on", "enabled").await?;
    ///             m.update_value(&column, "off", "disabled").await?;
    ///             Ok::<_, EnumMigrationError>(())
    ///         })
    ///     })
    ///     .await?;
    /// ```
    pub async fn upgrade_scope<F, T, Er>(&mut self, block: F) -> Result<T, Er>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T, Er>>,
        Er: From<EnumMigrationError>,
    {
        self.run_scope(MigrationDirection::Upgrade, block).await
    }

    /// Downgrade, running `block` while columns are on the temporary type
    pub async fn downgrade_scope<F, T, Er>(&mut self, block: F) -> Result<T, Er>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T, Er>>,
        Er: From<EnumMigrationError>,
    {
        self.run_scope(MigrationDirection::Downgrade, block).await
    }

    /// Replace `old_value` with `new_value` in every row of `column`
    ///
    /// Both values must be labels of the type the column is declared as,
    /// which inside a scope is the temporary union type. Returns the number
    /// of updated rows as reported by the executor.
    pub async fn update_value(
        &mut self,
        column: &Column,
        old_value: &str,
        new_value: &str,
    ) -> EnumMigrationResult<u64> {
        if self.state == MigrationState::Idle {
            warn!(
                "Updating {}.{} outside a migration scope; '{}' must be a label of '{}'",
                column.table, column.name, new_value, self.enum_name
            );
        }

        let statement = statements::update_value(
            &self.executor.quote_identifier(&column.table),
            &self.executor.quote_identifier(&column.name),
            &self.executor.quote_literal(old_value),
            &self.executor.quote_literal(new_value),
        );
        let updated = run_step(&mut self.executor, MigrationStep::UpdateValue, &statement).await?;

        debug!(
            "Updated {} row(s) of {}.{} from '{}' to '{}'",
            updated, column.table, column.name, old_value, new_value
        );
        Ok(updated)
    }

    async fn run_scope<F, T, Er>(&mut self, direction: MigrationDirection, block: F) -> Result<T, Er>
    where
        F: for<'a> FnOnce(&'a mut Self) -> BoxFuture<'a, Result<T, Er>>,
        Er: From<EnumMigrationError>,
    {
        self.widen(direction).await?;

        let outcome = block(&mut *self).await;
        let narrowed = self.narrow(direction).await;

        match (outcome, narrowed) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(narrow_error)) => Err(narrow_error.into()),
            (Err(block_error), Ok(())) => Err(block_error),
            (Err(block_error), Err(narrow_error)) => {
                warn!(
                    "Narrowing enum '{}' after a failed {} scope also failed: {}",
                    self.enum_name, direction, narrow_error
                );
                Err(block_error)
            }
        }
    }

    /// Phase 1: create the temporary type and move every column onto it
    async fn widen(&mut self, direction: MigrationDirection) -> EnumMigrationResult<()> {
        if let MigrationState::Widened(active) = self.state {
            return Err(EnumMigrationError::ScopeActive(active));
        }

        info!(
            "Widening enum '{}' to '{}' for {} ({} column(s))",
            self.enum_name,
            self.temp_enum_name,
            direction,
            self.columns.len()
        );

        self.executor
            .create_enum_type(&self.temp_enum_name, &self.temp_values, false)
            .await
            .map_err(|e| EnumMigrationError::from_executor(MigrationStep::CreateTempType, e))?;

        // Stays Idle until every column is on the temporary type
        let temp_type = self.executor.quote_identifier(&self.temp_enum_name);
        for column in &self.columns {
            let table = self.executor.quote_identifier(&column.table);
            let name = self.executor.quote_identifier(&column.name);

            if column.server_default.is_change() {
                let statement = statements::drop_column_default(&table, &name);
                run_step(&mut self.executor, MigrationStep::DropColumnDefault, &statement).await?;
            }

            let statement = statements::alter_column_type(&table, &name, &temp_type);
            run_step(&mut self.executor, MigrationStep::RetypeToTemp, &statement).await?;
        }

        self.state = MigrationState::Widened(direction);
        Ok(())
    }

    /// Phase 2: recreate the enum with its target labels and move every
    /// column back onto it
    async fn narrow(&mut self, direction: MigrationDirection) -> EnumMigrationResult<()> {
        self.state = MigrationState::Idle;

        let target_values = match direction {
            MigrationDirection::Upgrade => &self.new_values,
            MigrationDirection::Downgrade => &self.old_values,
        };

        self.executor
            .drop_enum_type(&self.enum_name, false)
            .await
            .map_err(|e| EnumMigrationError::from_executor(MigrationStep::DropSourceType, e))?;
        self.executor
            .create_enum_type(&self.enum_name, target_values, false)
            .await
            .map_err(|e| EnumMigrationError::from_executor(MigrationStep::CreateTargetType, e))?;

        let enum_type = self.executor.quote_identifier(&self.enum_name);
        for column in &self.columns {
            let table = self.executor.quote_identifier(&column.table);
            let name = self.executor.quote_identifier(&column.name);

            let statement = statements::alter_column_type(&table, &name, &enum_type);
            run_step(&mut self.executor, MigrationStep::RetypeToTarget, &statement).await?;

            if let Some(default) = column.server_default.target(direction) {
                let statement =
                    statements::set_column_default(&table, &name, &self.executor.quote_literal(default));
                run_step(&mut self.executor, MigrationStep::SetColumnDefault, &statement).await?;
            }
        }

        self.executor
            .drop_enum_type(&self.temp_enum_name, false)
            .await
            .map_err(|e| EnumMigrationError::from_executor(MigrationStep::DropTempType, e))?;

        info!(
            "Narrowed enum '{}' to {} label(s) after {}",
            self.enum_name,
            target_values.len(),
            direction
        );
        Ok(())
    }
}

async fn run_step<E: SqlExecutor>(
    executor: &mut E,
    step: MigrationStep,
    statement: &str,
) -> EnumMigrationResult<u64> {
    debug!("[{}] {}", step, statement);
    executor
        .execute(statement)
        .await
        .map_err(|e| EnumMigrationError::from_executor(step, e))
}
