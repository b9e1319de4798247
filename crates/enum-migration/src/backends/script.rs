//! Offline executor that records statements into a SQL script

use async_trait::async_trait;

use super::core::SqlExecutor;
use crate::error::ExecutorError;

/// Collects statements instead of running them
///
/// Useful for reviewing the exact DDL a migration emits, or for writing it
/// to a file and applying it with other tooling.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlScript {
    statements: Vec<String>,
}

impl SqlScript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorded statements, in execution order
    pub fn statements(&self) -> &[String] {
        &self.statements
    }

    pub fn len(&self) -> usize {
        self.statements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }

    pub fn clear(&mut self) {
        self.statements.clear();
    }

    /// Render the statements as a script, one terminated statement per line
    pub fn to_sql(&self) -> String {
        self.statements
            .iter()
            .map(|statement| format!("{};\n", statement))
            .collect()
    }
}

#[async_trait]
impl SqlExecutor for SqlScript {
    async fn execute(&mut self, statement: &str) -> Result<u64, ExecutorError> {
        self.statements.push(statement.to_string());
        Ok(0)
    }
}
