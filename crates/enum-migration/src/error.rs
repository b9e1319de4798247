//! Error types for enum migrations
//!
//! Executors report failures as [`ExecutorError`], carrying the SQLSTATE code
//! when the database supplied one. The orchestrator annotates those with the
//! step that failed and classifies them into [`EnumMigrationError`].

use std::fmt;

use crate::definition::{MigrationDirection, MigrationStep};

/// Result type alias for enum migration operations
pub type EnumMigrationResult<T> = Result<T, EnumMigrationError>;

/// SQLSTATE raised when creating a type that already exists
pub const DUPLICATE_OBJECT: &str = "42710";

/// SQLSTATE raised for a label that is not part of the enum type
pub const INVALID_TEXT_REPRESENTATION: &str = "22P02";

/// SQLSTATE raised when dropping a type that still has dependents
pub const DEPENDENT_OBJECTS_STILL_EXIST: &str = "2BP01";

/// Failure reported by a [`SqlExecutor`](crate::backends::SqlExecutor)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutorError {
    code: Option<String>,
    message: String,
}

impl ExecutorError {
    /// Create an error without a SQLSTATE code
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Create an error carrying a SQLSTATE code
    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    /// SQLSTATE code, if the database reported one
    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ExecutorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ExecutorError {}

impl From<sqlx::Error> for ExecutorError {
    fn from(err: sqlx::Error) -> Self {
        let code = err
            .as_database_error()
            .and_then(|db_err| db_err.code())
            .map(|code| code.into_owned());

        Self {
            code,
            message: err.to_string(),
        }
    }
}

/// Error types for enum migration operations
#[derive(Debug, thiserror::Error)]
pub enum EnumMigrationError {
    /// A type being created already exists (usually a temporary name collision)
    #[error("{step} failed, type already exists: {source}")]
    TypeCollision {
        step: MigrationStep,
        #[source]
        source: ExecutorError,
    },

    /// A value is not a label of the column's current type
    #[error("{step} failed, invalid enum value: {source}")]
    InvalidValue {
        step: MigrationStep,
        #[source]
        source: ExecutorError,
    },

    /// The enum type is still referenced by a column missing from the migration
    #[error("{step} failed, type is still referenced: {source}")]
    Dependency {
        step: MigrationStep,
        #[source]
        source: ExecutorError,
    },

    /// Any other failure while executing a statement
    #[error("{step} failed: {source}")]
    Executor {
        step: MigrationStep,
        #[source]
        source: ExecutorError,
    },

    /// The migration definition is malformed
    #[error("Invalid enum migration definition: {0}")]
    Definition(String),

    /// A phase transition was requested while a scope is open
    #[error("Migration scope already open for {0}")]
    ScopeActive(MigrationDirection),
}

impl EnumMigrationError {
    /// Classify an executor failure raised during `step`
    pub fn from_executor(step: MigrationStep, source: ExecutorError) -> Self {
        let code = source.code().map(str::to_owned);
        match code.as_deref() {
            Some(DUPLICATE_OBJECT) => EnumMigrationError::TypeCollision { step, source },
            Some(INVALID_TEXT_REPRESENTATION) => EnumMigrationError::InvalidValue { step, source },
            Some(DEPENDENT_OBJECTS_STILL_EXIST) => EnumMigrationError::Dependency { step, source },
            _ => EnumMigrationError::Executor { step, source },
        }
    }

    /// The step that failed, for errors raised while executing statements
    pub fn step(&self) -> Option<MigrationStep> {
        match self {
            EnumMigrationError::TypeCollision { step, .. }
            | EnumMigrationError::InvalidValue { step, .. }
            | EnumMigrationError::Dependency { step, .. }
            | EnumMigrationError::Executor { step, .. } => Some(*step),
            EnumMigrationError::Definition(_) | EnumMigrationError::ScopeActive(_) => None,
        }
    }

    /// The underlying executor error, if any
    pub fn executor_error(&self) -> Option<&ExecutorError> {
        match self {
            EnumMigrationError::TypeCollision { source, .. }
            | EnumMigrationError::InvalidValue { source, .. }
            | EnumMigrationError::Dependency { source, .. }
            | EnumMigrationError::Executor { source, .. } => Some(source),
            _ => None,
        }
    }
}

// Convert from definition parsing errors
impl From<serde_yaml::Error> for EnumMigrationError {
    fn from(err: serde_yaml::Error) -> Self {
        EnumMigrationError::Definition(err.to_string())
    }
}

impl From<serde_json::Error> for EnumMigrationError {
    fn from(err: serde_json::Error) -> Self {
        EnumMigrationError::Definition(err.to_string())
    }
}

impl From<std::io::Error> for EnumMigrationError {
    fn from(err: std::io::Error) -> Self {
        EnumMigrationError::Definition(err.to_string())
    }
}
