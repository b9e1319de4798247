//! # enum-migration: transactional PostgreSQL enum migrations
//!
//! Changes the label set of a PostgreSQL enum type that is already used by
//! table columns. Columns are widened onto a temporary type holding the union
//! of old and new labels, data can be remapped while both label sets are
//! valid, and the columns are then narrowed onto the recreated enum.
//!
//! ```ignore
//! use enum_migration::{Column, EnumMigration, PgExecutor};
//!
//! let mut tx = pool.begin().await?;
//! let mut migration = EnumMigration::new(
//!     PgExecutor::new(&mut *tx),
//!     "state_enum",
//!     ["on", "off"],
//!     ["on", "off", "unknown"],
//! )?
//! .with_columns(vec![Column::new("resources", "state")]);
//! migration.upgrade().await?;
//! drop(migration);
//! tx.commit().await?;
//! ```

pub mod backends;
pub mod definition;
pub mod error;
pub mod migration;
pub mod quoting;
pub mod statements;

// Re-export core traits and types
pub use backends::*;
pub use definition::*;
pub use error::*;
pub use migration::*;
