//! SQL executor backends
//!
//! [`PgExecutor`] runs statements on a live PostgreSQL connection or
//! transaction; [`SqlScript`] records them for offline review.

pub mod core;
pub mod postgres;
pub mod script;

pub use self::core::*;
pub use self::postgres::PgExecutor;
pub use self::script::SqlScript;
