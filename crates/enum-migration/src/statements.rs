//! SQL statement builders for the widen/narrow protocol
//!
//! Every builder takes identifiers and literals that have already been
//! quoted by the executor.

/// `CREATE TYPE name AS ENUM (...)`
pub fn create_enum_type(type_name: &str, labels: &[String]) -> String {
    format!("CREATE TYPE {} AS ENUM ({})", type_name, labels.join(", "))
}

/// Create the enum type only when no type with that name resolves
///
/// `type_name_literal` is the quoted identifier wrapped as a string literal,
/// suitable for `to_regtype`.
pub fn create_enum_type_if_missing(type_name_literal: &str, type_name: &str, labels: &[String]) -> String {
    format!(
        "DO $enum_migration$ BEGIN IF to_regtype({}) IS NULL THEN {}; END IF; END $enum_migration$",
        type_name_literal,
        create_enum_type(type_name, labels)
    )
}

/// `DROP TYPE [IF EXISTS] name`
pub fn drop_enum_type(type_name: &str, if_exists: bool) -> String {
    if if_exists {
        format!("DROP TYPE IF EXISTS {}", type_name)
    } else {
        format!("DROP TYPE {}", type_name)
    }
}

pub fn drop_column_default(table: &str, column: &str) -> String {
    format!("ALTER TABLE {} ALTER COLUMN {} DROP DEFAULT", table, column)
}

pub fn set_column_default(table: &str, column: &str, default_literal: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} SET DEFAULT {}",
        table, column, default_literal
    )
}

/// Retype a column, re-casting existing values through their text form
pub fn alter_column_type(table: &str, column: &str, type_name: &str) -> String {
    format!(
        "ALTER TABLE {} ALTER COLUMN {} TYPE {} USING {}::text::{}",
        table, column, type_name, column, type_name
    )
}

pub fn update_value(table: &str, column: &str, old_literal: &str, new_literal: &str) -> String {
    format!(
        "UPDATE {} SET {} = {} WHERE {} = {}",
        table, column, new_literal, column, old_literal
    )
}
