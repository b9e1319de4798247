//! Quoting utilities for identifiers and literals
//!
//! Identifiers are always emitted quoted so that mixed-case table, column and
//! type names keep their case. Already quoted segments are passed through, and
//! dotted names are treated as schema-qualified.

/// Quote a possibly schema-qualified identifier
///
/// # Examples
/// ```
/// use enum_migration::quoting::quote_identifier;
///
/// assert_eq!(quote_identifier("state_enum"), "\"state_enum\"");
/// assert_eq!(quote_identifier("stateEnum"), "\"stateEnum\"");
/// assert_eq!(quote_identifier("public.stateEnum"), "\"public\".\"stateEnum\"");
/// assert_eq!(quote_identifier("\"stateEnum\""), "\"stateEnum\"");
/// ```
pub fn quote_identifier(name: &str) -> String {
    split_qualified_name(name)
        .into_iter()
        .map(quote_segment)
        .collect::<Vec<_>>()
        .join(".")
}

/// Quote a string literal, doubling embedded single quotes
///
/// # Examples
/// ```
/// use enum_migration::quoting::quote_literal;
///
/// assert_eq!(quote_literal("on"), "'on'");
/// assert_eq!(quote_literal("it's"), "'it''s'");
/// ```
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Whether a single name segment is already wrapped in double quotes
pub fn is_quoted(segment: &str) -> bool {
    segment.len() >= 2 && segment.starts_with('"') && segment.ends_with('"')
}

/// Split a name on dots that are outside double quotes
pub fn split_qualified_name(name: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quotes = false;
    let mut start = 0;

    for (index, c) in name.char_indices() {
        match c {
            '"' => in_quotes = !in_quotes,
            '.' if !in_quotes => {
                segments.push(&name[start..index]);
                start = index + 1;
            }
            _ => {}
        }
    }
    segments.push(&name[start..]);
    segments
}

/// Name of the temporary supertype for `enum_name`
///
/// The schema qualifier, if any, is kept so the temporary type lives next to
/// the migrated one, and a quoted base name stays quoted.
pub fn temp_type_name(enum_name: &str, suffix: u16) -> String {
    let mut segments = split_qualified_name(enum_name);
    let base = segments.pop().unwrap_or_default();

    let temp = if is_quoted(base) {
        format!("\"_tmp_{}_{:04}\"", &base[1..base.len() - 1], suffix)
    } else {
        format!("_tmp_{}_{:04}", base, suffix)
    };

    segments.push(&temp);
    segments.join(".")
}

fn quote_segment(segment: &str) -> String {
    if is_quoted(segment) {
        segment.to_string()
    } else {
        format!("\"{}\"", segment.replace('"', "\"\""))
    }
}
