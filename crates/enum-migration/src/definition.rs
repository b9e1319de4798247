//! Migration Definitions - Core types describing an enum migration
//!
//! Defines the columns affected by a migration, their server default policy,
//! the migration direction and step labels, and the declarative
//! [`EnumMigrationDefinition`] that can be loaded from YAML or JSON.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{EnumMigrationError, EnumMigrationResult};

/// Direction a migration runs in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MigrationDirection {
    /// Move columns from the old label set to the new one
    Upgrade,
    /// Move columns from the new label set back to the old one
    Downgrade,
}

impl fmt::Display for MigrationDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationDirection::Upgrade => write!(f, "upgrade"),
            MigrationDirection::Downgrade => write!(f, "downgrade"),
        }
    }
}

/// Phase of the widen/narrow protocol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationPhase {
    /// Columns are moved onto the temporary supertype
    Widen,
    /// Caller-controlled window while the temporary type is active
    Scope,
    /// Columns are moved onto the target type
    Narrow,
}

impl fmt::Display for MigrationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MigrationPhase::Widen => write!(f, "widen"),
            MigrationPhase::Scope => write!(f, "scope"),
            MigrationPhase::Narrow => write!(f, "narrow"),
        }
    }
}

/// Individual statement kinds issued by a migration, in protocol order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MigrationStep {
    CreateTempType,
    DropColumnDefault,
    RetypeToTemp,
    UpdateValue,
    DropSourceType,
    CreateTargetType,
    RetypeToTarget,
    SetColumnDefault,
    DropTempType,
}

impl MigrationStep {
    pub fn phase(&self) -> MigrationPhase {
        match self {
            MigrationStep::CreateTempType
            | MigrationStep::DropColumnDefault
            | MigrationStep::RetypeToTemp => MigrationPhase::Widen,
            MigrationStep::UpdateValue => MigrationPhase::Scope,
            MigrationStep::DropSourceType
            | MigrationStep::CreateTargetType
            | MigrationStep::RetypeToTarget
            | MigrationStep::SetColumnDefault
            | MigrationStep::DropTempType => MigrationPhase::Narrow,
        }
    }

    fn description(&self) -> &'static str {
        match self {
            MigrationStep::CreateTempType => "create temporary type",
            MigrationStep::DropColumnDefault => "drop column default",
            MigrationStep::RetypeToTemp => "alter column to temporary type",
            MigrationStep::UpdateValue => "update value",
            MigrationStep::DropSourceType => "drop source type",
            MigrationStep::CreateTargetType => "create target type",
            MigrationStep::RetypeToTarget => "alter column to target type",
            MigrationStep::SetColumnDefault => "set column default",
            MigrationStep::DropTempType => "drop temporary type",
        }
    }
}

impl fmt::Display for MigrationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.phase(), self.description())
    }
}

/// What happens to a column's server default during the migration
///
/// `Keep` leaves the default expression alone, so it is only suitable for
/// columns without a default: a default typed as the enum blocks both the
/// column retype and the type drop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerDefault {
    #[default]
    Keep,
    /// Drop the default while widening and set the label selected by the
    /// direction while narrowing. `None` leaves the column without a default.
    Change {
        #[serde(default)]
        old: Option<String>,
        #[serde(default)]
        new: Option<String>,
    },
}

impl ServerDefault {
    /// Build a `Change` policy
    pub fn change<O, N>(old: Option<O>, new: Option<N>) -> Self
    where
        O: Into<String>,
        N: Into<String>,
    {
        ServerDefault::Change {
            old: old.map(Into::into),
            new: new.map(Into::into),
        }
    }

    pub fn is_change(&self) -> bool {
        matches!(self, ServerDefault::Change { .. })
    }

    /// Default to install once the column reaches its target type
    pub fn target(&self, direction: MigrationDirection) -> Option<&str> {
        match (self, direction) {
            (ServerDefault::Keep, _) => None,
            (ServerDefault::Change { new, .. }, MigrationDirection::Upgrade) => new.as_deref(),
            (ServerDefault::Change { old, .. }, MigrationDirection::Downgrade) => old.as_deref(),
        }
    }
}

/// A column whose declared type is the migrated enum
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Table containing the column
    pub table: String,
    /// Column name
    pub name: String,
    /// Written as `keep` or `change: { old, new }` in YAML and JSON alike
    #[serde(default, with = "serde_yaml::with::singleton_map")]
    pub server_default: ServerDefault,
}

impl Column {
    /// Create a column reference that keeps its server default
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            server_default: ServerDefault::Keep,
        }
    }

    pub fn with_server_default(mut self, server_default: ServerDefault) -> Self {
        self.server_default = server_default;
        self
    }
}

/// Declarative description of an enum migration
///
/// ```yaml
/// enum_name: state_enum
/// old_values: [on, off]
/// new_values: [enabled, disabled]
/// columns:
///   - table: resources
///     name: state
///     server_default:
///       change: { old: on, new: enabled }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumMigrationDefinition {
    pub enum_name: String,
    pub old_values: Vec<String>,
    pub new_values: Vec<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
}

impl EnumMigrationDefinition {
    pub fn new<O, N>(enum_name: impl Into<String>, old_values: O, new_values: N) -> Self
    where
        O: IntoIterator,
        O::Item: Into<String>,
        N: IntoIterator,
        N::Item: Into<String>,
    {
        Self {
            enum_name: enum_name.into(),
            old_values: dedup_labels(old_values.into_iter().map(Into::into)),
            new_values: dedup_labels(new_values.into_iter().map(Into::into)),
            columns: Vec::new(),
        }
    }

    pub fn with_columns(mut self, columns: Vec<Column>) -> Self {
        self.columns = columns;
        self
    }

    /// Parse a definition from YAML
    pub fn from_yaml_str(source: &str) -> EnumMigrationResult<Self> {
        let definition: Self = serde_yaml::from_str(source)?;
        definition.normalized()
    }

    /// Parse a definition from JSON
    pub fn from_json_str(source: &str) -> EnumMigrationResult<Self> {
        let definition: Self = serde_json::from_str(source)?;
        definition.normalized()
    }

    /// Load a definition from a `.json`, `.yaml` or `.yml` file
    pub fn from_file(path: impl AsRef<Path>) -> EnumMigrationResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&source),
            Some("yaml") | Some("yml") => Self::from_yaml_str(&source),
            other => Err(EnumMigrationError::Definition(format!(
                "Unsupported definition file extension {:?} for '{}'",
                other,
                path.display()
            ))),
        }
    }

    /// Check that the definition can be executed
    pub fn validate(&self) -> EnumMigrationResult<()> {
        if self.enum_name.trim().is_empty() {
            return Err(EnumMigrationError::Definition(
                "Enum name cannot be empty".to_string(),
            ));
        }

        if self.old_values.is_empty() {
            return Err(EnumMigrationError::Definition(format!(
                "Old value set of enum '{}' cannot be empty",
                self.enum_name
            )));
        }

        if self.new_values.is_empty() {
            return Err(EnumMigrationError::Definition(format!(
                "New value set of enum '{}' cannot be empty",
                self.enum_name
            )));
        }

        for column in &self.columns {
            if column.table.trim().is_empty() || column.name.trim().is_empty() {
                return Err(EnumMigrationError::Definition(format!(
                    "Column reference '{}.{}' of enum '{}' has an empty table or column name",
                    column.table, column.name, self.enum_name
                )));
            }
        }

        Ok(())
    }

    /// Drop repeated labels and validate
    ///
    /// Definitions built as struct literals bypass the constructors, so
    /// anything that executes a definition goes through here first.
    pub(crate) fn normalized(mut self) -> EnumMigrationResult<Self> {
        self.old_values = dedup_labels(self.old_values);
        self.new_values = dedup_labels(self.new_values);
        self.validate()?;
        Ok(self)
    }
}

/// Remove repeated labels, keeping the first occurrence so enum sort order
/// follows the caller's ordering
fn dedup_labels(labels: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(label.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_server_default_target_follows_direction() {
        let policy = ServerDefault::change(Some("on"), Some("enabled"));
        assert_eq!(policy.target(MigrationDirection::Upgrade), Some("enabled"));
        assert_eq!(policy.target(MigrationDirection::Downgrade), Some("on"));

        let dropped = ServerDefault::change(Some("on"), None::<String>);
        assert_eq!(dropped.target(MigrationDirection::Upgrade), None);
        assert_eq!(dropped.target(MigrationDirection::Downgrade), Some("on"));

        assert_eq!(ServerDefault::Keep.target(MigrationDirection::Upgrade), None);
        assert!(!ServerDefault::Keep.is_change());
    }

    #[test]
    fn test_step_display_includes_phase() {
        assert_eq!(
            MigrationStep::CreateTempType.to_string(),
            "widen: create temporary type"
        );
        assert_eq!(MigrationStep::UpdateValue.phase(), MigrationPhase::Scope);
        assert_eq!(
            MigrationStep::SetColumnDefault.to_string(),
            "narrow: set column default"
        );
    }

    #[test]
    fn test_definition_from_yaml() {
        let yaml = r#"
enum_name: state_enum
old_values: [on, off]
new_values: [enabled, disabled]
columns:
  - table: resources
    name: state
    server_default:
      change:
        old: on
        new: enabled
  - table: audit_log
    name: state
"#;
        let definition = EnumMigrationDefinition::from_yaml_str(yaml).unwrap();

        assert_eq!(definition.enum_name, "state_enum");
        assert_eq!(definition.old_values, vec!["on", "off"]);
        assert_eq!(definition.new_values, vec!["enabled", "disabled"]);
        assert_eq!(definition.columns.len(), 2);
        assert_eq!(
            definition.columns[0].server_default,
            ServerDefault::change(Some("on"), Some("enabled"))
        );
        assert_eq!(definition.columns[1].server_default, ServerDefault::Keep);
    }

    #[test]
    fn test_definition_from_json_with_missing_default_side() {
        let json = r#"{
            "enum_name": "state_enum",
            "old_values": ["on", "off", "on"],
            "new_values": ["on", "off", "unknown"],
            "columns": [
                {"table": "resources", "name": "state", "server_default": {"change": {"old": "on"}}}
            ]
        }"#;
        let definition = EnumMigrationDefinition::from_json_str(json).unwrap();

        assert_eq!(definition.old_values, vec!["on", "off"]);
        assert_eq!(
            definition.columns[0].server_default,
            ServerDefault::change(Some("on"), None::<String>)
        );
    }

    #[test]
    fn test_server_default_survives_json_and_yaml_round_trip() {
        let definition = EnumMigrationDefinition::new("state_enum", ["on", "off"], ["enabled", "disabled"])
            .with_columns(vec![
                Column::new("resources", "state")
                    .with_server_default(ServerDefault::change(Some("on"), Some("enabled"))),
                Column::new("audit_log", "state"),
            ]);

        let json = serde_json::to_string(&definition).unwrap();
        assert!(json.contains(r#""server_default":{"change":{"old":"on","new":"enabled"}}"#));
        assert!(json.contains(r#""server_default":"keep""#));
        assert_eq!(EnumMigrationDefinition::from_json_str(&json).unwrap(), definition);

        let yaml = serde_yaml::to_string(&definition).unwrap();
        assert!(!yaml.contains('!'));
        assert_eq!(EnumMigrationDefinition::from_yaml_str(&yaml).unwrap(), definition);
    }

    #[test]
    fn test_keep_policy_from_yaml_scalar() {
        let yaml = "enum_name: state_enum\nold_values: [on]\nnew_values: [off]\n\
                    columns:\n  - table: resources\n    name: state\n    server_default: keep\n";
        let definition = EnumMigrationDefinition::from_yaml_str(yaml).unwrap();

        assert_eq!(definition.columns[0].server_default, ServerDefault::Keep);
    }

    #[test]
    fn test_definition_validation() {
        let empty_old = EnumMigrationDefinition::new("state_enum", Vec::<String>::new(), ["on"]);
        assert!(matches!(
            empty_old.validate(),
            Err(EnumMigrationError::Definition(msg)) if msg.contains("Old value set")
        ));

        let empty_new = EnumMigrationDefinition::new("state_enum", ["on"], Vec::<String>::new());
        assert!(empty_new.validate().is_err());

        let unnamed = EnumMigrationDefinition::new("  ", ["on"], ["off"]);
        assert!(unnamed.validate().is_err());

        let bad_column = EnumMigrationDefinition::new("state_enum", ["on"], ["off"])
            .with_columns(vec![Column::new("resources", "")]);
        assert!(bad_column.validate().is_err());

        let valid = EnumMigrationDefinition::new("state_enum", ["on"], ["off"])
            .with_columns(vec![Column::new("resources", "state")]);
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_invalid_yaml_is_a_definition_error() {
        let result = EnumMigrationDefinition::from_yaml_str("enum_name: [unterminated");
        assert!(matches!(result, Err(EnumMigrationError::Definition(_))));
    }

    #[test]
    fn test_definition_from_file() {
        let temp_dir = TempDir::new().unwrap();

        let yaml_path = temp_dir.path().join("state_enum.yml");
        fs::write(
            &yaml_path,
            "enum_name: state_enum\nold_values: [on, off]\nnew_values: [on, off, unknown]\n",
        )
        .unwrap();
        let definition = EnumMigrationDefinition::from_file(&yaml_path).unwrap();
        assert_eq!(definition.new_values, vec!["on", "off", "unknown"]);
        assert!(definition.columns.is_empty());

        let toml_path = temp_dir.path().join("state_enum.toml");
        fs::write(&toml_path, "enum_name = 'state_enum'").unwrap();
        assert!(EnumMigrationDefinition::from_file(&toml_path).is_err());
    }
}
