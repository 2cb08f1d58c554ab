use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};

/// Logical field types a scouting form can declare.
///
/// Unknown type strings in the configuration file are rejected at load time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Text,
    Number,
    Select,
    Textarea,
    Checkbox,
    File,
}

impl FieldType {
    /// SQLite storage type backing this logical type.
    pub fn storage_type(self) -> &'static str {
        match self {
            FieldType::Number => "REAL",
            FieldType::Checkbox => "INTEGER",
            FieldType::Text | FieldType::Select | FieldType::Textarea | FieldType::File => "TEXT",
        }
    }
}

/// Declarative definition of one form field and its storage column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name; must be a valid SQL identifier, stable once data exists.
    pub id: String,
    /// Human-readable label shown to scouts and used in validation messages.
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub sortable: bool,
    /// Choices for `select` fields.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    /// Accept pattern for `file` fields (e.g. "image/*").
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accept: Option<String>,
}

/// One named category of data collection form with its own field set and table.
#[derive(Debug, Clone)]
pub struct ScoutingType {
    pub key: String,
    pub name: String,
    pub description: String,
    pub table_name: String,
    pub fields: Vec<FieldDescriptor>,
}

impl ScoutingType {
    /// Columns valid for ORDER BY: the base pair plus every configured field.
    pub fn is_sort_column(&self, column: &str) -> bool {
        column == "id" || column == "timestamp" || self.fields.iter().any(|f| f.id == column)
    }

    /// Field descriptors of `file` type (used for upload cleanup on delete).
    pub fn file_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields
            .iter()
            .filter(|f| f.field_type == FieldType::File)
    }
}

#[derive(Debug, Deserialize)]
struct RawScoutingType {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(rename = "tableName")]
    table_name: Option<String>,
    #[serde(default)]
    fields: Vec<FieldDescriptor>,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(rename = "scoutingTypes", deserialize_with = "ordered_map")]
    scouting_types: Vec<(String, RawScoutingType)>,
}

/// Deserialize a JSON map preserving key order.
///
/// Configuration order drives schema synchronization and the order of
/// descriptors served to clients, so it must survive parsing.
fn ordered_map<'de, D>(deserializer: D) -> Result<Vec<(String, RawScoutingType)>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedMapVisitor;

    impl<'de> Visitor<'de> for OrderedMapVisitor {
        type Value = Vec<(String, RawScoutingType)>;

        fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
            formatter.write_str("a map of scouting type configurations")
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut entries = Vec::new();
            while let Some(entry) = map.next_entry()? {
                entries.push(entry);
            }
            Ok(entries)
        }
    }

    deserializer.deserialize_map(OrderedMapVisitor)
}

/// Parsed and validated field configuration for every scouting type.
///
/// Loaded once at startup; changing the file requires a restart because
/// schema synchronization only runs at boot.
#[derive(Debug, Clone)]
pub struct ScoutingConfig {
    types: Vec<ScoutingType>,
}

impl ScoutingConfig {
    /// Load and validate the configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scouting configuration {:?}", path))?;
        Self::from_json(&raw).with_context(|| format!("invalid scouting configuration {:?}", path))
    }

    /// Parse and validate configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawConfig = serde_json::from_str(json).context("malformed JSON")?;

        let mut types = Vec::with_capacity(raw.scouting_types.len());
        let mut table_names = HashSet::new();

        for (key, raw_type) in raw.scouting_types {
            if key.trim().is_empty() {
                bail!("scouting type key must not be empty");
            }

            let table_name = raw_type
                .table_name
                .unwrap_or_else(|| format!("{}_data", key));
            if !is_valid_identifier(&table_name) {
                bail!("invalid table name '{}' for type '{}'", table_name, key);
            }
            if !table_names.insert(table_name.clone()) {
                bail!("duplicate table name '{}'", table_name);
            }

            let mut field_ids = HashSet::new();
            for field in &raw_type.fields {
                if !is_valid_identifier(&field.id) {
                    bail!("invalid field id '{}' in type '{}'", field.id, key);
                }
                if field.id == "id" || field.id == "timestamp" {
                    bail!(
                        "field id '{}' in type '{}' collides with a base column",
                        field.id,
                        key
                    );
                }
                if !field_ids.insert(field.id.clone()) {
                    bail!("duplicate field id '{}' in type '{}'", field.id, key);
                }
                if field.field_type == FieldType::Select
                    && field.options.as_ref().map_or(true, |o| o.is_empty())
                {
                    bail!(
                        "select field '{}' in type '{}' has no options",
                        field.id,
                        key
                    );
                }
            }

            types.push(ScoutingType {
                key,
                name: raw_type.name,
                description: raw_type.description,
                table_name,
                fields: raw_type.fields,
            });
        }

        Ok(ScoutingConfig { types })
    }

    /// All scouting types, in configuration order.
    pub fn types(&self) -> &[ScoutingType] {
        &self.types
    }

    /// Look up a scouting type by its routing key.
    pub fn get(&self, key: &str) -> Option<&ScoutingType> {
        self.types.iter().find(|t| t.key == key)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Valid SQL identifier: starts with a letter or underscore, then letters,
/// digits, or underscores. The only strings ever interpolated into SQL text
/// must pass this check.
fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal(fields_json: &str) -> Result<ScoutingConfig> {
        ScoutingConfig::from_json(&format!(
            r#"{{
                "scoutingTypes": {{
                    "prematch": {{
                        "name": "Pre-Match",
                        "description": "Before the match",
                        "tableName": "prematch_data",
                        "fields": {}
                    }}
                }}
            }}"#,
            fields_json
        ))
    }

    #[test]
    fn parses_fields_in_order() {
        let config = minimal(
            r#"[
                {"id": "teamNumber", "label": "Team Number", "type": "text", "required": true, "sortable": true},
                {"id": "driveType", "label": "Drive Type", "type": "select", "options": ["tank", "swerve"]}
            ]"#,
        )
        .unwrap();

        let ty = config.get("prematch").unwrap();
        let ids: Vec<&str> = ty.fields.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(ids, vec!["teamNumber", "driveType"]);
        assert!(ty.fields[0].required);
        assert!(!ty.fields[1].required);
    }

    #[test]
    fn defaults_table_name_from_key() {
        let config =
            ScoutingConfig::from_json(r#"{"scoutingTypes": {"pit": {"name": "Pit", "fields": []}}}"#)
                .unwrap();
        assert_eq!(config.get("pit").unwrap().table_name, "pit_data");
    }

    #[test]
    fn rejects_unknown_field_type() {
        let err = minimal(r#"[{"id": "x", "label": "X", "type": "slider"}]"#).unwrap_err();
        assert!(err.to_string().contains("malformed JSON"));
    }

    #[test]
    fn rejects_invalid_identifier() {
        assert!(minimal(r#"[{"id": "team number", "label": "X", "type": "text"}]"#).is_err());
        assert!(minimal(r#"[{"id": "1team", "label": "X", "type": "text"}]"#).is_err());
        assert!(minimal(r#"[{"id": "team;drop", "label": "X", "type": "text"}]"#).is_err());
    }

    #[test]
    fn rejects_duplicate_field_id() {
        let err = minimal(
            r#"[
                {"id": "x", "label": "X", "type": "text"},
                {"id": "x", "label": "X again", "type": "number"}
            ]"#,
        )
        .unwrap_err();
        assert!(err.root_cause().to_string().contains("duplicate field id"));
    }

    #[test]
    fn rejects_base_column_collision() {
        assert!(minimal(r#"[{"id": "id", "label": "Id", "type": "text"}]"#).is_err());
        assert!(minimal(r#"[{"id": "timestamp", "label": "Ts", "type": "text"}]"#).is_err());
    }

    #[test]
    fn rejects_select_without_options() {
        assert!(minimal(r#"[{"id": "x", "label": "X", "type": "select"}]"#).is_err());
        assert!(
            minimal(r#"[{"id": "x", "label": "X", "type": "select", "options": []}]"#).is_err()
        );
    }

    #[test]
    fn rejects_duplicate_table_names() {
        let err = ScoutingConfig::from_json(
            r#"{"scoutingTypes": {
                "a": {"name": "A", "tableName": "shared", "fields": []},
                "b": {"name": "B", "tableName": "shared", "fields": []}
            }}"#,
        )
        .unwrap_err();
        assert!(err.root_cause().to_string().contains("duplicate table name"));
    }

    #[test]
    fn storage_types() {
        assert_eq!(FieldType::Number.storage_type(), "REAL");
        assert_eq!(FieldType::Checkbox.storage_type(), "INTEGER");
        assert_eq!(FieldType::Text.storage_type(), "TEXT");
        assert_eq!(FieldType::Select.storage_type(), "TEXT");
        assert_eq!(FieldType::Textarea.storage_type(), "TEXT");
        assert_eq!(FieldType::File.storage_type(), "TEXT");
    }

    #[test]
    fn preserves_type_order() {
        let config = ScoutingConfig::from_json(
            r#"{"scoutingTypes": {
                "zebra": {"name": "Z", "fields": []},
                "alpha": {"name": "A", "fields": []},
                "mid": {"name": "M", "fields": []}
            }}"#,
        )
        .unwrap();
        let keys: Vec<&str> = config.types().iter().map(|t| t.key.as_str()).collect();
        assert_eq!(keys, vec!["zebra", "alpha", "mid"]);
    }
}
