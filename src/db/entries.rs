//! Persistence access for scouting entries.
//!
//! All values are bound as parameters. Identifiers (table names, column
//! names, sort columns) are interpolated only after validation against the
//! closed configuration list loaded at startup.

use std::path::Path;

use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, Sqlite, SqlitePool};

use crate::constants::UPLOADS_URL_PREFIX;
use crate::error::{AppError, Result};
use crate::fields::{FieldDescriptor, FieldType, ScoutingType};

/// A field value coerced to its storage representation.
enum StorageValue {
    Null,
    Text(String),
    Real(f64),
    Int(i64),
}

/// Coerce a submitted JSON value to the field's storage type.
///
/// Missing values, JSON null, and the empty string all store as NULL.
/// Numeric strings are left to SQLite column affinity. Arrays and objects
/// are rejected.
fn to_storage(field: &FieldDescriptor, value: Option<&Value>) -> Result<StorageValue> {
    let value = match value {
        None | Some(Value::Null) => return Ok(StorageValue::Null),
        Some(v) => v,
    };

    match value {
        Value::Null => Ok(StorageValue::Null),
        Value::String(s) if s.is_empty() => Ok(StorageValue::Null),
        Value::String(s) => Ok(StorageValue::Text(s.clone())),
        Value::Number(n) => match field.field_type {
            FieldType::Number => Ok(n
                .as_f64()
                .map(StorageValue::Real)
                .unwrap_or(StorageValue::Null)),
            FieldType::Checkbox => Ok(n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .map(StorageValue::Int)
                .unwrap_or(StorageValue::Null)),
            _ => Ok(StorageValue::Text(n.to_string())),
        },
        Value::Bool(b) => Ok(StorageValue::Int(i64::from(*b))),
        Value::Array(_) | Value::Object(_) => Err(AppError::InvalidInput(format!(
            "Field '{}' must be a scalar value",
            field.label
        ))),
    }
}

/// Resolve the ORDER BY column and direction for a list request.
///
/// An unrecognized column falls back to `timestamp`; anything other than an
/// explicit `asc` sorts descending.
pub fn resolve_sort<'a>(
    ty: &'a ScoutingType,
    sort_by: Option<&'a str>,
    sort_order: Option<&str>,
) -> (&'a str, &'static str) {
    let column = match sort_by {
        Some(col) if ty.is_sort_column(col) => col,
        _ => "timestamp",
    };
    let direction = match sort_order {
        Some("asc") => "ASC",
        _ => "DESC",
    };
    (column, direction)
}

/// Columns served for this type: the base pair plus every configured field.
/// Retired live columns are deliberately excluded.
fn select_columns(ty: &ScoutingType) -> String {
    let mut columns = vec!["id".to_string(), "timestamp".to_string()];
    columns.extend(ty.fields.iter().map(|f| f.id.clone()));
    columns.join(", ")
}

/// Decode one row into a JSON object keyed by base and field column names.
fn row_to_json(row: &SqliteRow, ty: &ScoutingType) -> Result<Value> {
    let mut obj = Map::new();
    obj.insert("id".into(), Value::from(row.try_get::<i64, _>("id")?));
    obj.insert(
        "timestamp".into(),
        row.try_get::<Option<String>, _>("timestamp")?
            .map_or(Value::Null, Value::from),
    );

    for field in &ty.fields {
        let id = field.id.as_str();
        let value = match field.field_type {
            FieldType::Number => match row.try_get::<Option<f64>, _>(id) {
                Ok(v) => v
                    .and_then(serde_json::Number::from_f64)
                    .map_or(Value::Null, Value::Number),
                // A non-numeric value stored through column affinity
                Err(_) => row
                    .try_get::<Option<String>, _>(id)?
                    .map_or(Value::Null, Value::from),
            },
            FieldType::Checkbox => match row.try_get::<Option<i64>, _>(id) {
                Ok(v) => v.map_or(Value::Null, Value::from),
                Err(_) => row
                    .try_get::<Option<String>, _>(id)?
                    .map_or(Value::Null, Value::from),
            },
            _ => row
                .try_get::<Option<String>, _>(id)?
                .map_or(Value::Null, Value::from),
        };
        obj.insert(field.id.clone(), value);
    }

    Ok(Value::Object(obj))
}

/// Insert a new entry, returning its generated id.
///
/// Fails with the labels of every required non-file field that is missing,
/// null, or empty.
pub async fn insert(pool: &SqlitePool, ty: &ScoutingType, data: &Map<String, Value>) -> Result<i64> {
    let missing: Vec<String> = ty
        .fields
        .iter()
        .filter(|f| f.required && f.field_type != FieldType::File)
        .filter(|f| is_missing(data.get(&f.id)))
        .map(|f| f.label.clone())
        .collect();

    if !missing.is_empty() {
        return Err(AppError::MissingFields(missing));
    }

    if ty.fields.is_empty() {
        let result = sqlx::query(&format!("INSERT INTO {} DEFAULT VALUES", ty.table_name))
            .execute(pool)
            .await?;
        return Ok(result.last_insert_rowid());
    }

    let columns: Vec<&str> = ty.fields.iter().map(|f| f.id.as_str()).collect();
    let placeholders = vec!["?"; columns.len()].join(", ");
    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        ty.table_name,
        columns.join(", "),
        placeholders
    );

    let mut query = sqlx::query(&sql);
    for field in &ty.fields {
        query = bind_storage(query, to_storage(field, data.get(&field.id))?);
    }

    let result = query.execute(pool).await?;
    Ok(result.last_insert_rowid())
}

fn is_missing(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

fn bind_storage<'a>(
    query: sqlx::query::Query<'a, Sqlite, sqlx::sqlite::SqliteArguments<'a>>,
    value: StorageValue,
) -> sqlx::query::Query<'a, Sqlite, sqlx::sqlite::SqliteArguments<'a>> {
    match value {
        StorageValue::Null => query.bind(None::<String>),
        StorageValue::Text(s) => query.bind(s),
        StorageValue::Real(f) => query.bind(f),
        StorageValue::Int(i) => query.bind(i),
    }
}

/// List all entries of a type, sorted.
pub async fn list(
    pool: &SqlitePool,
    ty: &ScoutingType,
    sort_by: Option<&str>,
    sort_order: Option<&str>,
) -> Result<Vec<Value>> {
    let (column, direction) = resolve_sort(ty, sort_by, sort_order);
    let sql = format!(
        "SELECT {} FROM {} ORDER BY {} {}",
        select_columns(ty),
        ty.table_name,
        column,
        direction
    );

    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    rows.iter().map(|row| row_to_json(row, ty)).collect()
}

/// Fetch a single entry by id.
pub async fn get_by_id(pool: &SqlitePool, ty: &ScoutingType, id: i64) -> Result<Value> {
    let sql = format!(
        "SELECT {} FROM {} WHERE id = ?",
        select_columns(ty),
        ty.table_name
    );

    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::EntryNotFound)?;

    row_to_json(&row, ty)
}

/// Full-overwrite update: every configured field column is written, and a
/// field omitted from `data` becomes NULL even if it had a prior value.
pub async fn update(
    pool: &SqlitePool,
    ty: &ScoutingType,
    id: i64,
    data: &Map<String, Value>,
) -> Result<()> {
    if ty.fields.is_empty() {
        // Nothing to overwrite; still report whether the entry exists
        get_by_id(pool, ty, id).await?;
        return Ok(());
    }

    let set_clause = ty
        .fields
        .iter()
        .map(|f| format!("{} = ?", f.id))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!("UPDATE {} SET {} WHERE id = ?", ty.table_name, set_clause);

    let mut query = sqlx::query(&sql);
    for field in &ty.fields {
        query = bind_storage(query, to_storage(field, data.get(&field.id))?);
    }
    query = query.bind(id);

    let result = query.execute(pool).await?;
    if result.rows_affected() == 0 {
        return Err(AppError::EntryNotFound);
    }

    Ok(())
}

/// Delete an entry, cleaning up any uploaded file it references first.
///
/// File removal is best-effort: the row delete proceeds whether or not the
/// referenced file still exists.
pub async fn delete_by_id(
    pool: &SqlitePool,
    ty: &ScoutingType,
    id: i64,
    uploads_dir: &Path,
) -> Result<()> {
    let entry = get_by_id(pool, ty, id).await?;

    for field in ty.file_fields() {
        let Some(stored) = entry.get(&field.id).and_then(Value::as_str) else {
            continue;
        };
        let Some(relative) = stored.strip_prefix(UPLOADS_URL_PREFIX) else {
            continue;
        };
        // Only ever touch direct children of the uploads directory
        let Some(file_name) = Path::new(relative).file_name() else {
            continue;
        };
        let path = uploads_dir.join(file_name);
        if let Err(e) = std::fs::remove_file(&path) {
            tracing::warn!("Could not remove uploaded file {:?}: {}", path, e);
        }
    }

    let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", ty.table_name))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::EntryNotFound);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fields::ScoutingConfig;

    fn test_type() -> ScoutingType {
        let config = ScoutingConfig::from_json(
            r#"{"scoutingTypes": {"prematch": {
                "name": "Pre-Match",
                "fields": [
                    {"id": "teamNumber", "label": "Team Number", "type": "text", "required": true, "sortable": true},
                    {"id": "autoPoints", "label": "Auto Points", "type": "number"}
                ]
            }}}"#,
        )
        .unwrap();
        config.get("prematch").unwrap().clone()
    }

    #[test]
    fn sort_falls_back_to_timestamp_desc() {
        let ty = test_type();
        assert_eq!(resolve_sort(&ty, Some("notAColumn"), None), ("timestamp", "DESC"));
        assert_eq!(
            resolve_sort(&ty, Some("teamNumber; DROP TABLE users"), Some("asc")),
            ("timestamp", "ASC")
        );
        assert_eq!(resolve_sort(&ty, None, None), ("timestamp", "DESC"));
    }

    #[test]
    fn sort_accepts_configured_columns() {
        let ty = test_type();
        assert_eq!(resolve_sort(&ty, Some("teamNumber"), Some("asc")), ("teamNumber", "ASC"));
        assert_eq!(resolve_sort(&ty, Some("id"), None), ("id", "DESC"));
        assert_eq!(resolve_sort(&ty, Some("timestamp"), Some("desc")), ("timestamp", "DESC"));
    }

    #[test]
    fn sort_order_only_asc_is_ascending() {
        let ty = test_type();
        assert_eq!(resolve_sort(&ty, Some("id"), Some("ASC")).1, "DESC");
        assert_eq!(resolve_sort(&ty, Some("id"), Some("sideways")).1, "DESC");
        assert_eq!(resolve_sort(&ty, Some("id"), Some("asc")).1, "ASC");
    }

    #[test]
    fn missing_value_detection() {
        assert!(is_missing(None));
        assert!(is_missing(Some(&Value::Null)));
        assert!(is_missing(Some(&Value::String(String::new()))));
        assert!(!is_missing(Some(&Value::String("254".into()))));
        assert!(!is_missing(Some(&Value::from(0))));
        assert!(!is_missing(Some(&Value::Bool(false))));
    }

    #[test]
    fn rejects_non_scalar_values() {
        let ty = test_type();
        let field = &ty.fields[0];
        let value = serde_json::json!(["a", "b"]);
        assert!(matches!(
            to_storage(field, Some(&value)),
            Err(AppError::InvalidInput(_))
        ));
    }
}
