//! Startup schema synchronization.
//!
//! Makes each scouting type's table a superset of its configured fields:
//! additive only, never drops or renames a column. Runs to completion before
//! the HTTP listener binds, so request handlers never observe a partial
//! schema. Any failure here is fatal by design.

use sqlx::{Row, SqlitePool};

use crate::fields::ScoutingConfig;

/// Ensure the users table exists and seed the bootstrap admin emails.
pub async fn ensure_users_table(
    pool: &SqlitePool,
    initial_admins: &[String],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT UNIQUE NOT NULL,
            role TEXT NOT NULL CHECK(role IN ('admin', 'upload')),
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
    )
    .execute(pool)
    .await?;

    for email in initial_admins {
        sqlx::query("INSERT OR IGNORE INTO users (email, role) VALUES (?, 'admin')")
            .bind(email)
            .execute(pool)
            .await?;
    }

    Ok(())
}

/// Align every scouting type's table with its field configuration.
///
/// Creation and augmentation share one code path: tables are created with
/// only the base columns, then missing field columns are added one by one.
/// Columns present in the live schema but absent from configuration are left
/// untouched, so retired fields keep their history.
///
/// Known limitation: a field whose logical type changed keeps the storage
/// type it was first created with.
pub async fn synchronize(pool: &SqlitePool, config: &ScoutingConfig) -> Result<(), sqlx::Error> {
    for ty in config.types() {
        sqlx::query(&format!(
            "CREATE TABLE IF NOT EXISTS {} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            ty.table_name
        ))
        .execute(pool)
        .await?;

        let existing = table_columns(pool, &ty.table_name).await?;

        for field in &ty.fields {
            if existing.iter().any(|c| c == &field.id) {
                continue;
            }

            sqlx::query(&format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                ty.table_name,
                field.id,
                field.field_type.storage_type()
            ))
            .execute(pool)
            .await
            .map_err(|e| {
                tracing::error!(
                    "Failed adding column {} to {}: {:?}",
                    field.id,
                    ty.table_name,
                    e
                );
                e
            })?;

            tracing::info!("Added column {} to {}", field.id, ty.table_name);
        }
    }

    tracing::info!("Schema synchronized for {} scouting type(s)", config.len());

    Ok(())
}

/// Names of the live columns of a table, in declaration order.
pub async fn table_columns(pool: &SqlitePool, table: &str) -> Result<Vec<String>, sqlx::Error> {
    let rows = sqlx::query("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(pool)
        .await?;

    rows.iter().map(|row| row.try_get("name")).collect()
}
