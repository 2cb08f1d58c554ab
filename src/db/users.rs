//! Users table access: role lookups and admin-managed user records.

use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use crate::auth::Role;
use crate::error::{AppError, Result};

/// A recognized user and their role, as served by the users API.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub created_at: String,
}

/// Case-insensitive role lookup. Absence from the table means no role.
///
/// Called on every gated request; no caching, so a role change takes effect
/// on the affected user's next request.
pub async fn resolve_role(pool: &SqlitePool, email: &str) -> Result<Option<Role>> {
    let normalized = email.trim().to_lowercase();
    let row: Option<(Role,)> = sqlx::query_as("SELECT role FROM users WHERE email = ?")
        .bind(&normalized)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(|(role,)| role))
}

/// All users, ordered by email.
pub async fn list(pool: &SqlitePool) -> Result<Vec<User>> {
    let users = sqlx::query_as("SELECT id, email, role, created_at FROM users ORDER BY email")
        .fetch_all(pool)
        .await?;
    Ok(users)
}

/// Add a user with a role. Duplicate emails conflict.
pub async fn create(pool: &SqlitePool, email: &str, role: Role) -> Result<i64> {
    let result = sqlx::query("INSERT INTO users (email, role) VALUES (?, ?)")
        .bind(email)
        .bind(role.as_str())
        .execute(pool)
        .await
        .map_err(|e| {
            if e.as_database_error()
                .is_some_and(|db| db.is_unique_violation())
            {
                AppError::UserAlreadyExists
            } else {
                AppError::Database(e)
            }
        })?;

    Ok(result.last_insert_rowid())
}

/// Change an existing user's role.
pub async fn update_role(pool: &SqlitePool, email: &str, role: Role) -> Result<()> {
    let result = sqlx::query("UPDATE users SET role = ? WHERE email = ?")
        .bind(role.as_str())
        .bind(email)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::UserNotFound);
    }
    Ok(())
}

/// Remove a user. Admins may remove anyone, including themselves.
pub async fn delete(pool: &SqlitePool, email: &str) -> Result<()> {
    let result = sqlx::query("DELETE FROM users WHERE email = ?")
        .bind(email)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::UserNotFound);
    }
    Ok(())
}
