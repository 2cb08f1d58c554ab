use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, Identity, Role};
use crate::constants::ERR_INVALID_ROLE;
use crate::db::users;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: Option<String>,
    pub role: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub role: Option<String>,
}

fn normalize_email(email: Option<&str>) -> Result<String> {
    let normalized = email.unwrap_or_default().trim().to_lowercase();
    if normalized.is_empty() {
        return Err(AppError::InvalidInput("Email is required".to_string()));
    }
    Ok(normalized)
}

fn parse_role(role: Option<&str>) -> Result<Role> {
    role.and_then(Role::parse)
        .ok_or_else(|| AppError::InvalidInput(ERR_INVALID_ROLE.to_string()))
}

/// List all recognized users (admin only).
pub async fn list_users(
    State(state): State<AppState>,
    identity: Identity,
) -> Result<Json<Value>> {
    auth::require_admin(&state.pool, &identity).await?;

    let users = users::list(&state.pool).await?;
    Ok(Json(json!({ "users": users })))
}

/// Grant a role to an email (admin only). 409 when the email already exists.
pub async fn create_user(
    State(state): State<AppState>,
    identity: Identity,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let admin = auth::require_admin(&state.pool, &identity).await?;

    let email = normalize_email(payload.email.as_deref())?;
    let role = parse_role(payload.role.as_deref())?;

    let id = users::create(&state.pool, &email, role).await?;

    tracing::info!("User {} added with role {} by {}", email, role.as_str(), admin);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "id": id,
            "email": email,
            "role": role,
        })),
    ))
}

/// Change a user's role (admin only). Admins may change their own role.
pub async fn update_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    identity: Identity,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<Value>> {
    let admin = auth::require_admin(&state.pool, &identity).await?;

    let email = normalize_email(Some(email.as_str()))?;
    let role = parse_role(payload.role.as_deref())?;

    users::update_role(&state.pool, &email, role).await?;

    tracing::info!("User {} role set to {} by {}", email, role.as_str(), admin);

    Ok(Json(json!({
        "success": true,
        "email": email,
        "role": role,
    })))
}

/// Remove a user (admin only, self-removal included).
pub async fn delete_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    identity: Identity,
) -> Result<Json<Value>> {
    let admin = auth::require_admin(&state.pool, &identity).await?;

    let email = normalize_email(Some(email.as_str()))?;
    users::delete(&state.pool, &email).await?;

    tracing::info!("User {} removed by {}", email, admin);

    Ok(Json(json!({ "success": true })))
}

/// Resolved identity and capability flags for the caller.
///
/// Anonymous callers get 401 with `authenticated: false` so the client knows
/// to offer sign-in rather than a permission message.
pub async fn me(State(state): State<AppState>, identity: Identity) -> Result<Response> {
    let Some(email) = identity.email() else {
        return Ok((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "authenticated": false })),
        )
            .into_response());
    };

    let role = users::resolve_role(&state.pool, email).await?;
    let can_upload = role.is_some_and(Role::can_upload);
    let can_edit = role.is_some_and(Role::can_edit);
    let can_manage_users = role.is_some_and(Role::can_manage_users);

    Ok(Json(json!({
        "user": { "email": email },
        "role": role,
        "canUpload": can_upload,
        "canEdit": can_edit,
        "canManageUsers": can_manage_users,
    }))
    .into_response())
}
