use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};

use crate::auth::{self, Identity};
use crate::db::entries;
use crate::error::{AppError, Result};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "sortBy")]
    pub sort_by: Option<String>,
    #[serde(rename = "sortOrder")]
    pub sort_order: Option<String>,
}

/// Treat any JSON body as a field-value map; non-object bodies behave like
/// an empty submission and fail required-field validation.
fn as_field_map(payload: Value) -> Map<String, Value> {
    match payload {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// Submit a new scouting entry (upload or admin role required).
pub async fn submit_entry(
    State(state): State<AppState>,
    Path(type_key): Path<String>,
    identity: Identity,
    Json(payload): Json<Value>,
) -> Result<(StatusCode, Json<Value>)> {
    let email = auth::require_upload(&state.pool, &identity).await?;

    let ty = state.scouting.get(&type_key).ok_or(AppError::TypeNotFound)?;
    let data = as_field_map(payload);

    let id = entries::insert(&state.pool, ty, &data).await?;

    tracing::info!("Entry {} submitted to {} by {}", id, ty.table_name, email);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "id": id,
            "message": "Scouting data saved successfully",
        })),
    ))
}

/// List all entries of a type, sorted. Public.
pub async fn list_entries(
    State(state): State<AppState>,
    Path(type_key): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Value>>> {
    let ty = state.scouting.get(&type_key).ok_or(AppError::TypeNotFound)?;

    let rows = entries::list(
        &state.pool,
        ty,
        query.sort_by.as_deref(),
        query.sort_order.as_deref(),
    )
    .await?;

    Ok(Json(rows))
}

/// Fetch a single entry by id. Public.
pub async fn get_entry(
    State(state): State<AppState>,
    Path((type_key, id)): Path<(String, i64)>,
) -> Result<Json<Value>> {
    let ty = state.scouting.get(&type_key).ok_or(AppError::TypeNotFound)?;
    let entry = entries::get_by_id(&state.pool, ty, id).await?;
    Ok(Json(entry))
}

/// Full-overwrite update of an entry (admin only).
///
/// Every configured field is written; omitted fields become null.
pub async fn update_entry(
    State(state): State<AppState>,
    Path((type_key, id)): Path<(String, i64)>,
    identity: Identity,
    Json(payload): Json<Value>,
) -> Result<Json<Value>> {
    let email = auth::require_admin(&state.pool, &identity).await?;

    let ty = state.scouting.get(&type_key).ok_or(AppError::TypeNotFound)?;
    let data = as_field_map(payload);

    entries::update(&state.pool, ty, id, &data).await?;

    tracing::info!("Entry {} in {} updated by {}", id, ty.table_name, email);

    Ok(Json(json!({
        "success": true,
        "message": "Entry updated successfully",
    })))
}

/// Delete an entry, with best-effort cleanup of any referenced upload
/// (admin only).
pub async fn delete_entry(
    State(state): State<AppState>,
    Path((type_key, id)): Path<(String, i64)>,
    identity: Identity,
) -> Result<Json<Value>> {
    let email = auth::require_admin(&state.pool, &identity).await?;

    let ty = state.scouting.get(&type_key).ok_or(AppError::TypeNotFound)?;

    entries::delete_by_id(&state.pool, ty, id, std::path::Path::new(&state.config.uploads_dir))
        .await?;

    tracing::info!("Entry {} in {} deleted by {}", id, ty.table_name, email);

    Ok(Json(json!({
        "success": true,
        "message": "Entry deleted successfully",
    })))
}
