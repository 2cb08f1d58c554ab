use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Map, Value};

use crate::error::{AppError, Result};
use crate::AppState;

/// List every configured scouting type with its name and description,
/// in configuration order.
pub async fn scouting_types(State(state): State<AppState>) -> Json<Value> {
    let mut types = Map::new();
    for ty in state.scouting.types() {
        types.insert(
            ty.key.clone(),
            json!({
                "name": ty.name,
                "description": ty.description,
            }),
        );
    }

    Json(json!({ "scoutingTypes": types }))
}

/// Field descriptors for one scouting type, in configuration order.
///
/// The client builds its form and table views entirely from this response.
pub async fn field_config(
    State(state): State<AppState>,
    Path(type_key): Path<String>,
) -> Result<Json<Value>> {
    let ty = state.scouting.get(&type_key).ok_or(AppError::TypeNotFound)?;

    Ok(Json(json!({
        "name": ty.name,
        "description": ty.description,
        "fields": ty.fields,
    })))
}
