use std::path::{Path, PathBuf};

use axum::{
    extract::{Multipart, State},
    Json,
};
use serde_json::{json, Value};

use crate::auth::{self, Identity};
use crate::constants::UPLOADS_URL_PREFIX;
use crate::error::{AppError, Result};
use crate::AppState;

/// Store an uploaded file (robot pictures) under the uploads directory and
/// return the relative path the entry should reference.
///
/// Requires the upload or admin role. Expects a multipart body with a part
/// named `file`.
pub async fn upload_file(
    State(state): State<AppState>,
    identity: Identity,
    mut multipart: Multipart,
) -> Result<Json<Value>> {
    let email = auth::require_upload(&state.pool, &identity).await?;

    let mut stored: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("Invalid multipart request: {}", e)))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let extension = field
            .file_name()
            .map(sanitized_extension)
            .unwrap_or_default();
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("Invalid multipart request: {}", e)))?;

        let uploads_dir = PathBuf::from(&state.config.uploads_dir);
        tokio::fs::create_dir_all(&uploads_dir).await?;

        let file_name = format!("{}{}", unique_suffix(), extension);
        tokio::fs::write(uploads_dir.join(&file_name), &data).await?;

        tracing::info!("Stored upload {} ({} bytes) from {}", file_name, data.len(), email);

        stored = Some(file_name);
        break;
    }

    let file_name = stored.ok_or_else(|| AppError::InvalidInput("No file uploaded".to_string()))?;

    Ok(Json(json!({
        "success": true,
        "filePath": format!("{}{}", UPLOADS_URL_PREFIX, file_name),
        "filename": file_name,
    })))
}

/// Collision-resistant file name stem: millisecond timestamp plus the
/// sub-millisecond remainder of the clock.
fn unique_suffix() -> String {
    let now = chrono::Utc::now();
    format!(
        "{}-{}",
        now.timestamp_millis(),
        now.timestamp_subsec_nanos() % 1_000_000
    )
}

/// Keep the original extension only if it is plainly alphanumeric.
fn sanitized_extension(original_name: &str) -> String {
    Path::new(original_name)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(sanitized_extension("robot.jpg"), ".jpg");
        assert_eq!(sanitized_extension("robot.JPG"), ".jpg");
        assert_eq!(sanitized_extension("archive.tar.gz"), ".gz");
        assert_eq!(sanitized_extension("no_extension"), "");
        assert_eq!(sanitized_extension("weird.j pg"), "");
        assert_eq!(sanitized_extension("trailing."), "");
    }
}
