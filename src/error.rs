use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::constants::{ERR_NEED_ADMIN_ROLE, ERR_NEED_UPLOAD_ROLE, ERR_SIGN_IN};

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("File storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Missing required fields: {0:?}")]
    MissingFields(Vec<String>),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Upload or admin role required")]
    UploadRoleRequired,

    #[error("Admin role required")]
    AdminRoleRequired,

    #[error("Scouting type not found")]
    TypeNotFound,

    #[error("Entry not found")]
    EntryNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("User already exists")]
    UserAlreadyExists,
}

/// Convert AppError into the structured `{"error": ...}` HTTP response.
///
/// Storage-level failures are logged and reported with a generic message;
/// everything else maps to a user-correctable status. Authentication (401)
/// and authorization (403) stay distinct so the client can prompt sign-in
/// versus display a permission message.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::Io(ref e) => {
                tracing::error!("File storage error: {:?}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
            AppError::MissingFields(missing) => {
                let body = Json(json!({
                    "error": "Missing required fields",
                    "missingFields": missing,
                }));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
            AppError::InvalidInput(ref msg) => (StatusCode::BAD_REQUEST, msg.as_str()),
            AppError::NotAuthenticated => (StatusCode::UNAUTHORIZED, ERR_SIGN_IN),
            AppError::UploadRoleRequired => (StatusCode::FORBIDDEN, ERR_NEED_UPLOAD_ROLE),
            AppError::AdminRoleRequired => (StatusCode::FORBIDDEN, ERR_NEED_ADMIN_ROLE),
            AppError::TypeNotFound => (StatusCode::NOT_FOUND, "Scouting type not found"),
            AppError::EntryNotFound => (StatusCode::NOT_FOUND, "Entry not found"),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "User not found"),
            AppError::UserAlreadyExists => (
                StatusCode::CONFLICT,
                "A user with this email already exists",
            ),
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}

/// Result type alias for application results
pub type Result<T> = std::result::Result<T, AppError>;
