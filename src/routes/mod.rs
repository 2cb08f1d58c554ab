pub mod entries;
pub mod health;
pub mod scouting;
pub mod upload;
pub mod users;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};
use tower_http::services::ServeDir;

use crate::constants::MAX_UPLOAD_SIZE_BYTES;
use crate::AppState;

pub use entries::{delete_entry, get_entry, list_entries, submit_entry, update_entry};
pub use health::health_check;
pub use scouting::{field_config, scouting_types};
pub use upload::upload_file;
pub use users::{create_user, delete_user, list_users, me, update_user};

/// Build the application router. Shared between the binary and the
/// integration tests so both exercise the same wiring.
pub fn router(state: AppState) -> Router {
    let uploads_service = ServeDir::new(&state.config.uploads_dir);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/scouting-types", get(scouting_types))
        .route("/api/fields/:type", get(field_config))
        .route("/api/upload", post(upload_file))
        .route("/api/submit/:type", post(submit_entry))
        .route("/api/data/:type", get(list_entries))
        .route(
            "/api/data/:type/:id",
            get(get_entry).put(update_entry).delete(delete_entry),
        )
        .route("/api/users", get(list_users).post(create_user))
        .route("/api/users/:email", put(update_user).delete(delete_user))
        .route("/api/me", get(me))
        .nest_service("/uploads", uploads_service)
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .with_state(state)
}
