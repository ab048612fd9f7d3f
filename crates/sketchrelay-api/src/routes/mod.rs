//! Route modules, one per resource.

use axum::Router;

use crate::state::AppState;

pub mod archives;
pub mod health;
pub mod participants;
pub mod sessions;
pub mod uploads;

/// Returns the full API router. `max_upload_bytes` caps the body of an
/// image upload.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/sessions", sessions::router())
        .nest("/api/v1/archives", archives::router())
        .nest("/api/v1/participants", participants::router())
        .nest("/api/v1/uploads", uploads::router(max_upload_bytes))
}
