//! Routes for archived game results.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};
use serde::Serialize;

use sketchrelay_game::application::query_handlers;
use sketchrelay_game::domain::archive::ArchivedResult;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct ArchiveListResponse {
    /// Archive ids, oldest first.
    pub archives: Vec<String>,
}

/// GET /
async fn list_archives(
    State(state): State<AppState>,
) -> Result<Json<ArchiveListResponse>, ApiError> {
    let archives = query_handlers::list_archived_results(&state.registry)?;
    Ok(Json(ArchiveListResponse { archives }))
}

/// GET /{id}
async fn get_archive(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ArchivedResult>, ApiError> {
    let archived = query_handlers::get_archived_result(&id, &state.registry)?;
    Ok(Json(ArchivedResult::clone(&archived)))
}

/// Returns the router for archived results.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_archives))
        .route("/{id}", get(get_archive))
}
