//! Route for drawing uploads.

use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::{Json, Router, routing::post};
use serde::Serialize;
use sketchrelay_core::error::DomainError;
use tracing::{info, instrument};

use sketchrelay_media::upload::store_drawing;

use crate::error::ApiError;
use crate::state::AppState;

/// Response body for POST /.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    /// Blob key to pass as `image_ref` when submitting the drawing.
    pub image_ref: String,
}

fn malformed(err: &MultipartError) -> DomainError {
    DomainError::Validation(format!("malformed upload: {}", err.body_text()))
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, DomainError> {
    value.ok_or_else(|| DomainError::Validation(format!("upload is missing the {field} field")))
}

/// POST /
///
/// Multipart fields: `identity`, `secret` and `file`.
#[instrument(skip_all)]
async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut identity = None;
    let mut secret = None;
    let mut file = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| malformed(&e))? {
        let name = field.name().unwrap_or_default().to_owned();
        match name.as_str() {
            "identity" => identity = Some(field.text().await.map_err(|e| malformed(&e))?),
            "secret" => secret = Some(field.text().await.map_err(|e| malformed(&e))?),
            "file" => file = Some(field.bytes().await.map_err(|e| malformed(&e))?),
            _ => {}
        }
    }

    let identity = required(identity, "identity")?;
    let secret = required(secret, "secret")?;
    let file = required(file, "file")?;

    state.directory.require(identity.trim(), &secret)?;
    info!(identity = %identity.trim(), bytes = file.len(), "handling image upload");

    let image_ref = store_drawing(file.to_vec(), state.upload_size, state.blobs.as_ref()).await?;
    Ok(Json(UploadResponse { image_ref }))
}

/// Returns the router for uploads. Request bodies above
/// `max_upload_bytes` are rejected.
pub fn router(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/", post(upload_image))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
