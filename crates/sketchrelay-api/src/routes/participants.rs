//! Routes for participant notifications.

use axum::extract::{Path, State};
use axum::{Json, Router, routing::get};

use sketchrelay_game::application::directory::NotificationView;
use sketchrelay_game::application::query_handlers;

use crate::error::ApiError;
use crate::state::AppState;

/// GET /{identity}/notification
async fn get_notification(
    State(state): State<AppState>,
    Path(identity): Path<String>,
) -> Result<Json<NotificationView>, ApiError> {
    let view = query_handlers::get_queued_notification(&identity, &state.directory)?;
    Ok(Json(view))
}

/// Returns the router for participants.
pub fn router() -> Router<AppState> {
    Router::new().route("/{identity}/notification", get(get_notification))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use serde_json::Value;
    use sketchrelay_test_support::{FixedClock, MemoryBlobStore, RecordingRenderer};
    use tower::ServiceExt;

    fn test_app_state() -> AppState {
        AppState::new(
            Arc::new(FixedClock(Utc::now())),
            Arc::new(RecordingRenderer::new()),
            Arc::new(MemoryBlobStore::new()),
            64,
        )
    }

    #[tokio::test]
    async fn test_known_identity_gets_welcome() {
        // Arrange
        let state = test_app_state();
        state.directory.require("alice", "s3cret").unwrap();
        let app = router().with_state(state);

        let request = Request::builder()
            .method("GET")
            .uri("/alice/notification")
            .body(Body::empty())
            .unwrap();

        // Act
        let response = app.oneshot(request).await.unwrap();

        // Assert
        assert_eq!(response.status(), StatusCode::OK);

        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body_bytes).unwrap();

        assert_eq!(json["identity"], "alice");
        assert_eq!(json["notification"]["kind"], "welcome");
        assert!(json["message"].as_str().unwrap().starts_with("Welcome"));
    }

    #[tokio::test]
    async fn test_unknown_identity_returns_404() {
        let app = router().with_state(test_app_state());

        let request = Request::builder()
            .method("GET")
            .uri("/nobody/notification")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
