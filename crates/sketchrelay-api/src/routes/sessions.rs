//! Routes for game sessions.

use axum::extract::{Path, State};
use axum::{
    Json, Router,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sketchrelay_core::error::DomainError;
use tracing::{info, instrument};
use uuid::Uuid;

use sketchrelay_game::application::command_handlers::{
    self, JoinResult, SessionCommandResult, SubmissionResult,
};
use sketchrelay_game::application::query_handlers::{self, SessionView};
use sketchrelay_game::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Unique session name.
    pub name: String,
    /// Round count as a JSON number or numeric string; absent or `<= 0`
    /// means one round per participant.
    #[serde(default, alias = "totalRounds")]
    pub total_rounds: Option<Value>,
    /// Advisory per-round timer in seconds.
    #[serde(default, alias = "roundTimer")]
    pub round_timer: Option<u32>,
}

/// Request body for POST /{name}/join.
#[derive(Debug, Deserialize)]
pub struct JoinSessionRequest {
    /// Joining identity.
    pub identity: String,
    /// Identity secret; bound on first use.
    pub secret: String,
}

/// Request body for POST /{name}/prompts.
#[derive(Debug, Deserialize)]
pub struct SubmitPromptRequest {
    /// Submitting identity.
    pub identity: String,
    /// Identity secret.
    pub secret: String,
    /// Prompt or caption text.
    pub text: String,
}

/// Request body for POST /{name}/drawings.
#[derive(Debug, Deserialize)]
pub struct SubmitDrawingRequest {
    /// Submitting identity.
    pub identity: String,
    /// Identity secret.
    pub secret: String,
    /// Blob key returned by POST /api/v1/uploads.
    #[serde(alias = "imageRef")]
    pub image_ref: String,
}

/// Response body for GET /.
#[derive(Debug, Serialize)]
pub struct SessionListResponse {
    /// Names of all active sessions, sorted.
    pub sessions: Vec<String>,
}

fn parse_total_rounds(value: Option<&Value>) -> Result<Option<i64>, DomainError> {
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number.as_i64().map(Some).ok_or_else(|| {
            DomainError::Validation(format!("total_rounds must be an integer, got {number}"))
        }),
        Some(Value::String(text)) => text.trim().parse().map(Some).map_err(|_| {
            DomainError::Validation(format!("total_rounds must be numeric, got {text:?}"))
        }),
        Some(other) => Err(DomainError::Validation(format!(
            "total_rounds must be a number, got {other}"
        ))),
    }
}

/// POST /
#[instrument(skip(state, request), fields(session = %request.name))]
async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<SessionCommandResult>, ApiError> {
    let command = commands::CreateSession {
        correlation_id: Uuid::new_v4(),
        name: request.name.clone(),
        total_rounds: parse_total_rounds(request.total_rounds.as_ref())?,
        round_timer: request.round_timer,
    };

    info!(correlation_id = %command.correlation_id, "handling create_session command");

    let result = command_handlers::handle_create_session(&command, &state.registry)?;
    Ok(Json(result))
}

/// GET /
async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, ApiError> {
    let sessions = query_handlers::list_active_sessions(&state.registry)?;
    Ok(Json(SessionListResponse { sessions }))
}

/// GET /{name}
async fn get_session(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let view = query_handlers::get_session_state(&name, &state.registry)?;
    Ok(Json(view))
}

/// POST /{name}/start
#[instrument(skip(state))]
async fn start_session(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SessionCommandResult>, ApiError> {
    let command = commands::StartSession {
        correlation_id: Uuid::new_v4(),
        name,
    };

    info!(correlation_id = %command.correlation_id, "handling start_session command");

    let result = command_handlers::handle_start_session(
        &command,
        state.clock.as_ref(),
        &state.registry,
        &state.directory,
    )?;
    Ok(Json(result))
}

/// POST /{name}/join
#[instrument(skip(state, request), fields(identity = %request.identity))]
async fn join_session(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<JoinSessionRequest>,
) -> Result<Json<JoinResult>, ApiError> {
    let command = commands::JoinSession {
        correlation_id: Uuid::new_v4(),
        name,
        identity: request.identity,
        secret: request.secret,
    };

    info!(correlation_id = %command.correlation_id, "handling join_session command");

    let result = command_handlers::handle_join_session(
        &command,
        state.clock.as_ref(),
        &state.registry,
        &state.directory,
    )?;
    Ok(Json(result))
}

/// POST /{name}/prompts
#[instrument(skip(state, request), fields(identity = %request.identity))]
async fn submit_prompt(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SubmitPromptRequest>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let command = commands::SubmitPrompt {
        correlation_id: Uuid::new_v4(),
        name,
        identity: request.identity,
        secret: request.secret,
        text: request.text,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_prompt command");

    let result = command_handlers::handle_submit_prompt(&command, &state.services()).await?;
    Ok(Json(result))
}

/// POST /{name}/drawings
#[instrument(skip(state, request), fields(identity = %request.identity))]
async fn submit_drawing(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Json(request): Json<SubmitDrawingRequest>,
) -> Result<Json<SubmissionResult>, ApiError> {
    let command = commands::SubmitDrawing {
        correlation_id: Uuid::new_v4(),
        name,
        identity: request.identity,
        secret: request.secret,
        image_ref: request.image_ref,
    };

    info!(correlation_id = %command.correlation_id, "handling submit_drawing command");

    let result = command_handlers::handle_submit_drawing(&command, &state.services()).await?;
    Ok(Json(result))
}

/// POST /{name}/end
#[instrument(skip(state))]
async fn end_session(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<SessionCommandResult>, ApiError> {
    let command = commands::EndSession {
        correlation_id: Uuid::new_v4(),
        name,
    };

    info!(correlation_id = %command.correlation_id, "handling end_session command");

    let result = command_handlers::handle_end_session(&command, &state.services()).await?;
    Ok(Json(result))
}

/// Returns the router for game sessions.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_session).get(list_sessions))
        .route("/{name}", get(get_session))
        .route("/{name}/start", post(start_session))
        .route("/{name}/join", post(join_session))
        .route("/{name}/prompts", post(submit_prompt))
        .route("/{name}/drawings", post(submit_drawing))
        .route("/{name}/end", post(end_session))
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::Utc;
    use sketchrelay_core::blob::BlobStore;
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

    async fn send(
        state: &AppState,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let app = router().with_state(state.clone());
        let request = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => request
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&body_bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[test]
    fn test_parse_total_rounds_accepts_numbers_and_numeric_strings() {
        assert_eq!(parse_total_rounds(None).unwrap(), None);
        assert_eq!(parse_total_rounds(Some(&Value::Null)).unwrap(), None);
        assert_eq!(parse_total_rounds(Some(&serde_json::json!(4))).unwrap(), Some(4));
        assert_eq!(parse_total_rounds(Some(&serde_json::json!(" 5 "))).unwrap(), Some(5));
        assert_eq!(parse_total_rounds(Some(&serde_json::json!(-1))).unwrap(), Some(-1));
    }

    #[test]
    fn test_parse_total_rounds_rejects_everything_else() {
        for value in [
            serde_json::json!("three"),
            serde_json::json!(2.5),
            serde_json::json!(true),
            serde_json::json!([3]),
        ] {
            assert!(matches!(
                parse_total_rounds(Some(&value)),
                Err(DomainError::Validation(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_create_session_returns_200_and_lists_it() {
        // Arrange
        let state = test_app_state();

        // Act
        let (status, json) = send(
            &state,
            "POST",
            "/",
            Some(serde_json::json!({ "name": "party", "totalRounds": "3" })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["session_name"], "party");
        assert!(json["archive_id"].is_null());

        let (status, json) = send(&state, "GET", "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["sessions"], serde_json::json!(["party"]));

        let (status, json) = send(&state, "GET", "/party", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["lifecycle"], "lobby");
        assert_eq!(json["requested_rounds"], 3);
        assert_eq!(json["game_started"], false);
    }

    #[tokio::test]
    async fn test_create_session_returns_400_for_non_numeric_rounds() {
        let state = test_app_state();

        let (status, json) = send(
            &state,
            "POST",
            "/",
            Some(serde_json::json!({ "name": "party", "total_rounds": "lots" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }

    #[tokio::test]
    async fn test_create_session_returns_409_for_duplicate_name() {
        let state = test_app_state();
        let body = serde_json::json!({ "name": "party" });

        let (first, _) = send(&state, "POST", "/", Some(body.clone())).await;
        let (second, json) = send(&state, "POST", "/", Some(body)).await;

        assert_eq!(first, StatusCode::OK);
        assert_eq!(second, StatusCode::CONFLICT);
        assert_eq!(json["error"], "state_error");
    }

    #[tokio::test]
    async fn test_create_session_returns_422_for_missing_name() {
        let state = test_app_state();

        let (status, _) = send(&state, "POST", "/", Some(serde_json::json!({}))).await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn test_get_unknown_session_returns_404() {
        let state = test_app_state();

        let (status, json) = send(&state, "GET", "/nowhere", None).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
    }

    #[tokio::test]
    async fn test_join_returns_role_and_rejects_wrong_secret() {
        // Arrange
        let state = test_app_state();
        send(&state, "POST", "/", Some(serde_json::json!({ "name": "party" }))).await;

        // Act
        let (joined, json) = send(
            &state,
            "POST",
            "/party/join",
            Some(serde_json::json!({ "identity": "alice", "secret": "s3cret" })),
        )
        .await;
        let (rejected, error) = send(
            &state,
            "POST",
            "/party/join",
            Some(serde_json::json!({ "identity": "alice", "secret": "guess" })),
        )
        .await;

        // Assert
        assert_eq!(joined, StatusCode::OK);
        assert_eq!(json["role"], "participant");
        assert_eq!(json["event_ids"].as_array().unwrap().len(), 1);
        assert_eq!(rejected, StatusCode::UNAUTHORIZED);
        assert_eq!(error["error"], "auth_error");
    }

    #[tokio::test]
    async fn test_start_empty_session_returns_409() {
        let state = test_app_state();
        send(&state, "POST", "/", Some(serde_json::json!({ "name": "party" }))).await;

        let (status, json) = send(&state, "POST", "/party/start", None).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["error"], "state_error");
    }

    #[tokio::test]
    async fn test_prompt_before_start_returns_409() {
        let state = test_app_state();
        send(&state, "POST", "/", Some(serde_json::json!({ "name": "party" }))).await;
        send(
            &state,
            "POST",
            "/party/join",
            Some(serde_json::json!({ "identity": "alice", "secret": "s" })),
        )
        .await;

        let (status, _) = send(
            &state,
            "POST",
            "/party/prompts",
            Some(serde_json::json!({ "identity": "alice", "secret": "s", "text": "a cat" })),
        )
        .await;

        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_single_player_game_archives_on_last_drawing() {
        // Arrange
        let state = test_app_state();
        send(&state, "POST", "/", Some(serde_json::json!({ "name": "solo" }))).await;
        let credentials = serde_json::json!({ "identity": "alice", "secret": "s" });
        send(&state, "POST", "/solo/join", Some(credentials)).await;
        send(&state, "POST", "/solo/start", None).await;
        state.blobs.write("drawings/cat.png", b"png").await.unwrap();

        // Act
        let (prompt_status, prompt) = send(
            &state,
            "POST",
            "/solo/prompts",
            Some(serde_json::json!({ "identity": "alice", "secret": "s", "text": "a cat" })),
        )
        .await;
        let (drawing_status, drawing) = send(
            &state,
            "POST",
            "/solo/drawings",
            Some(serde_json::json!({
                "identity": "alice",
                "secret": "s",
                "imageRef": "drawings/cat.png"
            })),
        )
        .await;

        // Assert
        assert_eq!(prompt_status, StatusCode::OK);
        assert_eq!(prompt["advanced"], true);
        assert!(prompt["archive_id"].is_null());
        assert_eq!(drawing_status, StatusCode::OK);
        let archive_id = drawing["archive_id"].as_str().unwrap();
        assert_eq!(archive_id.len(), 32);
        let (status, _) = send(&state, "GET", "/solo", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            state.registry.archive_ids().unwrap(),
            vec![archive_id.to_owned()]
        );
    }

    #[tokio::test]
    async fn test_end_session_archives_and_second_end_is_404() {
        let state = test_app_state();
        send(&state, "POST", "/", Some(serde_json::json!({ "name": "party" }))).await;

        let (first, json) = send(&state, "POST", "/party/end", None).await;
        let (second, _) = send(&state, "POST", "/party/end", None).await;

        assert_eq!(first, StatusCode::OK);
        assert!(json["archive_id"].is_string());
        assert_eq!(second, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_drawing_that_was_never_uploaded_returns_404() {
        // Arrange
        let state = test_app_state();
        send(&state, "POST", "/", Some(serde_json::json!({ "name": "solo" }))).await;
        let credentials = serde_json::json!({ "identity": "alice", "secret": "s" });
        send(&state, "POST", "/solo/join", Some(credentials)).await;
        send(&state, "POST", "/solo/start", None).await;
        send(
            &state,
            "POST",
            "/solo/prompts",
            Some(serde_json::json!({ "identity": "alice", "secret": "s", "text": "a cat" })),
        )
        .await;

        // Act
        let (status, json) = send(
            &state,
            "POST",
            "/solo/drawings",
            Some(serde_json::json!({
                "identity": "alice",
                "secret": "s",
                "imageRef": "drawings/never-uploaded.png"
            })),
        )
        .await;

        // Assert
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"], "not_found");
        let (_, view) = send(&state, "GET", "/solo", None).await;
        assert!(view["drawings"][0][0].is_null());
        assert_eq!(view["phase"], "collecting_drawings");
    }

    #[tokio::test]
    async fn test_drawing_outside_drawings_area_returns_400() {
        let state = test_app_state();
        send(&state, "POST", "/", Some(serde_json::json!({ "name": "solo" }))).await;
        let credentials = serde_json::json!({ "identity": "alice", "secret": "s" });
        send(&state, "POST", "/solo/join", Some(credentials)).await;
        send(&state, "POST", "/solo/start", None).await;
        state.blobs.write("animations/old/chain-0.gif", b"gif").await.unwrap();

        let (status, json) = send(
            &state,
            "POST",
            "/solo/drawings",
            Some(serde_json::json!({
                "identity": "alice",
                "secret": "s",
                "imageRef": "animations/old/chain-0.gif"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "validation_error");
    }
}
