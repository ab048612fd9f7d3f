//! Shared test helpers for API integration tests.
#![allow(dead_code)]

use std::io::Cursor;
use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use image::{ImageFormat, Rgba, RgbaImage};
use sketchrelay_core::clock::Clock;
use sketchrelay_core::render::AnimationRenderer;
use sketchrelay_test_support::{FixedClock, MemoryBlobStore, RecordingRenderer};
use tower::ServiceExt;

use sketchrelay_api::config::DEFAULT_MAX_UPLOAD_BYTES;
use sketchrelay_api::routes;
use sketchrelay_api::state::AppState;

const BOUNDARY: &str = "sketchrelay-integration-boundary";

/// Edge length uploads are normalized to in tests.
pub const TEST_UPLOAD_SIZE: u32 = 32;

/// Fixed timestamp used across all integration tests.
fn fixed_clock() -> Arc<dyn Clock> {
    Arc::new(FixedClock(
        chrono::TimeZone::with_ymd_and_hms(&chrono::Utc, 2026, 1, 15, 10, 0, 0).unwrap(),
    ))
}

/// Application state plus handles on its in-memory fakes.
pub struct TestContext {
    pub state: AppState,
    pub blobs: Arc<MemoryBlobStore>,
}

/// Build state backed by a `MemoryBlobStore` and a `RecordingRenderer`.
pub fn build_test_context() -> TestContext {
    build_test_context_with_renderer(Arc::new(RecordingRenderer::new()))
}

/// Build state backed by a `MemoryBlobStore` and the given renderer.
pub fn build_test_context_with_renderer(renderer: Arc<dyn AnimationRenderer>) -> TestContext {
    let blobs = Arc::new(MemoryBlobStore::new());
    let state = AppState::new(fixed_clock(), renderer, blobs.clone(), TEST_UPLOAD_SIZE);
    TestContext { state, blobs }
}

/// Build the full app router over `state`. Uses the same route structure
/// as `main.rs`.
pub fn build_test_app(state: &AppState) -> Router {
    routes::router(DEFAULT_MAX_UPLOAD_BYTES).with_state(state.clone())
}

async fn read_json(response: axum::response::Response) -> (StatusCode, serde_json::Value) {
    let status = response.status();
    let body_bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();

    (status, json)
}

/// Send a POST request with a JSON body and return the response.
pub async fn post_json(
    app: Router,
    uri: &str,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();

    read_json(app.oneshot(request).await.unwrap()).await
}

/// Send a POST request without a body and return the response.
pub async fn post_empty(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    read_json(app.oneshot(request).await.unwrap()).await
}

/// Send a GET request and return the response.
pub async fn get_json(app: Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let request = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap();

    read_json(app.oneshot(request).await.unwrap()).await
}

/// Upload `file` as a multipart form to `/api/v1/uploads`.
pub async fn post_upload(
    app: Router,
    identity: &str,
    secret: &str,
    file: &[u8],
) -> (StatusCode, serde_json::Value) {
    let mut body = Vec::new();
    for (name, value) in [("identity", identity), ("secret", secret)] {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
    }
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"drawing.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(file);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method("POST")
        .uri("/api/v1/uploads")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();

    read_json(app.oneshot(request).await.unwrap()).await
}

/// A solid-colour PNG.
pub fn png_bytes(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    let mut bytes = Vec::new();
    RgbaImage::from_pixel(width, height, Rgba(color))
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    bytes
}
