#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, Response, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use tempfile::TempDir;
use tower::ServiceExt;

use stepsight_api::config::ServerConfig;
use stepsight_api::router::build_app_router;
use stepsight_api::state::AppState;
use stepsight_core::capabilities::Capabilities;
use stepsight_core::submission::SubmissionStore;

/// Boundary used by the hand-assembled multipart bodies below.
pub const BOUNDARY: &str = "stepsight-test-boundary";

/// Build a test `ServerConfig` with safe defaults and the given upload dir.
pub fn test_config(upload_dir: PathBuf) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upload_dir,
    }
}

/// Build the full application router with all middleware layers, backed by a
/// temporary upload directory.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. The returned `TempDir` must be kept
/// alive for the duration of the test.
pub fn build_test_app() -> (Router, TempDir) {
    let dir = tempfile::tempdir().expect("failed to create temp upload dir");
    let (app, _store) = build_test_app_at(dir.path().to_path_buf());
    (app, dir)
}

/// Like [`build_test_app`], but with an explicit upload directory and a
/// handle to the submission store so tests can inspect stored state.
pub fn build_test_app_at(upload_dir: PathBuf) -> (Router, Arc<SubmissionStore>) {
    let config = test_config(upload_dir);
    let store = Arc::new(SubmissionStore::new());

    let state = AppState {
        store: Arc::clone(&store),
        config: Arc::new(config.clone()),
        capabilities: Capabilities::detect(),
    };

    (build_app_router(state, &config), store)
}

/// Issue a GET request against the app.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// POST a single file as `multipart/form-data` under the given field name.
pub async fn post_file(
    app: Router,
    uri: &str,
    field: &str,
    filename: &str,
    data: &[u8],
) -> Response<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// POST an empty multipart body (no fields at all).
pub async fn post_empty_multipart(app: Router, uri: &str) -> Response<Body> {
    let body = format!("--{BOUNDARY}--\r\n");
    app.oneshot(
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                "content-type",
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Upload `data` as `filename` and return the generated upload id,
/// asserting the upload succeeded.
pub async fn upload(app: &Router, filename: &str, data: &[u8]) -> String {
    let response = post_file(app.clone(), "/api/v1/mri/upload", "file", filename, data).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    json["upload_id"].as_str().expect("upload_id missing").to_string()
}

/// A small checkerboard PNG with plenty of edges and texture.
pub fn checkerboard_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(64, 64, |x, y| {
        if (x / 8 + y / 8) % 2 == 0 {
            image::Rgb([255, 255, 255])
        } else {
            image::Rgb([0, 0, 0])
        }
    });
    png_bytes(&img)
}

/// A featureless uniform PNG.
pub fn flat_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(64, 64, image::Rgb([128, 128, 128]));
    png_bytes(&img)
}

/// A large noise PNG whose encoded size stays well above axum's default
/// 2 MiB body limit (noise does not compress).
pub fn large_noise_png() -> Vec<u8> {
    let img = image::RgbImage::from_fn(1600, 1600, |x, y| {
        // Integer hash of the coordinates; full avalanche so PNG filters
        // find nothing to compress.
        let mut h = x.wrapping_mul(0x9E37_79B1) ^ y.wrapping_mul(0x85EB_CA6B);
        h ^= h >> 16;
        h = h.wrapping_mul(0x7FEB_352D);
        h ^= h >> 15;
        h = h.wrapping_mul(0x846C_A68B);
        h ^= h >> 16;
        image::Rgb([h as u8, (h >> 8) as u8, (h >> 16) as u8])
    });
    png_bytes(&img)
}

fn png_bytes(img: &image::RgbImage) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png).unwrap();
    buf.into_inner()
}
