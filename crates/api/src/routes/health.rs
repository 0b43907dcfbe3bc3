use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Overall service status.
    pub status: &'static str,
    /// A learned-model stack is linked (never, in this configuration).
    pub tensorflow_available: bool,
    /// DICOM decoding is compiled in.
    pub dicom_available: bool,
    /// The MRNet scorer is enabled (never, in this configuration).
    pub mrnet_enabled: bool,
}

/// GET /api/health -- returns service status and capability flags.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "running",
        tensorflow_available: state.capabilities.tensorflow_available,
        dicom_available: state.capabilities.dicom_available,
        mrnet_enabled: state.capabilities.mrnet_enabled,
    })
}

/// Mount health check routes.
pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health_check))
}
