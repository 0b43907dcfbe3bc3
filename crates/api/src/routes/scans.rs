//! Upload and analyze endpoints for MRI scans.
//!
//! Upload accepts a multipart file, validates the extension, stores the
//! bytes under the generated identifier, and registers the submission.
//! Analyze runs the decode -> extract -> score pipeline under the
//! submission's analysis lock and merges the outcome into the stored record.

use axum::extract::{DefaultBodyLimit, Multipart, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use stepsight_core::error::CoreError;
use stepsight_core::submission::{allowed_extension, Submission, DICOM_EXTENSION};
use stepsight_core::{features, imaging, scoring};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Upload body cap. MRI scans and DICOM series routinely exceed axum's
/// 2 MiB default request limit.
pub const MAX_UPLOAD_BYTES: usize = 64 * 1024 * 1024;

/// Typed response for the upload endpoint.
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub upload_id: Uuid,
    pub message: &'static str,
}

fn unknown_submission(id: &str) -> CoreError {
    CoreError::NotFound {
        entity: "submission",
        id: id.to_string(),
    }
}

/// POST /api/v1/mri/upload
///
/// Accept a multipart upload with a `file` field, validate its extension
/// against the allow-list, and register a submission with status `uploaded`.
pub async fn upload_scan(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<UploadResponse>)> {
    let mut file: Option<(String, axum::body::Bytes)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().unwrap_or_default().to_string();
        if filename.is_empty() {
            return Err(AppError::BadRequest("Invalid file type".into()));
        }
        let extension = allowed_extension(&filename)?;

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;

        file = Some((extension, data));
        break;
    }

    let Some((extension, data)) = file else {
        return Err(AppError::BadRequest("No file uploaded".into()));
    };

    let is_dicom = extension == DICOM_EXTENSION;
    let (upload_id, file_path) = state
        .store
        .create(&state.config.upload_dir, &extension, is_dicom)
        .await;

    if let Err(e) = tokio::fs::write(&file_path, &data).await {
        // Don't leave a record pointing at a file that was never written.
        let _ = state.store.remove(&upload_id).await;
        return Err(AppError::InternalError(format!(
            "Failed to store upload: {e}"
        )));
    }

    tracing::info!(%upload_id, is_dicom, bytes = data.len(), "Scan uploaded");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            upload_id,
            message: "File uploaded successfully",
        }),
    ))
}

/// GET /api/v1/mri/analyze/{upload_id}
///
/// Run the analysis pipeline on a previously uploaded scan and return the
/// full updated submission record. The stored file is re-read on every call.
pub async fn analyze_scan(
    State(state): State<AppState>,
    Path(upload_id): Path<String>,
) -> AppResult<Json<Submission>> {
    // Any string that does not name a live submission is unknown, including
    // non-UUID input.
    let id: Uuid = upload_id
        .parse()
        .map_err(|_| unknown_submission(&upload_id))?;

    let submission = state
        .store
        .get(&id)
        .await
        .ok_or_else(|| unknown_submission(&upload_id))?;
    let lock = state
        .store
        .analysis_lock(&id)
        .await
        .ok_or_else(|| unknown_submission(&upload_id))?;

    // Serialize analyses of this submission; other identifiers are
    // unaffected.
    let _guard = lock.lock().await;

    let caps = state.capabilities;
    let file_path = submission.file_path.clone();
    let is_dicom = submission.is_dicom;

    // Decode and extraction are CPU-bound; keep them off the async runtime.
    let result = tokio::task::spawn_blocking(move || {
        let img = imaging::decode_image(&file_path, is_dicom, &caps)?;
        features::extract_features(&img)
    })
    .await
    .map_err(|e| AppError::InternalError(format!("Analysis task failed: {e}")))?;

    match result {
        Ok(extracted) => {
            let (risk_score, severity) = scoring::score(&extracted);
            let updated = state
                .store
                .complete(&id, extracted, risk_score, severity)
                .await?;
            tracing::info!(%id, risk_score, ?severity, "Scan analyzed");
            Ok(Json(updated))
        }
        Err(err) => {
            state.store.fail(&id, err.to_string()).await?;
            tracing::warn!(%id, error = %err, "Scan analysis failed");
            Err(err.into())
        }
    }
}

/// Mount scan routes (intended for nesting under `/api/v1/mri`).
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload_scan))
        .route("/analyze/{upload_id}", get(analyze_scan))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
