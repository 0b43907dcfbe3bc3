//! In-memory submission store.
//!
//! Process-lifetime mapping from an opaque upload identifier to the state of
//! one submission. Constructed once at startup and shared by handle; the
//! store is the only owner of submission records. Each record carries a
//! per-identifier analysis lock so concurrent analyze calls on the same
//! identifier serialize instead of racing last-write-wins.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::error::CoreError;
use crate::features::ScanFeatures;
use crate::scoring::Severity;

/// Upload file extensions accepted by the service.
pub const ALLOWED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "dcm"];

/// Extension that marks an upload as DICOM.
pub const DICOM_EXTENSION: &str = "dcm";

/// Validate a client-supplied filename and return its lowercased extension.
pub fn allowed_extension(filename: &str) -> Result<String, CoreError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .ok_or_else(|| CoreError::Validation(format!("File '{filename}' has no extension")))?;

    if ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(CoreError::Validation(format!(
            "File extension '{ext}' is not allowed (expected one of: png, jpg, jpeg, dcm)"
        )))
    }
}

/// Lifecycle status of a submission.
///
/// Transitions are `uploaded -> completed` or `uploaded -> failed`; a failed
/// submission may be re-analyzed by a later request (the file is re-read
/// each time).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Uploaded,
    Completed,
    Failed,
}

/// One upload and, once analyzed, its result.
///
/// Serialized field names match the service's wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
    #[serde(rename = "filepath")]
    pub file_path: PathBuf,
    pub is_dicom: bool,
    pub status: SubmissionStatus,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub features: Option<ScanFeatures>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub severity_level: Option<Severity>,
    /// Always `null`: the MRNet scorer is disabled in this configuration.
    pub mrnet_acl_probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_timestamp: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

struct SubmissionEntry {
    record: Submission,
    analysis_lock: Arc<Mutex<()>>,
}

/// Process-wide map of upload id -> submission state.
#[derive(Default)]
pub struct SubmissionStore {
    entries: RwLock<HashMap<Uuid, SubmissionEntry>>,
}

impl SubmissionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new upload: generate a fresh identifier, derive the stored
    /// file path `<upload_dir>/<id>.<ext>`, and insert a record with status
    /// `uploaded` and the current timestamp.
    pub async fn create(
        &self,
        upload_dir: &Path,
        extension: &str,
        is_dicom: bool,
    ) -> (Uuid, PathBuf) {
        let mut entries = self.entries.write().await;

        // UUIDv4 collisions are negligible, but the identifier must never
        // clash with a live record.
        let mut id = Uuid::new_v4();
        while entries.contains_key(&id) {
            id = Uuid::new_v4();
        }

        let file_path = upload_dir.join(format!("{id}.{extension}"));
        entries.insert(
            id,
            SubmissionEntry {
                record: Submission {
                    file_path: file_path.clone(),
                    is_dicom,
                    status: SubmissionStatus::Uploaded,
                    timestamp: Utc::now(),
                    features: None,
                    risk_score: None,
                    severity_level: None,
                    mrnet_acl_probability: None,
                    analysis_timestamp: None,
                    error: None,
                },
                analysis_lock: Arc::new(Mutex::new(())),
            },
        );

        (id, file_path)
    }

    /// Snapshot of the record for `id`, if it exists.
    pub async fn get(&self, id: &Uuid) -> Option<Submission> {
        self.entries.read().await.get(id).map(|e| e.record.clone())
    }

    /// Remove the record for `id`, returning it if it existed.
    ///
    /// Used to roll back a registration whose file was never stored.
    pub async fn remove(&self, id: &Uuid) -> Option<Submission> {
        self.entries.write().await.remove(id).map(|e| e.record)
    }

    /// Number of live submissions.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// Handle to the per-identifier analysis lock.
    ///
    /// Callers hold the lock across the whole decode -> extract -> score ->
    /// merge sequence so analyses of one submission serialize.
    pub async fn analysis_lock(&self, id: &Uuid) -> Option<Arc<Mutex<()>>> {
        self.entries
            .read()
            .await
            .get(id)
            .map(|e| Arc::clone(&e.analysis_lock))
    }

    /// Merge a successful analysis into the record and return the updated
    /// snapshot.
    pub async fn complete(
        &self,
        id: &Uuid,
        features: ScanFeatures,
        risk_score: i64,
        severity: Severity,
    ) -> Result<Submission, CoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "submission",
            id: id.to_string(),
        })?;

        let record = &mut entry.record;
        record.status = SubmissionStatus::Completed;
        record.features = Some(features);
        record.risk_score = Some(risk_score);
        record.severity_level = Some(severity);
        record.mrnet_acl_probability = None;
        record.analysis_timestamp = Some(Utc::now());
        record.error = None;

        Ok(record.clone())
    }

    /// Mark the record as failed with the given error message.
    pub async fn fail(&self, id: &Uuid, error: String) -> Result<(), CoreError> {
        let mut entries = self.entries.write().await;
        let entry = entries.get_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "submission",
            id: id.to_string(),
        })?;

        entry.record.status = SubmissionStatus::Failed;
        entry.record.error = Some(error);
        Ok(())
    }
}
