#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// The uploaded file could not be decoded into an image.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Feature extraction failed on a decoded image.
    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
