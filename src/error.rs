use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use panel_encode::EncodeError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid upload: {0}")]
    InvalidUpload(String),

    #[error("Upload exceeds {limit} bytes")]
    UploadTooLarge { limit: usize },

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Resize error: {0}")]
    Resize(String),

    #[error("Quantize error: {0}")]
    Quantize(String),

    #[error("Size mismatch: expected {expected} indices, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<EncodeError> for PipelineError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Decode(msg) => PipelineError::Decode(msg),
            EncodeError::Resize(msg) => PipelineError::Resize(msg),
            EncodeError::Quantize(msg) => PipelineError::Quantize(msg),
            EncodeError::SizeMismatch { expected, actual } => {
                PipelineError::SizeMismatch { expected, actual }
            }
            EncodeError::Palette(e) => PipelineError::Quantize(e.to_string()),
        }
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingField(_) | ApiError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            ApiError::UploadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Pipeline(PipelineError::Decode(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Pipeline(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}
