//! Error types for the EAM OCR server

use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::ocr::OcrError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Failed to read upload: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, detail) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::Multipart(e) => {
                tracing::warn!("Multipart error: {}", e);
                (StatusCode::BAD_REQUEST, "bad_request", self.to_string())
            }
            AppError::Ocr(e) => {
                tracing::error!("OCR error: {}", e);
                let detail = match e {
                    OcrError::EngineInit(_) | OcrError::Processing(_) => e.to_string(),
                    _ => format!("OCR processing failed: {}", e),
                };
                (e.status_code(), "ocr_error", detail)
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    format!("OCR processing failed: {}", e),
                )
            }
        };

        (status, Json(ErrorResponse { error: error_type, detail })).into_response()
    }
}
