use axum::extract::multipart::MultipartError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Everything a handler can answer with besides success.
///
/// Clients only ever see the short plain-text message; details go to the log.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No file part")]
    NoFilePart,

    #[error("No selected file")]
    NoSelectedFile,

    #[error("Unsupported file type")]
    UnsupportedFileType,

    #[error("Document not found")]
    NotFound,

    #[error("multipart body could not be read: {0}")]
    Multipart(#[from] MultipartError),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::NoFilePart | ApiError::NoSelectedFile | ApiError::UnsupportedFileType => {
                tracing::info!(reason = %self, "Upload rejected");
                (StatusCode::BAD_REQUEST, self.to_string()).into_response()
            }
            ApiError::NotFound => (StatusCode::NOT_FOUND, self.to_string()).into_response(),
            ApiError::Multipart(e) => {
                tracing::warn!(error = %e, "Malformed upload");
                (e.status(), e.body_text()).into_response()
            }
            ApiError::Internal(e) => {
                tracing::error!(error = %format!("{e:#}"), "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
            }
        }
    }
}
