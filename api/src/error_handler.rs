use axum::{
    extract::multipart::MultipartError,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rag_store::RagError;
use thiserror::Error;
use tracing::error;

use crate::core::http::response_envelope::ApiResponse;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }

    fn http(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        AppError::Http {
            status,
            code,
            message: message.into(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(code = self.error_code(), error = %self, "request failed");
        }
        ApiResponse::error(self.error_code(), self.to_string()).into_response_with_status(status)
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        AppError::BadRequest(err.body_text())
    }
}

/// Convert `RagError` to `AppError::Http` with precise HTTP status & code.
impl From<RagError> for AppError {
    fn from(err: RagError) -> Self {
        match &err {
            RagError::UnsupportedFormat(_) => {
                AppError::http(StatusCode::BAD_REQUEST, "UNSUPPORTED_FORMAT", err.to_string())
            }
            RagError::InvalidInput(_) => {
                AppError::http(StatusCode::BAD_REQUEST, "INVALID_INPUT", err.to_string())
            }
            RagError::FieldTooLong { .. } => {
                AppError::http(StatusCode::BAD_REQUEST, "FIELD_TOO_LONG", err.to_string())
            }
            RagError::Csv(_) => AppError::http(StatusCode::BAD_REQUEST, "INVALID_CSV", err.to_string()),
            RagError::DimensionMismatch { .. } => {
                AppError::http(StatusCode::CONFLICT, "DIMENSION_MISMATCH", err.to_string())
            }
            RagError::Connection { .. } => AppError::http(
                StatusCode::BAD_GATEWAY,
                "BACKEND_UNAVAILABLE",
                err.to_string(),
            ),
            RagError::Embedding(_) => {
                AppError::http(StatusCode::BAD_GATEWAY, "EMBEDDING_FAILED", err.to_string())
            }
            RagError::PartialIndex { .. } => AppError::http(
                StatusCode::INTERNAL_SERVER_ERROR,
                "PARTIAL_INDEX",
                err.to_string(),
            ),
            RagError::Io(e) if e.kind() == std::io::ErrorKind::NotFound => {
                AppError::http(StatusCode::NOT_FOUND, "NOT_FOUND", err.to_string())
            }
            RagError::Io(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                AppError::http(StatusCode::BAD_REQUEST, "INVALID_ENCODING", err.to_string())
            }
            RagError::Io(_) => {
                AppError::http(StatusCode::INTERNAL_SERVER_ERROR, "IO_ERROR", err.to_string())
            }
            RagError::Config(_) => {
                AppError::http(StatusCode::INTERNAL_SERVER_ERROR, "CONFIG_ERROR", err.to_string())
            }
            RagError::Backend(_) => AppError::http(
                StatusCode::INTERNAL_SERVER_ERROR,
                "VECTOR_STORE_ERROR",
                err.to_string(),
            ),
        }
    }
}
