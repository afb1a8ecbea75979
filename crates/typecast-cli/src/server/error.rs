//! API error types and handling.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use typecast::{ErrorKind, TypecastError};

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    /// Upload request without a `file` field.
    FileNotProvided,
    /// Bad request from client.
    BadRequest(String),
    /// Internal server error.
    Internal(String),
    /// Error from the typecast library.
    Typecast(TypecastError),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

fn status_for(err: &TypecastError) -> StatusCode {
    if matches!(err, TypecastError::NotFound(_)) {
        return StatusCode::NOT_FOUND;
    }
    match err.kind() {
        ErrorKind::UnsupportedFormat => StatusCode::UNSUPPORTED_MEDIA_TYPE,
        ErrorKind::IngestionParse => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Config => StatusCode::BAD_REQUEST,
        ErrorKind::Inference | ErrorKind::Persistence => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::FileNotProvided => {
                (StatusCode::BAD_REQUEST, "File not provided".to_string(), None)
            }
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request".to_string(), Some(msg)),
            ApiError::Internal(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal".to_string(),
                Some(msg),
            ),
            ApiError::Typecast(e) => (
                status_for(&e),
                e.kind().as_str().to_string(),
                Some(e.to_string()),
            ),
        };

        (status, Json(ErrorResponse { error, message })).into_response()
    }
}

impl From<TypecastError> for ApiError {
    fn from(err: TypecastError) -> Self {
        ApiError::Typecast(err)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::FileNotProvided => write!(f, "File not provided"),
            ApiError::BadRequest(msg) => write!(f, "Bad request: {}", msg),
            ApiError::Internal(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Typecast(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ApiError {}
