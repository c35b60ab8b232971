use axum::{http::StatusCode, Json};
use tracing::error;

use crate::models::ErrorResponse;
use crate::services::FsError;

/// Error half of every JSON handler
pub type ApiError = (StatusCode, Json<ErrorResponse>);

impl From<FsError> for (StatusCode, Json<ErrorResponse>) {
    fn from(err: FsError) -> Self {
        let status = match &err {
            FsError::AccessDenied => StatusCode::FORBIDDEN,
            FsError::PayloadTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
            FsError::NotFound(_) | FsError::InvalidContent(_) | FsError::Io(_) => {
                error!("File operation failed: {}", err);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(ErrorResponse::new(err.to_string())))
    }
}

pub fn internal_error(message: impl Into<String>) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new(message)),
    )
}
