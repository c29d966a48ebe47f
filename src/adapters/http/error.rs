use axum::{http::StatusCode, response::IntoResponse, response::Response, Json};
use tracing::{error, warn};

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

pub const MISSING_IMAGE_MESSAGE: &str = "No image uploaded";
pub const TOO_LARGE_MESSAGE: &str = "Image too large";
pub const PROCESSING_FAILED_MESSAGE: &str = "Failed to process image";

/// HTTP face of [`DomainError`]. Clients only ever see one of the fixed
/// messages above; the detail goes to the log.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn status_and_message(&self) -> (StatusCode, &'static str) {
        match self.0 {
            DomainError::MissingInput(_) => (StatusCode::BAD_REQUEST, MISSING_IMAGE_MESSAGE),
            DomainError::PayloadTooLarge(_) => (StatusCode::PAYLOAD_TOO_LARGE, TOO_LARGE_MESSAGE),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, PROCESSING_FAILED_MESSAGE),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if self.0.is_client_error() {
            warn!(kind = self.0.kind(), "rejected upload: {}", self.0);
        } else {
            error!(kind = self.0.kind(), "prediction failed: {}", self.0);
        }
        (status, Json(ErrorResponse::new(message))).into_response()
    }
}
