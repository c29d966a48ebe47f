use axum::{
    extract::{multipart::MultipartError, multipart::MultipartRejection, Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::adapters::http::{error::ApiError, state::HttpState};
use crate::application::dto::PredictResponse;
use crate::domain::errors::{DomainError, DomainResult};

/// Multipart field carrying the upload.
pub const IMAGE_FIELD: &str = "image";

pub async fn predict(
    State(st): State<HttpState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<PredictResponse>, ApiError> {
    let mut multipart = multipart.map_err(|e| DomainError::MissingInput(format!("not a multipart upload: {e}")))?;
    let upload = read_image_field(&mut multipart).await?;
    debug!(bytes = upload.len(), "upload received");

    let response = st.prediction.predict(upload).await?;
    Ok(Json(response))
}

pub async fn model_info(State(st): State<HttpState>) -> impl IntoResponse {
    Json(st.prediction.model_info())
}

async fn read_image_field(multipart: &mut Multipart) -> DomainResult<Vec<u8>> {
    loop {
        let field = multipart.next_field().await.map_err(multipart_error)?;
        let Some(field) = field else {
            return Err(DomainError::MissingInput(format!("no '{IMAGE_FIELD}' field")));
        };
        if field.name() != Some(IMAGE_FIELD) {
            continue;
        }
        let data = field.bytes().await.map_err(multipart_error)?;
        if data.is_empty() {
            return Err(DomainError::MissingInput(format!("'{IMAGE_FIELD}' field is empty")));
        }
        return Ok(data.to_vec());
    }
}

fn multipart_error(e: MultipartError) -> DomainError {
    match e.status() {
        StatusCode::PAYLOAD_TOO_LARGE => DomainError::PayloadTooLarge(e.body_text()),
        StatusCode::BAD_REQUEST => DomainError::MissingInput(e.body_text()),
        _ => DomainError::OperationFailed(format!("reading upload: {}", e.body_text())),
    }
}
