use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::fusion::{FailureKind, FusionError};

use super::status::SEARCH_STATUS_HEADER;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("could not encode query: {0}")]
    EmbeddingFailed(String),

    #[error("offer lookup failed for facet '{facet}': {message}")]
    RetrievalFailed { facet: String, message: String },

    #[error("internal error: {0}")]
    InternalError(String),
}

impl From<FusionError> for GatewayError {
    fn from(err: FusionError) -> Self {
        match err.kind() {
            FailureKind::Embedding => GatewayError::EmbeddingFailed(err.to_string()),
            FailureKind::Retrieval => GatewayError::RetrievalFailed {
                facet: err.facet().unwrap_or("unknown").to_string(),
                message: err.to_string(),
            },
            FailureKind::Config => GatewayError::InternalError(err.to_string()),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl GatewayError {
    /// HTTP status and the value sent in the status header.
    pub fn status(&self) -> (StatusCode, &'static str) {
        match self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::EmbeddingFailed(_) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "embedding_error")
            }
            GatewayError::RetrievalFailed { .. } => (StatusCode::BAD_GATEWAY, "retrieval_error"),
            GatewayError::InternalError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, search_status) = self.status();

        let mut headers = HeaderMap::new();
        headers.insert(
            SEARCH_STATUS_HEADER,
            HeaderValue::from_static(search_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}
