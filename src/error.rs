//! Service error taxonomy and its HTTP mapping.
//!
//! Every failure reaching the boundary becomes a JSON body with an `error`
//! message and a stable `code` string; clients never see a bare status or a
//! stack trace. Each kind maps to a distinct status code.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExtractError {
    /// Declared MIME type is not one we accept.
    #[error("Unsupported file type: {0}")]
    UnsupportedType(String),

    /// Malformed multipart body, missing file field, or empty upload.
    #[error("{0}")]
    BadRequest(String),

    /// The PDF could not be decoded or rendered. Fatal for the request.
    #[error("rasterization failed: {0}")]
    Rasterization(String),

    /// An OCR or summarization call failed (network, auth, quota, empty
    /// response). Not retried here; the client performs its own bounded retry.
    #[error("external service call failed: {0:#}")]
    ExternalService(#[from] anyhow::Error),
}

impl ExtractError {
    /// Stable machine-readable identifier for each error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnsupportedType(_) => "unsupported_type",
            Self::BadRequest(_) => "bad_request",
            Self::Rasterization(_) => "rasterization",
            Self::ExternalService(_) => "external_service",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::UnsupportedType(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Rasterization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ExternalService(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ExtractError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });
        (self.status(), Json(body)).into_response()
    }
}
