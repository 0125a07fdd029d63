//! Error types for the referral API

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use referral_core::CoreError;
use referral_mail::MailError;
use referral_pdf::PdfError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Validation(CoreError),

    #[error(transparent)]
    Pdf(#[from] PdfError),

    #[error("Email send failed: {0}")]
    Email(#[from] MailError),

    #[error("{0}")]
    Lead(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<CoreError> for ApiError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::InvalidPayload(msg) => ApiError::BadRequest(msg),
            validation => ApiError::Validation(validation),
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(e: tokio::task::JoinError) -> Self {
        ApiError::Internal(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field) = match &self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.field()),
            ApiError::Pdf(_) | ApiError::Email(_) | ApiError::Lead(_) | ApiError::Internal(_) => {
                tracing::error!(error = %self, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let mut body = json!({
            "error": self.to_string(),
            "status": status.as_u16(),
        });
        if let Some(field) = field {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}
