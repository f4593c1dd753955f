//! Error types for the server

use axum::{
    extract::rejection::BytesRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::error::{ErrorCategory, PipelineError};
use super::ErrorStatusPolicy;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Request body exceeds the configured size limit")]
    PayloadTooLarge,

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<BytesRejection> for ServerError {
    fn from(rejection: BytesRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ServerError::PayloadTooLarge
        } else {
            ServerError::BadRequest(rejection.body_text())
        }
    }
}

impl ServerError {
    /// Status code under the categorized policy
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Pipeline(e) => match e.category() {
                ErrorCategory::BadInput => StatusCode::BAD_REQUEST,
                ErrorCategory::Schema => StatusCode::UNPROCESSABLE_ENTITY,
                ErrorCategory::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            },
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ServerError::NotFound(_) => StatusCode::NOT_FOUND,
            ServerError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render as `{"error": "..."}` with the status the policy picks
    pub fn into_response_with(self, policy: ErrorStatusPolicy) -> Response {
        let status = self.status();

        let message = match policy {
            // Legacy clients only look at the body, give them the full message
            ErrorStatusPolicy::AlwaysOk => {
                tracing::warn!(detail = %self, "Request failed");
                self.to_string()
            }
            ErrorStatusPolicy::Categorized if status.is_server_error() => {
                tracing::error!(detail = %self, "Internal server error");
                "Prediction failed. Check server logs for details.".to_string()
            }
            ErrorStatusPolicy::Categorized => {
                tracing::warn!(status = status.as_u16(), detail = %self, "Request rejected");
                self.to_string()
            }
        };

        let status = match policy {
            ErrorStatusPolicy::AlwaysOk => StatusCode::OK,
            ErrorStatusPolicy::Categorized => status,
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        self.into_response_with(ErrorStatusPolicy::Categorized)
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
