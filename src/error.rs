//! Request-level error type and its mapping to JSON error responses.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::translate::input::InputError;

const AUTH_FAILURE_MESSAGE: &str = "Authentication error occurred.";

/// Errors a request can end in. Every variant becomes a JSON `{"error": ...}` body.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("A message is required. Provide the 'message' query parameter.")]
    MissingInput,

    #[error(transparent)]
    InvalidInput(InputError),

    #[error("Unsupported target language '{code}'. Supported codes: {supported}")]
    UnsupportedLanguage { code: String, supported: String },

    #[error("Too many requests. Please try again in {retry_after_secs} seconds.")]
    RateLimited { retry_after_secs: u64 },

    /// Any failure talking to the LLM provider. `detail` is for the log only.
    #[error("{operation} failed: {detail}")]
    ExternalService {
        operation: &'static str,
        detail: String,
    },
}

impl From<InputError> for ApiError {
    fn from(err: InputError) -> Self {
        match err {
            InputError::Missing => ApiError::MissingInput,
            other => ApiError::InvalidInput(other),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::MissingInput
            | ApiError::InvalidInput(_)
            | ApiError::UnsupportedLanguage { .. } => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::ExternalService { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the caller. Provider detail never leaves the process.
    pub fn user_message(&self) -> String {
        match self {
            ApiError::ExternalService { operation, detail } => {
                if mentions_credentials(detail) {
                    AUTH_FAILURE_MESSAGE.to_string()
                } else {
                    format!("{operation} failed. Please try again later.")
                }
            }
            other => other.to_string(),
        }
    }
}

fn mentions_credentials(detail: &str) -> bool {
    let lower = detail.to_lowercase();
    lower.contains("api key") || lower.contains("authentication")
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            error: self.user_message(),
            retry_after: match &self {
                ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
                _ => None,
            },
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after_secs } = self {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, retry_after_secs.into());
        }
        response
    }
}
