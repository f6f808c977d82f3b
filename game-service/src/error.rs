//! API error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::debug;

use gamerate_common::GameRateError;

/// Errors returned by the game API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Missing or malformed request parameter.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// No such item.
    #[error("not found: {0}")]
    NotFound(String),

    /// The conversion did not produce a price. Every engine failure is
    /// answered with an empty 204.
    #[error("no content: {0}")]
    NoContent(GameRateError),

    /// The store failed while reading.
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::NoContent(e) => {
                debug!(error_code = e.error_code(), "Answering conversion failure with 204");
                return StatusCode::NO_CONTENT.into_response();
            }
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        (status, axum::Json(json!({ "error": message }))).into_response()
    }
}

impl From<GameRateError> for ApiError {
    fn from(e: GameRateError) -> Self {
        match e {
            GameRateError::InvalidInput(msg) => Self::BadRequest(msg),
            GameRateError::NotFound(msg) => Self::NotFound(msg),
            other => Self::Internal(other.to_string()),
        }
    }
}
