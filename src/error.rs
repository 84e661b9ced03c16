//! # error
//!
//! Centralised application error type.
//!
//! Every handler returns `Result<_, AppError>`.  Axum's `IntoResponse` impl
//! turns these into `{ "error": "<message>" }` bodies so clients always get a
//! machine-readable response, even on failure.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// A required parameter is missing or invalid.
    #[error("{0}")]
    BadRequest(String),

    /// Missing, malformed or rejected bearer token.
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    NotFound(String),

    /// A required server-side secret is not configured.
    #[error("Server configuration error: {0}")]
    Config(String),

    /// The upstream provider could not be reached.
    #[error("Failed to fetch data")]
    Upstream,

    /// A failure the user should see as a notification, with the detail kept
    /// in the logs only.
    #[error("{0}")]
    Unavailable(String),

    /// Catch-all for unexpected failures.
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Config(_)
            | AppError::Upstream
            | AppError::Unavailable(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_match_the_wire_contract() {
        assert_eq!(
            AppError::BadRequest("Symbol is required".into()).to_string(),
            "Symbol is required"
        );
        assert_eq!(
            AppError::Config("API Key missing".into()).to_string(),
            "Server configuration error: API Key missing"
        );
        assert_eq!(AppError::Upstream.to_string(), "Failed to fetch data");
    }

    #[test]
    fn status_codes() {
        assert_eq!(AppError::BadRequest(String::new()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::Unauthorized(String::new()).status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AppError::NotFound(String::new()).status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Upstream.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
