//! Application error types and HTTP response mapping.
//!
//! Defines `AppError` enum for all error conditions and implements Axum's
//! `IntoResponse` to automatically convert errors to appropriate HTTP responses
//! with JSON error bodies.
//!
//! Error mappings:
//! - `Unauthorized` → 401, `Forbidden` → 403
//! - `NotFound` → 404
//! - `BadRequest`, `InvalidState` → 400
//! - `UpstreamUnavailable` → 503
//! - `UpstreamError` and every analysis failure → 502
//! - `Database`, `Internal` → 500

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Malformed model output: {0}")]
    MalformedModelOutput(String),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("Message generation failed: {0}")]
    MessageGenerationFailed(String),

    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Maps a non-success upstream HTTP status onto the error taxonomy.
    pub fn from_upstream_status(status: u16, context: impl Into<String>) -> Self {
        let context = context.into();
        match status {
            401 => AppError::Unauthorized(context),
            403 => AppError::Forbidden(context),
            404 => AppError::NotFound(context),
            s if s >= 500 => AppError::UpstreamUnavailable(format!("{} (status {})", context, s)),
            s => AppError::UpstreamError(format!("{} (status {})", context, s)),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamError(_)
            | AppError::MalformedModelOutput(_)
            | AppError::InvariantViolation(_)
            | AppError::AnalysisFailed(_)
            | AppError::MessageGenerationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() {
            AppError::UpstreamUnavailable(e.to_string())
        } else {
            AppError::UpstreamError(e.to_string())
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(status = status.as_u16(), error = %self, "request failed");
        }

        let error_message = match &self {
            // Driver messages can leak schema details
            AppError::Database(_) => "Database error".to_string(),
            other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upstream_statuses_map_onto_taxonomy() {
        assert!(matches!(AppError::from_upstream_status(401, "x"), AppError::Unauthorized(_)));
        assert!(matches!(AppError::from_upstream_status(403, "x"), AppError::Forbidden(_)));
        assert!(matches!(AppError::from_upstream_status(404, "x"), AppError::NotFound(_)));
        assert!(matches!(
            AppError::from_upstream_status(502, "x"),
            AppError::UpstreamUnavailable(_)
        ));
        assert!(matches!(AppError::from_upstream_status(422, "x"), AppError::UpstreamError(_)));
    }

    #[test]
    fn analysis_failures_surface_as_bad_gateway() {
        let err = AppError::InvariantViolation("sum is 0".into());
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            AppError::InvalidState("pending".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }
}
