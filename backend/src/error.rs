//! Request-level error types.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::ValidationError;
use crate::store::StoreError;

/// Errors surfaced to HTTP callers.
///
/// Per-item inference failures never show up here; they are recorded in
/// batch reports or absorbed into the fallback label.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Caller input rejected before any inference call.
    #[error("{0}")]
    Validation(String),

    /// The store could not be reached or written.
    #[error("Persistence unavailable: {0}")]
    Persistence(String),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Validation(e) => e.into(),
            other => Error::Persistence(other.to_string()),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            Error::Validation(_) => (StatusCode::BAD_REQUEST, "validation_failed"),
            Error::Persistence(_) => (StatusCode::SERVICE_UNAVAILABLE, "persistence_unavailable"),
        };

        if let Error::Persistence(ref message) = self {
            tracing::error!("Persistence failure: {}", message);
        }

        let body = Json(json!({
            "error": {
                "type": error_type,
                "message": self.to_string()
            }
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Reject blank required fields.
pub fn require(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require() {
        assert!(require("x", "text").is_ok());
        let err = require("   ", "text").unwrap_err();
        assert_eq!(err.to_string(), "Field \"text\" is required");
    }

    #[test]
    fn test_store_validation_maps_to_validation() {
        let err: Error = StoreError::Validation(ValidationError::ConfidenceOutOfRange(2.0)).into();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_error_is_unavailable() {
        let err: Error = StoreError::DatabaseError("disk I/O error".to_string()).into();
        assert_eq!(err.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
