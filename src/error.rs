//! API error taxonomy.
//!
//! Every failure a handler can produce maps to exactly one status code and
//! renders as a `success: false` envelope. Internal detail is only exposed
//! when the server runs with `debug` on.

use std::collections::BTreeMap;

use axum::http::{Method, StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::http::response::Envelope;
use crate::store::StoreError;

/// Field name → problem description.
pub type FieldErrors = BTreeMap<String, String>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    Validation {
        message: String,
        errors: Option<FieldErrors>,
    },

    #[error("Authentication required")]
    Unauthenticated,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Route not found")]
    RouteNotFound { method: Method, path: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Request body too large")]
    PayloadTooLarge,

    #[error("Request timed out")]
    Timeout,

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    /// 422 without per-field detail.
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: None,
        }
    }

    /// 422 with per-field detail.
    pub fn invalid_fields(message: impl Into<String>, errors: FieldErrors) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: Some(errors),
        }
    }

    pub fn internal(err: impl std::fmt::Display) -> Self {
        ApiError::Internal(err.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Unauthenticated | ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::RouteNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Render the error body. `expose_internal` controls 500 detail.
    pub fn envelope(&self, expose_internal: bool) -> Envelope {
        let (message, errors) = match self {
            ApiError::Validation { message, errors } => (
                message.clone(),
                errors.as_ref().map(|e| json!(e)),
            ),
            ApiError::RouteNotFound { method, path } => (
                self.to_string(),
                Some(json!({ "method": method.as_str(), "path": path })),
            ),
            ApiError::Internal(detail) => (
                "Internal server error".to_string(),
                expose_internal.then(|| json!({ "detail": detail })),
            ),
            other => (other.to_string(), None),
        };

        Envelope {
            success: false,
            message,
            data: None,
            errors,
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(message) => ApiError::Conflict(message),
            StoreError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            other => ApiError::internal(other),
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::internal(err)
    }
}

pub fn field_errors<I, K, V>(pairs: I) -> FieldErrors
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<String>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
        assert_eq!(ApiError::invalid("x").status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::Unauthenticated.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(ApiError::conflict("x").status(), StatusCode::CONFLICT);
        assert_eq!(ApiError::internal("boom").status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(ApiError::PayloadTooLarge.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(ApiError::Timeout.status(), StatusCode::REQUEST_TIMEOUT);
    }

    #[test]
    fn test_internal_detail_hidden_by_default() {
        let err = ApiError::internal("disk on fire");
        let hidden = serde_json::to_value(err.envelope(false)).unwrap();
        assert_eq!(hidden, json!({"success": false, "message": "Internal server error"}));

        let shown = serde_json::to_value(err.envelope(true)).unwrap();
        assert_eq!(shown["errors"]["detail"], "disk on fire");
    }

    #[test]
    fn test_field_errors_rendered() {
        let err = ApiError::invalid_fields(
            "Missing fields",
            field_errors([("email", "email is required")]),
        );
        let body = serde_json::to_value(err.envelope(false)).unwrap();
        assert_eq!(body["message"], "Missing fields");
        assert_eq!(body["errors"]["email"], "email is required");
    }

    #[test]
    fn test_route_not_found_names_request() {
        let err = ApiError::RouteNotFound {
            method: Method::PATCH,
            path: "/api/nowhere".into(),
        };
        let body = serde_json::to_value(err.envelope(false)).unwrap();
        assert_eq!(body["message"], "Route not found");
        assert_eq!(body["errors"]["method"], "PATCH");
        assert_eq!(body["errors"]["path"], "/api/nowhere");
    }
}
