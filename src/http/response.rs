//! Response envelope.
//!
//! # Responsibilities
//! - Wrap every body in `{success, message, data?, errors?}`
//! - Carry the status code chosen by the handler
//! - Render to an axum `Response` with a JSON content type
//! - Render `ApiError` values with the same envelope
//!
//! # Design Decisions
//! - Handlers return `ApiResponse` values; nothing writes to the wire directly
//! - `data` and `errors` are omitted from the JSON when absent

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::error::ApiError;

/// Uniform JSON body of every response.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Value>,
}

/// A successful handler outcome.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub message: String,
    pub data: Option<Value>,
}

impl ApiResponse {
    /// 200 with `data` and the default message.
    pub fn ok(data: Value) -> Self {
        Self {
            status: StatusCode::OK,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    /// 201 with `data`.
    pub fn created(data: Value, message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::CREATED,
            message: message.into(),
            data: Some(data),
        }
    }

    /// 200 with only a message.
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn envelope(&self) -> Envelope {
        Envelope {
            success: true,
            message: self.message.clone(),
            data: self.data.clone(),
            errors: None,
        }
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope())).into_response()
    }
}

/// Render a handler failure. `expose_internal` reveals 500 detail.
pub fn render_error(err: &ApiError, expose_internal: bool) -> Response {
    (err.status(), Json(err.envelope(expose_internal))).into_response()
}
