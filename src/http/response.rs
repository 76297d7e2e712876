//! Response shaping.
//!
//! # Responsibilities
//! - Relay successful upstream replies verbatim (status, content-type, body)
//! - Map [`ProxyError`] to caller-facing errors
//!
//! # Design Decisions
//! - Validation errors are returned as-is with 400
//! - Every other failure is a 500 with a generic, operation-specific message;
//!   upstream detail goes to the log only
//! - Error bodies are `{"error": "<message>"}`

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::documents::UpstreamReply;
use crate::error::ProxyError;

/// Error returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    /// Convert a proxy failure, logging its detail. `context` is the
    /// generic message the caller sees for anything but validation errors.
    pub fn from_proxy(err: ProxyError, context: &str) -> Self {
        match err {
            ProxyError::Validation(message) => {
                tracing::warn!(reason = %message, "{}", context);
                Self::bad_request(message)
            }
            ProxyError::Parse { what, reason, raw } => {
                tracing::error!(what, reason = %reason, raw = %raw, "{}", context);
                Self::internal(context)
            }
            other => {
                tracing::error!(error = %other, "{}", context);
                Self::internal(context)
            }
        }
    }

    fn internal(message: &str) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl IntoResponse for UpstreamReply {
    fn into_response(self) -> Response {
        let mut response = (self.status, self.body).into_response();
        if let Some(content_type) = self.content_type {
            response.headers_mut().insert(header::CONTENT_TYPE, content_type);
        }
        response
    }
}
