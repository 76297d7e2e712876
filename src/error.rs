//! Error taxonomy for proxied operations.
//!
//! Every component returns [`ProxyError`]; the HTTP layer decides what the
//! caller sees (see `http::response::ApiError`).

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

/// Longest upstream body excerpt kept in an error message.
const MAX_UPSTREAM_EXCERPT: usize = 512;

/// External collaborator a request was sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Documents,
    Ai,
}

impl Service {
    /// Short label for metrics and structured logs.
    pub fn label(self) -> &'static str {
        match self {
            Service::Documents => "documents",
            Service::Ai => "ai",
        }
    }
}

impl std::fmt::Display for Service {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Service::Documents => write!(f, "document service"),
            Service::Ai => write!(f, "AI service"),
        }
    }
}

/// Errors that can occur while translating or relaying a request.
#[derive(Debug, Error)]
pub enum ProxyError {
    /// Required caller input is missing or malformed.
    #[error("{0}")]
    Validation(String),

    /// Upstream answered with a non-success status.
    #[error("{service} returned {status}: {message}")]
    Upstream {
        service: Service,
        status: StatusCode,
        message: String,
    },

    /// Upstream could not be reached or the exchange broke.
    #[error("{service} request failed: {source}")]
    Transport {
        service: Service,
        #[source]
        source: reqwest::Error,
    },

    /// Upstream did not answer within the configured bound.
    #[error("{service} did not respond within {secs} seconds")]
    Timeout { service: Service, secs: u64 },

    /// Upstream output could not be decoded. `raw` is kept for logs only.
    #[error("could not parse {what}: {reason}")]
    Parse {
        what: &'static str,
        reason: String,
        raw: String,
    },
}

/// Result type for proxied operations.
pub type ProxyResult<T> = Result<T, ProxyError>;

impl ProxyError {
    pub fn validation(message: impl Into<String>) -> Self {
        ProxyError::Validation(message.into())
    }

    pub fn transport(service: Service, source: reqwest::Error) -> Self {
        ProxyError::Transport { service, source }
    }

    /// Build an upstream error from a failed response body, preferring the
    /// service's own `error`/`message` field and falling back to the status.
    pub fn upstream(service: Service, status: StatusCode, body: &[u8]) -> Self {
        ProxyError::Upstream {
            service,
            status,
            message: upstream_message(status, body),
        }
    }
}

fn upstream_message(status: StatusCode, body: &[u8]) -> String {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        let reported = value
            .get("error")
            .or_else(|| value.get("message"))
            .or_else(|| value.get("detail"));
        match reported {
            Some(Value::String(s)) => return s.clone(),
            Some(Value::Object(obj)) => {
                if let Some(Value::String(s)) = obj.get("message") {
                    return s.clone();
                }
            }
            _ => {}
        }
    }

    let text = String::from_utf8_lossy(body);
    let text = text.trim();
    if text.is_empty() {
        return format!("status {}", status.as_u16());
    }
    match text.char_indices().nth(MAX_UPSTREAM_EXCERPT) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upstream_message_prefers_error_field() {
        let err = ProxyError::upstream(
            Service::Ai,
            StatusCode::SERVICE_UNAVAILABLE,
            br#"{"error":"model offline"}"#,
        );
        assert_eq!(err.to_string(), "AI service returned 503 Service Unavailable: model offline");
    }

    #[test]
    fn test_upstream_message_nested_error_object() {
        let err = ProxyError::upstream(
            Service::Documents,
            StatusCode::BAD_REQUEST,
            br#"{"error":{"message":"Invalid column"}}"#,
        );
        assert!(err.to_string().ends_with("Invalid column"));
    }

    #[test]
    fn test_upstream_message_falls_back_to_status() {
        let err = ProxyError::upstream(Service::Documents, StatusCode::BAD_GATEWAY, b"  ");
        assert!(err.to_string().ends_with("status 502"));
    }

    #[test]
    fn test_upstream_message_truncates_text() {
        let body = "x".repeat(2000);
        match ProxyError::upstream(Service::Documents, StatusCode::INTERNAL_SERVER_ERROR, body.as_bytes()) {
            ProxyError::Upstream { message, .. } => {
                assert_eq!(message.len(), MAX_UPSTREAM_EXCERPT + 3);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_display_omits_raw() {
        let err = ProxyError::Parse {
            what: "analysis",
            reason: "expected value".into(),
            raw: "secret model output".into(),
        };
        assert!(!err.to_string().contains("secret"));
    }
}
