//! Pantry chat handler.

use axum::{
    body::Body,
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue},
    response::Response,
    Json,
};
use futures_util::TryStreamExt;

use crate::ai::chat::{pantry_chat_payload, PantryChatRequest};
use crate::http::response::ApiError;
use crate::http::server::AppState;

const CHAT_FAILED: &str = "Failed to get chat response";

/// Ask the AI service about the pantry and stream its answer back verbatim.
///
/// Errors before the upstream answers become JSON errors. Once headers are
/// sent, a broken upstream stream just ends the connection.
pub async fn pantry_chat(
    State(state): State<AppState>,
    body: Result<Json<PantryChatRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = body.map_err(|rejection| ApiError::bad_request(rejection.body_text()))?;
    let (items, message) = request
        .into_parts()
        .map_err(|e| ApiError::from_proxy(e, CHAT_FAILED))?;

    let payload = pantry_chat_payload(state.ai.config(), &items, &message);
    let upstream = state
        .ai
        .open_stream(&payload)
        .await
        .map_err(|e| ApiError::from_proxy(e, CHAT_FAILED))?;

    tracing::debug!(items = items.len(), "Relaying pantry chat stream");

    let status = upstream.status();
    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("text/plain; charset=utf-8"));

    let stream = upstream
        .bytes_stream()
        .inspect_err(|e| tracing::error!(error = %e, "Pantry chat stream broke after headers were sent"));

    let mut response = Response::new(Body::from_stream(stream));
    *response.status_mut() = status;
    response.headers_mut().insert(header::CONTENT_TYPE, content_type);
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    Ok(response)
}
